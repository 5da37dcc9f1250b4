//! `status`: changed geometry files with per-file added/removed/
//! modified counters for cells and surfaces.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::commands::load_at_rev;
use crate::diff::diff;
use crate::fingerprint::{self, FingerprintSet};
use crate::geometry::{is_geometry_file, loader};
use crate::store::RevisionStore;

fn load_worktree(path: &str) -> Result<Option<FingerprintSet>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let geom = loader::load_buffer(path, &bytes)?;
    Ok(Some(fingerprint::build(&geom)))
}

pub fn run(store: &dyn RevisionStore) -> Result<()> {
    let entries: Vec<_> = store
        .status_entries()?
        .into_iter()
        .filter(|e| is_geometry_file(&e.path))
        .collect();

    if entries.is_empty() {
        println!("No geometry changes.");
        return Ok(());
    }

    for entry in &entries {
        let old = load_at_rev(store, "HEAD", &entry.path)?.map(|g| fingerprint::build(&g));
        let new = if entry.is_deleted() {
            None
        } else {
            load_worktree(&entry.path)?
        };

        match (&old, &new) {
            (None, Some(new)) => {
                println!("new file: {} ({} cells, {} surfaces)", entry.path, new.cells.len(), new.surfaces.len());
            }
            (Some(_), None) => {
                println!("deleted: {}", entry.path);
            }
            (Some(old), Some(new)) => {
                let result = diff(old, new);
                println!(
                    "modified: {} (cells +{} -{} ~{} | surfaces +{} -{} ~{})",
                    entry.path,
                    result.cells_added,
                    result.cells_removed,
                    result.cells_modified,
                    result.surfs_added,
                    result.surfs_removed,
                    result.surfs_modified,
                );
            }
            (None, None) => {}
        }
    }

    Ok(())
}
