//! `summary [rev] [-- <file>]`: per-file cell/surface/universe counts.

use anyhow::{bail, Result};

use crate::commands::{geometry_files_at, load_at_rev};
use crate::store::RevisionStore;

pub fn run(store: &dyn RevisionStore, rev: &str, path: Option<&str>) -> Result<()> {
    let files = match path {
        Some(p) => vec![p.to_string()],
        None => geometry_files_at(store, rev)?,
    };

    if files.is_empty() {
        println!("No geometry files tracked at {rev}.");
        return Ok(());
    }

    let mut any_error = false;
    for file in &files {
        match load_at_rev(store, rev, file)? {
            None => {
                eprintln!("warning: {file} not found at {rev}");
                any_error = true;
            }
            Some(geom) => {
                println!(
                    "{file}: {} cells, {} surfaces, {} universes",
                    geom.cells.len(),
                    geom.surfaces.len(),
                    geom.universe_count
                );
            }
        }
    }

    if any_error {
        bail!("one or more files could not be summarised");
    }
    Ok(())
}
