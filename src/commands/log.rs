//! `log [--cell N] [--surface N] [-n K] [-- <file>]`: history for a
//! file, optionally filtered to commits whose fingerprint set still
//! contains a given cell/surface id. Default limit 50, first message
//! line only.

use anyhow::Result;

use crate::fingerprint;
use crate::geometry::loader;
use crate::history::walk_history;
use crate::store::RevisionStore;

pub const DEFAULT_LOG_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub enum Filter {
    #[default]
    None,
    Cell(i64),
    Surface(i64),
}

pub fn run(store: &dyn RevisionStore, path: &str, filter: Filter, limit: usize) -> Result<()> {
    let mut shown = 0usize;
    let mut stop = false;

    walk_history(store, path, |commit| {
        if stop || shown >= limit {
            return Ok(false);
        }

        let matches = match filter {
            Filter::None => true,
            Filter::Cell(id) => commit_has_cell(store, &commit.id, path, id)?,
            Filter::Surface(id) => commit_has_surface(store, &commit.id, path, id)?,
        };

        if matches {
            let subject = commit.message.lines().next().unwrap_or("");
            println!("{} {} {} {}", commit.short_id, commit.date, commit.author_name, subject);
            shown += 1;
        }

        if shown >= limit {
            stop = true;
        }
        Ok(!stop)
    })?;

    if shown == 0 {
        println!("No matching history for {path}.");
    }
    Ok(())
}

fn commit_has_cell(store: &dyn RevisionStore, commit: &str, path: &str, id: i64) -> Result<bool> {
    let Some(bytes) = store.read_blob_at(commit, path)? else {
        return Ok(false);
    };
    let Ok(geom) = loader::load_buffer(path, &bytes) else {
        return Ok(false);
    };
    Ok(fingerprint::build(&geom).cells.iter().any(|c| c.cell_id == id))
}

fn commit_has_surface(store: &dyn RevisionStore, commit: &str, path: &str, id: i64) -> Result<bool> {
    let Some(bytes) = store.read_blob_at(commit, path)? else {
        return Ok(false);
    };
    let Ok(geom) = loader::load_buffer(path, &bytes) else {
        return Ok(false);
    };
    Ok(fingerprint::build(&geom).surfaces.iter().any(|s| s.surface_id == id))
}
