//! `add <file>... | -A`: stage one or more geometry files, or everything.

use anyhow::{bail, Result};

use crate::store::RevisionStore;

pub fn run(store: &dyn RevisionStore, paths: &[String], all: bool) -> Result<()> {
    if all {
        store.stage_all()?;
        println!("Staged all changes.");
        return Ok(());
    }

    if paths.is_empty() {
        bail!("no files given; pass paths or -A");
    }

    store.stage_paths(paths)?;
    println!("Staged {} file(s).", paths.len());
    Ok(())
}
