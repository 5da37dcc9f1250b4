//! `validate [--pre-commit] [-- <file>]`: parses the targeted files and
//! reports parse failures, without otherwise touching their contents.

use anyhow::{bail, Result};

use crate::commands::geometry_files_at;
use crate::geometry::loader;
use crate::store::RevisionStore;

pub fn run(store: &dyn RevisionStore, pre_commit: bool, path: Option<&str>) -> Result<()> {
    let files = match (pre_commit, path) {
        (_, Some(p)) => vec![p.to_string()],
        (true, None) => store
            .staged_paths()?
            .into_iter()
            .filter(|p| crate::geometry::is_geometry_file(p))
            .collect(),
        (false, None) => geometry_files_at(store, "HEAD")?,
    };

    let mut errors = 0usize;
    for file in &files {
        let bytes = if pre_commit {
            store.read_staged_blob(file)?
        } else {
            store.read_blob_at("HEAD", file)?
        };
        let Some(bytes) = bytes else {
            eprintln!("warning: {file} could not be read");
            errors += 1;
            continue;
        };
        if let Err(e) = loader::load_buffer(file, &bytes) {
            eprintln!("warning: {file}: {e:#}");
            errors += 1;
        } else {
            println!("ok: {file}");
        }
    }

    if errors > 0 {
        bail!("{errors} file(s) failed validation");
    }
    println!("{} file(s) validated.", files.len());
    Ok(())
}
