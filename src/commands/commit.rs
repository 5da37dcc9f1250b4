//! `commit -m <msg> [-a]`: create a commit, appending one structured
//! trailer block per staged geometry file.

use anyhow::{bail, Result};

use crate::commands::{fingerprint_of, format_trailer, load_at_rev, load_staged};
use crate::geometry::is_geometry_file;
use crate::store::RevisionStore;

/// `-a` is approximated as staging everything (including untracked
/// geometry files), not just modifications to already-tracked paths;
/// a full `git commit -a` would need a narrower "stage tracked only"
/// primitive the revision-store interface doesn't expose.
pub fn run(store: &dyn RevisionStore, message: &str, stage_all: bool) -> Result<()> {
    if message.trim().is_empty() {
        bail!("commit message (-m) is required");
    }

    if stage_all {
        store.stage_all()?;
    }

    if !store.has_staged_changes()? {
        bail!("nothing staged to commit");
    }

    let staged_geometry: Vec<String> = store
        .staged_paths()?
        .into_iter()
        .filter(|p| is_geometry_file(p))
        .collect();

    let mut trailers = Vec::new();
    for path in &staged_geometry {
        let old = load_at_rev(store, "HEAD", path)?.map(|g| fingerprint_of(&g));
        let new = load_staged(store, path)?.map(|g| fingerprint_of(&g));
        let trailer = format_trailer(path, old.as_ref(), new.as_ref());
        if !trailer.is_empty() {
            trailers.push(trailer);
        }
    }

    let mut full_message = message.trim_end().to_string();
    if !trailers.is_empty() {
        full_message.push_str("\n\n");
        full_message.push_str(&trailers.join("\n\n"));
    }

    let commit = store.commit(&full_message)?;
    println!("[{}] {}", commit.short_id, message.lines().next().unwrap_or(""));
    Ok(())
}
