//! Blame engine: attributes each element to the oldest ancestor whose
//! fingerprint for that id still matches the tip.

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::fingerprint::compare::{cell_fp_eq, surface_fp_eq};
use crate::fingerprint::{self, CellFp, SurfaceFp};
use crate::geometry::loader;
use crate::history::walk_history;
use crate::store::{CommitInfo, RevisionStore};

#[derive(Debug, Clone)]
pub struct Attribution {
    pub commit_id: String,
    pub short_id: String,
    pub author_name: String,
    pub date: String,
}

impl From<&CommitInfo> for Attribution {
    fn from(c: &CommitInfo) -> Self {
        Attribution {
            commit_id: c.id.clone(),
            short_id: c.short_id.clone(),
            author_name: c.author_name.clone(),
            date: c.date.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlameResult {
    pub cells: HashMap<i64, Attribution>,
    pub surfaces: HashMap<i64, Attribution>,
}

/// Compute attribution for every cell and surface in `path` at `HEAD`.
/// The walk visits every distinct ancestor version and "older wins"
/// whenever a match is found, so the result does not depend on the
/// walk's visiting order among matching ancestors.
pub fn blame(store: &dyn RevisionStore, path: &str) -> Result<BlameResult> {
    let head_bytes = store
        .read_blob_at("HEAD", path)?
        .with_context(|| format!("{path} does not exist at HEAD"))?;
    let head_geom = loader::load_buffer(path, &head_bytes)?;
    let head_fp = fingerprint::build(&head_geom);

    let head_cell_index: HashMap<i64, &CellFp> =
        head_fp.cells.iter().map(|c| (c.cell_id, c)).collect();
    let head_surface_index: HashMap<i64, &SurfaceFp> =
        head_fp.surfaces.iter().map(|s| (s.surface_id, s)).collect();

    let mut result = BlameResult::default();
    let mut first = true;

    walk_history(store, path, |commit| {
        if first {
            first = false;
            for c in &head_fp.cells {
                result.cells.insert(c.cell_id, Attribution::from(commit));
            }
            for s in &head_fp.surfaces {
                result.surfaces.insert(s.surface_id, Attribution::from(commit));
            }
            return Ok(true);
        }

        let bytes = match store.read_blob_at(&commit.id, path)? {
            Some(b) => b,
            None => return Ok(true),
        };
        let geom = match loader::load_buffer(path, &bytes) {
            Ok(g) => g,
            Err(_) => return Ok(true), // parse error: skip this version, keep walking
        };
        let fp = fingerprint::build(&geom);
        let cell_index: HashMap<i64, &CellFp> = fp.cells.iter().map(|c| (c.cell_id, c)).collect();
        let surface_index: HashMap<i64, &SurfaceFp> =
            fp.surfaces.iter().map(|s| (s.surface_id, s)).collect();

        let cell_ids: Vec<i64> = result.cells.keys().copied().collect();
        for id in cell_ids {
            if let (Some(head_c), Some(old_c)) = (head_cell_index.get(&id), cell_index.get(&id)) {
                if cell_fp_eq(head_c, old_c) {
                    result.cells.insert(id, Attribution::from(commit));
                }
            }
        }

        let surface_ids: Vec<i64> = result.surfaces.keys().copied().collect();
        for id in surface_ids {
            if let (Some(head_s), Some(old_s)) =
                (head_surface_index.get(&id), surface_index.get(&id))
            {
                if surface_fp_eq(head_s, old_s) {
                    result.surfaces.insert(id, Attribution::from(commit));
                }
            }
        }

        Ok(true)
    })?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StatusEntry;

    struct ScriptedStore {
        head_blob: Vec<u8>,
        commits: Vec<(CommitInfo, Option<Vec<u8>>, String)>,
    }

    impl RevisionStore for ScriptedStore {
        fn is_repo(&self) -> bool {
            true
        }
        fn init(&self) -> Result<bool> {
            Ok(false)
        }
        fn resolve(&self, _rev: &str) -> Result<CommitInfo> {
            Ok(self.commits[0].0.clone())
        }
        fn current_branch(&self) -> Result<String> {
            Ok("main".into())
        }
        fn read_blob_at(&self, commit: &str, _path: &str) -> Result<Option<Vec<u8>>> {
            if commit == "HEAD" {
                return Ok(Some(self.head_blob.clone()));
            }
            Ok(self
                .commits
                .iter()
                .find(|(c, _, _)| c.id == commit)
                .and_then(|(_, b, _)| b.clone()))
        }
        fn read_staged_blob(&self, _path: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        fn blob_id_at(&self, commit: &str, _path: &str) -> Result<Option<String>> {
            Ok(self
                .commits
                .iter()
                .find(|(c, _, _)| c.id == commit)
                .map(|(_, _, blob_id)| blob_id.clone()))
        }
        fn list_tree_files(&self, _commit: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        fn commits_touching(&self, _path: &str) -> Result<Vec<CommitInfo>> {
            Ok(self.commits.iter().map(|(c, _, _)| c.clone()).collect())
        }
        fn status_entries(&self) -> Result<Vec<StatusEntry>> {
            Ok(vec![])
        }
        fn staged_paths(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
        fn has_staged_changes(&self) -> Result<bool> {
            Ok(false)
        }
        fn stage_all(&self) -> Result<()> {
            Ok(())
        }
        fn stage_paths(&self, _paths: &[String]) -> Result<()> {
            Ok(())
        }
        fn commit(&self, _message: &str) -> Result<CommitInfo> {
            Ok(self.commits[0].0.clone())
        }
        fn hooks_dir(&self) -> Result<std::path::PathBuf> {
            Ok(std::path::PathBuf::from("."))
        }
    }

    fn commit(id: &str) -> CommitInfo {
        CommitInfo {
            id: id.to_string(),
            short_id: id.to_string(),
            author_name: format!("author-{id}"),
            author_email: "a@x".into(),
            date: "2026-01-01T00:00:00Z".into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn attributes_unchanged_cell_to_oldest_introducing_commit() {
        // C (no change to cell 7) -> B (edits cell 8 only) -> A (introduces cell 7)
        let a_blob = b"7 3 1.0 -1 u=0\n\n1 so 5\n".to_vec();
        let b_blob = b"7 3 1.0 -1 u=0\n8 1 1.0 -1 u=0\n\n1 so 5\n".to_vec();
        let c_blob = b_blob.clone();

        let store = ScriptedStore {
            head_blob: c_blob.clone(),
            commits: vec![
                (commit("C"), Some(c_blob), "blobC".to_string()),
                (commit("B"), Some(b_blob), "blobB".to_string()),
                (commit("A"), Some(a_blob), "blobA".to_string()),
            ],
        };

        let result = blame(&store, "model.inp").unwrap();
        assert_eq!(result.cells[&7].short_id, "A");
    }
}
