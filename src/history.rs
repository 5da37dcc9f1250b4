//! History walker: drives a `RevisionStore`'s time-descending commit
//! list for a path, filtering out commits whose blob is byte-identical
//! to the previously seen one.

use anyhow::Result;

use crate::store::{CommitInfo, RevisionStore};

/// Visit each distinct version of `path`, newest first. `visitor` returns
/// `Ok(false)` to stop early. Missing-at-a-commit resets the "previous
/// blob id" memory so a later reintroduction is reported again.
pub fn walk_history(
    store: &dyn RevisionStore,
    path: &str,
    mut visitor: impl FnMut(&CommitInfo) -> Result<bool>,
) -> Result<()> {
    let commits = store.commits_touching(path)?;
    let mut prev_blob: Option<String> = None;

    for commit in &commits {
        match store.blob_id_at(&commit.id, path)? {
            None => {
                prev_blob = None;
            }
            Some(blob_id) => {
                if prev_blob.as_deref() != Some(blob_id.as_str()) {
                    let keep_going = visitor(commit)?;
                    if !keep_going {
                        break;
                    }
                }
                prev_blob = Some(blob_id);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StatusEntry;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeStore {
        commits: Vec<CommitInfo>,
        blobs: HashMap<(String, String), String>,
    }

    impl RevisionStore for FakeStore {
        fn is_repo(&self) -> bool {
            true
        }
        fn init(&self) -> Result<bool> {
            Ok(false)
        }
        fn resolve(&self, _rev: &str) -> Result<CommitInfo> {
            Ok(self.commits[0].clone())
        }
        fn current_branch(&self) -> Result<String> {
            Ok("main".into())
        }
        fn read_blob_at(&self, _c: &str, _p: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        fn read_staged_blob(&self, _p: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        fn blob_id_at(&self, commit: &str, path: &str) -> Result<Option<String>> {
            Ok(self.blobs.get(&(commit.to_string(), path.to_string())).cloned())
        }
        fn list_tree_files(&self, _commit: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        fn commits_touching(&self, _path: &str) -> Result<Vec<CommitInfo>> {
            Ok(self.commits.clone())
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
            Ok(self.commits[0].clone())
        }
        fn hooks_dir(&self) -> Result<std::path::PathBuf> {
            Ok(std::path::PathBuf::from("."))
        }
    }

    fn commit(id: &str) -> CommitInfo {
        CommitInfo {
            id: id.to_string(),
            short_id: id[..3.min(id.len())].to_string(),
            author_name: "a".into(),
            author_email: "a@x".into(),
            date: "2026-01-01T00:00:00Z".into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn skips_consecutive_identical_blobs() {
        let path = "a.inp";
        let store = FakeStore {
            commits: vec![commit("c3"), commit("c2"), commit("c1")],
            blobs: HashMap::from([
                (("c3".to_string(), path.to_string()), "blobA".to_string()),
                (("c2".to_string(), path.to_string()), "blobA".to_string()),
                (("c1".to_string(), path.to_string()), "blobB".to_string()),
            ]),
        };
        let visited = RefCell::new(Vec::new());
        walk_history(&store, path, |c| {
            visited.borrow_mut().push(c.id.clone());
            Ok(true)
        })
        .unwrap();
        assert_eq!(visited.into_inner(), vec!["c3", "c1"]);
    }

    #[test]
    fn visitor_can_stop_early() {
        let path = "a.inp";
        let store = FakeStore {
            commits: vec![commit("c2"), commit("c1")],
            blobs: HashMap::from([
                (("c2".to_string(), path.to_string()), "blobA".to_string()),
                (("c1".to_string(), path.to_string()), "blobB".to_string()),
            ]),
        };
        let visited = RefCell::new(Vec::new());
        walk_history(&store, path, |c| {
            visited.borrow_mut().push(c.id.clone());
            Ok(false)
        })
        .unwrap();
        assert_eq!(visited.into_inner(), vec!["c2"]);
    }
}
