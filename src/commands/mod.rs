//! Shared helpers for the CLI subcommands (geometry file discovery,
//! per-revision loading, commit-trailer formatting).

pub mod add;
pub mod blame;
pub mod commit;
pub mod diff;
pub mod init;
pub mod log;
pub mod status;
pub mod summary;
pub mod validate;

use anyhow::Result;

use crate::diff::{format_cell_change, format_surface_change, CellEntry, DiffResult, SurfaceEntry};
use crate::fingerprint::{self, FingerprintSet};
use crate::geometry::{loader, is_geometry_file, ParsedGeometry};
use crate::store::RevisionStore;

/// Maximum per-file detail lines in a commit trailer.
pub const MAX_TRAILER_DETAIL_LINES: usize = 30;
/// Maximum per-file detail lines in console diff/status output.
pub const MAX_CONSOLE_DETAIL_LINES: usize = 10;

/// All geometry-extension paths tracked at `rev`.
pub fn geometry_files_at(store: &dyn RevisionStore, rev: &str) -> Result<Vec<String>> {
    Ok(store
        .list_tree_files(rev)?
        .into_iter()
        .filter(|p| is_geometry_file(p))
        .collect())
}

/// Load and parse the geometry stored for `path` at `rev`; `None` if the
/// path does not exist there.
pub fn load_at_rev(store: &dyn RevisionStore, rev: &str, path: &str) -> Result<Option<ParsedGeometry>> {
    match store.read_blob_at(rev, path)? {
        None => Ok(None),
        Some(bytes) => Ok(Some(loader::load_buffer(path, &bytes)?)),
    }
}

/// Load and parse the currently staged geometry for `path`; `None` if not
/// present in the index.
pub fn load_staged(store: &dyn RevisionStore, path: &str) -> Result<Option<ParsedGeometry>> {
    match store.read_staged_blob(path)? {
        None => Ok(None),
        Some(bytes) => Ok(Some(loader::load_buffer(path, &bytes)?)),
    }
}

pub fn fingerprint_of(geometry: &ParsedGeometry) -> FingerprintSet {
    fingerprint::build(geometry)
}

/// Build the structured trailer block for one changed file.
pub fn format_trailer(path: &str, old: Option<&FingerprintSet>, new: Option<&FingerprintSet>) -> String {
    match (old, new) {
        (None, Some(new)) => format!(
            "Geometry-New: {path} ({} cells, {} surfaces)",
            new.cells.len(),
            new.surfaces.len()
        ),
        (Some(_), None) => format!("Geometry-Deleted: {path}"),
        (Some(old), Some(new)) => {
            let result = crate::diff::diff(old, new);
            if result.is_empty() {
                return String::new();
            }
            format_modified_trailer(path, &result)
        }
        (None, None) => String::new(),
    }
}

fn format_modified_trailer(path: &str, result: &DiffResult) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Geometry-Change: {path}"));
    lines.push(format!(
        "  cells: +{} -{} ~{} | surfaces: +{} -{} ~{}",
        result.cells_added,
        result.cells_removed,
        result.cells_modified,
        result.surfs_added,
        result.surfs_removed,
        result.surfs_modified,
    ));

    let mut detail_lines = Vec::new();
    for entry in &result.surfaces {
        let line = match entry {
            SurfaceEntry::Added(fp) => format!("  + surface {}", fp.surface_id),
            SurfaceEntry::Removed(fp) => format!("  - surface {}", fp.surface_id),
            SurfaceEntry::Modified { old, new, mask } => {
                format!("  ~ surface {} ({})", new.surface_id, format_surface_change(old, new, *mask))
            }
        };
        detail_lines.push(line);
    }
    for entry in &result.cells {
        let line = match entry {
            CellEntry::Added(fp) => format!("  + cell {}", fp.cell_id),
            CellEntry::Removed(fp) => format!("  - cell {}", fp.cell_id),
            CellEntry::Modified { old, new, mask } => {
                format!("  ~ cell {} ({})", new.cell_id, format_cell_change(old, new, *mask))
            }
        };
        detail_lines.push(line);
    }

    let total = detail_lines.len();
    let shown = total.min(MAX_TRAILER_DETAIL_LINES);
    lines.extend(detail_lines.into_iter().take(shown));
    if total > shown {
        lines.push(format!("  ... and {} more", total - shown));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{CellFp, SurfaceFp};

    fn set(cells: Vec<CellFp>, surfaces: Vec<SurfaceFp>) -> FingerprintSet {
        FingerprintSet { cells, surfaces }
    }

    fn cfp(id: i64) -> CellFp {
        CellFp {
            cell_id: id,
            material_id: 1,
            density: 1.0,
            universe_id: 1,
            fill_universe: -1,
            lat_type: 0,
            tree_hash: 1,
            lattice_hash: 1,
        }
    }

    #[test]
    fn new_file_trailer_reports_counts() {
        let new = set(vec![cfp(1), cfp(2)], vec![]);
        let trailer = format_trailer("a.inp", None, Some(&new));
        assert_eq!(trailer, "Geometry-New: a.inp (2 cells, 0 surfaces)");
    }

    #[test]
    fn deleted_file_trailer() {
        let old = set(vec![cfp(1)], vec![]);
        let trailer = format_trailer("a.inp", Some(&old), None);
        assert_eq!(trailer, "Geometry-Deleted: a.inp");
    }

    #[test]
    fn overflow_beyond_thirty_lines_is_elided() {
        let old_cells: Vec<CellFp> = vec![];
        let new_cells: Vec<CellFp> = (1..=40).map(cfp).collect();
        let old = set(old_cells, vec![]);
        let new = set(new_cells, vec![]);
        let trailer = format_trailer("a.inp", Some(&old), Some(&new));
        assert!(trailer.contains("... and 10 more"));
    }
}
