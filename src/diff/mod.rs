//! Structural differ: a pure, linear two-pointer merge over two
//! id-sorted `FingerprintSet`s.

use colored::Colorize;

use crate::config::color_enabled;
use crate::fingerprint::compare::{
    cell_fp_diff, surface_fp_diff, CELL_CHANGE_ORDER, SURFACE_CHANGE_ORDER,
};
use crate::fingerprint::{CellChange, CellFp, FingerprintSet, SurfaceChange, SurfaceFp};

#[derive(Debug, Clone)]
pub enum CellEntry {
    Added(CellFp),
    Removed(CellFp),
    Modified {
        old: CellFp,
        new: CellFp,
        mask: CellChange,
    },
}

impl CellEntry {
    pub fn id(&self) -> i64 {
        match self {
            CellEntry::Added(fp) | CellEntry::Removed(fp) => fp.cell_id,
            CellEntry::Modified { new, .. } => new.cell_id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SurfaceEntry {
    Added(SurfaceFp),
    Removed(SurfaceFp),
    Modified {
        old: SurfaceFp,
        new: SurfaceFp,
        mask: SurfaceChange,
    },
}

impl SurfaceEntry {
    pub fn id(&self) -> i64 {
        match self {
            SurfaceEntry::Added(fp) | SurfaceEntry::Removed(fp) => fp.surface_id,
            SurfaceEntry::Modified { new, .. } => new.surface_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    pub surfaces: Vec<SurfaceEntry>,
    pub cells: Vec<CellEntry>,
    pub surfs_added: usize,
    pub surfs_removed: usize,
    pub surfs_modified: usize,
    pub cells_added: usize,
    pub cells_removed: usize,
    pub cells_modified: usize,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty() && self.cells.is_empty()
    }
}

/// Two-pointer merge over id-ascending arrays. Linear in `|old| + |new|`;
/// pure (same inputs, same output, same order).
pub fn diff(old: &FingerprintSet, new: &FingerprintSet) -> DiffResult {
    let mut result = DiffResult::default();

    let (mut i, mut j) = (0usize, 0usize);
    while i < old.surfaces.len() || j < new.surfaces.len() {
        let take_old = i < old.surfaces.len();
        let take_new = j < new.surfaces.len();
        if take_old && take_new && old.surfaces[i].surface_id == new.surfaces[j].surface_id {
            let (o, n) = (old.surfaces[i], new.surfaces[j]);
            let mask = surface_fp_diff(&o, &n);
            if !mask.is_empty() {
                result.surfaces.push(SurfaceEntry::Modified { old: o, new: n, mask });
                result.surfs_modified += 1;
            }
            i += 1;
            j += 1;
        } else if !take_new || (take_old && old.surfaces[i].surface_id < new.surfaces[j].surface_id) {
            result.surfaces.push(SurfaceEntry::Removed(old.surfaces[i]));
            result.surfs_removed += 1;
            i += 1;
        } else {
            result.surfaces.push(SurfaceEntry::Added(new.surfaces[j]));
            result.surfs_added += 1;
            j += 1;
        }
    }

    let (mut i, mut j) = (0usize, 0usize);
    while i < old.cells.len() || j < new.cells.len() {
        let take_old = i < old.cells.len();
        let take_new = j < new.cells.len();
        if take_old && take_new && old.cells[i].cell_id == new.cells[j].cell_id {
            let (o, n) = (old.cells[i], new.cells[j]);
            let mask = cell_fp_diff(&o, &n);
            if !mask.is_empty() {
                result.cells.push(CellEntry::Modified { old: o, new: n, mask });
                result.cells_modified += 1;
            }
            i += 1;
            j += 1;
        } else if !take_new || (take_old && old.cells[i].cell_id < new.cells[j].cell_id) {
            result.cells.push(CellEntry::Removed(old.cells[i]));
            result.cells_removed += 1;
            i += 1;
        } else {
            result.cells.push(CellEntry::Added(new.cells[j]));
            result.cells_added += 1;
            j += 1;
        }
    }

    result
}

/// Render `v` the way printf's `%.4g` would: 4 significant digits,
/// fixed-point when the decimal exponent is in `[-4, 4)`, scientific
/// otherwise, trailing fractional zeros (and a bare trailing point)
/// stripped either way.
fn format_g4(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    const SIG: i32 = 4;
    let sci = format!("{:.*e}", (SIG - 1) as usize, v);
    let (mantissa, exp_str) = sci.split_once('e').expect("scientific format always has 'e'");
    let exp: i32 = exp_str.parse().expect("exponent is always an integer");

    let strip = |s: &str| -> String {
        if !s.contains('.') {
            return s.to_string();
        }
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s.is_empty() || s == "-" {
            "0".to_string()
        } else {
            s.to_string()
        }
    };

    if exp < -4 || exp >= SIG {
        let sign = if exp < 0 { "-" } else { "+" };
        format!("{}e{sign}{:02}", strip(mantissa), exp.abs())
    } else {
        let decimals = (SIG - 1 - exp).max(0) as usize;
        strip(&format!("{v:.decimals$}"))
    }
}

/// Format a cell's change mask in the canonical field order, e.g.
/// `MATERIAL=3->5 DENSITY=1->1.1`. Shared by the commit trailer
/// formatter and the console printer.
pub fn format_cell_change(old: &CellFp, new: &CellFp, mask: CellChange) -> String {
    let mut parts = Vec::new();
    for flag in CELL_CHANGE_ORDER {
        if !mask.contains(flag) {
            continue;
        }
        let s = match flag {
            CellChange::MATERIAL => format!("material {}->{}", old.material_id, new.material_id),
            CellChange::DENSITY => format!(
                "density {}->{}",
                format_g4(old.density),
                format_g4(new.density)
            ),
            CellChange::REGION => "region changed".to_string(),
            CellChange::UNIVERSE => format!("universe {}->{}", old.universe_id, new.universe_id),
            CellChange::FILL => format!("fill {}->{}", old.fill_universe, new.fill_universe),
            CellChange::LATTICE => "lattice changed".to_string(),
            _ => continue,
        };
        parts.push(s);
    }
    parts.join(", ")
}

pub fn format_surface_change(old: &SurfaceFp, new: &SurfaceFp, mask: SurfaceChange) -> String {
    let mut parts = Vec::new();
    for flag in SURFACE_CHANGE_ORDER {
        if !mask.contains(flag) {
            continue;
        }
        let s = match flag {
            SurfaceChange::TYPE => format!("type {}->{}", old.primitive_type, new.primitive_type),
            SurfaceChange::DATA => "data changed".to_string(),
            SurfaceChange::BOUNDARY => format!("boundary {}->{}", old.boundary_type, new.boundary_type),
            _ => continue,
        };
        parts.push(s);
    }
    parts.join(", ")
}

/// Console summary + up to `max_detail_lines` per-element lines. Callers
/// pass their own limit since commit and status output use different
/// caps.
pub fn print_summary(result: &DiffResult, max_detail_lines: usize) {
    let color = color_enabled();
    let summary = format!(
        "cells: +{} -{} ~{} | surfaces: +{} -{} ~{}",
        result.cells_added,
        result.cells_removed,
        result.cells_modified,
        result.surfs_added,
        result.surfs_removed,
        result.surfs_modified,
    );
    println!("{summary}");

    let mut shown = 0usize;
    let mut total = 0usize;
    for entry in &result.surfaces {
        total += 1;
        if shown >= max_detail_lines {
            continue;
        }
        shown += 1;
        print_surface_entry(entry, color);
    }
    for entry in &result.cells {
        total += 1;
        if shown >= max_detail_lines {
            continue;
        }
        shown += 1;
        print_cell_entry(entry, color);
    }
    if total > shown {
        println!("  ... and {} more", total - shown);
    }
}

fn print_surface_entry(entry: &SurfaceEntry, color: bool) {
    match entry {
        SurfaceEntry::Added(fp) => {
            let line = format!("  + surface {}", fp.surface_id);
            println!("{}", if color { line.green().to_string() } else { line });
        }
        SurfaceEntry::Removed(fp) => {
            let line = format!("  - surface {}", fp.surface_id);
            println!("{}", if color { line.red().to_string() } else { line });
        }
        SurfaceEntry::Modified { old, new, mask } => {
            let line = format!(
                "  ~ surface {} ({})",
                new.surface_id,
                format_surface_change(old, new, *mask)
            );
            println!("{}", if color { line.yellow().to_string() } else { line });
        }
    }
}

fn print_cell_entry(entry: &CellEntry, color: bool) {
    match entry {
        CellEntry::Added(fp) => {
            let line = format!("  + cell {}", fp.cell_id);
            println!("{}", if color { line.green().to_string() } else { line });
        }
        CellEntry::Removed(fp) => {
            let line = format!("  - cell {}", fp.cell_id);
            println!("{}", if color { line.red().to_string() } else { line });
        }
        CellEntry::Modified { old, new, mask } => {
            let line = format!(
                "  ~ cell {} ({})",
                new.cell_id,
                format_cell_change(old, new, *mask)
            );
            println!("{}", if color { line.yellow().to_string() } else { line });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfp(id: i64, density: f64) -> CellFp {
        CellFp {
            cell_id: id,
            material_id: 3,
            density,
            universe_id: 1,
            fill_universe: -1,
            lat_type: 0,
            tree_hash: 1,
            lattice_hash: 1,
        }
    }

    fn sfp(id: i64) -> SurfaceFp {
        SurfaceFp {
            surface_id: id,
            primitive_type: 0,
            boundary_type: 0,
            data_hash: 1,
        }
    }

    #[test]
    fn diff_of_identical_sets_is_empty() {
        let fp = FingerprintSet {
            cells: vec![cfp(1, 1.0)],
            surfaces: vec![sfp(1)],
        };
        let d = diff(&fp, &fp);
        assert!(d.is_empty());
        assert_eq!(d.cells_modified + d.cells_added + d.cells_removed, 0);
        assert_eq!(d.surfs_modified + d.surfs_added + d.surfs_removed, 0);
    }

    #[test]
    fn surface_addition_is_reported() {
        let old = FingerprintSet {
            cells: vec![],
            surfaces: vec![sfp(1), sfp(2)],
        };
        let new = FingerprintSet {
            cells: vec![],
            surfaces: vec![sfp(1), sfp(2), sfp(3)],
        };
        let d = diff(&old, &new);
        assert_eq!(d.surfs_added, 1);
        assert_eq!(d.surfs_removed, 0);
        assert_eq!(d.surfs_modified, 0);
        assert!(matches!(d.surfaces.last(), Some(SurfaceEntry::Added(fp)) if fp.surface_id == 3));
    }

    #[test]
    fn density_only_change_reports_modified_with_density_mask() {
        let old = FingerprintSet {
            cells: vec![cfp(1, 1.0)],
            surfaces: vec![],
        };
        let new = FingerprintSet {
            cells: vec![cfp(1, 1.1)],
            surfaces: vec![],
        };
        let d = diff(&old, &new);
        assert_eq!(d.cells_modified, 1);
        match &d.cells[0] {
            CellEntry::Modified { mask, .. } => assert_eq!(*mask, CellChange::DENSITY),
            _ => panic!("expected modified entry"),
        }
    }

    #[test]
    fn diff_is_anti_symmetric() {
        let old = FingerprintSet {
            cells: vec![cfp(1, 1.0), cfp(2, 2.0)],
            surfaces: vec![sfp(1)],
        };
        let new = FingerprintSet {
            cells: vec![cfp(1, 1.0), cfp(3, 3.0)],
            surfaces: vec![sfp(1), sfp(2)],
        };
        let fwd = diff(&old, &new);
        let rev = diff(&new, &old);
        assert_eq!(fwd.cells_added, rev.cells_removed);
        assert_eq!(fwd.cells_removed, rev.cells_added);
        assert_eq!(fwd.surfs_added, rev.surfs_removed);
        assert_eq!(fwd.surfs_removed, rev.surfs_added);
    }

    #[test]
    fn format_g4_matches_printf_g_examples() {
        assert_eq!(format_g4(0.0), "0");
        assert_eq!(format_g4(1.0), "1");
        assert_eq!(format_g4(1.1), "1.1");
        assert_eq!(format_g4(0.1), "0.1");
        assert_eq!(format_g4(1234.0), "1234");
        assert_eq!(format_g4(1234.5), "1234"); // 4 sig figs, rounds down
        assert_eq!(format_g4(0.0001234), "0.0001234");
        // exponent below -4 switches to scientific notation
        assert_eq!(format_g4(0.00001234), "1.234e-05");
        // exponent >= precision also switches to scientific notation
        assert_eq!(format_g4(123456.0), "1.235e+05");
        assert_eq!(format_g4(-1.1), "-1.1");
    }

    #[test]
    fn tiny_density_change_is_not_hidden_by_rounding() {
        let old = FingerprintSet {
            cells: vec![cfp(1, 0.00001234)],
            surfaces: vec![],
        };
        let new = FingerprintSet {
            cells: vec![cfp(1, 0.00005678)],
            surfaces: vec![],
        };
        let d = diff(&old, &new);
        match &d.cells[0] {
            CellEntry::Modified { old, new, mask } => {
                let rendered = format_cell_change(old, new, *mask);
                assert!(rendered.contains("1.234e-05"));
                assert!(rendered.contains("5.678e-05"));
            }
            _ => panic!("expected modified entry"),
        }
    }
}
