//! Fingerprint comparator: equality predicates and per-field change-flag
//! bitmasks between two element fingerprints.

use bitflags::bitflags;

use super::{CellFp, SurfaceFp};
use crate::config::density_eq;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellChange: u32 {
        const MATERIAL = 1 << 0;
        const DENSITY  = 1 << 1;
        const REGION   = 1 << 2;
        const UNIVERSE = 1 << 3;
        const FILL     = 1 << 4;
        const LATTICE  = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SurfaceChange: u32 {
        const TYPE     = 1 << 0;
        const DATA     = 1 << 1;
        const BOUNDARY = 1 << 2;
    }
}

/// Canonical field order for trailer formatting.
pub const CELL_CHANGE_ORDER: [CellChange; 6] = [
    CellChange::MATERIAL,
    CellChange::DENSITY,
    CellChange::REGION,
    CellChange::UNIVERSE,
    CellChange::FILL,
    CellChange::LATTICE,
];

pub const SURFACE_CHANGE_ORDER: [SurfaceChange; 3] = [
    SurfaceChange::TYPE,
    SurfaceChange::DATA,
    SurfaceChange::BOUNDARY,
];

pub fn cell_change_name(flag: CellChange) -> &'static str {
    match flag {
        CellChange::MATERIAL => "MATERIAL",
        CellChange::DENSITY => "DENSITY",
        CellChange::REGION => "REGION",
        CellChange::UNIVERSE => "UNIVERSE",
        CellChange::FILL => "FILL",
        CellChange::LATTICE => "LATTICE",
        _ => "UNKNOWN",
    }
}

pub fn surface_change_name(flag: SurfaceChange) -> &'static str {
    match flag {
        SurfaceChange::TYPE => "TYPE",
        SurfaceChange::DATA => "DATA",
        SurfaceChange::BOUNDARY => "BOUNDARY",
        _ => "UNKNOWN",
    }
}

/// Equal iff `material_id`, `universe_id`, `fill_universe`, `lat_type`,
/// `tree_hash`, `lattice_hash` match exactly and density matches to
/// tolerance.
pub fn cell_fp_eq(a: &CellFp, b: &CellFp) -> bool {
    cell_fp_diff(a, b).is_empty()
}

/// Bitmask naming every field that disagrees.
pub fn cell_fp_diff(a: &CellFp, b: &CellFp) -> CellChange {
    let mut mask = CellChange::empty();
    if a.material_id != b.material_id {
        mask |= CellChange::MATERIAL;
    }
    if !density_eq(a.density, b.density) {
        mask |= CellChange::DENSITY;
    }
    if a.tree_hash != b.tree_hash {
        mask |= CellChange::REGION;
    }
    if a.universe_id != b.universe_id {
        mask |= CellChange::UNIVERSE;
    }
    if a.fill_universe != b.fill_universe {
        mask |= CellChange::FILL;
    }
    if a.lattice_hash != b.lattice_hash || a.lat_type != b.lat_type {
        mask |= CellChange::LATTICE;
    }
    mask
}

/// Equal iff `primitive_type`, `boundary_type`, `data_hash` match.
pub fn surface_fp_eq(a: &SurfaceFp, b: &SurfaceFp) -> bool {
    surface_fp_diff(a, b).is_empty()
}

pub fn surface_fp_diff(a: &SurfaceFp, b: &SurfaceFp) -> SurfaceChange {
    let mut mask = SurfaceChange::empty();
    if a.primitive_type != b.primitive_type {
        mask |= SurfaceChange::TYPE;
    }
    if a.data_hash != b.data_hash {
        mask |= SurfaceChange::DATA;
    }
    if a.boundary_type != b.boundary_type {
        mask |= SurfaceChange::BOUNDARY;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cell() -> CellFp {
        CellFp {
            cell_id: 1,
            material_id: 3,
            density: 1.0,
            universe_id: 1,
            fill_universe: -1,
            lat_type: 0,
            tree_hash: 42,
            lattice_hash: 7,
        }
    }

    #[test]
    fn density_within_tolerance_is_unchanged() {
        let mut other = base_cell();
        other.density = 1.0 + 5e-7;
        assert!(cell_fp_eq(&base_cell(), &other));
    }

    #[test]
    fn density_change_sets_density_flag() {
        let mut other = base_cell();
        other.density = 1.1;
        let mask = cell_fp_diff(&base_cell(), &other);
        assert_eq!(mask, CellChange::DENSITY);
    }

    #[test]
    fn tree_hash_change_sets_region_flag() {
        let mut other = base_cell();
        other.tree_hash = 999;
        let mask = cell_fp_diff(&base_cell(), &other);
        assert_eq!(mask, CellChange::REGION);
    }

    #[test]
    fn surface_type_change_sets_type_flag() {
        let a = SurfaceFp {
            surface_id: 5,
            primitive_type: 0,
            boundary_type: 0,
            data_hash: 1,
        };
        let mut b = a;
        b.primitive_type = 1;
        b.data_hash = 2;
        let mask = surface_fp_diff(&a, &b);
        assert!(mask.contains(SurfaceChange::TYPE));
        assert!(mask.contains(SurfaceChange::DATA));
    }
}
