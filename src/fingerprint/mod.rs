//! Fingerprint builder: reduces a parsed geometry to a stable,
//! order-independent summary via 64-bit FNV-1a.

pub mod compare;

pub use compare::{CellChange, SurfaceChange};

use crate::config::{discretise, FNV_OFFSET_BASIS, FNV_PRIME};
use crate::geometry::{CellInfo, CsgNode, CsgTree, Geometry, NodeId, Operation, SurfaceInfo};

fn fold_byte(h: u64, b: u8) -> u64 {
    (h ^ b as u64).wrapping_mul(FNV_PRIME)
}

fn fold_bytes(mut h: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        h = fold_byte(h, b);
    }
    h
}

fn fold_i64(h: u64, v: i64) -> u64 {
    fold_bytes(h, &v.to_le_bytes())
}

fn fold_i32(h: u64, v: i32) -> u64 {
    fold_bytes(h, &v.to_le_bytes())
}

fn fold_u64(h: u64, v: u64) -> u64 {
    fold_bytes(h, &v.to_le_bytes())
}

fn fold_double(h: u64, v: f64) -> u64 {
    fold_i64(h, discretise(v))
}

/// Recursively hash the CSG tree rooted at `node`. Children are folded
/// positionally (left then right) — operand order is significant, so
/// `a : b` and `b : a` currently hash differently even though union is
/// semantically commutative.
fn hash_tree(tree: &CsgTree, node: NodeId) -> u64 {
    match tree.get(node) {
        CsgNode::Primitive { surface_id, sense } => {
            let mut h = FNV_OFFSET_BASIS;
            h = fold_i64(h, *surface_id);
            h = fold_i32(h, *sense);
            h
        }
        CsgNode::Internal { op, left, right } => {
            let mut h = FNV_OFFSET_BASIS;
            h = fold_i32(h, op_tag(*op));
            let left_hash = hash_tree(tree, *left);
            h = fold_u64(h, left_hash);
            if let Some(right) = right {
                let right_hash = hash_tree(tree, *right);
                h = fold_u64(h, right_hash);
            }
            h
        }
    }
}

fn op_tag(op: Operation) -> i32 {
    match op {
        Operation::Union => 0,
        Operation::Intersection => 1,
        Operation::Complement => 2,
    }
}

fn hash_lattice(cell: &CellInfo) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    if cell.lat_type == 0 {
        return fold_i32(h, 0);
    }
    h = fold_i32(h, cell.lat_type);
    for d in cell.lattice_dims {
        h = fold_i64(h, d);
    }
    for p in cell.lattice_pitch {
        h = fold_double(h, p);
    }
    for l in cell.lattice_lower_left {
        h = fold_double(h, l);
    }
    for f in &cell.lattice_fill {
        h = fold_i64(h, *f);
    }
    h
}

fn hash_surface_data(surface: &SurfaceInfo) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    h = fold_i32(h, surface.primitive_type.tag());
    for v in surface.data.0 {
        h = fold_double(h, v);
    }
    h
}

/// An 8-field record summarising one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFp {
    pub cell_id: i64,
    pub material_id: i64,
    pub density: f64,
    pub universe_id: i64,
    pub fill_universe: i64,
    pub lat_type: i32,
    pub tree_hash: u64,
    pub lattice_hash: u64,
}

/// A 4-field record summarising one surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFp {
    pub surface_id: i64,
    pub primitive_type: i32,
    pub boundary_type: i32,
    pub data_hash: u64,
}

fn build_cell_fp(cell: &CellInfo) -> CellFp {
    let tree_hash = cell
        .tree
        .root()
        .map(|r| hash_tree(&cell.tree, r))
        .unwrap_or(FNV_OFFSET_BASIS);
    CellFp {
        cell_id: cell.cell_id,
        material_id: cell.material_id,
        density: cell.density,
        universe_id: cell.universe_id,
        fill_universe: cell.fill_universe,
        lat_type: cell.lat_type,
        tree_hash,
        lattice_hash: hash_lattice(cell),
    }
}

fn build_surface_fp(surface: &SurfaceInfo) -> SurfaceFp {
    SurfaceFp {
        surface_id: surface.surface_id,
        primitive_type: surface.primitive_type.tag(),
        boundary_type: surface.boundary_type,
        data_hash: hash_surface_data(surface),
    }
}

/// Two id-ascending-sorted arrays. Every consumer (the differ, the
/// trailer formatter) relies on that sort order to do a linear merge
/// instead of a hash-map lookup.
#[derive(Debug, Clone, Default)]
pub struct FingerprintSet {
    pub cells: Vec<CellFp>,
    pub surfaces: Vec<SurfaceFp>,
}

/// Build a `FingerprintSet` from a parsed geometry.
pub fn build(geometry: &dyn Geometry) -> FingerprintSet {
    let mut cells: Vec<CellFp> = geometry.cells().iter().map(build_cell_fp).collect();
    let mut surfaces: Vec<SurfaceFp> = geometry.surfaces().iter().map(build_surface_fp).collect();
    cells.sort_by_key(|c| c.cell_id);
    surfaces.sort_by_key(|s| s.surface_id);
    FingerprintSet { cells, surfaces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BBox, ParsedGeometry, PrimitiveData, PrimitiveType};

    fn cell(id: i64, universe_id: i64) -> CellInfo {
        let mut tree = CsgTree::default();
        let root = tree.push(CsgNode::Primitive {
            surface_id: 1,
            sense: -1,
        });
        tree.set_root(root);
        CellInfo {
            cell_id: id,
            material_id: 3,
            density: 1.0,
            universe_id,
            fill_universe: -1,
            lat_type: 0,
            lattice_dims: [0; 6],
            lattice_pitch: [0.0; 3],
            lattice_lower_left: [0.0; 3],
            lattice_fill: vec![],
            tree,
            bbox: BBox::EMPTY,
        }
    }

    fn surface(id: i64) -> SurfaceInfo {
        SurfaceInfo {
            surface_id: id,
            primitive_type: PrimitiveType::Plane,
            boundary_type: 0,
            data: PrimitiveData([0.0, 0.0, 1.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        }
    }

    #[test]
    fn fingerprint_is_idempotent() {
        let geom = ParsedGeometry {
            cells: vec![cell(2, 1), cell(1, 1)],
            surfaces: vec![surface(1)],
            universe_count: 2,
        };
        let a = build(&geom);
        let b = build(&geom);
        assert_eq!(a.cells, b.cells);
        assert_eq!(a.surfaces, b.surfaces);
    }

    #[test]
    fn fingerprint_set_is_id_ascending() {
        let geom = ParsedGeometry {
            cells: vec![cell(5, 0), cell(1, 0), cell(3, 0)],
            surfaces: vec![surface(9), surface(2)],
            universe_count: 1,
        };
        let fp = build(&geom);
        let ids: Vec<i64> = fp.cells.iter().map(|c| c.cell_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        let sids: Vec<i64> = fp.surfaces.iter().map(|s| s.surface_id).collect();
        assert_eq!(sids, vec![2, 9]);
    }

    #[test]
    fn fingerprint_insensitive_to_slot_order() {
        let geom_a = ParsedGeometry {
            cells: vec![cell(1, 0), cell(2, 0)],
            surfaces: vec![surface(1), surface(2)],
            universe_count: 1,
        };
        let geom_b = ParsedGeometry {
            cells: vec![cell(2, 0), cell(1, 0)],
            surfaces: vec![surface(2), surface(1)],
            universe_count: 1,
        };
        assert_eq!(build(&geom_a).cells, build(&geom_b).cells);
        assert_eq!(build(&geom_a).surfaces, build(&geom_b).surfaces);
    }

    #[test]
    fn tree_hash_is_positional() {
        let mut t1 = CsgTree::default();
        let a = t1.push(CsgNode::Primitive {
            surface_id: 1,
            sense: 1,
        });
        let b = t1.push(CsgNode::Primitive {
            surface_id: 2,
            sense: 1,
        });
        let r1 = t1.push(CsgNode::Internal {
            op: Operation::Union,
            left: a,
            right: Some(b),
        });
        t1.set_root(r1);

        let mut t2 = CsgTree::default();
        let a2 = t2.push(CsgNode::Primitive {
            surface_id: 2,
            sense: 1,
        });
        let b2 = t2.push(CsgNode::Primitive {
            surface_id: 1,
            sense: 1,
        });
        let r2 = t2.push(CsgNode::Internal {
            op: Operation::Union,
            left: a2,
            right: Some(b2),
        });
        t2.set_root(r2);

        assert_ne!(
            hash_tree(&t1, t1.root().unwrap()),
            hash_tree(&t2, t2.root().unwrap())
        );
    }
}
