//! The parsed-geometry interface.
//!
//! Everything downstream (fingerprinting, diffing, visual diff) only ever
//! talks to geometries through [`Geometry`]. Two reference parsers
//! (`mcnp`, `openmc`) implement it; a real deployment would plug in
//! whatever parser actually understands the input codes.

pub mod loader;
pub mod mcnp;
pub mod openmc;

use std::collections::HashMap;

/// CSG boolean operation tag for an internal tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Union,
    Intersection,
    Complement,
}

/// A node in a cell's CSG tree, addressed by [`NodeId`] within that cell's
/// own arena (trees are not shared *across* geometries, only possibly
/// across cells within one — §9 "Cyclic and shared ownership").
#[derive(Debug, Clone)]
pub enum CsgNode {
    /// A half-space bounded by `surface_id`, selected by `sense` (+1/-1).
    Primitive { surface_id: i64, sense: i32 },
    /// An internal node. `Complement` only uses `left`.
    Internal {
        op: Operation,
        left: NodeId,
        right: Option<NodeId>,
    },
}

pub type NodeId = usize;

/// Arena holding one cell's CSG tree.
#[derive(Debug, Clone, Default)]
pub struct CsgTree {
    nodes: Vec<CsgNode>,
    root: Option<NodeId>,
}

impl CsgTree {
    pub fn push(&mut self, node: CsgNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &CsgNode {
        &self.nodes[id]
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl BBox {
    pub const EMPTY: BBox = BBox {
        min_x: f64::MAX,
        max_x: f64::MIN,
        min_y: f64::MAX,
        max_y: f64::MIN,
        min_z: f64::MAX,
        max_z: f64::MIN,
    };

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    pub fn clamp(&self, bound: f64) -> BBox {
        BBox {
            min_x: self.min_x.max(-bound),
            max_x: self.max_x.min(bound),
            min_y: self.min_y.max(-bound),
            max_y: self.max_y.min(bound),
            min_z: self.min_z.max(-bound),
            max_z: self.max_z.min(bound),
        }
    }
}

/// A cell: a CSG region plus the attributes the fingerprint cares about.
#[derive(Debug, Clone)]
pub struct CellInfo {
    pub cell_id: i64,
    pub material_id: i64,
    pub density: f64,
    pub universe_id: i64,
    /// -1 if the cell is not filled by another universe.
    pub fill_universe: i64,
    /// 0 if the cell has no lattice.
    pub lat_type: i32,
    pub lattice_dims: [i64; 6],
    pub lattice_pitch: [f64; 3],
    pub lattice_lower_left: [f64; 3],
    pub lattice_fill: Vec<i64>,
    pub tree: CsgTree,
    pub bbox: BBox,
}

impl CellInfo {
    /// The distinguished unbounded outer cell (GLOSSARY).
    pub fn is_graveyard(&self) -> bool {
        self.universe_id == 0 && self.material_id == 0 && self.fill_universe == -1
    }
}

/// A surface primitive tag. Values are stable across implementations only
/// in the sense that the same parser always emits the same tag for the
/// same primitive kind; the fingerprint hashes the tag value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Plane,
    Sphere,
    CylinderX,
    CylinderY,
    CylinderZ,
    Other(i32),
}

impl PrimitiveType {
    pub fn tag(&self) -> i32 {
        match self {
            PrimitiveType::Plane => 0,
            PrimitiveType::Sphere => 1,
            PrimitiveType::CylinderX => 2,
            PrimitiveType::CylinderY => 3,
            PrimitiveType::CylinderZ => 4,
            PrimitiveType::Other(t) => *t,
        }
    }
}

/// Up to 10 double slots of primitive parameters, zero-initialised so
/// hashing padding is deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveData(pub [f64; 10]);

impl Default for PrimitiveData {
    fn default() -> Self {
        PrimitiveData([0.0; 10])
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceInfo {
    pub surface_id: i64,
    pub primitive_type: PrimitiveType,
    /// Integer tag for boundary condition (vacuum/reflective/...); the
    /// exact enumeration is the parser's business.
    pub boundary_type: i32,
    pub data: PrimitiveData,
}

/// Read-only interface a parsed geometry exposes to the rest of the
/// system.
pub trait Geometry {
    fn cells(&self) -> &[CellInfo];
    fn surfaces(&self) -> &[SurfaceInfo];
    fn universe_count(&self) -> i64;

    fn cell_by_id(&self, id: i64) -> Option<&CellInfo> {
        self.cells().iter().find(|c| c.cell_id == id)
    }

    fn surface_by_id(&self, id: i64) -> Option<&SurfaceInfo> {
        self.surfaces().iter().find(|s| s.surface_id == id)
    }

    fn surface_index(&self) -> HashMap<i64, usize> {
        self.surfaces()
            .iter()
            .enumerate()
            .map(|(i, s)| (s.surface_id, i))
            .collect()
    }
}

/// An in-memory geometry the reference parsers build into.
#[derive(Debug, Clone, Default)]
pub struct ParsedGeometry {
    pub cells: Vec<CellInfo>,
    pub surfaces: Vec<SurfaceInfo>,
    pub universe_count: i64,
}

impl Geometry for ParsedGeometry {
    fn cells(&self) -> &[CellInfo] {
        &self.cells
    }

    fn surfaces(&self) -> &[SurfaceInfo] {
        &self.surfaces
    }

    fn universe_count(&self) -> i64 {
        self.universe_count
    }
}

/// Geometry text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Mcnp,
    OpenMc,
}

impl Format {
    /// Extension-first, then content-sniff.
    pub fn detect(path: &str, content: &[u8]) -> Format {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".xml") {
            return Format::OpenMc;
        }
        if lower.ends_with(".inp") || lower.ends_with(".i") || lower.ends_with(".mcnp") {
            return Format::Mcnp;
        }
        for &b in content {
            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                continue;
            }
            return if b == b'<' { Format::OpenMc } else { Format::Mcnp };
        }
        Format::Mcnp
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Mcnp => &[".inp", ".i", ".mcnp"],
            Format::OpenMc => &[".xml"],
        }
    }
}

const UNBOUNDED: f64 = 1.0e4;

/// A conservative (possibly loose) bounding box for one surface primitive,
/// used to derive a cell's `bbox` from the surfaces its region references.
fn primitive_bbox(s: &SurfaceInfo) -> BBox {
    let d = s.data.0;
    match s.primitive_type {
        PrimitiveType::Sphere => BBox {
            min_x: d[0] - d[3],
            max_x: d[0] + d[3],
            min_y: d[1] - d[3],
            max_y: d[1] + d[3],
            min_z: d[2] - d[3],
            max_z: d[2] + d[3],
        },
        PrimitiveType::CylinderX => BBox {
            min_x: -UNBOUNDED,
            max_x: UNBOUNDED,
            min_y: d[0] - d[3],
            max_y: d[0] + d[3],
            min_z: d[1] - d[3],
            max_z: d[1] + d[3],
        },
        PrimitiveType::CylinderY => BBox {
            min_x: d[0] - d[3],
            max_x: d[0] + d[3],
            min_y: -UNBOUNDED,
            max_y: UNBOUNDED,
            min_z: d[1] - d[3],
            max_z: d[1] + d[3],
        },
        PrimitiveType::CylinderZ => BBox {
            min_x: d[0] - d[3],
            max_x: d[0] + d[3],
            min_y: d[1] - d[3],
            max_y: d[1] + d[3],
            min_z: -UNBOUNDED,
            max_z: UNBOUNDED,
        },
        PrimitiveType::Plane | PrimitiveType::Other(_) => BBox {
            min_x: -UNBOUNDED,
            max_x: UNBOUNDED,
            min_y: -UNBOUNDED,
            max_y: UNBOUNDED,
            min_z: -UNBOUNDED,
            max_z: UNBOUNDED,
        },
    }
}

fn collect_surface_ids(tree: &CsgTree, node: NodeId, ids: &mut Vec<i64>) {
    match tree.get(node) {
        CsgNode::Primitive { surface_id, .. } => ids.push(*surface_id),
        CsgNode::Internal { left, right, .. } => {
            collect_surface_ids(tree, *left, ids);
            if let Some(r) = right {
                collect_surface_ids(tree, *r, ids);
            }
        }
    }
}

/// Union of the bounding boxes of every surface a cell's region
/// references. Loose by construction (it ignores the boolean structure),
/// but sufficient for the visual differ's auto-slice scoring.
pub fn cell_conservative_bbox(tree: &CsgTree, surfaces: &HashMap<i64, &SurfaceInfo>) -> BBox {
    let Some(root) = tree.root() else {
        return BBox::EMPTY;
    };
    let mut ids = Vec::new();
    collect_surface_ids(tree, root, &mut ids);
    let mut bbox = BBox::EMPTY;
    for id in ids {
        if let Some(s) = surfaces.get(&id) {
            bbox = bbox.union(&primitive_bbox(s));
        }
    }
    bbox
}

/// All extensions recognised as geometry files, across both formats.
pub fn geometry_extensions() -> Vec<&'static str> {
    let mut v = Format::Mcnp.extensions().to_vec();
    v.extend(Format::OpenMc.extensions());
    v
}

pub fn is_geometry_file(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    geometry_extensions().iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_by_extension() {
        assert_eq!(Format::detect("model.xml", b""), Format::OpenMc);
        assert_eq!(Format::detect("model.inp", b""), Format::Mcnp);
    }

    #[test]
    fn detect_by_sniff() {
        assert_eq!(Format::detect("model.geom", b"  <geometry>"), Format::OpenMc);
        assert_eq!(Format::detect("model.geom", b"1 1 -1.0 -1 2"), Format::Mcnp);
    }

    #[test]
    fn graveyard_detection() {
        let mut c = make_cell(1);
        c.universe_id = 0;
        c.material_id = 0;
        c.fill_universe = -1;
        assert!(c.is_graveyard());
        c.fill_universe = 2;
        assert!(!c.is_graveyard());
    }

    fn make_cell(id: i64) -> CellInfo {
        CellInfo {
            cell_id: id,
            material_id: 1,
            density: 1.0,
            universe_id: 1,
            fill_universe: -1,
            lat_type: 0,
            lattice_dims: [0; 6],
            lattice_pitch: [0.0; 3],
            lattice_lower_left: [0.0; 3],
            lattice_fill: vec![],
            tree: CsgTree::default(),
            bbox: BBox::EMPTY,
        }
    }
}
