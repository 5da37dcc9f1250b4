//! Reference point-in-cell query engine: evaluates the same CSG trees
//! the fingerprint builder hashes, to decide which cell (if any) owns a
//! sampled point.

use std::collections::HashMap;

use crate::geometry::{CsgNode, CsgTree, Geometry, NodeId, Operation, PrimitiveType, SurfaceInfo};
use crate::visual::color::Sample;
use crate::visual::Axis;

pub trait PointInCellQuery {
    /// Sample the geometry at a single 3-D point.
    fn query(&self, geometry: &dyn Geometry, x: f64, y: f64, z: f64) -> Sample;
}

pub struct CsgEvaluator;

impl CsgEvaluator {
    pub fn sample_plane(
        &self,
        geometry: &dyn Geometry,
        axis: Axis,
        slice_pos: f64,
        u: f64,
        v: f64,
    ) -> Sample {
        let (x, y, z) = axis.plane_point(slice_pos, u, v);
        self.query(geometry, x, y, z)
    }
}

fn surface_value(s: &SurfaceInfo, x: f64, y: f64, z: f64) -> f64 {
    let d = s.data.0;
    match s.primitive_type {
        PrimitiveType::Plane => d[0] * x + d[1] * y + d[2] * z - d[3],
        PrimitiveType::Sphere => {
            (x - d[0]).powi(2) + (y - d[1]).powi(2) + (z - d[2]).powi(2) - d[3].powi(2)
        }
        PrimitiveType::CylinderX => (y - d[0]).powi(2) + (z - d[1]).powi(2) - d[3].powi(2),
        PrimitiveType::CylinderY => (x - d[0]).powi(2) + (z - d[1]).powi(2) - d[3].powi(2),
        PrimitiveType::CylinderZ => (x - d[0]).powi(2) + (y - d[1]).powi(2) - d[3].powi(2),
        PrimitiveType::Other(_) => 1.0,
    }
}

fn eval_node(
    tree: &CsgTree,
    node: NodeId,
    surfaces: &HashMap<i64, &SurfaceInfo>,
    x: f64,
    y: f64,
    z: f64,
) -> bool {
    match tree.get(node) {
        CsgNode::Primitive { surface_id, sense } => {
            let Some(surface) = surfaces.get(surface_id) else {
                return false;
            };
            let v = surface_value(surface, x, y, z);
            if *sense >= 0 {
                v >= 0.0
            } else {
                v <= 0.0
            }
        }
        CsgNode::Internal { op, left, right } => match op {
            Operation::Union => {
                eval_node(tree, *left, surfaces, x, y, z)
                    || right
                        .map(|r| eval_node(tree, r, surfaces, x, y, z))
                        .unwrap_or(false)
            }
            Operation::Intersection => {
                eval_node(tree, *left, surfaces, x, y, z)
                    && right
                        .map(|r| eval_node(tree, r, surfaces, x, y, z))
                        .unwrap_or(true)
            }
            Operation::Complement => !eval_node(tree, *left, surfaces, x, y, z),
        },
    }
}

impl PointInCellQuery for CsgEvaluator {
    fn query(&self, geometry: &dyn Geometry, x: f64, y: f64, z: f64) -> Sample {
        let surfaces: HashMap<i64, &SurfaceInfo> = geometry
            .surfaces()
            .iter()
            .map(|s| (s.surface_id, s))
            .collect();

        for cell in geometry.cells() {
            let Some(root) = cell.tree.root() else {
                continue;
            };
            if eval_node(&cell.tree, root, &surfaces, x, y, z) {
                return Sample {
                    cell_id: cell.cell_id,
                    material_id: cell.material_id,
                };
            }
        }
        Sample::EMPTY
    }
}
