//! Reference parser for an OpenMC-like XML geometry format.
//!
//! Path-only by construction, so loading a blob always goes through the
//! temp-file dance in `loader.rs`.
//!
//! Expected shape:
//! ```xml
//! <geometry>
//!   <surface id="1" type="plane" coeffs="0 0 1 5" boundary="vacuum"/>
//!   <surface id="2" type="x-cylinder" coeffs="0 0 2"/>
//!   <cell id="1" material="3" density="1.0" universe="1" region="-1 2"/>
//! </geometry>
//! ```

use anyhow::{bail, Context, Result};
use roxmltree::Document;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::mcnp::parse_region;
use super::{CellInfo, CsgTree, ParsedGeometry, PrimitiveData, PrimitiveType, SurfaceInfo};

pub fn parse_path(path: &Path) -> Result<ParsedGeometry> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read OpenMC geometry at {}", path.display()))?;
    parse_str(&text)
}

fn parse_str(text: &str) -> Result<ParsedGeometry> {
    let doc = Document::parse(text).context("failed to parse OpenMC XML")?;
    let root = doc.root_element();

    let mut surfaces = Vec::new();
    for node in root.children().filter(|n| n.has_tag_name("surface")) {
        let surface_id = attr_i64(node, "id")?;
        let kind = node
            .attribute("type")
            .context("surface missing 'type' attribute")?;
        let coeffs: Vec<f64> = node
            .attribute("coeffs")
            .unwrap_or("")
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<Result<_, _>>()
            .context("bad surface coeffs")?;

        let mut data = PrimitiveData::default();
        let primitive_type = match kind {
            "plane" => {
                for (i, v) in coeffs.iter().take(4).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::Plane
            }
            "sphere" => {
                for (i, v) in coeffs.iter().take(4).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::Sphere
            }
            "x-cylinder" => {
                for (i, v) in coeffs.iter().take(3).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::CylinderX
            }
            "y-cylinder" => {
                for (i, v) in coeffs.iter().take(3).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::CylinderY
            }
            "z-cylinder" => {
                for (i, v) in coeffs.iter().take(3).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::CylinderZ
            }
            other => {
                for (i, v) in coeffs.iter().take(10).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::Other(other.len() as i32)
            }
        };

        let boundary_type = match node.attribute("boundary") {
            Some("vacuum") => 0,
            Some("reflective") => 1,
            Some("periodic") => 2,
            _ => 0,
        };

        surfaces.push(SurfaceInfo {
            surface_id,
            primitive_type,
            boundary_type,
            data,
        });
    }

    let surface_index: HashMap<i64, &SurfaceInfo> =
        surfaces.iter().map(|s| (s.surface_id, s)).collect();

    let mut cells = Vec::new();
    for node in root.children().filter(|n| n.has_tag_name("cell")) {
        let cell_id = attr_i64(node, "id")?;
        let material_id = node
            .attribute("material")
            .map(|s| s.parse::<i64>())
            .transpose()
            .context("bad material id")?
            .unwrap_or(0);
        let density = node
            .attribute("density")
            .map(|s| s.parse::<f64>())
            .transpose()
            .context("bad density")?
            .unwrap_or(0.0);
        let universe_id = node
            .attribute("universe")
            .map(|s| s.parse::<i64>())
            .transpose()
            .context("bad universe id")?
            .unwrap_or(0);
        let fill_universe = node
            .attribute("fill")
            .map(|s| s.parse::<i64>())
            .transpose()
            .context("bad fill universe")?
            .unwrap_or(-1);
        let lat_type = node
            .attribute("lat")
            .map(|s| s.parse::<i32>())
            .transpose()
            .context("bad lattice type")?
            .unwrap_or(0);

        let region_str = node.attribute("region").unwrap_or("");
        let mut tree = CsgTree::default();
        if region_str.trim().is_empty() {
            bail!("cell {cell_id} has no region");
        }
        let root_id = parse_region(region_str, &mut tree)?;
        tree.set_root(root_id);
        let bbox = super::cell_conservative_bbox(&tree, &surface_index);

        cells.push(CellInfo {
            cell_id,
            material_id,
            density,
            universe_id,
            fill_universe,
            lat_type,
            lattice_dims: [0; 6],
            lattice_pitch: [0.0; 3],
            lattice_lower_left: [0.0; 3],
            lattice_fill: vec![],
            tree,
            bbox,
        });
    }

    let mut universe_count = 0;
    for c in &cells {
        universe_count = universe_count.max(c.universe_id + 1);
    }

    Ok(ParsedGeometry {
        cells,
        surfaces,
        universe_count,
    })
}

fn attr_i64(node: roxmltree::Node, name: &str) -> Result<i64> {
    node.attribute(name)
        .with_context(|| format!("missing '{name}' attribute"))?
        .parse()
        .with_context(|| format!("'{name}' attribute is not an integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_geometry() {
        let xml = r#"<geometry>
          <surface id="1" type="sphere" coeffs="0 0 0 5" boundary="vacuum"/>
          <cell id="1" material="3" density="1.0" universe="1" region="-1"/>
        </geometry>"#;
        let sys = parse_str(xml).unwrap();
        assert_eq!(sys.cells.len(), 1);
        assert_eq!(sys.surfaces.len(), 1);
        assert_eq!(sys.cells[0].material_id, 3);
    }
}
