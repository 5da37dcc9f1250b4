//! Reference parser for an MCNP-like text geometry format.
//!
//! This is deliberately a reduced dialect, not a full MCNP input-deck
//! parser — just enough to exercise the rest of the pipeline end to end.
//!
//! Cell card: `<id> <material> <density> <region-expr> [u=<n>] [fill=<n>] [lat=<n>]`
//! Surface card, one of:
//!   `<id> p  a b c d`        general plane a*x+b*y+c*z=d
//!   `<id> so r`              sphere at origin, radius r
//!   `<id> s  x y z r`        sphere centered at (x,y,z), radius r
//!   `<id> cx r` / `cy r` / `cz r`   infinite cylinder along that axis, radius r
//! Region expressions use MCNP's own grammar: signed surface ids,
//! space-separated intersection, `:` union, `#<id>` cell complement.
//!
//! Cards are separated into two blocks by a blank line: cells, then
//! surfaces (MCNP's own convention).

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::HashMap;

use super::{
    CellInfo, CsgNode, CsgTree, NodeId, Operation, ParsedGeometry, PrimitiveData, PrimitiveType,
    SurfaceInfo,
};

pub fn parse(content: &str) -> Result<ParsedGeometry> {
    let mut blocks = content.split("\n\n");
    let cell_block = blocks.next().unwrap_or_default();
    let surface_block = blocks.next().unwrap_or_default();

    let surfaces = parse_surfaces(surface_block)?;
    let cells = parse_cells(cell_block, &surfaces)?;

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

fn parse_surfaces(block: &str) -> Result<Vec<SurfaceInfo>> {
    let re = Regex::new(r"^\s*(-?\d+)\s+(\S+)\s+(.*)$").unwrap();
    let mut out = Vec::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        let caps = re
            .captures(line)
            .with_context(|| format!("unparseable surface card: {line}"))?;
        let surface_id: i64 = caps[1].parse()?;
        let kind = caps[2].to_ascii_lowercase();
        let params: Vec<f64> = caps[3]
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("bad surface parameters: {line}"))?;

        let mut data = PrimitiveData::default();
        let primitive_type = match kind.as_str() {
            "p" => {
                for (i, v) in params.iter().take(4).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::Plane
            }
            "so" => {
                data.0[3] = *params.first().unwrap_or(&0.0);
                PrimitiveType::Sphere
            }
            "s" => {
                for (i, v) in params.iter().take(4).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::Sphere
            }
            "cx" => {
                data.0[3] = *params.first().unwrap_or(&0.0);
                PrimitiveType::CylinderX
            }
            "cy" => {
                data.0[3] = *params.first().unwrap_or(&0.0);
                PrimitiveType::CylinderY
            }
            "cz" => {
                data.0[3] = *params.first().unwrap_or(&0.0);
                PrimitiveType::CylinderZ
            }
            other => {
                for (i, v) in params.iter().take(10).enumerate() {
                    data.0[i] = *v;
                }
                PrimitiveType::Other(other.len() as i32)
            }
        };

        out.push(SurfaceInfo {
            surface_id,
            primitive_type,
            boundary_type: 0,
            data,
        });
    }
    Ok(out)
}

fn parse_cells(block: &str, surfaces: &[SurfaceInfo]) -> Result<Vec<CellInfo>> {
    let head_re = Regex::new(r"^\s*(-?\d+)\s+(-?\d+)\s+([\d.eE+-]+)\s+(.*)$").unwrap();
    let kv_re = Regex::new(r"(u|fill|lat)\s*=\s*(-?\d+)").unwrap();
    let surface_index = surface_lookup(surfaces);

    let mut out = Vec::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        let caps = head_re
            .captures(line)
            .with_context(|| format!("unparseable cell card: {line}"))?;
        let cell_id: i64 = caps[1].parse()?;
        let material_id: i64 = caps[2].parse()?;
        let density: f64 = caps[3].parse()?;
        let rest = &caps[4];

        let mut universe_id = 0i64;
        let mut fill_universe = -1i64;
        let mut lat_type = 0i32;
        for kv in kv_re.captures_iter(rest) {
            let val: i64 = kv[2].parse()?;
            match &kv[1] {
                "u" => universe_id = val,
                "fill" => fill_universe = val,
                "lat" => lat_type = val as i32,
                _ => unreachable!(),
            }
        }

        let region = kv_re.replace_all(rest, "").to_string();
        let mut tree = CsgTree::default();
        let root = parse_region(&region, &mut tree)?;
        tree.set_root(root);
        let bbox = super::cell_conservative_bbox(&tree, &surface_index);

        out.push(CellInfo {
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
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(i64),
    Colon,
    LParen,
    RParen,
    Hash,
}

fn tokenize(region: &str) -> Result<Vec<Tok>> {
    let mut toks = Vec::new();
    let mut chars = region.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            ':' => {
                toks.push(Tok::Colon);
                chars.next();
            }
            '(' => {
                toks.push(Tok::LParen);
                chars.next();
            }
            ')' => {
                toks.push(Tok::RParen);
                chars.next();
            }
            '#' => {
                toks.push(Tok::Hash);
                chars.next();
            }
            '+' | '-' | '0'..='9' => {
                let mut s = String::new();
                s.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        s.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok::Num(s.parse().context("bad signed surface id")?));
            }
            other => bail!("unexpected character '{other}' in region expression"),
        }
    }
    Ok(toks)
}

/// Recursive-descent parse of an MCNP region expression into `tree`,
/// returning the id of the root node. Precedence: complement binds
/// tightest, then intersection (concatenation), then union (`:`).
pub(crate) fn parse_region(region: &str, tree: &mut CsgTree) -> Result<NodeId> {
    let toks = tokenize(region)?;
    let mut pos = 0usize;
    let root = parse_union(&toks, &mut pos, tree)?;
    if pos != toks.len() {
        bail!("trailing tokens in region expression: {region}");
    }
    Ok(root)
}

fn parse_union(toks: &[Tok], pos: &mut usize, tree: &mut CsgTree) -> Result<NodeId> {
    let mut left = parse_intersection(toks, pos, tree)?;
    while matches!(toks.get(*pos), Some(Tok::Colon)) {
        *pos += 1;
        let right = parse_intersection(toks, pos, tree)?;
        left = tree.push(CsgNode::Internal {
            op: Operation::Union,
            left,
            right: Some(right),
        });
    }
    Ok(left)
}

fn parse_intersection(toks: &[Tok], pos: &mut usize, tree: &mut CsgTree) -> Result<NodeId> {
    let mut left = parse_factor(toks, pos, tree)?;
    while matches!(
        toks.get(*pos),
        Some(Tok::Num(_)) | Some(Tok::LParen) | Some(Tok::Hash)
    ) {
        let right = parse_factor(toks, pos, tree)?;
        left = tree.push(CsgNode::Internal {
            op: Operation::Intersection,
            left,
            right: Some(right),
        });
    }
    Ok(left)
}

fn parse_factor(toks: &[Tok], pos: &mut usize, tree: &mut CsgTree) -> Result<NodeId> {
    match toks.get(*pos) {
        Some(Tok::Hash) => {
            *pos += 1;
            let child = parse_factor(toks, pos, tree)?;
            Ok(tree.push(CsgNode::Internal {
                op: Operation::Complement,
                left: child,
                right: None,
            }))
        }
        Some(Tok::LParen) => {
            *pos += 1;
            let inner = parse_union(toks, pos, tree)?;
            match toks.get(*pos) {
                Some(Tok::RParen) => {
                    *pos += 1;
                    Ok(inner)
                }
                _ => bail!("unbalanced parentheses in region expression"),
            }
        }
        Some(Tok::Num(n)) => {
            *pos += 1;
            let sense = if *n < 0 { -1 } else { 1 };
            Ok(tree.push(CsgNode::Primitive {
                surface_id: n.abs(),
                sense,
            }))
        }
        other => bail!("unexpected token in region expression: {other:?}"),
    }
}

fn surface_lookup(surfaces: &[SurfaceInfo]) -> HashMap<i64, &SurfaceInfo> {
    surfaces.iter().map(|s| (s.surface_id, s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_system() {
        let text = "1 3 1.0 -1 2 u=1\n2 0 0 +1 : -2 u=0 fill=-1\n\n1 p 0 0 1 5\n2 p 0 0 1 -5\n";
        let sys = parse(text).unwrap();
        assert_eq!(sys.cells.len(), 2);
        assert_eq!(sys.surfaces.len(), 2);
        assert_eq!(sys.cells[0].material_id, 3);
        assert_eq!(sys.cells[0].density, 1.0);
    }

    #[test]
    fn parses_complement_and_union() {
        let text = "1 0 0 #2 : (3 -4) u=0 fill=-1\n\n2 so 5\n3 p 1 0 0 1\n4 p 1 0 0 2\n";
        let sys = parse(text).unwrap();
        assert_eq!(sys.cells.len(), 1);
        assert!(sys.cells[0].tree.root().is_some());
    }
}
