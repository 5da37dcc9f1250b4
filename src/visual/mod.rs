//! Visual differ: rasterises planar slices of two geometries,
//! auto-selects the most informative slice, and writes before/after/diff
//! bitmaps.

pub mod bmp;
pub mod color;
pub mod contour;
pub mod pointquery;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{AUTO_SLICE_GRID, AUTO_SLICE_SAMPLES};
use crate::geometry::{BBox, Geometry};
use bmp::Image;
use color::{overlay_color, Sample};
use contour::{DefaultContourExtractor, SliceContourExtractor};
use pointquery::{CsgEvaluator, PointInCellQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    pub fn all() -> [Axis; 3] {
        [Axis::X, Axis::Y, Axis::Z]
    }

    fn u_axis(self) -> Axis {
        match self {
            Axis::Z => Axis::X,
            Axis::Y => Axis::X,
            Axis::X => Axis::Y,
        }
    }

    fn v_axis(self) -> Axis {
        match self {
            Axis::Z => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::X => Axis::Z,
        }
    }

    pub(crate) fn in_plane_coord_is_v(self, other: Axis) -> bool {
        other == self.v_axis()
    }

    pub(crate) fn perpendicular_axes(self) -> (Axis, Axis) {
        (self.u_axis(), self.v_axis())
    }

    /// (u, v) = in-plane coordinates: Z-slices read (x, y), Y-slices
    /// read (x, z), X-slices read (y, z).
    pub fn plane_point(self, slice_pos: f64, u: f64, v: f64) -> (f64, f64, f64) {
        match self {
            Axis::Z => (u, v, slice_pos),
            Axis::Y => (u, slice_pos, v),
            Axis::X => (slice_pos, u, v),
        }
    }

    /// Reorder a plane's `(a,b,c,d)` so the result reads `(coef_u, coef_v, coef_w, d)`.
    pub(crate) fn decompose_plane(self, a: f64, b: f64, c: f64, d: f64) -> (f64, f64, f64, f64) {
        match self {
            Axis::Z => (a, b, c, d),
            Axis::Y => (a, c, b, d),
            Axis::X => (b, c, a, d),
        }
    }

    pub(crate) fn decompose_point(self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        match self {
            Axis::Z => (x, y, z),
            Axis::Y => (x, z, y),
            Axis::X => (y, z, x),
        }
    }

    fn axis_range(self, bbox: &BBox) -> (f64, f64) {
        match self {
            Axis::X => (bbox.min_x, bbox.max_x),
            Axis::Y => (bbox.min_y, bbox.max_y),
            Axis::Z => (bbox.min_z, bbox.max_z),
        }
    }

    fn uv_range(self, bbox: &BBox) -> (f64, f64, f64, f64) {
        match self {
            Axis::Z => (bbox.min_x, bbox.max_x, bbox.min_y, bbox.max_y),
            Axis::Y => (bbox.min_x, bbox.max_x, bbox.min_z, bbox.max_z),
            Axis::X => (bbox.min_y, bbox.max_y, bbox.min_z, bbox.max_z),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisualOpts {
    pub axis: Axis,
    pub slice_pos: f64,
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    pub width: usize,
    pub height: usize,
    pub draw_contours: bool,
}

const BBOX_CLAMP: f64 = 1000.0;

/// Union of per-cell bounding boxes, excluding graveyard cells unless
/// none exist, clamped to +/-1000.
pub fn inner_bbox(geometry: &dyn Geometry) -> BBox {
    let mut found = BBox::EMPTY;
    let mut any_non_graveyard = false;
    for cell in geometry.cells() {
        if cell.is_graveyard() {
            continue;
        }
        any_non_graveyard = true;
        found = found.union(&cell.bbox);
    }
    if !any_non_graveyard {
        for cell in geometry.cells() {
            found = found.union(&cell.bbox);
        }
    }
    found.clamp(BBOX_CLAMP)
}

struct SliceScore {
    pos: f64,
    diff_pixels: usize,
    geom_pixels: usize,
}

fn sample_grid(
    query: &dyn PointInCellQuery,
    geometry: &dyn Geometry,
    axis: Axis,
    slice_pos: f64,
    u_min: f64,
    u_max: f64,
    v_min: f64,
    v_max: f64,
    grid: usize,
) -> Vec<Sample> {
    let mut out = Vec::with_capacity(grid * grid);
    for j in 0..grid {
        let v = v_min + (v_max - v_min) * (j as f64 + 0.5) / grid as f64;
        for i in 0..grid {
            let u = u_min + (u_max - u_min) * (i as f64 + 0.5) / grid as f64;
            let (x, y, z) = axis.plane_point(slice_pos, u, v);
            let s = query.query(geometry, x, y, z);
            out.push(s);
        }
    }
    out
}

/// Best `(position, diff, geom)` for one axis: samples a grid of points
/// at `AUTO_SLICE_SAMPLES` candidate positions and keeps the one with
/// the most differing pixels, breaking ties by total geometry coverage.
fn find_best_slice_for_axis(
    query: &dyn PointInCellQuery,
    old: &dyn Geometry,
    new: &dyn Geometry,
    axis: Axis,
    union_bbox: &BBox,
) -> SliceScore {
    let (lo, hi) = axis.axis_range(union_bbox);
    let (u_min, u_max, v_min, v_max) = axis.uv_range(union_bbox);

    let mut best = SliceScore {
        pos: (lo + hi) * 0.5,
        diff_pixels: 0,
        geom_pixels: 0,
    };

    for i in 0..AUTO_SLICE_SAMPLES {
        let pos = if AUTO_SLICE_SAMPLES == 1 {
            (lo + hi) * 0.5
        } else {
            lo + (hi - lo) * (i as f64) / (AUTO_SLICE_SAMPLES - 1) as f64
        };
        let old_samples = sample_grid(query, old, axis, pos, u_min, u_max, v_min, v_max, AUTO_SLICE_GRID);
        let new_samples = sample_grid(query, new, axis, pos, u_min, u_max, v_min, v_max, AUTO_SLICE_GRID);

        let mut diff_pixels = 0usize;
        let mut geom_pixels = 0usize;
        for (o, n) in old_samples.iter().zip(new_samples.iter()) {
            if !o.is_empty() || !n.is_empty() {
                geom_pixels += 1;
            }
            if o.cell_id != n.cell_id || o.material_id != n.material_id {
                diff_pixels += 1;
            }
        }

        if (diff_pixels, geom_pixels) > (best.diff_pixels, best.geom_pixels) {
            best = SliceScore { pos, diff_pixels, geom_pixels };
        }
    }

    best
}

fn padded_viewport(union_bbox: &BBox, axis: Axis, width_hint: Option<usize>) -> VisualOpts {
    let (mut u_min, mut u_max, mut v_min, mut v_max) = axis.uv_range(union_bbox);
    let du = (u_max - u_min) * 0.1;
    let dv = (v_max - v_min) * 0.1;
    u_min -= du;
    u_max += du;
    v_min -= dv;
    v_max += dv;

    let width = width_hint.unwrap_or(800);
    let aspect = (v_max - v_min) / (u_max - u_min);
    let height = ((width as f64 * aspect) as usize).clamp(100, 4000);

    VisualOpts {
        axis,
        slice_pos: 0.0,
        u_min,
        u_max,
        v_min,
        v_max,
        width,
        height,
        draw_contours: true,
    }
}

/// Pick the best axis and position overall: the axis with the highest
/// (diff, geom) score wins.
pub fn auto_select(old: &dyn Geometry, new: &dyn Geometry) -> VisualOpts {
    let query = CsgEvaluator;
    let union_bbox = inner_bbox(old).union(&inner_bbox(new));

    let mut best_axis = Axis::Z;
    let mut best_score = SliceScore { pos: 0.0, diff_pixels: 0, geom_pixels: 0 };
    let mut first = true;
    for axis in Axis::all() {
        let score = find_best_slice_for_axis(&query, old, new, axis, &union_bbox);
        if first || (score.diff_pixels, score.geom_pixels) > (best_score.diff_pixels, best_score.geom_pixels) {
            best_axis = axis;
            best_score = score;
            first = false;
        }
    }

    let mut opts = padded_viewport(&union_bbox, best_axis, None);
    opts.slice_pos = best_score.pos;
    opts
}

/// Best position per axis, for `--all`.
pub fn auto_select_all(old: &dyn Geometry, new: &dyn Geometry) -> Vec<VisualOpts> {
    let query = CsgEvaluator;
    let union_bbox = inner_bbox(old).union(&inner_bbox(new));
    Axis::all()
        .into_iter()
        .map(|axis| {
            let score = find_best_slice_for_axis(&query, old, new, axis, &union_bbox);
            let mut opts = padded_viewport(&union_bbox, axis, None);
            opts.slice_pos = score.pos;
            opts
        })
        .collect()
}

fn render_system(
    query: &dyn PointInCellQuery,
    extractor: &dyn SliceContourExtractor,
    geometry: &dyn Geometry,
    opts: &VisualOpts,
) -> (Image, Vec<Vec<Sample>>) {
    let mut image = Image::new(opts.width, opts.height, [255, 255, 255]);
    let mut samples = vec![vec![Sample::EMPTY; opts.width]; opts.height];

    for py in 0..opts.height {
        let v = opts.v_max - (opts.v_max - opts.v_min) * (py as f64 + 0.5) / opts.height as f64;
        for px in 0..opts.width {
            let u = opts.u_min + (opts.u_max - opts.u_min) * (px as f64 + 0.5) / opts.width as f64;
            let (x, y, z) = opts.axis.plane_point(opts.slice_pos, u, v);
            let sample = query.query(geometry, x, y, z);
            samples[py][px] = sample;
            image.set(px as i64, py as i64, color::id_to_color(sample.material_id));
        }
    }

    if opts.draw_contours {
        for curve in extractor.curves(geometry, opts.axis, opts.slice_pos) {
            contour::rasterise_curve(&mut image, &curve, opts.u_min, opts.u_max, opts.v_min, opts.v_max);
        }
    }

    (image, samples)
}

/// Render one axis: writes `{prefix}_{Axis}_{before,after,diff}.bmp`.
pub fn render_one_axis(old: &dyn Geometry, new: &dyn Geometry, prefix: &str, opts: &VisualOpts) -> Result<()> {
    let query = CsgEvaluator;
    let extractor = DefaultContourExtractor;

    let (before_img, before_samples) = render_system(&query, &extractor, old, opts);
    let (after_img, after_samples) = render_system(&query, &extractor, new, opts);

    let mut diff_img = Image::new(opts.width, opts.height, [255, 255, 255]);
    for py in 0..opts.height {
        for px in 0..opts.width {
            let o = before_samples[py][px];
            let n = after_samples[py][px];
            diff_img.set(px as i64, py as i64, overlay_color(o, n));
        }
    }
    if opts.draw_contours {
        for curve in extractor.curves(old, opts.axis, opts.slice_pos) {
            contour::rasterise_curve(&mut diff_img, &curve, opts.u_min, opts.u_max, opts.v_min, opts.v_max);
        }
        for curve in extractor.curves(new, opts.axis, opts.slice_pos) {
            contour::rasterise_curve(&mut diff_img, &curve, opts.u_min, opts.u_max, opts.v_min, opts.v_max);
        }
    }

    let label = opts.axis.label();
    before_img
        .write_bmp(Path::new(&format!("{prefix}_{label}_before.bmp")))
        .context("failed to write before image")?;
    after_img
        .write_bmp(Path::new(&format!("{prefix}_{label}_after.bmp")))
        .context("failed to write after image")?;
    diff_img
        .write_bmp(Path::new(&format!("{prefix}_{label}_diff.bmp")))
        .context("failed to write diff image")?;
    Ok(())
}

/// Full visual diff: explicit opts, or `None` for full auto mode.
pub fn visual_diff(old: &dyn Geometry, new: &dyn Geometry, prefix: &str, opts: Option<VisualOpts>) -> Result<()> {
    let opts = opts.unwrap_or_else(|| auto_select(old, new));
    render_one_axis(old, new, prefix, &opts)
}

/// `--all`: one rendering per axis, each with its own best position.
pub fn visual_diff_all(old: &dyn Geometry, new: &dyn Geometry, prefix: &str) -> Result<()> {
    for opts in auto_select_all(old, new) {
        render_one_axis(old, new, prefix, &opts)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CellInfo, CsgNode, CsgTree, ParsedGeometry, PrimitiveData, PrimitiveType, SurfaceInfo};

    fn sphere_system(material: i64, radius: f64) -> ParsedGeometry {
        let mut tree = CsgTree::default();
        let root = tree.push(CsgNode::Primitive { surface_id: 1, sense: -1 });
        tree.set_root(root);
        ParsedGeometry {
            cells: vec![CellInfo {
                cell_id: 1,
                material_id: material,
                density: 1.0,
                universe_id: 1,
                fill_universe: -1,
                lat_type: 0,
                lattice_dims: [0; 6],
                lattice_pitch: [0.0; 3],
                lattice_lower_left: [0.0; 3],
                lattice_fill: vec![],
                tree,
                bbox: BBox {
                    min_x: -radius,
                    max_x: radius,
                    min_y: -radius,
                    max_y: radius,
                    min_z: -radius,
                    max_z: radius,
                },
            }],
            surfaces: vec![SurfaceInfo {
                surface_id: 1,
                primitive_type: PrimitiveType::Sphere,
                boundary_type: 0,
                data: PrimitiveData([0.0, 0.0, 0.0, radius, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            }],
            universe_count: 1,
        }
    }

    fn graveyard_cell() -> CellInfo {
        let mut tree = CsgTree::default();
        let root = tree.push(CsgNode::Primitive { surface_id: 2, sense: 1 });
        tree.set_root(root);
        CellInfo {
            cell_id: 99,
            material_id: 0,
            density: 0.0,
            universe_id: 0,
            fill_universe: -1,
            lat_type: 0,
            lattice_dims: [0; 6],
            lattice_pitch: [0.0; 3],
            lattice_lower_left: [0.0; 3],
            lattice_fill: vec![],
            tree,
            bbox: BBox {
                min_x: -1e6,
                max_x: 1e6,
                min_y: -1e6,
                max_y: 1e6,
                min_z: -1e6,
                max_z: 1e6,
            },
        }
    }

    #[test]
    fn inner_bbox_excludes_graveyard() {
        let mut geom = sphere_system(3, 10.0);
        geom.cells.push(graveyard_cell());
        let bbox = inner_bbox(&geom);
        assert!(bbox.min_x >= -11.0 && bbox.max_x <= 11.0);
    }

    #[test]
    fn auto_select_prefers_axis_with_differences() {
        let old = sphere_system(3, 5.0);
        let new = sphere_system(7, 5.0);
        let opts = auto_select(&old, &new);
        assert!(opts.width == 800);
        assert!(opts.height >= 100 && opts.height <= 4000);
    }
}
