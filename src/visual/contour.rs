//! Slice-contour extraction and rasterisation. `Curve` is the tagged sum
//! the rasteriser dispatches over; `DefaultContourExtractor` derives
//! contours from the axis-aligned primitives the reference parsers emit
//! (plane, sphere, cylinder).

use crate::geometry::{Geometry, PrimitiveType};
use crate::visual::bmp::Image;
use crate::visual::color::CONTOUR;
use crate::visual::Axis;

/// A parametric curve in the (u,v) slice plane.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    /// Infinite line `a*u + b*v = c`.
    Line { a: f64, b: f64, c: f64 },
    LineSegment { u0: f64, v0: f64, u1: f64, v1: f64 },
    Circle { cu: f64, cv: f64, r: f64 },
    /// Parametric range `[t0, t1]` in radians, angle measured from +u axis.
    Arc { cu: f64, cv: f64, r: f64, t0: f64, t1: f64 },
    /// Rotated by `angle` (radians) about (cu, cv); `ru`/`rv` are the
    /// semi-axes before rotation.
    Ellipse { cu: f64, cv: f64, ru: f64, rv: f64, angle: f64 },
    EllipseArc {
        cu: f64,
        cv: f64,
        ru: f64,
        rv: f64,
        angle: f64,
        t0: f64,
        t1: f64,
    },
    Polygon { points: Vec<(f64, f64)>, closed: bool },
    /// Two coplanar lines sharing direction `(a, b)` at offsets `c1`, `c2`.
    ParallelLines { a: f64, b: f64, c1: f64, c2: f64 },
}

pub trait SliceContourExtractor {
    fn curves(&self, geometry: &dyn Geometry, axis: Axis, slice_pos: f64) -> Vec<Curve>;
}

pub struct DefaultContourExtractor;

impl SliceContourExtractor for DefaultContourExtractor {
    fn curves(&self, geometry: &dyn Geometry, axis: Axis, slice_pos: f64) -> Vec<Curve> {
        let mut out = Vec::new();
        for s in geometry.surfaces() {
            let d = s.data.0;
            match s.primitive_type {
                PrimitiveType::Plane => {
                    let (cu, cv, cw, rhs) = axis.decompose_plane(d[0], d[1], d[2], d[3]);
                    let c = rhs - cw * slice_pos;
                    if cu != 0.0 || cv != 0.0 {
                        out.push(Curve::Line { a: cu, b: cv, c });
                    }
                }
                PrimitiveType::Sphere => {
                    let (cu, cv, cw) = axis.decompose_point(d[0], d[1], d[2]);
                    let r = d[3];
                    let dw = (slice_pos - cw).abs();
                    if dw <= r {
                        let rc = (r * r - dw * dw).max(0.0).sqrt();
                        out.push(Curve::Circle { cu, cv, r: rc });
                    }
                }
                PrimitiveType::CylinderX | PrimitiveType::CylinderY | PrimitiveType::CylinderZ => {
                    let cyl_axis = match s.primitive_type {
                        PrimitiveType::CylinderX => Axis::X,
                        PrimitiveType::CylinderY => Axis::Y,
                        _ => Axis::Z,
                    };
                    let r = d[3];
                    // Center in the two axes perpendicular to the cylinder's own axis.
                    let (ca, cb) = (d[0], d[1]);
                    if axis == cyl_axis {
                        out.push(Curve::Circle { cu: ca, cv: cb, r });
                    } else if let Some(curve) =
                        cylinder_parallel_lines(cyl_axis, ca, cb, r, axis, slice_pos)
                    {
                        out.push(curve);
                    }
                }
                PrimitiveType::Other(_) => {}
            }
        }
        out
    }
}

/// Intersect an infinite cylinder (axis `cyl_axis`, centered at `(ca,cb)`
/// in the plane perpendicular to that axis, radius `r`) with the slice
/// plane `axis = slice_pos`, producing the pair of lines traced on the
/// cylinder's own axis, if the slice actually crosses it.
fn cylinder_parallel_lines(
    cyl_axis: Axis,
    ca: f64,
    cb: f64,
    r: f64,
    slice_axis: Axis,
    slice_pos: f64,
) -> Option<Curve> {
    // The cylinder's two non-axis coordinates are (ca, cb) in cyl_axis's
    // own (a,b) convention, which happens to coincide with the same
    // ordering as (u,v) when viewed along cyl_axis. We need the
    // coordinate of the slicing axis within that (a,b) pair.
    let (a_name, b_name) = cyl_axis.perpendicular_axes();
    let (center_on_slice_axis, center_on_free_axis) = if slice_axis == a_name {
        (ca, cb)
    } else if slice_axis == b_name {
        (cb, ca)
    } else {
        return None; // slicing along the cylinder's own axis handled by the circle branch
    };

    let dist = (slice_pos - center_on_slice_axis).abs();
    if dist > r {
        return None;
    }
    let half_width = (r * r - dist * dist).max(0.0).sqrt();
    let v0 = center_on_free_axis - half_width;
    let v1 = center_on_free_axis + half_width;
    // Lines are constant in the "free" in-plane coordinate: 0*u + 1*v = v0/v1,
    // with u running along the cylinder's own (now in-plane) axis.
    let free_is_v = slice_axis.in_plane_coord_is_v(cyl_axis);
    if free_is_v {
        Some(Curve::ParallelLines { a: 0.0, b: 1.0, c1: v0, c2: v1 })
    } else {
        Some(Curve::ParallelLines { a: 1.0, b: 0.0, c1: v0, c2: v1 })
    }
}

/// Liang-Barsky clip of a parametric segment `p0 + t*(p1-p0)`, `t in [0,1]`,
/// against an axis-aligned rectangle. Returns the clipped `t` range.
fn clip_line(
    u0: f64,
    v0: f64,
    u1: f64,
    v1: f64,
    u_min: f64,
    u_max: f64,
    v_min: f64,
    v_max: f64,
) -> Option<(f64, f64)> {
    let (du, dv) = (u1 - u0, v1 - v0);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-du, u0 - u_min),
        (du, u_max - u0),
        (-dv, v0 - v_min),
        (dv, v_max - v0),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }
    if t0 > t1 {
        None
    } else {
        Some((t0, t1))
    }
}

struct Viewport {
    u_min: f64,
    u_max: f64,
    v_min: f64,
    v_max: f64,
    width: usize,
    height: usize,
}

impl Viewport {
    fn to_pixel(&self, u: f64, v: f64) -> (i64, i64) {
        let px = ((u - self.u_min) / (self.u_max - self.u_min) * self.width as f64) as i64;
        let py =
            ((self.v_max - v) / (self.v_max - self.v_min) * self.height as f64) as i64;
        (px, py)
    }

    fn pixel_u(&self) -> f64 {
        (self.u_max - self.u_min) / self.width as f64
    }

    fn pixel_v(&self) -> f64 {
        (self.v_max - self.v_min) / self.height as f64
    }
}

fn stamp_pixel(image: &mut Image, viewport: &Viewport, u: f64, v: f64) {
    let (x, y) = viewport.to_pixel(u, v);
    image.set(x, y, CONTOUR);
}

fn rasterise_segment(image: &mut Image, viewport: &Viewport, u0: f64, v0: f64, u1: f64, v1: f64) {
    let Some((t0, t1)) = clip_line(
        u0,
        v0,
        u1,
        v1,
        viewport.u_min,
        viewport.u_max,
        viewport.v_min,
        viewport.v_max,
    ) else {
        return;
    };
    let step = (viewport.pixel_u().min(viewport.pixel_v()) / 2.0).max(1e-9);
    let length = (((u1 - u0) * (t1 - t0)).powi(2) + ((v1 - v0) * (t1 - t0)).powi(2)).sqrt();
    let nsteps = ((length / step).ceil() as usize).max(1);
    for i in 0..=nsteps {
        let t = t0 + (t1 - t0) * (i as f64 / nsteps as f64);
        stamp_pixel(image, viewport, u0 + (u1 - u0) * t, v0 + (v1 - v0) * t);
    }
}

/// Resolve an infinite line `a*u+b*v=c` to a long segment spanning the
/// viewport, then clip/rasterise it like a regular segment.
fn rasterise_line(image: &mut Image, viewport: &Viewport, a: f64, b: f64, c: f64) {
    // Parametrize by whichever coordinate has a larger coefficient.
    let (u0, v0, u1, v1);
    if b.abs() > a.abs() {
        let f = |u: f64| (c - a * u) / b;
        u0 = viewport.u_min;
        v0 = f(u0);
        u1 = viewport.u_max;
        v1 = f(u1);
    } else if a != 0.0 {
        let f = |v: f64| (c - b * v) / a;
        v0 = viewport.v_min;
        u0 = f(v0);
        v1 = viewport.v_max;
        u1 = f(v1);
    } else {
        return;
    }
    rasterise_segment(image, viewport, u0, v0, u1, v1);
}

fn rasterise_circle(image: &mut Image, viewport: &Viewport, cu: f64, cv: f64, r: f64) {
    let step = viewport.pixel_u().min(viewport.pixel_v()) / 2.0;
    let nsteps = (32usize).max((2.0 * std::f64::consts::PI * r / step.max(1e-9)).ceil() as usize);
    for i in 0..nsteps {
        let t = 2.0 * std::f64::consts::PI * (i as f64) / nsteps as f64;
        stamp_pixel(image, viewport, cu + r * t.cos(), cv + r * t.sin());
    }
}

fn rasterise_arc(image: &mut Image, viewport: &Viewport, cu: f64, cv: f64, r: f64, t0: f64, t1: f64) {
    let step = viewport.pixel_u().min(viewport.pixel_v()) / 2.0;
    let nsteps = (16usize).max((r * (t1 - t0).abs() / step.max(1e-9)).ceil() as usize);
    for i in 0..=nsteps {
        let t = t0 + (t1 - t0) * (i as f64 / nsteps as f64);
        stamp_pixel(image, viewport, cu + r * t.cos(), cv + r * t.sin());
    }
}

/// Ramanujan's perimeter approximation, clamped to >=64 steps.
fn rasterise_ellipse(
    image: &mut Image,
    viewport: &Viewport,
    cu: f64,
    cv: f64,
    ru: f64,
    rv: f64,
    angle: f64,
) {
    let h = ((ru - rv) / (ru + rv)).powi(2);
    let perimeter =
        std::f64::consts::PI * (ru + rv) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
    let step = viewport.pixel_u().min(viewport.pixel_v()) / 2.0;
    let nsteps = (64usize).max((perimeter / step.max(1e-9)).ceil() as usize);
    let (ca, sa) = (angle.cos(), angle.sin());
    for i in 0..nsteps {
        let t = 2.0 * std::f64::consts::PI * (i as f64) / nsteps as f64;
        let (x, y) = (ru * t.cos(), rv * t.sin());
        stamp_pixel(image, viewport, cu + x * ca - y * sa, cv + x * sa + y * ca);
    }
}

fn rasterise_ellipse_arc(
    image: &mut Image,
    viewport: &Viewport,
    cu: f64,
    cv: f64,
    ru: f64,
    rv: f64,
    angle: f64,
    t0: f64,
    t1: f64,
) {
    let h = ((ru - rv) / (ru + rv)).powi(2);
    let perimeter =
        std::f64::consts::PI * (ru + rv) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
    let step = viewport.pixel_u().min(viewport.pixel_v()) / 2.0;
    let frac = (t1 - t0).abs() / (2.0 * std::f64::consts::PI);
    let nsteps = (64usize).max((perimeter * frac / step.max(1e-9)).ceil() as usize);
    let (ca, sa) = (angle.cos(), angle.sin());
    for i in 0..=nsteps {
        let t = t0 + (t1 - t0) * (i as f64 / nsteps as f64);
        let (x, y) = (ru * t.cos(), rv * t.sin());
        stamp_pixel(image, viewport, cu + x * ca - y * sa, cv + x * sa + y * ca);
    }
}

fn rasterise_polygon(image: &mut Image, viewport: &Viewport, points: &[(f64, f64)], closed: bool) {
    if points.len() < 2 {
        return;
    }
    let n = points.len();
    let edges = if closed { n } else { n - 1 };
    for i in 0..edges {
        let (u0, v0) = points[i];
        let (u1, v1) = points[(i + 1) % n];
        rasterise_segment(image, viewport, u0, v0, u1, v1);
    }
}

pub fn rasterise_curve(
    image: &mut Image,
    curve: &Curve,
    u_min: f64,
    u_max: f64,
    v_min: f64,
    v_max: f64,
) {
    let viewport = Viewport {
        u_min,
        u_max,
        v_min,
        v_max,
        width: image.width,
        height: image.height,
    };
    match curve {
        Curve::Line { a, b, c } => rasterise_line(image, &viewport, *a, *b, *c),
        Curve::LineSegment { u0, v0, u1, v1 } => rasterise_segment(image, &viewport, *u0, *v0, *u1, *v1),
        Curve::Circle { cu, cv, r } => rasterise_circle(image, &viewport, *cu, *cv, *r),
        Curve::Arc { cu, cv, r, t0, t1 } => rasterise_arc(image, &viewport, *cu, *cv, *r, *t0, *t1),
        Curve::Ellipse { cu, cv, ru, rv, angle } => {
            rasterise_ellipse(image, &viewport, *cu, *cv, *ru, *rv, *angle)
        }
        Curve::EllipseArc { cu, cv, ru, rv, angle, t0, t1 } => {
            rasterise_ellipse_arc(image, &viewport, *cu, *cv, *ru, *rv, *angle, *t0, *t1)
        }
        Curve::Polygon { points, closed } => rasterise_polygon(image, &viewport, points, *closed),
        Curve::ParallelLines { a, b, c1, c2 } => {
            rasterise_line(image, &viewport, *a, *b, *c1);
            rasterise_line(image, &viewport, *a, *b, *c2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_line_fully_inside() {
        let r = clip_line(1.0, 1.0, 9.0, 9.0, 0.0, 10.0, 0.0, 10.0);
        assert_eq!(r, Some((0.0, 1.0)));
    }

    #[test]
    fn clip_line_fully_outside() {
        let r = clip_line(-5.0, -5.0, -1.0, -1.0, 0.0, 10.0, 0.0, 10.0);
        assert_eq!(r, None);
    }

    #[test]
    fn circle_rasterises_without_panicking() {
        let mut img = Image::new(64, 64, [255, 255, 255]);
        rasterise_curve(
            &mut img,
            &Curve::Circle { cu: 0.0, cv: 0.0, r: 5.0 },
            -10.0,
            10.0,
            -10.0,
            10.0,
        );
        assert!(img.pixels.iter().any(|p| *p == CONTOUR));
    }

    /// `to_pixel` of a 64x64 image over [-10,10]x[-10,10]: 3.2px per unit.
    /// A 2-unit square search window around the expected point is generous
    /// enough to absorb both the viewport's own rounding and the curve
    /// rasterisers' step-size discretization.
    fn painted_near(img: &Image, viewport: &Viewport, u: f64, v: f64) -> bool {
        let (cx, cy) = viewport.to_pixel(u, v);
        let radius = (2.0 * viewport.width as f64 / (viewport.u_max - viewport.u_min)).ceil() as i64;
        for y in (cy - radius)..=(cy + radius) {
            for x in (cx - radius)..=(cx + radius) {
                if img.get(x, y) == Some(CONTOUR) {
                    return true;
                }
            }
        }
        false
    }

    fn test_viewport() -> Viewport {
        Viewport {
            u_min: -10.0,
            u_max: 10.0,
            v_min: -10.0,
            v_max: 10.0,
            width: 64,
            height: 64,
        }
    }

    #[test]
    fn arc_only_paints_within_its_angle_range() {
        let mut img = Image::new(64, 64, [255, 255, 255]);
        let vp = test_viewport();
        // Quarter circle spanning the first quadrant (angle measured from +u).
        rasterise_curve(
            &mut img,
            &Curve::Arc { cu: 0.0, cv: 0.0, r: 5.0, t0: 0.0, t1: std::f64::consts::FRAC_PI_2 },
            vp.u_min,
            vp.u_max,
            vp.v_min,
            vp.v_max,
        );
        assert!(painted_near(&img, &vp, 5.0, 0.0), "start of arc should be painted");
        assert!(painted_near(&img, &vp, 0.0, 5.0), "end of arc should be painted");
        assert!(!painted_near(&img, &vp, -5.0, 0.0), "opposite side is outside the angle range");
        assert!(!painted_near(&img, &vp, 0.0, -5.0), "opposite side is outside the angle range");
    }

    #[test]
    fn ellipse_rotation_swaps_the_long_axis() {
        let vp = test_viewport();

        let mut unrotated = Image::new(64, 64, [255, 255, 255]);
        rasterise_curve(
            &mut unrotated,
            &Curve::Ellipse { cu: 0.0, cv: 0.0, ru: 6.0, rv: 2.0, angle: 0.0 },
            vp.u_min,
            vp.u_max,
            vp.v_min,
            vp.v_max,
        );
        assert!(painted_near(&unrotated, &vp, 6.0, 0.0), "semi-major axis lies along +u");
        assert!(!painted_near(&unrotated, &vp, 0.0, 6.0), "semi-minor axis is only 2 units long");

        let mut rotated = Image::new(64, 64, [255, 255, 255]);
        rasterise_curve(
            &mut rotated,
            &Curve::Ellipse {
                cu: 0.0,
                cv: 0.0,
                ru: 6.0,
                rv: 2.0,
                angle: std::f64::consts::FRAC_PI_2,
            },
            vp.u_min,
            vp.u_max,
            vp.v_min,
            vp.v_max,
        );
        assert!(painted_near(&rotated, &vp, 0.0, 6.0), "a 90deg rotation swings the major axis onto +v");
        assert!(!painted_near(&rotated, &vp, 6.0, 0.0), "+u is now along the 2-unit semi-minor axis");
    }

    #[test]
    fn ellipse_arc_only_paints_within_its_parameter_range() {
        let mut img = Image::new(64, 64, [255, 255, 255]);
        let vp = test_viewport();
        rasterise_curve(
            &mut img,
            &Curve::EllipseArc {
                cu: 0.0,
                cv: 0.0,
                ru: 6.0,
                rv: 3.0,
                angle: 0.0,
                t0: 0.0,
                t1: std::f64::consts::FRAC_PI_2,
            },
            vp.u_min,
            vp.u_max,
            vp.v_min,
            vp.v_max,
        );
        assert!(painted_near(&img, &vp, 6.0, 0.0), "start of the arc should be painted");
        assert!(painted_near(&img, &vp, 0.0, 3.0), "end of the arc should be painted");
        assert!(!painted_near(&img, &vp, -6.0, 0.0), "opposite side is outside the parameter range");
    }

    #[test]
    fn polygon_closed_connects_last_point_to_first() {
        let vp = test_viewport();
        let points = vec![(-5.0, -5.0), (5.0, -5.0), (5.0, 5.0), (-5.0, 5.0)];

        let mut open = Image::new(64, 64, [255, 255, 255]);
        rasterise_curve(
            &mut open,
            &Curve::Polygon { points: points.clone(), closed: false },
            vp.u_min,
            vp.u_max,
            vp.v_min,
            vp.v_max,
        );
        assert!(!painted_near(&open, &vp, -5.0, 0.0), "open polygon should not close the last edge");

        let mut closed = Image::new(64, 64, [255, 255, 255]);
        rasterise_curve(
            &mut closed,
            &Curve::Polygon { points, closed: true },
            vp.u_min,
            vp.u_max,
            vp.v_min,
            vp.v_max,
        );
        assert!(painted_near(&closed, &vp, -5.0, 0.0), "closed polygon should paint the closing edge");
        assert!(painted_near(&closed, &vp, 0.0, -5.0), "closed polygon should also paint interior edges");
    }
}
