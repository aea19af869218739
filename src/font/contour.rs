//! Contour flattening: tagged outline points -> polyline.
//!
//! TrueType contours are chains of quadratic arcs. A run of off-curve points
//! between two on-curve points is a chain of arcs whose joints sit at the
//! midpoints of adjacent control points; those joints are never stored in the
//! font. We rebuild them here and sample every arc `N + 1` times.
//!
//! Output points are shared between segments: the polyline starts with the
//! contour's first on-curve point and each segment appends everything after its
//! own start. A contour made only of on-curve points comes out unchanged.

use glam::Vec3;

use crate::font::outline::OutlinePoint;

/// Flattened contour, `z = 0`.
pub type Polyline = Vec<Vec3>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ContourError {
    #[error("contour has {len} points, limit is {limit}")]
    TooManyPoints { len: usize, limit: usize },
}

/// Reject contours larger than `limit` before they are staged.
pub fn check_contour_len(contour: &[OutlinePoint], limit: usize) -> Result<(), ContourError> {
    if contour.len() > limit {
        return Err(ContourError::TooManyPoints {
            len: contour.len(),
            limit,
        });
    }
    Ok(())
}

/// Flatten one closed contour into a polyline.
///
/// `subdivisions` is the number of steps per quadratic arc (0 is treated as 1).
/// Contours with fewer than two points produce an empty polyline.
pub fn extract_polyline(contour: &[OutlinePoint], subdivisions: u32) -> Polyline {
    let mut out = Polyline::new();
    extract_polyline_into(contour, subdivisions, &mut out);
    out
}

/// Like [`extract_polyline`], appending to `out` so callers can reuse a buffer.
pub fn extract_polyline_into(contour: &[OutlinePoint], subdivisions: u32, out: &mut Polyline) {
    if contour.len() < 2 {
        return;
    }
    let steps = subdivisions.max(1);

    let mut points = normalize_start(contour);
    if points.last().is_some_and(|p| !p.on_curve) {
        // Terminal segment is a curve: close it on an explicit on-curve point.
        points.push(points[0]);
    }

    let base = out.len();
    out.push(points[0].position);

    let mut start = 0usize;
    for k in 1..points.len() {
        if !points[k].on_curve {
            continue;
        }
        if k - start == 1 {
            out.push(points[k].position);
        } else {
            let controls: Vec<Vec3> = points[start + 1..k].iter().map(|p| p.position).collect();
            push_curve(
                points[start].position,
                &controls,
                points[k].position,
                steps,
                out,
            );
        }
        start = k;
    }

    // The contour is implicitly closed; a copy of the first point at the end is noise.
    if out.len() - base > 1 && out.last() == Some(&out[base]) {
        out.pop();
    }
}

/// Rotate the contour so it begins on an on-curve point.
///
/// A contour with no on-curve points at all gets a synthesized start at the
/// midpoint of its last and first control points.
fn normalize_start(contour: &[OutlinePoint]) -> Vec<OutlinePoint> {
    match contour.iter().position(|p| p.on_curve) {
        Some(0) => contour.to_vec(),
        Some(i) => contour[i..].iter().chain(&contour[..i]).copied().collect(),
        None => {
            let first = contour[0].position;
            let last = contour[contour.len() - 1].position;
            let mut points = Vec::with_capacity(contour.len() + 1);
            points.push(OutlinePoint {
                position: (first + last) * 0.5,
                on_curve: true,
            });
            points.extend_from_slice(contour);
            points
        }
    }
}

/// Emit the chain of quadratic arcs from `start` to `end` through `controls`.
fn push_curve(start: Vec3, controls: &[Vec3], end: Vec3, steps: u32, out: &mut Polyline) {
    let m = controls.len();
    for i in 0..m {
        let from = if i == 0 {
            start
        } else {
            midpoint(controls[i - 1], controls[i])
        };
        let to = if i + 1 == m {
            end
        } else {
            midpoint(controls[i], controls[i + 1])
        };
        let arc = [from, controls[i], to];

        for l in 1..=steps {
            let t = l as f64 / steps as f64;
            out.push(eval_bezier(&arc, t));
        }
    }
}

#[inline]
fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

/// `n!` as a float.
fn factorial(n: usize) -> f64 {
    (2..=n).fold(1.0, |acc, i| acc * i as f64)
}

/// Binomial coefficient `C(n, k)`.
pub fn binomial(n: usize, k: usize) -> f64 {
    factorial(n) / (factorial(k) * factorial(n - k))
}

/// Evaluate a Bezier curve of arbitrary degree at `t` with Bernstein weights.
///
/// `points` is the control polygon (degree = `points.len() - 1`). Arithmetic is
/// done in f64. At `t = 0` and `t = 1` the endpoints are returned unchanged.
pub fn eval_bezier(points: &[Vec3], t: f64) -> Vec3 {
    let Some(n) = points.len().checked_sub(1) else {
        return Vec3::ZERO;
    };
    if t <= 0.0 {
        return points[0];
    }
    if t >= 1.0 {
        return points[n];
    }

    let mut acc = [0.0f64; 3];
    for (i, p) in points.iter().enumerate() {
        let w = binomial(n, i) * (1.0 - t).powi((n - i) as i32) * t.powi(i as i32);
        acc[0] += p.x as f64 * w;
        acc[1] += p.y as f64 * w;
        acc[2] += p.z as f64 * w;
    }
    Vec3::new(acc[0] as f32, acc[1] as f32, acc[2] as f32)
}
