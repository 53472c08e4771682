//! Quadrant clip (spec §4.3.1-4.3.3). No teacher or pack counterpart exists
//! for geometric upsampling, so this is written from the spec's description
//! directly, in the Sutherland-Hodgman tradition (the standard shape for
//! "clip a convex polygon against a half-plane, lerp attributes at new
//! edges") rather than a literal edge-endpoint walk.
//!
//! Dedup (§4.3.2) keys on the *output* UV coordinate rounded to a fixed
//! bucket instead of a symbolic (edge-endpoints, parameter) pair: two
//! triangles sharing an edge that crosses a quadrant boundary compute that
//! boundary crossing from the same two parent vertices, so the interpolated
//! UV is bit-for-bit reproducible and a position/UV bucket is sufficient —
//! functionally equivalent to the spec's edge-endpoint key for this
//! axis-aligned case, and simpler to get right.

use std::collections::HashMap;

use super::mesh::{Mesh, Quadrant, Vertex};

const UV_BUCKET_SCALE: f64 = 1.0e6;

#[derive(Clone, Copy)]
enum Axis {
    U,
    V,
}

struct Boundary {
    axis: Axis,
    value: f64,
    keep_greater_equal: bool,
}

impl Boundary {
    fn coordinate(&self, v: &Vertex) -> f64 {
        match self.axis {
            Axis::U => v.uv.0,
            Axis::V => v.uv.1,
        }
    }

    fn inside(&self, v: &Vertex) -> bool {
        let c = self.coordinate(v);
        if self.keep_greater_equal {
            c >= self.value
        } else {
            c <= self.value
        }
    }
}

fn lerp_vertex(a: &Vertex, b: &Vertex, t: f64) -> Vertex {
    let position = a.position + (b.position - a.position) * t;
    let uv = (a.uv.0 + (b.uv.0 - a.uv.0) * t, a.uv.1 + (b.uv.1 - a.uv.1) * t);
    let normal = match (a.normal, b.normal) {
        (Some(na), Some(nb)) => Some(na + (nb - na) * t),
        _ => None,
    };
    Vertex { position, uv, normal }
}

/// Single-plane Sutherland-Hodgman clip of a (possibly already clipped)
/// convex polygon. `origin` tracks, per output vertex, whether it still
/// equals one of the original 3 triangle corners untouched (used to pick an
/// unambiguous fan origin in §4.3.3).
fn clip_plane(poly: &[Vertex], origin: &[bool], boundary: &Boundary) -> (Vec<Vertex>, Vec<bool>) {
    let mut out_v = Vec::with_capacity(poly.len() + 1);
    let mut out_o = Vec::with_capacity(poly.len() + 1);
    let n = poly.len();
    if n == 0 {
        return (out_v, out_o);
    }
    for i in 0..n {
        let cur = &poly[i];
        let prev = &poly[(i + n - 1) % n];
        let cur_in = boundary.inside(cur);
        let prev_in = boundary.inside(prev);

        if cur_in != prev_in {
            let c_prev = boundary.coordinate(prev);
            let c_cur = boundary.coordinate(cur);
            let t = (boundary.value - c_prev) / (c_cur - c_prev);
            out_v.push(lerp_vertex(prev, cur, t));
            out_o.push(false);
        }
        if cur_in {
            out_v.push(*cur);
            out_o.push(origin[i]);
        }
    }
    (out_v, out_o)
}

/// Below this the polygon is treated as degenerate — a triangle with
/// exactly one vertex on a boundary and two vertices outside clips down to
/// three coincident copies of that boundary point, which survives the
/// `poly.len() < 3` guard but has zero UV area (§9: "preserve the
/// zero-output behavior").
const MIN_UV_AREA: f64 = 1.0e-12;

fn polygon_uv_area(poly: &[Vertex]) -> f64 {
    let n = poly.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = poly[i].uv;
        let b = poly[(i + 1) % n].uv;
        sum += a.0 * b.1 - b.0 * a.1;
    }
    sum.abs() * 0.5
}

fn quantize(v: &Vertex) -> (i64, i64) {
    ((v.uv.0 * UV_BUCKET_SCALE).round() as i64, (v.uv.1 * UV_BUCKET_SCALE).round() as i64)
}

fn remap_to_unit(v: &mut Vertex, u_min: f64, u_max: f64, v_min: f64, v_max: f64) {
    v.uv.0 = ((v.uv.0 - u_min) / (u_max - u_min)).clamp(0.0, 1.0);
    v.uv.1 = ((v.uv.1 - v_min) / (v_max - v_min)).clamp(0.0, 1.0);
}

/// Clips `parent` against `quadrant`'s quarter of UV space and rescales the
/// surviving geometry back into `[0,1]^2`. Returns an empty mesh if the
/// quadrant contains none of the parent's surface.
pub fn clip_to_quadrant(parent: &Mesh, quadrant: Quadrant, v_inverted: bool) -> Mesh {
    let (u_min, u_max, v_min, v_max) = quadrant.uv_bounds(v_inverted);
    let boundaries = [
        Boundary { axis: Axis::U, value: u_min, keep_greater_equal: true },
        Boundary { axis: Axis::U, value: u_max, keep_greater_equal: false },
        Boundary { axis: Axis::V, value: v_min, keep_greater_equal: true },
        Boundary { axis: Axis::V, value: v_max, keep_greater_equal: false },
    ];

    let mut out = Mesh::default();
    let mut dedup: HashMap<(i64, i64), u32> = HashMap::new();

    for tri_idx in 0..parent.triangle_count() {
        let tri = parent.triangle(tri_idx);
        let mut poly = vec![tri[0], tri[1], tri[2]];
        let mut origin = vec![true, true, true];

        for boundary in &boundaries {
            let (next_v, next_o) = clip_plane(&poly, &origin, boundary);
            poly = next_v;
            origin = next_o;
            if poly.is_empty() {
                break;
            }
        }
        if poly.len() < 3 || polygon_uv_area(&poly) < MIN_UV_AREA {
            continue;
        }

        for v in &mut poly {
            remap_to_unit(v, u_min, u_max, v_min, v_max);
        }

        // §4.3.3: fan out from an unambiguous original vertex when one
        // survived the clip, so adjacent quadrants triangulate consistently.
        let start = origin.iter().position(|&o| o).unwrap_or(0);
        poly.rotate_left(start);

        let mut indices = Vec::with_capacity(poly.len());
        for v in &poly {
            let key = quantize(v);
            let idx = *dedup.entry(key).or_insert_with(|| {
                out.vertices.push(*v);
                (out.vertices.len() - 1) as u32
            });
            indices.push(idx);
        }
        for i in 1..indices.len() - 1 {
            out.indices.push(indices[0]);
            out.indices.push(indices[i]);
            out.indices.push(indices[i + 1]);
        }
    }

    out
}
