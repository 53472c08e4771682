//! Scenario and invariant tests for the raster-overlay upsampler (spec §8,
//! scenario 6 "split in half", plus the coverage and idempotence
//! invariants).

use crate::upsample::{clip_to_quadrant, Mesh, Quadrant, Vertex};
use cgmath::Point3;
use rand::Rng;

fn v(u: f64, vv: f64) -> Vertex {
    Vertex {
        position: Point3::new(u, vv, 0.0),
        uv: (u, vv),
        normal: None,
    }
}

/// Two triangles split along the (0,0)-(1,1) diagonal.
fn unit_square() -> Mesh {
    Mesh {
        vertices: vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

fn has_vertex_near(mesh: &Mesh, uv: (f64, f64)) -> bool {
    mesh.vertices.iter().any(|vert| (vert.uv.0 - uv.0).abs() < 1e-9 && (vert.uv.1 - uv.1).abs() < 1e-9)
}

/// Scenario 6: splitting a tile's raster mesh in half along its diagonal
/// puts the shared midpoint at opposite corners of the two quadrants it
/// now touches, since each quadrant rescales its own quarter back to
/// `[0,1]^2`.
#[test]
fn diagonal_midpoint_lands_on_opposite_corners_of_adjacent_quadrants() {
    let parent = unit_square();

    let lower_left = clip_to_quadrant(&parent, Quadrant::LowerLeft, false);
    assert!(has_vertex_near(&lower_left, (1.0, 1.0)), "parent's center should map to the LL quadrant's far corner");

    let upper_right = clip_to_quadrant(&parent, Quadrant::UpperRight, false);
    assert!(has_vertex_near(&upper_right, (0.0, 0.0)), "parent's center should map to the UR quadrant's near corner");
}

fn triangle_uv_area(mesh: &Mesh, tri_idx: usize) -> f64 {
    let tri = mesh.triangle(tri_idx);
    let (x1, y1) = tri[0].uv;
    let (x2, y2) = tri[1].uv;
    let (x3, y3) = tri[2].uv;
    0.5 * ((x2 - x1) * (y3 - y1) - (x3 - x1) * (y2 - y1)).abs()
}

fn total_uv_area(mesh: &Mesh) -> f64 {
    (0..mesh.triangle_count()).map(|i| triangle_uv_area(mesh, i)).sum()
}

/// Universal invariant: the four quadrant clips partition the parent's UV
/// area exactly, with no gaps or double coverage. Each quadrant's output
/// area is stated in its own rescaled `[0,1]^2` space, so it must be
/// divided by 4 (the rescale factor in each of U and V) before comparing
/// back against the parent's original area.
#[test]
fn upsample_coverage_preserves_total_uv_area() {
    let parent = unit_square();
    let parent_area = total_uv_area(&parent);

    let covered: f64 = [Quadrant::LowerLeft, Quadrant::LowerRight, Quadrant::UpperLeft, Quadrant::UpperRight]
        .into_iter()
        .map(|q| total_uv_area(&clip_to_quadrant(&parent, q, false)) / 4.0)
        .sum();

    assert!((covered - parent_area).abs() < 1e-9, "covered {covered} vs parent {parent_area}");
}

/// A triangle that lies entirely inside one quadrant clips to an identical
/// triangle (no new vertices introduced), just rescaled into the
/// quadrant's own `[0,1]^2`; the three other quadrants see no geometry at
/// all since nothing of the triangle falls inside them.
#[test]
fn triangle_fully_inside_one_quadrant_clips_without_subdivision() {
    let parent = Mesh {
        vertices: vec![v(0.0, 0.0), v(0.4, 0.0), v(0.0, 0.4)],
        indices: vec![0, 1, 2],
    };

    let lower_left = clip_to_quadrant(&parent, Quadrant::LowerLeft, false);
    assert_eq!(lower_left.triangle_count(), 1);
    assert!(has_vertex_near(&lower_left, (0.0, 0.0)));
    assert!(has_vertex_near(&lower_left, (0.8, 0.0)));
    assert!(has_vertex_near(&lower_left, (0.0, 0.8)));

    for q in [Quadrant::LowerRight, Quadrant::UpperLeft, Quadrant::UpperRight] {
        let clipped = clip_to_quadrant(&parent, q, false);
        assert_eq!(clipped.triangle_count(), 0, "quadrant {q:?} should see none of this triangle");
    }
}

/// Property test: the coverage invariant above holds for arbitrary
/// triangles, not just the diagonal-split unit square.
#[test]
fn upsample_coverage_holds_for_random_meshes() {
    let mut rng = rand::thread_rng();
    for _ in 0..50 {
        let verts: Vec<Vertex> = (0..3).map(|_| v(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0))).collect();
        let parent = Mesh {
            vertices: verts,
            indices: vec![0, 1, 2],
        };
        let parent_area = total_uv_area(&parent);
        let covered: f64 = [Quadrant::LowerLeft, Quadrant::LowerRight, Quadrant::UpperLeft, Quadrant::UpperRight]
            .into_iter()
            .map(|q| total_uv_area(&clip_to_quadrant(&parent, q, false)) / 4.0)
            .sum();
        assert!((covered - parent_area).abs() < 1e-6, "covered {covered} vs parent {parent_area}");
    }
}
