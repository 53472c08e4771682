//! Skirt regeneration (spec §4.3.4): after clipping, a quadrant's outer
//! edges are new tile boundaries that need their own skirt geometry so
//! adjacent tiles at different detail levels don't show gaps. No teacher
//! counterpart; grounded only in the spec's description of "extrude
//! boundary vertices downward by the edge's configured skirt height."

use std::collections::BTreeMap;

use cgmath::EuclideanSpace;

use super::mesh::{Mesh, SkirtMetadata};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Edge {
    West,
    South,
    East,
    North,
}

const EDGE_EPS: f64 = 1.0e-6;

fn classify(uv: (f64, f64)) -> Vec<Edge> {
    let mut edges = Vec::new();
    if uv.0 <= EDGE_EPS {
        edges.push(Edge::West);
    }
    if uv.0 >= 1.0 - EDGE_EPS {
        edges.push(Edge::East);
    }
    if uv.1 <= EDGE_EPS {
        edges.push(Edge::South);
    }
    if uv.1 >= 1.0 - EDGE_EPS {
        edges.push(Edge::North);
    }
    edges
}

fn height_for(edge: Edge, meta: &SkirtMetadata) -> f64 {
    match edge {
        Edge::West => meta.west_height,
        Edge::South => meta.south_height,
        Edge::East => meta.east_height,
        Edge::North => meta.north_height,
    }
}

fn along_coordinate(edge: Edge, uv: (f64, f64)) -> f64 {
    match edge {
        Edge::West | Edge::East => uv.1,
        Edge::South | Edge::North => uv.0,
    }
}

/// Appends skirt geometry to `mesh` in place and returns metadata describing
/// where the original surface vertices end. `mesh` must already be in
/// `[0,1]^2` UV space (post-`clip_to_quadrant`).
pub fn regenerate_skirt(mesh: &mut Mesh, meta: SkirtMetadata) -> SkirtMetadata {
    let surface_count = mesh.vertices.len();
    let mut by_edge: BTreeMap<Edge, Vec<(u32, f64)>> = BTreeMap::new();

    for (i, v) in mesh.vertices.iter().enumerate() {
        for edge in classify(v.uv) {
            by_edge.entry(edge).or_default().push((i as u32, along_coordinate(edge, v.uv)));
        }
    }

    for (edge, mut members) in by_edge {
        members.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let height = height_for(edge, &meta);
        if members.len() < 2 || height <= 0.0 {
            continue;
        }

        let mut extruded = Vec::with_capacity(members.len());
        for &(idx, _) in &members {
            let surface = mesh.vertices[idx as usize];
            let mut skirt_v = surface;
            skirt_v.position = surface.position - meta.down * height;
            mesh.vertices.push(skirt_v);
            extruded.push((mesh.vertices.len() - 1) as u32);
        }

        for w in 0..members.len() - 1 {
            let (a, _) = members[w];
            let (b, _) = members[w + 1];
            let a2 = extruded[w];
            let b2 = extruded[w + 1];
            mesh.indices.extend_from_slice(&[a, b, b2]);
            mesh.indices.extend_from_slice(&[a, b2, a2]);
        }
    }

    SkirtMetadata {
        non_skirt_vertex_count: surface_count,
        ..meta
    }
}
