//! CPU-side indexed mesh types for raster-overlay upsampling (spec §4.3).
//! Grounded loosely on `abetterworld::decode::types::Vertex`'s attribute
//! layout (position + normal + UV) but kept plain `f64` `cgmath` types
//! rather than a `#[repr(C)]` GPU vertex struct — GPU upload is a
//! `ResourcePreparer` concern, out of scope here (spec §1).

use cgmath::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub uv: (f64, f64),
    pub normal: Option<Vector3<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle(&self, i: usize) -> [Vertex; 3] {
        let base = i * 3;
        [
            self.vertices[self.indices[base] as usize],
            self.vertices[self.indices[base + 1] as usize],
            self.vertices[self.indices[base + 2] as usize],
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    LowerLeft,
    LowerRight,
    UpperLeft,
    UpperRight,
}

impl Quadrant {
    /// `(u_min, u_max, v_min, v_max)` in the parent's UV space, accounting
    /// for whether the V axis is stored inverted (spec §4.3: "a boolean
    /// indicating whether the UV V axis is inverted").
    pub fn uv_bounds(self, v_inverted: bool) -> (f64, f64, f64, f64) {
        let (u_min, u_max) = match self {
            Quadrant::LowerLeft | Quadrant::UpperLeft => (0.0, 0.5),
            Quadrant::LowerRight | Quadrant::UpperRight => (0.5, 1.0),
        };
        let lower = matches!(self, Quadrant::LowerLeft | Quadrant::LowerRight);
        let is_low_v = lower != v_inverted;
        let (v_min, v_max) = if is_low_v { (0.0, 0.5) } else { (0.5, 1.0) };
        (u_min, u_max, v_min, v_max)
    }
}

/// Per-edge skirt heights plus the geodetic "down" direction (spec §4.3.4).
#[derive(Debug, Clone, Copy)]
pub struct SkirtMetadata {
    pub down: Vector3<f64>,
    pub west_height: f64,
    pub south_height: f64,
    pub east_height: f64,
    pub north_height: f64,
    /// Index into `Mesh::vertices` where skirt (non-surface) vertices
    /// begin; surface indices are `0..non_skirt_vertex_count`.
    pub non_skirt_vertex_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct UpsampleResult {
    pub mesh: Mesh,
    pub skirt: Option<SkirtMetadata>,
}
