//! Per-frame traversal state (spec §4.1: "constant during traversal").

use crate::config::TilesetOptions;
use crate::geometry::{Plane, ViewState};

/// Fog attenuation beyond which a tile is treated as fully obscured and
/// excluded from the render list (spec §4.1.1, "fog attenuation at
/// distance is below the cutoff"). Matches the usual Cesium convention of
/// culling once the fog factor crosses three quarters of full density.
pub const FOG_CUTOFF: f64 = 0.75;

#[derive(Debug, Clone, Copy)]
pub struct FrameState {
    pub frame_number: u64,
    pub previous_frame_number: u64,
    pub fog_density: f64,
    pub planes: [Plane; 4],
    pub eye_lon_lat_rad: Option<(f64, f64)>,
}

impl FrameState {
    pub fn new(view: &ViewState, options: &TilesetOptions, frame_number: u64) -> Self {
        let fog_density = options
            .fog_density_table
            .density_at_height(view.eye_height_above_ellipsoid());
        let eye_lon_lat_rad = view
            .geodetic_eye
            .map(|g| (g.longitude_deg.to_radians(), g.latitude_deg.to_radians()));
        Self {
            frame_number,
            previous_frame_number: frame_number.saturating_sub(1),
            fog_density,
            planes: view.frustum_side_planes(),
            eye_lon_lat_rad,
        }
    }

    /// `true` when the tile would be fully hidden by fog at the given
    /// eye-to-surface distance.
    pub fn fog_culled(&self, distance: f64) -> bool {
        let fog_distance = distance * self.fog_density;
        let fog_factor = 1.0 - (-(fog_distance * fog_distance)).exp();
        fog_factor > FOG_CUTOFF
    }
}
