//! Shared fixtures for the scenario tests in this directory.

use cgmath::{Point3, Vector3};

use crate::geometry::{BoundingVolume, Sphere, ViewState};
use crate::tile::{RefineMode, Tile, TileLoadState};

pub fn sphere_tile(center: (f64, f64, f64), radius: f64, geometric_error: f64, refine: RefineMode) -> Tile {
    Tile::new(
        BoundingVolume::Sphere(Sphere {
            center: Point3::new(center.0, center.1, center.2),
            radius,
        }),
        geometric_error,
        refine,
    )
}

/// Marks a tile as already loaded (`Done`, with a content URI) so the
/// selector treats it as immediately renderable without queuing a load.
pub fn mark_loaded(tile: &mut Tile, uri: &str) {
    tile.content_uri = Some(uri.to_string());
    tile.state = TileLoadState::Done;
}

pub fn view_looking_down_z(eye_z: f64, viewport: f64, fov_y_radians: f64) -> ViewState {
    ViewState {
        eye: Point3::new(0.0, 0.0, eye_z),
        direction: Vector3::new(0.0, 0.0, -1.0),
        up: Vector3::new(0.0, 1.0, 0.0),
        viewport_width: viewport,
        viewport_height: viewport,
        fov_y_radians,
        geodetic_eye: None,
    }
}
