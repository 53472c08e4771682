//! `ViewState` (spec §2): immutable per-frame camera input, plus the two
//! queries the selector runs against a bounding volume.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use super::frustum::side_planes;
use super::volumes::{BoundingVolume, Intersection, Plane};

/// Geodetic form of the eye (degrees, degrees, meters above the ellipsoid),
/// used only for the fog-density lookup and `render_tiles_under_camera`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPosition {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub height_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub eye: Point3<f64>,
    pub direction: Vector3<f64>,
    pub up: Vector3<f64>,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub fov_y_radians: f64,
    pub geodetic_eye: Option<GeodeticPosition>,
}

impl ViewState {
    pub fn aspect(&self) -> f64 {
        self.viewport_width / self.viewport_height.max(1e-9)
    }

    pub fn frustum_side_planes(&self) -> [Plane; 4] {
        let direction = if self.direction.magnitude2() > 0.0 {
            self.direction.normalize()
        } else {
            Vector3::new(0.0, 0.0, -1.0)
        };
        side_planes(
            self.eye,
            self.eye + direction,
            self.up,
            self.fov_y_radians,
            self.aspect(),
        )
    }

    /// Eye height above the ellipsoid, used for the fog density lookup
    /// (spec §4.1). Falls back to distance from the coordinate origin minus
    /// Earth's mean radius when no geodetic form was supplied.
    pub fn eye_height_above_ellipsoid(&self) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;
        match self.geodetic_eye {
            Some(g) => g.height_m,
            None => self.eye.to_vec().magnitude() - EARTH_RADIUS_M,
        }
    }

    pub fn intersect_frustum(&self, planes: &[Plane; 4], volume: &BoundingVolume) -> Intersection {
        volume.intersect_frustum(planes)
    }

    pub fn distance_squared_to(&self, volume: &BoundingVolume) -> f64 {
        volume.distance_squared_to(self.eye)
    }
}
