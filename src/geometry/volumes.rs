//! Bounding-volume variants (spec §3.1) and the two queries the selector
//! needs against them: frustum-plane intersection and nearest-point
//! distance². Modeled as a tagged sum type matched by hand rather than
//! dispatched through a trait object, per DESIGN NOTES §9
//! ("Bounding-volume polymorphism via visitor ... implement as a tagged sum
//! type with a match; do not introduce virtual dispatch").

use cgmath::{EuclideanSpace, InnerSpace, Matrix3, Point3, SquareMatrix, Vector3};

use crate::helpers::coord_utils::geodetic_to_ecef_z_up;

/// A frustum side plane in point-normal form: points `p` with
/// `normal.dot(p) + distance >= 0` are on the inside.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub distance: f64,
}

impl Plane {
    pub fn signed_distance(&self, p: Point3<f64>) -> f64 {
        self.normal.dot(p.to_vec()) + self.distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    Outside,
    Intersecting,
    Inside,
}

impl Intersection {
    fn combine(self, other: Intersection) -> Intersection {
        use Intersection::*;
        match (self, other) {
            (Outside, _) | (_, Outside) => Outside,
            (Intersecting, _) | (_, Intersecting) => Intersecting,
            (Inside, Inside) => Inside,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Point3<f64>,
    pub half_axes: [Vector3<f64>; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

/// A geographic rectangle plus a height range, in radians for lon/lat
/// (matching the 3D Tiles `region` convention) and meters for height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl Region {
    fn corner(&self, lon: f64, lat: f64, height: f64) -> Point3<f64> {
        geodetic_to_ecef_z_up(lat.to_degrees(), lon.to_degrees(), height)
    }

    fn corners(&self) -> [Point3<f64>; 8] {
        [
            self.corner(self.west, self.south, self.min_height),
            self.corner(self.east, self.south, self.min_height),
            self.corner(self.east, self.north, self.min_height),
            self.corner(self.west, self.north, self.min_height),
            self.corner(self.west, self.south, self.max_height),
            self.corner(self.east, self.south, self.max_height),
            self.corner(self.east, self.north, self.max_height),
            self.corner(self.west, self.north, self.max_height),
        ]
    }

    fn center(&self) -> Point3<f64> {
        self.corner(
            (self.west + self.east) * 0.5,
            (self.south + self.north) * 0.5,
            (self.min_height + self.max_height) * 0.5,
        )
    }

    /// Clamp a query point's geodetic coordinates into the rectangle and
    /// return the corresponding ECEF point; `clamp_height` controls whether
    /// the height band is also clamped (false for the loose-fitting-heights
    /// variant, which treats its height range as unreliable).
    fn nearest_point(&self, query_lon: f64, query_lat: f64, query_height: f64, clamp_height: bool) -> Point3<f64> {
        let lon = query_lon.clamp(self.west, self.east);
        let lat = query_lat.clamp(self.south, self.north);
        let height = if clamp_height {
            query_height.clamp(self.min_height, self.max_height)
        } else {
            query_height.clamp(self.min_height, self.max_height).min(query_height).max(self.min_height)
        };
        self.corner(lon, lat, height)
    }
}

/// Inverse geodetic conversion good enough for nearest-point clamping: the
/// ellipsoid is treated as a sphere of Earth's mean radius, consistent with
/// `abetterworld::dynamics::camera::EARTH_RADIUS_M` being used the same way
/// for near/far-plane heuristics rather than exact WGS84 inversion.
fn ecef_to_approx_geodetic(p: Point3<f64>) -> (f64, f64, f64) {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let r = p.to_vec().magnitude();
    let lat = (p.z / r.max(1e-9)).asin();
    let lon = p.y.atan2(p.x);
    let height = r - EARTH_RADIUS_M;
    (lon, lat, height)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    OrientedBox(OrientedBox),
    Region(Region),
    Sphere(Sphere),
    RegionWithLooseFittingHeights(Region),
}

impl BoundingVolume {
    pub fn center(&self) -> Point3<f64> {
        match self {
            BoundingVolume::OrientedBox(b) => b.center,
            BoundingVolume::Region(r) => r.center(),
            BoundingVolume::Sphere(s) => s.center,
            BoundingVolume::RegionWithLooseFittingHeights(r) => r.center(),
        }
    }

    /// Tri-state visibility against a single frustum side plane.
    pub fn intersect_plane(&self, plane: &Plane) -> Intersection {
        match self {
            BoundingVolume::OrientedBox(b) => {
                let s = plane.normal.dot(b.center.to_vec()) + plane.distance;
                let r = b
                    .half_axes
                    .iter()
                    .map(|axis| plane.normal.dot(*axis).abs())
                    .sum::<f64>();
                if s - r > 0.0 {
                    Intersection::Inside
                } else if s + r < 0.0 {
                    Intersection::Outside
                } else {
                    Intersection::Intersecting
                }
            }
            BoundingVolume::Sphere(sp) => {
                let s = plane.signed_distance(sp.center);
                if s > sp.radius {
                    Intersection::Inside
                } else if s < -sp.radius {
                    Intersection::Outside
                } else {
                    Intersection::Intersecting
                }
            }
            BoundingVolume::Region(r) | BoundingVolume::RegionWithLooseFittingHeights(r) => {
                let mut result: Option<Intersection> = None;
                for corner in r.corners() {
                    let s = plane.signed_distance(corner);
                    let c = if s > 0.0 {
                        Intersection::Inside
                    } else {
                        Intersection::Outside
                    };
                    result = Some(match result {
                        None => c,
                        Some(prev) if prev == c => prev,
                        Some(_) => Intersection::Intersecting,
                    });
                }
                result.unwrap_or(Intersection::Outside)
            }
        }
    }

    /// Visibility against all four side planes of the frustum: `Outside`
    /// if any plane fully excludes the volume, `Inside` if all four fully
    /// contain it, `Intersecting` otherwise.
    pub fn intersect_frustum(&self, planes: &[Plane; 4]) -> Intersection {
        let mut acc = Intersection::Inside;
        for plane in planes {
            let r = self.intersect_plane(plane);
            if r == Intersection::Outside {
                return Intersection::Outside;
            }
            acc = acc.combine(r);
        }
        acc
    }

    /// Squared distance from `eye` to the nearest point on the volume's
    /// surface (0 if `eye` is inside).
    pub fn distance_squared_to(&self, eye: Point3<f64>) -> f64 {
        match self {
            BoundingVolume::OrientedBox(b) => {
                let nearest = obb_closest_point(b, eye);
                (nearest - eye).magnitude2()
            }
            BoundingVolume::Sphere(s) => {
                let d = (s.center - eye).magnitude() - s.radius.max(0.0);
                d.max(0.0).powi(2)
            }
            BoundingVolume::Region(r) => {
                let (lon, lat, height) = ecef_to_approx_geodetic(eye);
                let nearest = r.nearest_point(lon, lat, height, true);
                (nearest - eye).magnitude2()
            }
            BoundingVolume::RegionWithLooseFittingHeights(r) => {
                let (lon, lat, height) = ecef_to_approx_geodetic(eye);
                let nearest = r.nearest_point(lon, lat, height, false);
                (nearest - eye).magnitude2()
            }
        }
    }

    /// Exact point-in-volume test, used for `viewer_request_volume`
    /// eligibility (spec §3.1: "the tile is only eligible for rendering
    /// when the eye lies inside it").
    pub fn contains_point(&self, p: Point3<f64>) -> bool {
        match self {
            BoundingVolume::OrientedBox(b) => {
                let basis = Matrix3::from_cols(b.half_axes[0], b.half_axes[1], b.half_axes[2]);
                let Some(inv_basis) = basis.invert() else {
                    return false;
                };
                let local = inv_basis * (p - b.center);
                local.x.abs() <= 1.0 && local.y.abs() <= 1.0 && local.z.abs() <= 1.0
            }
            BoundingVolume::Sphere(s) => (p - s.center).magnitude2() <= s.radius * s.radius,
            BoundingVolume::Region(r) | BoundingVolume::RegionWithLooseFittingHeights(r) => {
                let (lon, lat, height) = ecef_to_approx_geodetic(p);
                lon >= r.west
                    && lon <= r.east
                    && lat >= r.south
                    && lat <= r.north
                    && height >= r.min_height
                    && height <= r.max_height
            }
        }
    }

    /// A conservative covering sphere, used by callers (e.g. the upsampler's
    /// host) that need a cheap single-number size estimate.
    pub fn bounding_sphere_radius(&self) -> f64 {
        match self {
            BoundingVolume::OrientedBox(b) => {
                b.half_axes.iter().map(|a| a.magnitude2()).sum::<f64>().sqrt()
            }
            BoundingVolume::Sphere(s) => s.radius,
            BoundingVolume::Region(r) | BoundingVolume::RegionWithLooseFittingHeights(r) => {
                let center = r.center();
                r.corners()
                    .iter()
                    .map(|c| (*c - center).magnitude())
                    .fold(0.0, f64::max)
            }
        }
    }
}

fn obb_closest_point(b: &OrientedBox, point: Point3<f64>) -> Point3<f64> {
    let basis = Matrix3::from_cols(b.half_axes[0], b.half_axes[1], b.half_axes[2]);
    let Some(inv_basis) = basis.invert() else {
        return b.center;
    };
    let local = inv_basis * (point - b.center);
    if local.x.abs() <= 1.0 && local.y.abs() <= 1.0 && local.z.abs() <= 1.0 {
        return point;
    }
    let clamped = Vector3::new(
        local.x.clamp(-1.0, 1.0),
        local.y.clamp(-1.0, 1.0),
        local.z.clamp(-1.0, 1.0),
    );
    b.center + basis * clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_distance_zero_when_inside() {
        let s = BoundingVolume::Sphere(Sphere {
            center: Point3::new(0.0, 0.0, 0.0),
            radius: 10.0,
        });
        assert_eq!(s.distance_squared_to(Point3::new(1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn sphere_distance_outside() {
        let s = BoundingVolume::Sphere(Sphere {
            center: Point3::new(0.0, 0.0, 0.0),
            radius: 10.0,
        });
        let d2 = s.distance_squared_to(Point3::new(0.0, 0.0, 1000.0));
        assert!((d2 - 990.0 * 990.0).abs() < 1e-6);
    }

    #[test]
    fn plane_fully_outside() {
        let s = BoundingVolume::Sphere(Sphere {
            center: Point3::new(100.0, 0.0, 0.0),
            radius: 1.0,
        });
        // plane with normal +x, inside = x > -distance; distance = 0 means inside is x>0
        let plane = Plane {
            normal: Vector3::new(-1.0, 0.0, 0.0),
            distance: -50.0,
        };
        assert_eq!(s.intersect_plane(&plane), Intersection::Outside);
    }
}
