//! Frustum side-plane extraction, the Gribb/Hartmann row-combination trick
//! `abetterworld::helpers::matrix::extract_frustum_planes_reverse_z` uses
//! (generalized here to an ordinary, non-reverse-Z projection since only
//! the four side planes are needed — spec §2: "visibility against the four
//! side planes of the frustum" — and near/far don't affect their shape).

use cgmath::{InnerSpace, Matrix, Matrix4, Point3, Rad, Vector3};

use super::volumes::Plane;

pub fn side_planes(
    eye: Point3<f64>,
    target: Point3<f64>,
    up: Vector3<f64>,
    fov_y_radians: f64,
    aspect: f64,
) -> [Plane; 4] {
    // near/far are arbitrary: they shift the near/far planes, not the side
    // planes' normals or the eye-relative distance term.
    let proj = cgmath::perspective(Rad(fov_y_radians), aspect, 1.0, 2.0);
    let view = Matrix4::look_at_rh(eye, target, up);
    let pv = proj * view;

    let r0 = pv.row(0);
    let r1 = pv.row(1);
    let r3 = pv.row(3);

    let raw = [r3 + r0, r3 - r0, r3 + r1, r3 - r1]; // left, right, bottom, top

    raw.map(|p| {
        let normal = Vector3::new(p.x, p.y, p.z);
        let len = normal.magnitude();
        if len > 0.0 {
            Plane {
                normal: normal / len,
                distance: p.w / len,
            }
        } else {
            Plane {
                normal: Vector3::new(0.0, 0.0, 1.0),
                distance: 0.0,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::volumes::{BoundingVolume, Intersection, Sphere};

    #[test]
    fn point_straight_ahead_is_inside_all_side_planes() {
        let planes = side_planes(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, 0.0),
            std::f64::consts::FRAC_PI_3,
            1.0,
        );
        let s = BoundingVolume::Sphere(Sphere {
            center: Point3::new(0.0, 0.0, -10.0),
            radius: 1.0,
        });
        assert_eq!(s.intersect_frustum(&planes), Intersection::Inside);
    }

    #[test]
    fn point_far_to_the_side_is_outside() {
        let planes = side_planes(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, 0.0),
            std::f64::consts::FRAC_PI_3,
            1.0,
        );
        let s = BoundingVolume::Sphere(Sphere {
            center: Point3::new(1000.0, 0.0, -10.0),
            radius: 1.0,
        });
        assert_eq!(s.intersect_frustum(&planes), Intersection::Outside);
    }
}
