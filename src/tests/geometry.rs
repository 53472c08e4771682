use super::common::view_looking_down_z;
use crate::geometry::{BoundingVolume, Intersection, Sphere};
use cgmath::Point3;

#[test]
fn eye_height_falls_back_to_origin_distance_without_geodetic_form() {
    let view = view_looking_down_z(6_371_500.0, 1000.0, std::f64::consts::FRAC_PI_3);
    // 6_371_500 - EARTH_RADIUS_M(6_371_000) == 500
    assert!((view.eye_height_above_ellipsoid() - 500.0).abs() < 1e-6);
}

#[test]
fn frustum_visibility_matches_intersect_frustum() {
    let view = view_looking_down_z(100.0, 1000.0, std::f64::consts::FRAC_PI_3);
    let planes = view.frustum_side_planes();
    let near = BoundingVolume::Sphere(Sphere {
        center: Point3::new(0.0, 0.0, 0.0),
        radius: 1.0,
    });
    let far_aside = BoundingVolume::Sphere(Sphere {
        center: Point3::new(10_000.0, 0.0, 0.0),
        radius: 1.0,
    });
    assert_eq!(view.intersect_frustum(&planes, &near), Intersection::Inside);
    assert_eq!(view.intersect_frustum(&planes, &far_aside), Intersection::Outside);
}

#[test]
fn distance_squared_matches_volume_query() {
    let view = view_looking_down_z(100.0, 1000.0, std::f64::consts::FRAC_PI_3);
    let volume = BoundingVolume::Sphere(Sphere {
        center: Point3::new(0.0, 0.0, 0.0),
        radius: 10.0,
    });
    let expected = volume.distance_squared_to(view.eye);
    assert_eq!(view.distance_squared_to(&volume), expected);
    assert!((expected - 90.0 * 90.0).abs() < 1e-6);
}
