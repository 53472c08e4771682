pub mod frustum;
pub mod view;
pub mod volumes;

pub use view::{GeodeticPosition, ViewState};
pub use volumes::{BoundingVolume, Intersection, OrientedBox, Plane, Region, Sphere};
