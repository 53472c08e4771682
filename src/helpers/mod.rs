pub mod async_runtime;
pub mod coord_utils;
pub mod hash;
pub mod logging;

pub use hash::hash_uri;
pub use logging::init_tracing;
