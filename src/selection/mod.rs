pub mod frame;
pub mod result;
pub mod traversal;

pub use frame::FrameState;
pub use result::{LoadIntent, ViewUpdateResult};
pub use traversal::Selector;
