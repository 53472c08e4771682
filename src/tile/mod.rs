pub mod arena;
pub mod state;

pub use arena::{RefineMode, Tile, TileArena, TileContent, TileId};
pub use state::{CancelToken, SelectionState, SelectionTag, TileLoadState};
