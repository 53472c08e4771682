//! `ViewUpdateResult` (spec §3.2): the per-frame output of `Selector::update_view`.

use crate::tile::TileId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadIntent {
    pub tile: TileId,
    /// Lower sorts first (spec §4.1, "Priority within a bucket is
    /// `distance_to_tile + depth_penalty`, lower first").
    pub priority: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ViewUpdateResult {
    pub tiles_to_render_this_frame: Vec<TileId>,
    pub tiles_loading_low_priority: Vec<LoadIntent>,
    pub tiles_loading_medium_priority: Vec<LoadIntent>,
    pub tiles_loading_high_priority: Vec<LoadIntent>,
    pub tiles_to_no_longer_render_this_frame: Vec<TileId>,
    pub tiles_visited: u64,
    pub culled_tiles_visited: u64,
    pub max_depth_visited: u32,
}
