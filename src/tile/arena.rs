//! The tile tree (spec §3.1), modeled as an arena per DESIGN NOTES §9:
//! children are owned by the arena's single `Vec<Tile>`; `parent` is a
//! non-owning index back-reference rather than an `Rc`/`Weak` pair.

use cgmath::Matrix4;

use crate::geometry::BoundingVolume;
use crate::interfaces::{ParsedContent, RenderHandle};
use crate::overlay::RasterMapping;
use crate::tile::state::{SelectionState, TileLoadState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineMode {
    Add,
    Replace,
}

/// Present iff a tile's state is `ContentLoaded` or `Done` (spec §3.1).
#[derive(Debug, Clone)]
pub struct TileContent {
    pub model: ParsedContent,
    pub raster_mappings: Vec<RasterMapping>,
    /// Approximate resident byte size, used by the scheduler's byte-budget
    /// eviction sweep (spec §4.2.3).
    pub byte_size: u64,
    /// Set once `ResourcePreparer::prepare_in_main_thread` has run
    /// (state `Done`); released on eviction.
    pub render_handle: Option<RenderHandle>,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub bounding_volume: BoundingVolume,
    pub viewer_request_volume: Option<BoundingVolume>,
    pub geometric_error: f64,
    pub refine: RefineMode,
    pub transform: Matrix4<f64>,
    pub parent: Option<TileId>,
    pub children: Vec<TileId>,
    pub content_uri: Option<String>,
    pub state: TileLoadState,
    pub content: Option<TileContent>,

    // Per-frame scratch (spec §3.1, §3.4).
    pub last_selection_state: SelectionState,
    pub last_selection_result_frame: u64,

    // Intrusive LRU links (spec §3.1: "Done is in the LRU list; a tile in
    // any other state is not"). Owned and walked by `scheduler::lru`.
    pub lru_prev: Option<TileId>,
    pub lru_next: Option<TileId>,
}

impl Tile {
    pub fn new(bounding_volume: BoundingVolume, geometric_error: f64, refine: RefineMode) -> Self {
        Self {
            bounding_volume,
            viewer_request_volume: None,
            geometric_error,
            refine,
            transform: Matrix4::from_scale(1.0),
            parent: None,
            children: Vec::new(),
            content_uri: None,
            state: TileLoadState::Unloaded,
            content: None,
            last_selection_state: SelectionState::default(),
            last_selection_result_frame: 0,
            lru_prev: None,
            lru_next: None,
        }
    }

    pub fn is_empty_tile(&self) -> bool {
        self.content_uri.is_none()
    }

    /// A tile with no content URI is "empty": pure hierarchy, trivially
    /// renderable without ever loading (spec §4.1, "Errors").
    pub fn is_renderable(&self) -> bool {
        self.is_empty_tile() || self.state.is_loaded()
    }

    pub fn byte_size(&self) -> u64 {
        self.content.as_ref().map(|c| c.byte_size).unwrap_or(0)
    }
}

/// Owns the tile tree. Tiles are never removed from the backing `Vec` once
/// inserted — "removal" in the spec's sense is a content/state reset, never
/// a deallocation — so `TileId`s stay valid for the arena's lifetime and
/// the `children` vector shape is stable across a frame's traversal.
#[derive(Debug, Default)]
pub struct TileArena {
    tiles: Vec<Tile>,
}

impl TileArena {
    pub fn new() -> Self {
        Self { tiles: Vec::new() }
    }

    pub fn insert(&mut self, tile: Tile) -> TileId {
        let id = TileId(self.tiles.len() as u32);
        self.tiles.push(tile);
        id
    }

    pub fn add_child(&mut self, parent: TileId, mut child: Tile) -> TileId {
        child.parent = Some(parent);
        let id = self.insert(child);
        self[parent].children.push(id);
        id
    }

    pub fn get(&self, id: TileId) -> &Tile {
        &self.tiles[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TileId) -> &mut Tile {
        &mut self.tiles[id.0 as usize]
    }

    pub fn try_get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.tiles.len() as u32).map(TileId)
    }
}

impl std::ops::Index<TileId> for TileArena {
    type Output = Tile;
    fn index(&self, id: TileId) -> &Tile {
        self.get(id)
    }
}

impl std::ops::IndexMut<TileId> for TileArena {
    fn index_mut(&mut self, id: TileId) -> &mut Tile {
        self.get_mut(id)
    }
}
