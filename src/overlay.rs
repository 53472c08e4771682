//! Raster overlay tiles and their per-host-tile mapping (spec §3.1, §3.3).
//! Overlay tiles are owned by a refcounted cache and referenced from each
//! host `Tile` by a shared handle, per DESIGN NOTES §9; the same ownership
//! shape `abetterworld::cache::cache_shared` uses for its tileset byte
//! cache, built here on `dashmap` rather than a bespoke `RwLock<HashMap>`.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicRectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterOverlayTileState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

impl RasterOverlayTileState {
    fn to_u8(self) -> u8 {
        match self {
            RasterOverlayTileState::Unloaded => 0,
            RasterOverlayTileState::Loading => 1,
            RasterOverlayTileState::Loaded => 2,
            RasterOverlayTileState::Failed => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => RasterOverlayTileState::Loading,
            2 => RasterOverlayTileState::Loaded,
            3 => RasterOverlayTileState::Failed,
            _ => RasterOverlayTileState::Unloaded,
        }
    }
}

/// A single overlay texture tile, owned by the overlay cache and shared
/// (via `Arc`) with every `RasterMapping` that points to it.
#[derive(Debug)]
pub struct RasterOverlayTile {
    pub rectangle: GeographicRectangle,
    state: AtomicU8,
    references: AtomicU32,
}

impl RasterOverlayTile {
    pub fn new(rectangle: GeographicRectangle) -> Self {
        Self {
            rectangle,
            state: AtomicU8::new(RasterOverlayTileState::Unloaded.to_u8()),
            references: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> RasterOverlayTileState {
        RasterOverlayTileState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: RasterOverlayTileState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    pub fn reference_count(&self) -> u32 {
        self.references.load(Ordering::Acquire)
    }

    fn add_ref(&self) {
        self.references.fetch_add(1, Ordering::AcqRel);
    }

    fn remove_ref(&self) {
        self.references.fetch_sub(1, Ordering::AcqRel);
    }

    /// Eligible for the overlay cache to free once unreferenced (spec
    /// §3.3: "when zero and state=Loaded, may be freed").
    pub fn is_freeable(&self) -> bool {
        self.reference_count() == 0 && self.state() == RasterOverlayTileState::Loaded
    }
}

/// A per-tile association of an overlay texture tile to a rectangle in the
/// host tile's UV space (spec §3.1).
#[derive(Debug, Clone)]
pub struct RasterMapping {
    pub overlay_tile: Arc<RasterOverlayTile>,
    pub uv_translation: (f64, f64),
    pub uv_scale: (f64, f64),
    pub attached: bool,
}

impl RasterMapping {
    pub fn new(overlay_tile: Arc<RasterOverlayTile>, uv_translation: (f64, f64), uv_scale: (f64, f64)) -> Self {
        overlay_tile.add_ref();
        Self {
            overlay_tile,
            uv_translation,
            uv_scale,
            attached: false,
        }
    }
}

impl Drop for RasterMapping {
    fn drop(&mut self) {
        self.overlay_tile.remove_ref();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayTileKey {
    pub overlay_id: u64,
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

/// Refcounted cache of overlay tiles, shared across every `RasterMapping`
/// pointing at the same quadtree cell of the same overlay.
#[derive(Debug, Default)]
pub struct RasterOverlayCache {
    tiles: DashMap<OverlayTileKey, Arc<RasterOverlayTile>>,
}

impl RasterOverlayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, key: OverlayTileKey, rectangle: GeographicRectangle) -> Arc<RasterOverlayTile> {
        self.tiles
            .entry(key)
            .or_insert_with(|| Arc::new(RasterOverlayTile::new(rectangle)))
            .clone()
    }

    /// Drops cache entries with no outstanding `RasterMapping` references
    /// and `Loaded` state (spec §3.3). Called opportunistically, e.g.
    /// alongside the scheduler's eviction sweep.
    pub fn sweep_unreferenced(&self) {
        self.tiles.retain(|_, tile| !tile.is_freeable());
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
