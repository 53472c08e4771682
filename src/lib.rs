//! `tileforge`: the selection, loading, and refinement engine for a
//! streaming 3D-tiles renderer (spec §1). Exposes the tile tree data model,
//! the view-dependent selector, the load scheduler, and the raster-overlay
//! upsampler as its public surface, plus `native` adapters for the external
//! interfaces a host plugs in (spec §6).

pub mod config;
pub mod error;
pub mod geometry;
pub mod helpers;
pub mod interfaces;
pub mod native;
pub mod overlay;
pub mod scheduler;
pub mod selection;
pub mod tile;
pub mod upsample;

#[cfg(test)]
mod tests;

pub use config::{FogDensityTable, TilesetOptions};
pub use error::{ResultExt, TfError};
pub use geometry::{BoundingVolume, GeodeticPosition, Intersection, OrientedBox, Region, Sphere, ViewState};
pub use helpers::init_tracing;
pub use interfaces::{
    AssetFetcher, AvailabilityRectangle, ContentParser, FetchResponse, ParseContext, ParsedContent,
    PreparedResource, RenderHandle, ResourcePreparer, TaskProcessor, TileDescriptor,
};
pub use overlay::{GeographicRectangle, OverlayTileKey, RasterMapping, RasterOverlayCache, RasterOverlayTile, RasterOverlayTileState};
pub use scheduler::LoadScheduler;
pub use selection::{LoadIntent, Selector, ViewUpdateResult};
pub use tile::{RefineMode, SelectionState, SelectionTag, Tile, TileArena, TileContent, TileId, TileLoadState};
pub use upsample::{upsample_quadrant, Mesh, Quadrant, SkirtMetadata, UpsampleResult, Vertex};
