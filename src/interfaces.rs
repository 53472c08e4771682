//! The four small interfaces the core consumes from collaborators (spec
//! §6): `AssetFetcher`, `ContentParser`, `ResourcePreparer`, `TaskProcessor`.
//! Concrete native adapters live in `native_adapters`.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::error::TfError;
use crate::geometry::BoundingVolume;
use crate::tile::RefineMode;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub bytes: Bytes,
}

impl FetchResponse {
    /// spec §4.2.4: a 401 is the one status code that triggers the
    /// token-refresh hook rather than a plain transient-failure retry.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 5xx and network-adjacent statuses are retried (spec §7, "Fetch
    /// transient"); everything else client-side (other than 401) is
    /// permanent.
    pub fn is_transient_failure(&self) -> bool {
        self.status >= 500
    }
}

/// Given a URL and header pairs, fetch asynchronously. Implementations
/// must not mutate any engine state (spec §6).
pub trait AssetFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str, headers: &'a [(String, String)]) -> BoxFuture<'a, Result<FetchResponse, TfError>>;
}

/// Resolves relative links found inside parsed content (e.g. an external
/// tileset JSON's children).
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub uri: String,
    pub base_uri: String,
}

/// A geographic rectangle plus a quadtree level, used by implicit-tiling
/// subdivision schemes (spec §6, `ContentParser`; SPEC_FULL §3
/// [SUPPLEMENT]). `tileforge` stores these but does not interpret them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvailabilityRectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub level: u32,
}

/// A tile discovered while parsing content (e.g. an external tileset's
/// root, or B3DM batch children). The scheduler inserts these into the
/// arena as new children of the tile whose content produced them.
#[derive(Debug, Clone)]
pub struct TileDescriptor {
    pub bounding_volume: BoundingVolume,
    pub geometric_error: f64,
    pub refine: RefineMode,
    pub content_uri: Option<String>,
}

/// Opaque decoded-model handle. Real geometry/texture decoding is a
/// `ContentParser` concern and out of scope for `tileforge` itself (spec
/// §1); the core only needs to move this payload between states.
#[derive(Debug, Clone)]
pub struct OpaqueModel(pub Bytes);

#[derive(Debug, Clone, Default)]
pub struct ParsedContent {
    pub model: Option<OpaqueModel>,
    pub child_tiles: Option<Vec<TileDescriptor>>,
    pub tighter_bounding_volume: Option<BoundingVolume>,
    pub available_rectangles: Option<Vec<AvailabilityRectangle>>,
    pub byte_size: u64,
}

/// Given bytes plus the tile's URL and link-resolution context, decode.
pub trait ContentParser: Send + Sync {
    fn parse(&self, bytes: &[u8], uri: &str, ctx: &ParseContext) -> Result<ParsedContent, TfError>;
}

/// Worker-computed, format-neutral precomputation result, handed to the
/// main-thread upload call.
#[derive(Debug, Clone)]
pub struct PreparedResource(pub Bytes);

/// Opaque GPU resource handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// Two-phase GPU resource preparation: a worker-thread call that
/// precomputes format-neutral data, and a main-thread call that uploads to
/// the GPU; plus a symmetric release.
pub trait ResourcePreparer: Send + Sync {
    fn prepare_in_worker(&self, model: &ParsedContent) -> Result<PreparedResource, TfError>;
    fn prepare_in_main_thread(&self, prepared: PreparedResource) -> Result<RenderHandle, TfError>;
    fn release(&self, handle: RenderHandle);
}

/// Runs a closure on some worker thread. No ordering guarantee between
/// tasks (spec §6).
pub trait TaskProcessor: Send + Sync {
    fn start_task(&self, task: Box<dyn FnOnce() + Send>);
}
