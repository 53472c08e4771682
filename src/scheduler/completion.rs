//! The message shape crossing the worker -> main-thread boundary (spec §5,
//! "workers ... produce outputs that are returned to the main thread via a
//! future"; concretely a `crossbeam_channel`, per SPEC_FULL §5).

use crate::interfaces::ParsedContent;
use crate::tile::TileId;

#[derive(Debug)]
pub enum Completion {
    Loaded {
        tile: TileId,
        parsed: ParsedContent,
        byte_size: u64,
    },
    FetchFailed {
        tile: TileId,
        permanent: bool,
    },
    Unauthorized {
        tile: TileId,
    },
    AuthRefreshed {
        tiles: Vec<TileId>,
        success: bool,
    },
}
