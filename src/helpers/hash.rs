//! URI hashing for `TileId` derivation and cache keys, adapted from
//! `abetterworld`'s flat `helpers.rs` (`hash_uri`).

use xxhash_rust::xxh3::xxh3_64;

pub fn hash_uri(uri: &str) -> u64 {
    xxh3_64(uri.as_bytes())
}
