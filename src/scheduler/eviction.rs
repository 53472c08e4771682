//! Byte-budgeted eviction sweep (spec §4.2.3). Walks the LRU from the
//! oldest entry, skipping anything in this frame's render set, until the
//! resident byte total is back under budget or nothing evictable is left.

use std::collections::HashSet;

use tracing::debug;

use crate::interfaces::ResourcePreparer;
use crate::tile::{TileArena, TileId, TileLoadState};

use super::lru::LruList;

/// Returns the number of bytes freed.
pub fn evict(
    tree: &mut TileArena,
    lru: &mut LruList,
    resident_bytes: &mut u64,
    budget: u64,
    rendered: &[TileId],
    preparer: &dyn ResourcePreparer,
) -> u64 {
    if *resident_bytes <= budget {
        return 0;
    }
    let rendered_set: HashSet<TileId> = rendered.iter().copied().collect();
    let mut freed = 0u64;
    let mut cursor = lru.oldest();

    while *resident_bytes > budget {
        let Some(id) = cursor else { break };
        let next = lru.next_after(tree, id);
        if rendered_set.contains(&id) {
            cursor = next;
            continue;
        }

        tree[id].state = TileLoadState::Unloading;
        if let Some(content) = tree[id].content.take() {
            *resident_bytes = resident_bytes.saturating_sub(content.byte_size);
            freed += content.byte_size;
            if let Some(handle) = content.render_handle {
                preparer.release(handle);
            }
        }
        lru.unlink(tree, id);
        tree[id].state = TileLoadState::Unloaded;
        debug!(tile = id.0, "evicted");

        cursor = next;
    }

    freed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingVolume, Sphere};
    use crate::interfaces::{ParsedContent, PreparedResource, RenderHandle};
    use crate::tile::{RefineMode, Tile, TileContent};
    use cgmath::Point3;

    struct NoopPreparer;
    impl ResourcePreparer for NoopPreparer {
        fn prepare_in_worker(&self, _model: &ParsedContent) -> Result<PreparedResource, crate::error::TfError> {
            unreachable!()
        }
        fn prepare_in_main_thread(&self, _prepared: PreparedResource) -> Result<RenderHandle, crate::error::TfError> {
            unreachable!()
        }
        fn release(&self, _handle: RenderHandle) {}
    }

    fn loaded_tile(byte_size: u64) -> Tile {
        let mut t = Tile::new(
            BoundingVolume::Sphere(Sphere {
                center: Point3::new(0.0, 0.0, 0.0),
                radius: 1.0,
            }),
            1.0,
            RefineMode::Replace,
        );
        t.content_uri = Some("x".into());
        t.state = TileLoadState::Done;
        t.content = Some(TileContent {
            model: ParsedContent::default(),
            raster_mappings: Vec::new(),
            byte_size,
            render_handle: None,
        });
        t
    }

    #[test]
    fn never_evicts_rendered_tiles() {
        let mut tree = TileArena::new();
        let a = tree.insert(loaded_tile(100));
        let b = tree.insert(loaded_tile(100));
        let mut lru = LruList::new();
        lru.push_back(&mut tree, a);
        lru.push_back(&mut tree, b);
        let mut resident = 200u64;
        let preparer = NoopPreparer;

        evict(&mut tree, &mut lru, &mut resident, 50, &[a], &preparer);

        assert!(matches!(tree[a].state, TileLoadState::Done));
        assert!(matches!(tree[b].state, TileLoadState::Unloaded));
        assert_eq!(resident, 100);
    }
}
