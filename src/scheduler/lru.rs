//! Intrusive LRU list over `Tile::lru_prev`/`lru_next` (spec §3.1: "A Tile
//! in `Done` is in the LRU list; a Tile in any other state is not"). Written
//! by hand rather than wrapped around a generic LRU crate, because eviction
//! (§4.2.3) must walk from the oldest entry while skipping render-set tiles
//! mid-sweep — a capability a byte-oriented off-the-shelf LRU (the kind
//! `abetterworld::cache::cache_native` wraps) doesn't expose.

use crate::tile::{TileArena, TileId};

#[derive(Debug, Default)]
pub struct LruList {
    head: Option<TileId>,
    tail: Option<TileId>,
    len: usize,
}

impl LruList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn oldest(&self) -> Option<TileId> {
        self.head
    }

    /// Unlinks `id` from wherever it currently sits (no-op if not linked).
    pub fn unlink(&mut self, tree: &mut TileArena, id: TileId) {
        let (prev, next) = (tree[id].lru_prev, tree[id].lru_next);
        if prev.is_none() && next.is_none() && self.head != Some(id) && self.tail != Some(id) {
            return;
        }
        match prev {
            Some(p) => tree[p].lru_next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => tree[n].lru_prev = prev,
            None => self.tail = prev,
        }
        tree[id].lru_prev = None;
        tree[id].lru_next = None;
        self.len = self.len.saturating_sub(1);
    }

    /// Links `id` at the most-recently-used end.
    pub fn push_back(&mut self, tree: &mut TileArena, id: TileId) {
        self.unlink(tree, id);
        tree[id].lru_prev = self.tail;
        tree[id].lru_next = None;
        match self.tail {
            Some(t) => tree[t].lru_next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    /// Moves an already-linked tile to the most-recently-used end; a no-op
    /// if it's already there. Called whenever the selector visits a `Done`
    /// tile (spec §4.2.3: "An LRU entry is moved to the back whenever its
    /// tile is visited by the selector").
    pub fn touch(&mut self, tree: &mut TileArena, id: TileId) {
        if self.tail == Some(id) {
            return;
        }
        self.push_back(tree, id);
    }

    pub fn next_after(&self, tree: &TileArena, id: TileId) -> Option<TileId> {
        tree[id].lru_next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingVolume, Sphere};
    use crate::tile::{RefineMode, Tile};
    use cgmath::Point3;

    fn sample_tile() -> Tile {
        Tile::new(
            BoundingVolume::Sphere(Sphere {
                center: Point3::new(0.0, 0.0, 0.0),
                radius: 1.0,
            }),
            1.0,
            RefineMode::Replace,
        )
    }

    #[test]
    fn push_and_evict_oldest_first() {
        let mut tree = TileArena::new();
        let a = tree.insert(sample_tile());
        let b = tree.insert(sample_tile());
        let c = tree.insert(sample_tile());
        let mut lru = LruList::new();
        lru.push_back(&mut tree, a);
        lru.push_back(&mut tree, b);
        lru.push_back(&mut tree, c);
        assert_eq!(lru.oldest(), Some(a));
        lru.touch(&mut tree, a);
        assert_eq!(lru.oldest(), Some(b));
        assert_eq!(lru.len(), 3);
        lru.unlink(&mut tree, b);
        assert_eq!(lru.oldest(), Some(c));
        assert_eq!(lru.len(), 2);
    }
}
