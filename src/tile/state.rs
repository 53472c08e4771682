//! Tile lifecycle state machine (spec §4.2) and the per-frame selection
//! tag each tile carries (spec §3.4).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation flag handed to the worker performing a `ContentLoading`
/// fetch/parse. The worker checks it before posting its result back; the
/// scheduler sets it when a tile is evicted or cancelled before completion
/// (spec §5, "Cancellation & timeouts").
///
/// `settled` is a second, independent flag guarding the in-flight slot: the
/// scheduler's `cancel_load` and the worker's own completion path race to
/// free that slot, and exactly one of them must actually decrement the
/// counter. `claim_settlement` is the compare-and-swap both sides go
/// through so whichever gets there first wins and the other is a no-op.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<CancelInner>);

#[derive(Debug)]
struct CancelInner {
    cancelled: AtomicBool,
    settled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(CancelInner {
            cancelled: AtomicBool::new(false),
            settled: AtomicBool::new(false),
        }))
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` exactly once across every clone of this token — to
    /// whichever caller (the cancelling scheduler, or the worker noticing
    /// completion) first claims responsibility for freeing the in-flight
    /// slot. Later callers get `false` and must not touch the counter.
    pub fn claim_settlement(&self) -> bool {
        self.0
            .settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tile lifecycle (spec §4.2):
/// `Unloaded -> ContentLoading -> ContentLoaded -> Done`, with side
/// transitions `ContentLoading -> FailedTemporary -> Unloaded` (retryable),
/// `* -> Failed` (terminal), and `Done -> Unloading -> Unloaded` (eviction).
#[derive(Debug, Clone)]
pub enum TileLoadState {
    Unloaded,
    ContentLoading { cancel: CancelToken, retry_count: u32 },
    ContentLoaded,
    Done,
    Unloading,
    /// Retryable failure (network, 5xx, refreshable 401). `retry_count`
    /// tracks attempts so far against the scheduler's retry budget.
    FailedTemporary { retry_count: u32 },
    /// Terminal failure (4xx other than 401, parse error, retry budget
    /// exhausted). The tile is skipped by future selections.
    Failed,
}

impl TileLoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, TileLoadState::ContentLoaded | TileLoadState::Done)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, TileLoadState::ContentLoading { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TileLoadState::Failed)
    }

    pub fn is_unloaded(&self) -> bool {
        matches!(self, TileLoadState::Unloaded)
    }
}

/// What the selector did with a tile last frame (spec §3.4). Drives the
/// "kick descendants" fix-up (§4.1.4): a tile transitions to a `*Kicked`
/// variant when it was added to the render list during a subtree visit
/// that later got undone in favor of an ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTag {
    None,
    Culled,
    Rendered,
    Refined,
    RenderedAndKicked,
    RefinedAndKicked,
}

impl Default for SelectionTag {
    fn default() -> Self {
        SelectionTag::None
    }
}

/// Paired tag + frame number, per spec §3.4 ("Each carries the frame number
/// when set").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    pub tag: SelectionTag,
    pub frame: u64,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            tag: SelectionTag::None,
            frame: 0,
        }
    }
}
