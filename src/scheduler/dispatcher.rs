//! Tile load dispatch (§4.2.1), completion draining (§4.2.2), and the
//! `ContentLoaded -> Done` GPU-upload step, tying together the concurrency
//! model of spec §5. Grounded on `abetterworld::content::download_client`
//! for the fetch shape and `abetterworld::helpers::async_helper` for
//! running the fetch future on a process-wide Tokio runtime; the worker
//! pool that performs the CPU-bound parse step is whatever `TaskProcessor`
//! the host plugs in (native adapter: `threadpool`, per `native_adapters`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::config::TilesetOptions;
use crate::error::TfError;
use crate::interfaces::{AssetFetcher, ContentParser, ParseContext, ResourcePreparer, TaskProcessor};
use crate::selection::{LoadIntent, ViewUpdateResult};
use crate::tile::{CancelToken, TileArena, TileContent, TileId, TileLoadState};

use super::auth::{AuthGate, TokenRefresher};
use super::completion::Completion;
use super::eviction::evict;
use super::lru::LruList;

const MAX_RETRIES: u32 = 5;

/// Promotes load intents into outstanding fetches, advances the tile state
/// machine, and runs the eviction sweep. Owns the concurrency primitives
/// (in-flight counter, completion channel) and the resident-bytes LRU.
pub struct LoadScheduler {
    fetcher: Arc<dyn AssetFetcher>,
    parser: Arc<dyn ContentParser>,
    tasks: Arc<dyn TaskProcessor>,
    token_refresher: Option<Arc<dyn TokenRefresher>>,

    in_flight: Arc<AtomicUsize>,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,

    lru: LruList,
    resident_bytes: u64,
    auth_gate: AuthGate,
}

impl LoadScheduler {
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        parser: Arc<dyn ContentParser>,
        tasks: Arc<dyn TaskProcessor>,
        token_refresher: Option<Arc<dyn TokenRefresher>>,
    ) -> Self {
        let (completions_tx, completions_rx) = unbounded();
        Self {
            fetcher,
            parser,
            tasks,
            token_refresher,
            in_flight: Arc::new(AtomicUsize::new(0)),
            completions_tx,
            completions_rx,
            lru: LruList::new(),
            resident_bytes: 0,
            auth_gate: AuthGate::new(),
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn resident_bytes(&self) -> u64 {
        self.resident_bytes
    }

    /// §4.2.1: sorts each bucket by priority (already ascending out of the
    /// selector) and drains High -> Medium -> Low into new
    /// `Unloaded/FailedTemporary -> ContentLoading` transitions, stopping
    /// once the in-flight counter reaches the configured cap.
    pub fn dispatch(&mut self, tree: &mut TileArena, view_update: &ViewUpdateResult, options: &TilesetOptions) -> Result<(), TfError> {
        for bucket in [
            &view_update.tiles_loading_high_priority,
            &view_update.tiles_loading_medium_priority,
            &view_update.tiles_loading_low_priority,
        ] {
            self.dispatch_bucket(tree, bucket, options)?;
            if self.in_flight_count() >= options.maximum_simultaneous_tile_loads {
                break;
            }
        }
        Ok(())
    }

    fn dispatch_bucket(&mut self, tree: &mut TileArena, bucket: &[LoadIntent], options: &TilesetOptions) -> Result<(), TfError> {
        for intent in bucket {
            if self.in_flight_count() >= options.maximum_simultaneous_tile_loads {
                return Ok(());
            }
            self.start_load(tree, intent.tile)?;
        }
        Ok(())
    }

    fn start_load(&mut self, tree: &mut TileArena, id: TileId) -> Result<(), TfError> {
        let Some(tile) = tree.try_get(id) else {
            return Err(TfError::Invariant(format!("dispatch: tile {} not in arena", id.0)));
        };

        let retry_count = match &tile.state {
            TileLoadState::Unloaded => 0,
            TileLoadState::FailedTemporary { retry_count } => *retry_count,
            _ => return Ok(()), // already loading, loaded, or permanently failed
        };
        let Some(uri) = tile.content_uri.clone() else {
            return Ok(());
        };

        let cancel = CancelToken::new();
        tree[id].state = TileLoadState::ContentLoading {
            cancel: cancel.clone(),
            retry_count,
        };
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        debug!(tile = id.0, %uri, "dispatching load");

        let fetcher = self.fetcher.clone();
        let parser = self.parser.clone();
        let tasks = self.tasks.clone();
        let tx = self.completions_tx.clone();
        let in_flight = self.in_flight.clone();

        crate::helpers::async_runtime::spawn_detached(async move {
            // Every exit path below frees the in-flight slot through
            // `claim_settlement` rather than an unconditional `fetch_sub`:
            // `cancel_load` may have already claimed it (and reset the tile
            // to `Unloaded`) by the time we get here, and decrementing twice
            // for one dispatch would underflow the counter.
            let free_slot = |cancel: &CancelToken, in_flight: &Arc<AtomicUsize>| {
                if cancel.claim_settlement() {
                    in_flight.fetch_sub(1, Ordering::AcqRel);
                }
            };

            let response = fetcher.fetch(&uri, &[]).await;
            if cancel.is_cancelled() {
                free_slot(&cancel, &in_flight);
                return;
            }
            match response {
                Ok(resp) if resp.is_unauthorized() => {
                    free_slot(&cancel, &in_flight);
                    let _ = tx.send(Completion::Unauthorized { tile: id });
                }
                Ok(resp) if resp.is_success() => {
                    let byte_len = resp.bytes.len() as u64;
                    let ctx = ParseContext {
                        uri: uri.clone(),
                        base_uri: uri.clone(),
                    };
                    let cancel_for_task = cancel.clone();
                    tasks.start_task(Box::new(move || {
                        let outcome = parser.parse(&resp.bytes, &uri, &ctx);
                        if cancel_for_task.claim_settlement() {
                            in_flight.fetch_sub(1, Ordering::AcqRel);
                        }
                        let msg = match outcome {
                            Ok(parsed) => {
                                let byte_size = if parsed.byte_size > 0 { parsed.byte_size } else { byte_len };
                                Completion::Loaded {
                                    tile: id,
                                    parsed,
                                    byte_size,
                                }
                            }
                            Err(_) => Completion::FetchFailed { tile: id, permanent: true },
                        };
                        let _ = tx.send(msg);
                    }));
                }
                Ok(resp) if resp.is_transient_failure() => {
                    free_slot(&cancel, &in_flight);
                    let _ = tx.send(Completion::FetchFailed { tile: id, permanent: false });
                }
                Ok(_) => {
                    free_slot(&cancel, &in_flight);
                    let _ = tx.send(Completion::FetchFailed { tile: id, permanent: true });
                }
                Err(_) => {
                    free_slot(&cancel, &in_flight);
                    let _ = tx.send(Completion::FetchFailed { tile: id, permanent: false });
                }
            }
        });
        Ok(())
    }

    /// Cancels an in-flight load (spec §5, §3.1): fires the tile's
    /// `CancelToken` and, if the worker hasn't already raced us to freeing
    /// the slot, decrements `in_flight` and resets the tile to `Unloaded`.
    /// Without the reset the tile would be stuck in `ContentLoading`
    /// forever, since `wants_load` only re-queues `Unloaded`/
    /// `FailedTemporary` tiles.
    pub fn cancel_load(&mut self, tree: &mut TileArena, id: TileId) {
        let Some(tile) = tree.try_get(id) else { return };
        let cancel = match &tile.state {
            TileLoadState::ContentLoading { cancel, .. } => cancel.clone(),
            _ => return,
        };
        cancel.cancel();
        if cancel.claim_settlement() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
        }
        tree[id].state = TileLoadState::Unloaded;
    }

    /// §4.2.2 + the `ContentLoaded -> Done` upload step. Drains whatever
    /// completions have arrived since the last call, non-blockingly, then
    /// promotes any tile left in `ContentLoaded` to `Done` via `preparer`.
    pub fn drain_completions(&mut self, tree: &mut TileArena, preparer: &dyn ResourcePreparer) -> Result<(), TfError> {
        while let Ok(msg) = self.completions_rx.try_recv() {
            match msg {
                Completion::Loaded { tile, parsed, byte_size } => {
                    let Some(t) = tree.try_get(tile) else { continue };
                    if !t.state.is_loading() {
                        continue; // stale: tile was evicted/reset since dispatch
                    }
                    tree[tile].content = Some(TileContent {
                        model: parsed,
                        raster_mappings: Vec::new(),
                        byte_size,
                        render_handle: None,
                    });
                    tree[tile].state = TileLoadState::ContentLoaded;
                }
                Completion::FetchFailed { tile, permanent } => {
                    let Some(t) = tree.try_get(tile) else { continue };
                    let retry_count = match &t.state {
                        TileLoadState::ContentLoading { retry_count, .. } => *retry_count,
                        _ => continue,
                    };
                    tree[tile].state = if permanent || retry_count + 1 >= MAX_RETRIES {
                        TileLoadState::Failed
                    } else {
                        TileLoadState::FailedTemporary {
                            retry_count: retry_count + 1,
                        }
                    };
                }
                Completion::Unauthorized { tile } => {
                    if let Some(t) = tree.try_get(tile) {
                        let retry_count = match &t.state {
                            TileLoadState::ContentLoading { retry_count, .. } => *retry_count,
                            _ => 0,
                        };
                        tree[tile].state = TileLoadState::FailedTemporary { retry_count };
                    }
                    self.auth_gate.park(tile);
                }
                Completion::AuthRefreshed { tiles, success } => {
                    self.auth_gate.finish_refresh();
                    for tile in tiles {
                        if tree.try_get(tile).is_none() {
                            continue;
                        }
                        tree[tile].state = if success {
                            TileLoadState::Unloaded
                        } else {
                            TileLoadState::Failed
                        };
                    }
                }
            }
        }

        self.auth_gate
            .start_refresh_if_needed(self.token_refresher.clone(), self.completions_tx.clone());

        self.upload_ready_content(tree, preparer);
        Ok(())
    }

    fn upload_ready_content(&mut self, tree: &mut TileArena, preparer: &dyn ResourcePreparer) {
        for id in tree.ids() {
            if !matches!(tree[id].state, TileLoadState::ContentLoaded) {
                continue;
            }
            let model = &tree[id].content.as_ref().expect("ContentLoaded implies content").model;
            let prepared = match preparer.prepare_in_worker(model) {
                Ok(p) => p,
                Err(e) => {
                    warn!(tile = id.0, error = %e, "resource preparation failed");
                    tree[id].state = TileLoadState::Failed;
                    continue;
                }
            };
            let handle = match preparer.prepare_in_main_thread(prepared) {
                Ok(h) => h,
                Err(e) => {
                    warn!(tile = id.0, error = %e, "GPU upload failed");
                    tree[id].state = TileLoadState::Failed;
                    continue;
                }
            };
            tree[id].content.as_mut().unwrap().render_handle = Some(handle);
            let byte_size = tree[id].byte_size();
            tree[id].state = TileLoadState::Done;
            self.resident_bytes += byte_size;
            self.lru.push_back(tree, id);
        }
    }

    /// §4.2.3. Must be called after dispatch/drain each frame with the
    /// tiles the selector just chose to render.
    pub fn evict(&mut self, tree: &mut TileArena, rendered: &[TileId], options: &TilesetOptions, preparer: &dyn ResourcePreparer) {
        let freed = evict(tree, &mut self.lru, &mut self.resident_bytes, options.maximum_cached_bytes, rendered, preparer);
        if freed > 0 {
            debug!(freed, resident = self.resident_bytes, "eviction sweep");
        }
    }

    /// Marks a tile's LRU entry as freshly used (spec §4.2.3: moved to the
    /// back whenever the selector visits it). The host calls this for
    /// every `Done` tile in `tiles_to_render_this_frame`.
    pub fn touch(&mut self, tree: &mut TileArena, id: TileId) {
        if matches!(tree[id].state, TileLoadState::Done) {
            self.lru.touch(tree, id);
        }
    }
}
