//! 401 -> token-refresh -> retry hook (spec §4.2.4). Grounded in the same
//! async-dispatch shape `dispatcher.rs` uses for fetches: the refresh runs
//! on the process-wide runtime (`helpers::async_runtime`) and reports back
//! over the completion channel rather than blocking the main thread.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::error::TfError;
use crate::tile::TileId;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The one authentication operation the scheduler needs: refresh whatever
/// token gates asset requests. An implementor typically wraps an OAuth or
/// session-cookie client; out of scope for `tileforge` itself (spec §1,
/// "authentication/token flows beyond a single refresh-and-retry hook").
pub trait TokenRefresher: Send + Sync {
    fn refresh(&self) -> BoxFuture<Result<(), TfError>>;
}

/// Coalesces every tile parked by a 401 behind a single in-flight refresh
/// request (spec §4.2.4: "parks all 401-ed tiles ... issues a single
/// refresh request").
#[derive(Debug, Default)]
pub struct AuthGate {
    parked: Vec<TileId>,
    refreshing: bool,
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn park(&mut self, tile: TileId) {
        if !self.parked.contains(&tile) {
            self.parked.push(tile);
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Starts a refresh if tiles are waiting and none is already in
    /// flight. With no `TokenRefresher` configured, parked tiles have no
    /// path back to `Unloaded` and are reported as a failed refresh
    /// immediately, matching the "on failure they move to Failed" branch.
    pub fn start_refresh_if_needed(
        &mut self,
        refresher: Option<Arc<dyn TokenRefresher>>,
        completions: Sender<super::completion::Completion>,
    ) {
        if self.refreshing || self.parked.is_empty() {
            return;
        }
        self.refreshing = true;
        let tiles = std::mem::take(&mut self.parked);

        match refresher {
            Some(refresher) => {
                crate::helpers::async_runtime::spawn_detached(async move {
                    let result = refresher.refresh().await;
                    let _ = completions.send(super::completion::Completion::AuthRefreshed {
                        tiles,
                        success: result.is_ok(),
                    });
                });
            }
            None => {
                let _ = completions.send(super::completion::Completion::AuthRefreshed {
                    tiles,
                    success: false,
                });
            }
        }
    }

    /// The caller must clear `refreshing` once it has processed the
    /// matching `Completion::AuthRefreshed` message.
    pub fn finish_refresh(&mut self) {
        self.refreshing = false;
    }
}
