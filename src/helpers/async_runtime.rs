//! A single parked Tokio runtime for the whole process, exposing only a
//! `Handle` — mirrors `abetterworld::helpers::async_helper`'s native
//! `spawn_detached`, minus the wasm branch (`tileforge` is native-only).

use std::future::Future;

use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Handle};

static HANDLE: Lazy<Handle> = Lazy::new(|| {
    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_io()
        .enable_time()
        .build()
        .expect("tokio runtime");
    let handle = rt.handle().clone();
    std::thread::spawn(move || rt.block_on(futures::future::pending::<()>()));
    handle
});

/// Spawns `fut` on the process-wide runtime without blocking the caller.
pub fn spawn_detached<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    HANDLE.spawn(fut);
}
