//! Concrete, non-GPU, non-parsing adapters for the four external
//! interfaces (spec §6; SPEC_FULL §1 "Crate shape"). `ReqwestAssetFetcher`
//! wraps `reqwest::Client` the way `abetterworld::content::download_client
//! ::Client` does; `ThreadPoolTaskProcessor` sizes a `threadpool::ThreadPool`
//! the way `abetterworld`'s native pager sizes its worker threads
//! (`num_cpus::get()`). `NoopContentParser`/`NoopResourcePreparer` are
//! trivial pass-through test doubles — real glTF/B3DM parsing and GPU
//! upload are out of scope (spec §1).

use std::sync::Arc;

use bytes::Bytes;
use threadpool::ThreadPool;

use crate::error::TfError;
use crate::interfaces::{
    AssetFetcher, BoxFuture, ContentParser, FetchResponse, ParseContext, ParsedContent,
    PreparedResource, RenderHandle, ResourcePreparer, TaskProcessor,
};

/// Wraps a `reqwest::Client` with a fixed user agent, mirroring
/// `abetterworld::content::download_client::Client::new`.
#[derive(Debug, Clone)]
pub struct ReqwestAssetFetcher {
    inner: reqwest::Client,
}

impl ReqwestAssetFetcher {
    pub fn new() -> Result<Self, TfError> {
        let inner = reqwest::Client::builder()
            .user_agent("tileforge")
            .build()
            .map_err(|e| TfError::Invariant(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { inner })
    }
}

impl AssetFetcher for ReqwestAssetFetcher {
    fn fetch<'a>(&'a self, url: &'a str, headers: &'a [(String, String)]) -> BoxFuture<'a, Result<FetchResponse, TfError>> {
        Box::pin(async move {
            let mut request = self.inner.get(url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
            let response = request
                .send()
                .await
                .map_err(|e| TfError::Fetch(e.to_string()))?;
            let status = response.status().as_u16();
            let response_headers = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                .collect();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| TfError::Fetch(e.to_string()))?;
            Ok(FetchResponse {
                status,
                headers: response_headers,
                bytes,
            })
        })
    }
}

/// Wraps a `threadpool::ThreadPool`, sized like `abetterworld`'s native
/// pager (`num_cpus::get()` worker threads, a handful reserved for parsing
/// rather than fetch I/O).
pub struct ThreadPoolTaskProcessor {
    pool: ThreadPool,
}

impl ThreadPoolTaskProcessor {
    pub fn new() -> Self {
        let threads = num_cpus::get().max(2);
        Self {
            pool: ThreadPool::new(threads),
        }
    }

    pub fn with_threads(threads: usize) -> Self {
        Self {
            pool: ThreadPool::new(threads.max(1)),
        }
    }
}

impl Default for ThreadPoolTaskProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskProcessor for ThreadPoolTaskProcessor {
    fn start_task(&self, task: Box<dyn FnOnce() + Send>) {
        self.pool.execute(task);
    }
}

/// Pass-through parser: wraps the raw bytes as an opaque model with no
/// child tiles, tighter bounds, or availability rectangles. Real content
/// parsing (B3DM/PNTS/glTF/external tileset JSON) is a `ContentParser`
/// collaborator's concern, out of scope for `tileforge` (spec §1).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopContentParser;

impl ContentParser for NoopContentParser {
    fn parse(&self, bytes: &[u8], _uri: &str, _ctx: &ParseContext) -> Result<ParsedContent, TfError> {
        Ok(ParsedContent {
            model: Some(crate::interfaces::OpaqueModel(Bytes::copy_from_slice(bytes))),
            child_tiles: None,
            tighter_bounding_volume: None,
            available_rectangles: None,
            byte_size: bytes.len() as u64,
        })
    }
}

/// Pass-through resource preparer: issues sequential opaque handles and
/// does no actual GPU work. Real GPU upload is a `ResourcePreparer`
/// collaborator's concern, out of scope for `tileforge` (spec §1).
#[derive(Debug, Default)]
pub struct NoopResourcePreparer {
    next_handle: std::sync::atomic::AtomicU64,
}

impl NoopResourcePreparer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourcePreparer for NoopResourcePreparer {
    fn prepare_in_worker(&self, model: &ParsedContent) -> Result<PreparedResource, TfError> {
        let bytes = model
            .model
            .as_ref()
            .map(|m| m.0.clone())
            .unwrap_or_default();
        Ok(PreparedResource(bytes))
    }

    fn prepare_in_main_thread(&self, _prepared: PreparedResource) -> Result<RenderHandle, TfError> {
        let id = self
            .next_handle
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(RenderHandle(id))
    }

    fn release(&self, _handle: RenderHandle) {}
}

/// Convenience bundle for wiring a default native `LoadScheduler` together
/// (fetch over `reqwest`, parse/prepare as no-ops, tasks on a `threadpool`).
pub fn default_scheduler(
    token_refresher: Option<Arc<dyn crate::scheduler::TokenRefresher>>,
) -> Result<crate::scheduler::LoadScheduler, TfError> {
    let fetcher: Arc<dyn AssetFetcher> = Arc::new(ReqwestAssetFetcher::new()?);
    let parser: Arc<dyn ContentParser> = Arc::new(NoopContentParser);
    let tasks: Arc<dyn TaskProcessor> = Arc::new(ThreadPoolTaskProcessor::new());
    Ok(crate::scheduler::LoadScheduler::new(fetcher, parser, tasks, token_refresher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_parser_echoes_bytes() {
        let parser = NoopContentParser;
        let ctx = ParseContext {
            uri: "tile.b3dm".into(),
            base_uri: "tile.b3dm".into(),
        };
        let parsed = parser.parse(&[1, 2, 3, 4], "tile.b3dm", &ctx).unwrap();
        assert_eq!(parsed.byte_size, 4);
        assert_eq!(parsed.model.unwrap().0.as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn noop_preparer_issues_increasing_handles() {
        let preparer = NoopResourcePreparer::new();
        let model = ParsedContent::default();
        let prepared_a = preparer.prepare_in_worker(&model).unwrap();
        let a = preparer.prepare_in_main_thread(prepared_a).unwrap();
        let prepared_b = preparer.prepare_in_worker(&model).unwrap();
        let b = preparer.prepare_in_main_thread(prepared_b).unwrap();
        assert_ne!(a, b);
    }
}
