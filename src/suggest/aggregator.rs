//! Suggestion aggregator / 搜索建议聚合器
//!
//! Fans one query out to every enabled engine in parallel, caches per
//! (engine, query) results, and cancels superseded in-flight requests
//! per engine. Commits are generation-guarded: a stale request that
//! resolves late can neither poison the cache nor clobber the
//! in-flight handle of a newer request.

use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{CancelToken, SuggestError, SuggestionSource};
use crate::engines::SharedEngineSet;

/// Outstanding request bookkeeping, keyed by engine / 按引擎记录的在途请求
struct Inflight {
    generation: u64,
    token: CancelToken,
}

/// Suggestion aggregator / 搜索建议聚合器
///
/// Created once per session; both maps are owned here and never
/// touched by the adapters. Locks are released before every await.
pub struct SuggestionAggregator {
    sources: HashMap<String, Arc<dyn SuggestionSource>>,
    engines: SharedEngineSet,
    /// Result cache: (engine, normalized query) -> suggestions / 结果缓存
    cache: Mutex<HashMap<(String, String), Vec<String>>>,
    /// At most one outstanding request per engine / 每个引擎至多一个在途请求
    inflight: Mutex<HashMap<String, Inflight>>,
    generation: AtomicU64,
}

impl SuggestionAggregator {
    pub fn new(
        sources: HashMap<String, Arc<dyn SuggestionSource>>,
        engines: SharedEngineSet,
    ) -> Self {
        Self {
            sources,
            engines,
            cache: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch suggestions from every enabled engine / 从所有启用引擎获取建议
    ///
    /// Dispatches without awaiting between engines, then joins on all
    /// of them. Partial availability is a normal outcome; the call as
    /// a whole never fails.
    pub async fn fetch_all(&self, query: &str) -> HashMap<String, Vec<String>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return HashMap::new();
        }

        let enabled = self.engines.read().enabled();

        let requests: Vec<_> = enabled
            .into_iter()
            .map(|engine| async move {
                let list = self.fetch_one(trimmed, &engine).await;
                (engine, list)
            })
            .collect();

        join_all(requests).await.into_iter().collect()
    }

    /// Fetch suggestions from one engine, cached and cancelable / 单引擎获取，带缓存与取消
    pub async fn fetch_one(&self, query: &str, engine: &str) -> Vec<String> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let key = (engine.to_string(), normalize_query(query));

        if let Some(cached) = self.cache.lock().get(&key) {
            tracing::debug!("Suggestion cache hit: {} {:?}", engine, key.1);
            return cached.clone();
        }

        let source = match self.sources.get(engine) {
            Some(source) => source.clone(),
            None => {
                tracing::warn!("No suggestion source registered for engine {}", engine);
                return Vec::new();
            }
        };

        // Supersede whatever is outstanding for this engine, any query
        // 取代该引擎当前的在途请求（无论查询为何）
        let token = CancelToken::new();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inflight = self.inflight.lock();
            if let Some(prev) = inflight.insert(
                engine.to_string(),
                Inflight { generation, token: token.clone() },
            ) {
                tracing::debug!("Superseding in-flight request for {}", engine);
                prev.token.cancel();
            }
        }

        let result = source.fetch(trimmed, token).await;

        // Only the latest generation may clear the handle and commit
        // 仅最新一代请求可清除在途句柄并提交结果
        let latest = {
            let mut inflight = self.inflight.lock();
            let latest = inflight
                .get(engine)
                .map(|entry| entry.generation == generation)
                .unwrap_or(false);
            if latest {
                inflight.remove(engine);
            }
            latest
        };

        match result {
            Ok(list) => {
                if latest {
                    self.cache.lock().insert(key, list.clone());
                    list
                } else {
                    tracing::debug!("Discarding stale suggestion result for {}", engine);
                    Vec::new()
                }
            }
            Err(SuggestError::Cancelled) => {
                tracing::debug!("Suggestion request cancelled: {} {:?}", engine, trimmed);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Suggestion fetch failed for {}: {}", engine, e);
                Vec::new()
            }
        }
    }

    /// Empty the result cache / 清空结果缓存
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        let evicted = cache.len();
        cache.clear();
        tracing::info!("Suggestion cache cleared, {} entries evicted", evicted);
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }
}

/// Cache key normalization: trim + lowercase / 缓存键归一化
fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}
