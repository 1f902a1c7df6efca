//! Search suggestion fetching / 搜索建议获取
//!
//! One adapter per external engine behind a single capability trait;
//! the aggregator owns the adapter table and treats every adapter
//! identically (data-driven, no per-engine special cases).

pub mod aggregator;
pub mod sources;

pub use aggregator::SuggestionAggregator;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative cancellation token / 协作式取消令牌
///
/// Cloned handles observe the same state. `cancel()` wakes every
/// waiter; adapters race `cancelled()` against their request future.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolve once the token is cancelled / 等待取消信号
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register the waiter before re-checking the flag so a cancel
        // between check and await cannot be missed
        // 先注册等待者再复查标志，避免丢失取消信号
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Suggestion fetch error / 建议获取错误
///
/// Cancellation is distinguished from genuine failure for logging
/// only; both degrade to an empty list at the aggregator boundary.
#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    #[error("request cancelled")]
    Cancelled,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// One external suggestion engine / 单个外部建议引擎
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch ordered suggestions for a query / 获取查询的有序建议列表
    ///
    /// Must resolve promptly when the token is cancelled.
    async fn fetch(&self, query: &str, cancel: CancelToken) -> Result<Vec<String>, SuggestError>;
}

/// Build the default engine adapter table / 构建默认引擎适配器表
pub fn default_sources() -> HashMap<String, Arc<dyn SuggestionSource>> {
    let mut sources: HashMap<String, Arc<dyn SuggestionSource>> = HashMap::new();

    sources.insert("google".to_string(), Arc::new(sources::GoogleSource::new()));
    sources.insert("bing".to_string(), Arc::new(sources::BingSource::new()));
    sources.insert("baidu".to_string(), Arc::new(sources::BaiduSource::new()));

    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_token_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });

        tokio::task::yield_now().await;
        token.cancel();
        assert!(handle.await.unwrap());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_before_wait_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        // Must not hang / 不得挂起
        token.cancelled().await;
    }

    #[test]
    fn test_default_sources_cover_default_engines() {
        let sources = default_sources();
        assert!(sources.contains_key("google"));
        assert!(sources.contains_key("bing"));
        assert!(sources.contains_key("baidu"));
    }
}
