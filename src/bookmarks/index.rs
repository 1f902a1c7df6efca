//! Bookmark index - flattened in-memory search collection / 书签索引
//!
//! Holds a denormalized view of the hierarchical bookmark tree and
//! answers ranked fuzzy queries. The collection is rebuilt wholesale
//! on reload and swapped in atomically; concurrent searches see either
//! the old or the new collection, never a partial one.

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::BookmarkProvider;
use crate::models::{Bookmark, BookmarkHit, BookmarkNode};

/// Index statistics / 索引统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub bookmark_count: usize,
    pub last_loaded: Option<i64>,
}

/// Flattened bookmark index / 扁平化书签索引
pub struct BookmarkIndex {
    provider: Arc<dyn BookmarkProvider>,
    /// Current collection; replaced as a whole on reload / 当前集合，重载时整体替换
    entries: RwLock<Arc<Vec<Bookmark>>>,
    loaded_at: Mutex<Option<Instant>>,
    ttl: Duration,
    stats: Mutex<IndexStats>,
}

impl BookmarkIndex {
    pub fn new(provider: Arc<dyn BookmarkProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            entries: RwLock::new(Arc::new(Vec::new())),
            loaded_at: Mutex::new(None),
            ttl,
            stats: Mutex::new(IndexStats::default()),
        }
    }

    /// Get index statistics / 获取索引统计信息
    pub fn stats(&self) -> IndexStats {
        self.stats.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Rebuild the collection from the provider tree / 从书签树重建集合
    ///
    /// Idempotent; safe to call repeatedly. Returns the entry count.
    pub async fn load(&self) -> Result<usize> {
        let tree = self.provider.bookmark_tree().await?;

        let mut flat = Vec::new();
        flatten_into(&tree, "", &mut flat);
        let count = flat.len();

        // Atomic swap: readers hold an Arc to the old collection
        // 原子替换：读取方持有旧集合的 Arc
        *self.entries.write() = Arc::new(flat);
        *self.loaded_at.lock() = Some(Instant::now());

        {
            let mut stats = self.stats.lock();
            stats.bookmark_count = count;
            stats.last_loaded = Some(chrono::Utc::now().timestamp());
        }

        tracing::debug!("Bookmark index loaded, {} entries", count);
        Ok(count)
    }

    /// Reload when the cache is judged stale / 缓存过期时重新加载
    pub async fn ensure_loaded(&self) -> Result<()> {
        let stale = match *self.loaded_at.lock() {
            Some(at) => at.elapsed() >= self.ttl,
            None => true,
        };

        if stale {
            self.load().await?;
        }
        Ok(())
    }

    /// Force the next `ensure_loaded` to reload / 强制下次访问时重载
    pub fn invalidate(&self) {
        *self.loaded_at.lock() = None;
    }

    /// Weighted multi-term ranked search / 加权多词条排序搜索
    ///
    /// The query is lowercased and split on whitespace; each term
    /// contributes the score of the first matching rule, summed per
    /// bookmark. Zero-score bookmarks are excluded; ties keep
    /// collection order (stable sort).
    pub fn search(&self, query: &str, limit: usize) -> Vec<BookmarkHit> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let lowered = trimmed.to_lowercase();
        let terms: Vec<&str> = lowered.split_whitespace().collect();

        let entries = self.entries.read().clone();

        let mut hits: Vec<BookmarkHit> = entries
            .iter()
            .filter_map(|bookmark| {
                let score: u32 = terms.iter().map(|t| term_score(bookmark, t)).sum();
                if score > 0 {
                    Some(BookmarkHit { bookmark: bookmark.clone(), score })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    /// Plain substring filter (fallback mode) / 简单子串过滤（备用模式）
    ///
    /// Case-insensitive title/url contains, collection order. The
    /// ranked `search` is the canonical entry point.
    pub fn filter_simple(&self, query: &str, limit: usize) -> Vec<Bookmark> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let entries = self.entries.read().clone();
        entries
            .iter()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.url.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

/// Fixed tie-break ladder; first applicable rule wins / 固定优先级阶梯
fn term_score(bookmark: &Bookmark, term: &str) -> u32 {
    let title = bookmark.title.to_lowercase();
    let domain = bookmark.domain.to_lowercase();

    if title == term {
        return 100;
    }
    if title.starts_with(term) {
        return 80;
    }
    if domain == term {
        return 70;
    }
    if domain.starts_with(term) {
        return 60;
    }
    if title.contains(term) {
        return 50;
    }
    if domain.contains(term) {
        return 40;
    }
    if bookmark.path.to_lowercase().contains(term) {
        return 30;
    }
    if bookmark.url.to_lowercase().contains(term) {
        return 20;
    }
    if bookmark.search_text.contains(term) {
        return 10;
    }
    0
}

/// Depth-first flatten, accumulating the folder breadcrumb / 深度优先扁平化
fn flatten_into(node: &BookmarkNode, breadcrumb: &str, out: &mut Vec<Bookmark>) {
    if let Some(url) = &node.url {
        let domain = domain_of(url);
        let search_text =
            format!("{} {} {}", node.title, domain, breadcrumb).to_lowercase();
        out.push(Bookmark {
            title: node.title.clone(),
            url: url.clone(),
            path: breadcrumb.to_string(),
            domain,
            search_text,
        });
    }

    if !node.children.is_empty() {
        let next = if node.title.is_empty() {
            breadcrumb.to_string()
        } else if breadcrumb.is_empty() {
            node.title.clone()
        } else {
            format!("{} > {}", breadcrumb, node.title)
        };
        for child in &node.children {
            flatten_into(child, &next, out);
        }
    }
}

/// Extract the host part of a URL / 提取 URL 的主机名
fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default()
}
