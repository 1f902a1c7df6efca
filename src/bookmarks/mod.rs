//! Bookmark flattening and fuzzy search / 书签扁平化与模糊搜索

pub mod index;

pub use index::{BookmarkIndex, IndexStats};

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::models::BookmarkNode;

/// Source of the hierarchical bookmark tree / 书签树来源
///
/// The browser extension shell implements this against the browser
/// bookmark API; the standalone binary reads a JSON file.
#[async_trait]
pub trait BookmarkProvider: Send + Sync {
    async fn bookmark_tree(&self) -> Result<BookmarkNode>;
}

/// Reads a bookmark tree from a JSON file / 从 JSON 文件读取书签树
pub struct FileBookmarkProvider {
    path: PathBuf,
}

impl FileBookmarkProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BookmarkProvider for FileBookmarkProvider {
    async fn bookmark_tree(&self) -> Result<BookmarkNode> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read bookmarks file {:?}", self.path))?;

        let tree: BookmarkNode = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse bookmarks file {:?}", self.path))?;

        Ok(tree)
    }
}
