//! Bookmark search command / 书签搜索命令
//!
//! Ensures the index is fresh, then runs the ranked search.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::CommandHandler;
use crate::bookmarks::BookmarkIndex;
use crate::models::{CommandOutcome, OutcomeKind};

pub struct BookmarkSearchCommand {
    index: Arc<BookmarkIndex>,
    limit: usize,
}

impl BookmarkSearchCommand {
    pub fn new(index: Arc<BookmarkIndex>, limit: usize) -> Self {
        Self { index, limit }
    }
}

#[async_trait]
impl CommandHandler for BookmarkSearchCommand {
    fn kind(&self) -> OutcomeKind {
        OutcomeKind::Bookmarks
    }

    async fn execute(&self, args: &str) -> CommandOutcome {
        if let Err(e) = self.index.ensure_loaded().await {
            tracing::warn!("Bookmark index load failed: {}", e);
            return CommandOutcome::fail(self.kind(), "Bookmark index unavailable");
        }

        let hits = self.index.search(args, self.limit);

        match serde_json::to_value(&hits) {
            Ok(value) => CommandOutcome::ok(
                self.kind(),
                json!({
                    "query": args,
                    "total": hits.len(),
                    "hits": value,
                }),
            ),
            Err(e) => {
                tracing::error!("Failed to serialize bookmark hits: {}", e);
                CommandOutcome::fail(self.kind(), "Bookmark search failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::BookmarkProvider;
    use crate::models::BookmarkNode;
    use anyhow::{anyhow, Result};
    use std::time::Duration;

    struct TreeProvider {
        tree: Option<BookmarkNode>,
    }

    #[async_trait]
    impl BookmarkProvider for TreeProvider {
        async fn bookmark_tree(&self) -> Result<BookmarkNode> {
            self.tree
                .clone()
                .ok_or_else(|| anyhow!("bookmark store unavailable"))
        }
    }

    fn github_tree() -> BookmarkNode {
        BookmarkNode {
            title: String::new(),
            url: None,
            children: vec![BookmarkNode {
                title: "GitHub".to_string(),
                url: Some("https://github.com".to_string()),
                children: Vec::new(),
            }],
        }
    }

    #[tokio::test]
    async fn test_git_query_returns_ranked_hit() {
        let index = Arc::new(BookmarkIndex::new(
            Arc::new(TreeProvider { tree: Some(github_tree()) }),
            Duration::from_secs(300),
        ));
        let command = BookmarkSearchCommand::new(index, 5);

        let outcome = command.execute("git").await;
        assert!(outcome.success);

        let data = outcome.data.unwrap();
        assert_eq!(data["total"], 1);
        assert_eq!(data["hits"][0]["bookmark"]["title"], "GitHub");
        assert!(data["hits"][0]["score"].as_u64().unwrap() >= 50);
    }

    #[tokio::test]
    async fn test_empty_query_returns_empty_list() {
        let index = Arc::new(BookmarkIndex::new(
            Arc::new(TreeProvider { tree: Some(github_tree()) }),
            Duration::from_secs(300),
        ));
        let command = BookmarkSearchCommand::new(index, 5);

        let outcome = command.execute("").await;
        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["total"], 0);
    }

    #[tokio::test]
    async fn test_slash_prefix_routes_to_bookmark_search() {
        use crate::command::{DispatchResult, Dispatcher};
        use crate::config::EngineConfig;
        use crate::engines::EngineSet;
        use crate::suggest::SuggestionAggregator;
        use std::collections::HashMap;

        let index = Arc::new(BookmarkIndex::new(
            Arc::new(TreeProvider { tree: Some(github_tree()) }),
            Duration::from_secs(300),
        ));

        let engines = Arc::new(parking_lot::RwLock::new(EngineSet::from_config(
            &EngineConfig::default(),
        )));
        let aggregator = Arc::new(SuggestionAggregator::new(HashMap::new(), engines));

        let registry = crate::command::CommandRegistry::new();
        registry
            .register("/", Arc::new(BookmarkSearchCommand::new(index, 5)))
            .unwrap();
        let dispatcher = Dispatcher::new(registry, aggregator);

        match dispatcher.dispatch("/git").await {
            DispatchResult::Command(outcome) => {
                assert!(outcome.success);
                assert_eq!(outcome.kind, OutcomeKind::Bookmarks);
                let data = outcome.data.unwrap();
                assert_eq!(data["hits"][0]["bookmark"]["title"], "GitHub");
                assert!(data["hits"][0]["score"].as_u64().unwrap() >= 50);
            }
            other => panic!("expected a command outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_degrades() {
        let index = Arc::new(BookmarkIndex::new(
            Arc::new(TreeProvider { tree: None }),
            Duration::from_secs(300),
        ));
        let command = BookmarkSearchCommand::new(index, 5);

        let outcome = command.execute("git").await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Bookmark index unavailable")
        );
    }
}
