//! Command dispatch / 命令分发
//!
//! Maps the leading 1 or 2 characters of the input to a registered
//! handler; unmatched input falls through to suggestion aggregation.
//! A one-character prefix always wins over a two-character one that
//! shares the same leading character; this precedence is a contract,
//! not an accident.

pub mod bookmarks;
pub mod calculator;
pub mod translate;
pub mod weather;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{CommandOutcome, OutcomeKind};
use crate::suggest::SuggestionAggregator;

/// One prefix command / 单个前缀命令
///
/// Polymorphic over a single capability; `execute` always resolves to
/// a structured outcome and never errors out.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn kind(&self) -> OutcomeKind;

    async fn execute(&self, args: &str) -> CommandOutcome;
}

/// Prefix -> handler table / 前缀到处理器的映射表
///
/// Mutable at runtime; re-registration overwrites.
pub struct CommandRegistry {
    prefixes: RwLock<HashMap<String, Arc<dyn CommandHandler>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            prefixes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler under a 1- or 2-character prefix / 注册命令前缀
    pub fn register(&self, prefix: &str, handler: Arc<dyn CommandHandler>) -> Result<()> {
        let len = prefix.chars().count();
        if len == 0 || len > 2 {
            return Err(anyhow!(
                "Command prefix must be 1 or 2 characters: {:?}",
                prefix
            ));
        }

        if self
            .prefixes
            .write()
            .insert(prefix.to_string(), handler)
            .is_some()
        {
            tracing::debug!("Re-registered command prefix {:?}", prefix);
        }
        Ok(())
    }

    pub fn lookup(&self, prefix: &str) -> Option<Arc<dyn CommandHandler>> {
        self.prefixes.read().get(prefix).cloned()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch result / 分发结果
#[derive(Debug, Serialize)]
pub enum DispatchResult {
    /// A prefix command handled the input / 前缀命令处理了输入
    Command(CommandOutcome),
    /// Default path: per-engine suggestion lists / 默认路径：按引擎的建议列表
    Suggestions {
        query: String,
        engines: HashMap<String, Vec<String>>,
    },
}

/// Input dispatcher / 输入分发器
pub struct Dispatcher {
    registry: CommandRegistry,
    aggregator: Arc<SuggestionAggregator>,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, aggregator: Arc<SuggestionAggregator>) -> Self {
        Self { registry, aggregator }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Decide what an input string means / 判定输入串的含义
    ///
    /// Order matters: single-char prefix, then two-char prefix, then
    /// the default suggestion path. A single-char hit returns without
    /// ever consulting the two-char table.
    pub async fn dispatch(&self, input: &str) -> DispatchResult {
        if !input.is_empty() {
            let mut chars = input.chars();
            if let Some(c1) = chars.next() {
                let prefix1 = c1.to_string();
                if let Some(handler) = self.registry.lookup(&prefix1) {
                    let rest = input[c1.len_utf8()..].trim();
                    tracing::debug!("Input routed to command prefix {:?}", prefix1);
                    return DispatchResult::Command(handler.execute(rest).await);
                }

                if let Some(c2) = chars.next() {
                    let prefix2: String = [c1, c2].iter().collect();
                    if let Some(handler) = self.registry.lookup(&prefix2) {
                        let rest = input[c1.len_utf8() + c2.len_utf8()..].trim();
                        tracing::debug!("Input routed to command prefix {:?}", prefix2);
                        return DispatchResult::Command(handler.execute(rest).await);
                    }
                }
            }
        }

        let query = input.trim().to_string();
        let engines = self.aggregator.fetch_all(&query).await;
        DispatchResult::Suggestions { query, engines }
    }
}

/// Register the built-in command set / 注册内置命令
///
/// `=` calculator, `tq` weather, `tr` translate, `/` bookmark search.
pub fn register_default_commands(
    registry: &CommandRegistry,
    calculator: Arc<calculator::CalculatorCommand>,
    weather: Arc<weather::WeatherCommand>,
    translate: Arc<translate::TranslateCommand>,
    bookmarks: Arc<bookmarks::BookmarkSearchCommand>,
) -> Result<()> {
    registry.register("=", calculator)?;
    registry.register("tq", weather)?;
    registry.register("tr", translate)?;
    registry.register("/", bookmarks)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engines::EngineSet;
    use crate::suggest::{CancelToken, SuggestError, SuggestionSource};
    use serde_json::json;

    struct StubHandler {
        label: &'static str,
    }

    #[async_trait]
    impl CommandHandler for StubHandler {
        fn kind(&self) -> OutcomeKind {
            OutcomeKind::Calculator
        }

        async fn execute(&self, args: &str) -> CommandOutcome {
            CommandOutcome::ok(
                self.kind(),
                json!({ "label": self.label, "args": args }),
            )
        }
    }

    struct EchoSource;

    #[async_trait]
    impl SuggestionSource for EchoSource {
        fn name(&self) -> &str {
            "echo"
        }

        async fn fetch(
            &self,
            query: &str,
            _cancel: CancelToken,
        ) -> Result<Vec<String>, SuggestError> {
            Ok(vec![format!("{} result", query)])
        }
    }

    fn test_dispatcher() -> Dispatcher {
        let engines = Arc::new(parking_lot::RwLock::new(EngineSet::from_config(
            &EngineConfig::default(),
        )));
        let sources: HashMap<String, Arc<dyn SuggestionSource>> = [
            ("google".to_string(), Arc::new(EchoSource) as Arc<dyn SuggestionSource>),
            ("bing".to_string(), Arc::new(EchoSource) as Arc<dyn SuggestionSource>),
            ("baidu".to_string(), Arc::new(EchoSource) as Arc<dyn SuggestionSource>),
        ]
        .into_iter()
        .collect();
        let aggregator = Arc::new(SuggestionAggregator::new(sources, engines));
        Dispatcher::new(CommandRegistry::new(), aggregator)
    }

    fn outcome_args(result: DispatchResult) -> (String, String) {
        match result {
            DispatchResult::Command(outcome) => {
                let data = outcome.data.unwrap();
                (
                    data["label"].as_str().unwrap().to_string(),
                    data["args"].as_str().unwrap().to_string(),
                )
            }
            other => panic!("expected a command outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_char_prefix_beats_two_char() {
        let dispatcher = test_dispatcher();
        dispatcher
            .registry()
            .register("t", Arc::new(StubHandler { label: "one" }))
            .unwrap();
        dispatcher
            .registry()
            .register("tq", Arc::new(StubHandler { label: "two" }))
            .unwrap();

        let (label, args) = outcome_args(dispatcher.dispatch("tq: Paris").await);
        assert_eq!(label, "one");
        assert_eq!(args, "q: Paris");
    }

    #[tokio::test]
    async fn test_two_char_prefix_used_when_no_single_match() {
        let dispatcher = test_dispatcher();
        dispatcher
            .registry()
            .register("tq", Arc::new(StubHandler { label: "two" }))
            .unwrap();

        let (label, args) = outcome_args(dispatcher.dispatch("tq Paris").await);
        assert_eq!(label, "two");
        assert_eq!(args, "Paris");
    }

    #[tokio::test]
    async fn test_unmatched_input_falls_through_to_suggestions() {
        let dispatcher = test_dispatcher();

        match dispatcher.dispatch("hello world").await {
            DispatchResult::Suggestions { query, engines } => {
                assert_eq!(query, "hello world");
                let mut keys: Vec<_> = engines.keys().cloned().collect();
                keys.sort();
                assert_eq!(keys, vec!["baidu", "bing", "google"]);
                assert_eq!(engines["google"], vec!["hello world result"]);
            }
            other => panic!("expected suggestions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_input_goes_to_default_path() {
        let dispatcher = test_dispatcher();
        dispatcher
            .registry()
            .register("=", Arc::new(StubHandler { label: "calc" }))
            .unwrap();

        match dispatcher.dispatch("").await {
            DispatchResult::Suggestions { query, engines } => {
                assert!(query.is_empty());
                assert!(engines.is_empty());
            }
            other => panic!("expected suggestions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prefix_length_validation() {
        let registry = CommandRegistry::new();
        assert!(registry
            .register("", Arc::new(StubHandler { label: "x" }))
            .is_err());
        assert!(registry
            .register("abc", Arc::new(StubHandler { label: "x" }))
            .is_err());
        assert!(registry
            .register("=", Arc::new(StubHandler { label: "x" }))
            .is_ok());
    }

    #[tokio::test]
    async fn test_reregistration_overwrites() {
        let dispatcher = test_dispatcher();
        dispatcher
            .registry()
            .register("=", Arc::new(StubHandler { label: "old" }))
            .unwrap();
        dispatcher
            .registry()
            .register("=", Arc::new(StubHandler { label: "new" }))
            .unwrap();

        let (label, _) = outcome_args(dispatcher.dispatch("=1+1").await);
        assert_eq!(label, "new");
    }

    #[tokio::test]
    async fn test_calculator_end_to_end() {
        let dispatcher = test_dispatcher();
        dispatcher
            .registry()
            .register("=", Arc::new(calculator::CalculatorCommand::new()))
            .unwrap();

        match dispatcher.dispatch("=2+2*3").await {
            DispatchResult::Command(outcome) => {
                assert!(outcome.success);
                assert_eq!(outcome.kind, OutcomeKind::Calculator);
                let value = outcome.data.unwrap()["value"].as_f64().unwrap();
                assert_eq!(value, 8.0);
            }
            other => panic!("expected a command outcome, got {:?}", other),
        }
    }
}
