use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yaotab_core::bookmarks::{BookmarkIndex, FileBookmarkProvider};
use yaotab_core::command::bookmarks::BookmarkSearchCommand;
use yaotab_core::command::calculator::CalculatorCommand;
use yaotab_core::command::translate::{GoogleTranslateProvider, TranslateCommand};
use yaotab_core::command::weather::{OpenMeteoProvider, WeatherCommand};
use yaotab_core::command::{register_default_commands, CommandRegistry, DispatchResult, Dispatcher};
use yaotab_core::config;
use yaotab_core::engines::EngineSet;
use yaotab_core::suggest::{default_sources, SuggestionAggregator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yaotab_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("yaotab core starting, build {}", env!("BUILD_TIME"));

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(|e| anyhow::anyhow!(e))?;

    let engines = Arc::new(parking_lot::RwLock::new(EngineSet::from_config(
        &app_config.engines,
    )));
    tracing::info!(
        "Enabled suggestion engines: {:?}, primary {}",
        engines.read().enabled(),
        engines.read().primary()
    );

    let aggregator = Arc::new(SuggestionAggregator::new(default_sources(), engines.clone()));

    let index = Arc::new(BookmarkIndex::new(
        Arc::new(FileBookmarkProvider::new(app_config.get_bookmarks_path())),
        Duration::from_secs(app_config.search.bookmark_ttl_secs),
    ));

    let registry = CommandRegistry::new();
    register_default_commands(
        &registry,
        Arc::new(CalculatorCommand::new()),
        Arc::new(WeatherCommand::new(Arc::new(OpenMeteoProvider::new()))),
        Arc::new(TranslateCommand::new(
            Arc::new(GoogleTranslateProvider::new()),
            app_config.translate.default_target_lang.clone(),
        )),
        Arc::new(BookmarkSearchCommand::new(
            index.clone(),
            app_config.search.ranked_limit,
        )),
    )?;

    let dispatcher = Dispatcher::new(registry, aggregator);

    // Interactive loop: one input line in, one dispatched outcome out
    // 交互循环：一行输入，一个分发结果
    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim_end();
        if input == "exit" || input == "quit" {
            break;
        }

        let result = dispatcher.dispatch(input).await;
        println!("{}", serde_json::to_string_pretty(&result)?);

        if let DispatchResult::Suggestions { query, .. } = &result {
            if !query.is_empty() {
                println!("-> {}", engines.read().search_url(query));
            }
        }
    }

    Ok(())
}
