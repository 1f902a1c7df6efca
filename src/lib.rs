pub mod bookmarks;
pub mod command;
pub mod config;
pub mod engines;
pub mod models;
pub mod suggest;

// Convenience re-exports for embedding shells / 供宿主使用的便捷导出
pub use command::{register_default_commands, CommandRegistry, DispatchResult, Dispatcher};
pub use engines::{EngineSet, SharedEngineSet};
pub use suggest::SuggestionAggregator;
