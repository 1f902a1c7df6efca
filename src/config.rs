//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bookmark search configuration / 书签搜索配置
    pub search: SearchConfig,
    /// Suggestion engine configuration / 搜索建议引擎配置
    pub engines: EngineConfig,
    /// Translation configuration / 翻译配置
    pub translate: TranslateConfig,
}

/// Bookmark search configuration / 书签搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result cap for the weighted ranker / 加权排序结果上限
    pub ranked_limit: usize,
    /// Result cap for the plain substring filter / 简单过滤结果上限
    pub simple_limit: usize,
    /// Bookmark index validity window in seconds / 书签索引有效期（秒）
    pub bookmark_ttl_secs: u64,
    /// Bookmark tree file used by the shell binary / 书签树文件路径
    pub bookmarks_file: String,
}

/// One suggestion engine entry; table order is fan-out order / 引擎条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEntry {
    pub name: String,
    pub enabled: bool,
}

/// Suggestion engine configuration / 搜索建议引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub entries: Vec<EngineEntry>,
    /// Engine used when exactly one is needed / 主引擎
    pub primary: String,
}

/// Translation configuration / 翻译配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Target language when the input names none / 默认目标语言
    pub default_target_lang: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            engines: EngineConfig::default(),
            translate: TranslateConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ranked_limit: 5,
            simple_limit: 20,
            bookmark_ttl_secs: 300,
            bookmarks_file: "bookmarks.json".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entries: vec![
                EngineEntry { name: "google".to_string(), enabled: true },
                EngineEntry { name: "bing".to_string(), enabled: true },
                EngineEntry { name: "baidu".to_string(), enabled: true },
            ],
            primary: "google".to_string(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            default_target_lang: "en".to_string(),
        }
    }
}

impl AppConfig {
    /// Get the bookmark tree file path / 获取书签树文件路径
    pub fn get_bookmarks_path(&self) -> PathBuf {
        PathBuf::from(&self.search.bookmarks_file)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    let config_path = get_config_path();

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config(&config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig) -> Result<(), String> {
    let config_path = get_config_path();

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(&config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

/// Initialize global configuration / 初始化全局配置
pub fn init_config() -> Result<Arc<RwLock<AppConfig>>, String> {
    let config = load_config()?;

    let config_arc = Arc::new(RwLock::new(config));

    CONFIG.set(config_arc.clone())
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(config_arc)
}

/// Get global configuration instance / 获取全局配置实例
pub fn get_config() -> Arc<RwLock<AppConfig>> {
    CONFIG.get_or_init(|| {
        let config = load_config().unwrap_or_default();
        Arc::new(RwLock::new(config))
    }).clone()
}

/// Get a read-only snapshot of current config / 获取当前配置的只读快照
pub fn config() -> AppConfig {
    get_config().read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search.ranked_limit, 5);
        assert_eq!(config.search.simple_limit, 20);
        assert_eq!(config.search.bookmark_ttl_secs, 300);
        assert_eq!(config.engines.primary, "google");
        assert_eq!(config.engines.entries.len(), 3);
        assert!(config.engines.entries.iter().all(|e| e.enabled));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.engines.primary, config.engines.primary);
        assert_eq!(parsed.translate.default_target_lang, "en");
    }
}
