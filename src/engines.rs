//! Suggestion engine set / 搜索建议引擎集合
//!
//! Runtime view of the engine table from settings: which engines are
//! enabled, in which order they fan out, and which one is primary.
//! Invariant: at least one engine stays enabled at all times /
//! 不变量：始终保留至少一个启用的引擎

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::config::{EngineConfig, EngineEntry};

/// Shared handle read by the aggregator and mutated by settings / 共享句柄
pub type SharedEngineSet = Arc<parking_lot::RwLock<EngineSet>>;

/// Engine set (runtime) / 引擎集合（运行时）
#[derive(Debug, Clone)]
pub struct EngineSet {
    entries: Vec<EngineEntry>,
    primary: String,
}

impl EngineSet {
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut set = Self {
            entries: config.entries.clone(),
            primary: config.primary.clone(),
        };
        // A config with nothing enabled is unusable; fall back to enabling the first entry
        // 配置中若没有任何启用引擎则启用第一个
        if !set.entries.iter().any(|e| e.enabled) {
            if let Some(first) = set.entries.first_mut() {
                tracing::warn!("No engine enabled in config, enabling {}", first.name);
                first.enabled = true;
            }
        }
        set
    }

    pub fn to_config(&self) -> EngineConfig {
        EngineConfig {
            entries: self.entries.clone(),
            primary: self.primary.clone(),
        }
    }

    /// Enabled engine names in table order / 按表顺序返回启用的引擎名
    pub fn enabled(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name && e.enabled)
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Enable or disable one engine / 启用或禁用引擎
    ///
    /// Disabling the last enabled engine is rejected and leaves the
    /// set unchanged.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| anyhow!("Unknown engine: {}", name))?;

        if !enabled {
            let enabled_count = self.entries.iter().filter(|e| e.enabled).count();
            if self.entries[idx].enabled && enabled_count <= 1 {
                return Err(anyhow!("Cannot disable the last enabled engine: {}", name));
            }
        }

        self.entries[idx].enabled = enabled;
        Ok(())
    }

    /// Switch the primary engine / 切换主引擎
    pub fn set_primary(&mut self, name: &str) -> Result<()> {
        if !self.entries.iter().any(|e| e.name == name) {
            return Err(anyhow!("Unknown engine: {}", name));
        }
        self.primary = name.to_string();
        Ok(())
    }

    /// Result-page URL of the primary engine for a full search / 主引擎搜索页 URL
    pub fn search_url(&self, query: &str) -> String {
        let q = urlencoding::encode(query.trim());
        match self.primary.as_str() {
            "bing" => format!("https://www.bing.com/search?q={}", q),
            "baidu" => format!("https://www.baidu.com/s?wd={}", q),
            // google 及未知引擎回退到 google
            _ => format!("https://www.google.com/search?q={}", q),
        }
    }
}
