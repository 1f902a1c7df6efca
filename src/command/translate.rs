//! Translate command / 翻译命令
//!
//! Accepts an optional `src>dst text` syntax; without a `>` the
//! source is auto-detected and the target falls back to the
//! configured default language.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

use super::CommandHandler;
use crate::models::{CommandOutcome, OutcomeKind};

/// External translation provider / 外部翻译数据源
#[async_trait]
pub trait TranslateProvider: Send + Sync {
    async fn translate(&self, text: &str, src: &str, dst: &str) -> Result<String>;
}

/// Google gtx endpoint provider / 基于 Google gtx 接口的数据源
pub struct GoogleTranslateProvider {
    client: Client,
}

impl GoogleTranslateProvider {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for GoogleTranslateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslateProvider for GoogleTranslateProvider {
    async fn translate(&self, text: &str, src: &str, dst: &str) -> Result<String> {
        let url = format!(
            "https://translate.googleapis.com/translate_a/single?client=gtx&sl={}&tl={}&dt=t&q={}",
            src,
            dst,
            urlencoding::encode(text)
        );

        let body: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Response shape: [[["translated","original",…],…],…] / 响应为嵌套数组
        let segments = body
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("unexpected translation payload"))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(|v| v.as_str()))
            .collect();

        if translated.is_empty() {
            return Err(anyhow!("empty translation result"));
        }
        Ok(translated)
    }
}

/// Parsed translate arguments / 解析后的翻译参数
#[derive(Debug, PartialEq)]
struct TranslateArgs {
    src: String,
    dst: String,
    text: String,
}

/// Split `src>dst text`; no `>` means auto-detect into the default
/// target / 拆分方向标记，缺省为自动检测
fn parse_args(args: &str, default_target: &str) -> TranslateArgs {
    let trimmed = args.trim();

    if let Some((head, tail)) = trimmed.split_once(char::is_whitespace) {
        if let Some((src, dst)) = head.split_once('>') {
            let src = if src.is_empty() { "auto" } else { src };
            let dst = if dst.is_empty() { default_target } else { dst };
            return TranslateArgs {
                src: src.to_string(),
                dst: dst.to_string(),
                text: tail.trim().to_string(),
            };
        }
    }

    TranslateArgs {
        src: "auto".to_string(),
        dst: default_target.to_string(),
        text: trimmed.to_string(),
    }
}

pub struct TranslateCommand {
    provider: Arc<dyn TranslateProvider>,
    default_target: String,
}

impl TranslateCommand {
    pub fn new(provider: Arc<dyn TranslateProvider>, default_target: impl Into<String>) -> Self {
        Self {
            provider,
            default_target: default_target.into(),
        }
    }
}

#[async_trait]
impl CommandHandler for TranslateCommand {
    fn kind(&self) -> OutcomeKind {
        OutcomeKind::Translate
    }

    async fn execute(&self, args: &str) -> CommandOutcome {
        let parsed = parse_args(args, &self.default_target);
        if parsed.text.is_empty() {
            return CommandOutcome::fail(self.kind(), "Nothing to translate");
        }

        match self
            .provider
            .translate(&parsed.text, &parsed.src, &parsed.dst)
            .await
        {
            Ok(translated) => CommandOutcome::ok(
                self.kind(),
                json!({
                    "text": parsed.text,
                    "translated": translated,
                    "src": parsed.src,
                    "dst": parsed.dst,
                }),
            ),
            Err(e) => {
                tracing::warn!("Translation failed for {:?}: {}", parsed.text, e);
                CommandOutcome::fail(self.kind(), "Translation failed")
            }
        }
    }
}
