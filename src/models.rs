use serde::{Deserialize, Serialize};

/// Bookmark tree node supplied by the browser-side provider / 浏览器端书签树节点
///
/// Folders carry `children`, leaves carry `url`. The core never
/// mutates the tree, it only flattens it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

/// Flattened bookmark record / 扁平化书签记录
///
/// Immutable once produced by flattening; a reload replaces the whole
/// collection. `search_text` is the precomputed lowercase fallback
/// field (title + domain + path).
#[derive(Debug, Clone, Serialize)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    /// Folder breadcrumb, e.g. "工具 > 开发" / 文件夹面包屑
    pub path: String,
    pub domain: String,
    pub search_text: String,
}

/// A scored search hit / 带评分的搜索命中
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkHit {
    pub bookmark: Bookmark,
    pub score: u32,
}

/// Result kind tag consumed by the presentation layer / 结果类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Calculator,
    Weather,
    Translate,
    Bookmarks,
    Suggestions,
}

/// Structured command result / 结构化命令结果
///
/// Every handler resolves to one of these; `success: false` carries a
/// kind-specific message instead of an error being thrown.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub kind: OutcomeKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandOutcome {
    pub fn ok(kind: OutcomeKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn fail(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Current weather conditions / 当前天气状况
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherNow {
    /// Temperature in °C / 摄氏温度
    pub temperature: f64,
    /// Wind speed in km/h / 风速
    pub wind_speed: f64,
    pub condition: String,
}

/// One forecast day / 单日预报
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub high: f64,
    pub low: f64,
    pub condition: String,
}

/// Structured weather lookup result / 天气查询结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherData {
    pub city: String,
    pub current: WeatherNow,
    pub forecast: Vec<ForecastDay>,
}
