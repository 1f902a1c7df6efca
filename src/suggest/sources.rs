//! Engine suggestion adapters / 引擎建议适配器
//!
//! Each adapter wraps one upstream completion endpoint. All of them
//! race the HTTP call against the cancellation token so a superseded
//! request settles promptly instead of running to completion.

use async_trait::async_trait;
use reqwest::Client;

use super::{CancelToken, SuggestError, SuggestionSource};

/// Google completion endpoint (OpenSearch JSON) / Google 补全接口
pub struct GoogleSource {
    client: Client,
}

impl GoogleSource {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for GoogleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionSource for GoogleSource {
    fn name(&self) -> &str {
        "google"
    }

    async fn fetch(&self, query: &str, cancel: CancelToken) -> Result<Vec<String>, SuggestError> {
        let url = format!(
            "https://suggestqueries.google.com/complete/search?client=firefox&q={}",
            urlencoding::encode(query)
        );

        let request = async {
            let resp = self.client.get(&url).send().await?.error_for_status()?;
            let body: serde_json::Value = resp.json().await?;
            parse_opensearch(&body)
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(SuggestError::Cancelled),
            result = request => result,
        }
    }
}

/// Bing completion endpoint (OpenSearch JSON) / Bing 补全接口
pub struct BingSource {
    client: Client,
}

impl BingSource {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for BingSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionSource for BingSource {
    fn name(&self) -> &str {
        "bing"
    }

    async fn fetch(&self, query: &str, cancel: CancelToken) -> Result<Vec<String>, SuggestError> {
        let url = format!(
            "https://api.bing.com/osjson.aspx?query={}",
            urlencoding::encode(query)
        );

        let request = async {
            let resp = self.client.get(&url).send().await?.error_for_status()?;
            let body: serde_json::Value = resp.json().await?;
            parse_opensearch(&body)
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(SuggestError::Cancelled),
            result = request => result,
        }
    }
}

/// Baidu completion endpoint (GBK JSONP) / 百度补全接口
pub struct BaiduSource {
    client: Client,
}

impl BaiduSource {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for BaiduSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionSource for BaiduSource {
    fn name(&self) -> &str {
        "baidu"
    }

    async fn fetch(&self, query: &str, cancel: CancelToken) -> Result<Vec<String>, SuggestError> {
        let url = format!(
            "https://suggestion.baidu.com/su?wd={}&cb=window.baidu.sug",
            urlencoding::encode(query)
        );

        let request = async {
            let resp = self.client.get(&url).send().await?.error_for_status()?;
            let bytes = resp.bytes().await?;
            parse_baidu_jsonp(&bytes)
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(SuggestError::Cancelled),
            result = request => result,
        }
    }
}

/// Parse the OpenSearch shape `[query, [suggestions…], …]` / 解析 OpenSearch 结构
fn parse_opensearch(body: &serde_json::Value) -> Result<Vec<String>, SuggestError> {
    let list = body
        .get(1)
        .and_then(|v| v.as_array())
        .ok_or_else(|| SuggestError::Decode("unexpected suggestion payload shape".to_string()))?;

    Ok(list
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect())
}

/// Parse baidu's GBK JSONP `window.baidu.sug({q:"…",p:false,s:[…]})` / 解析百度 GBK JSONP
fn parse_baidu_jsonp(raw: &[u8]) -> Result<Vec<String>, SuggestError> {
    let (text, _, _) = encoding_rs::GBK.decode(raw);

    let start = text
        .find("s:[")
        .ok_or_else(|| SuggestError::Decode("missing suggestion array".to_string()))?;
    let rest = &text[start + 2..];
    let end = rest
        .find(']')
        .ok_or_else(|| SuggestError::Decode("unterminated suggestion array".to_string()))?;

    serde_json::from_str(&rest[..=end]).map_err(|e| SuggestError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_opensearch() {
        let body = json!(["rust", ["rust lang", "rust book", "rustup"]]);
        let list = parse_opensearch(&body).unwrap();
        assert_eq!(list, vec!["rust lang", "rust book", "rustup"]);
    }

    #[test]
    fn test_parse_opensearch_bad_shape() {
        let body = json!({"error": "nope"});
        assert!(matches!(
            parse_opensearch(&body),
            Err(SuggestError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_baidu_jsonp_ascii() {
        let raw = br#"window.baidu.sug({q:"rust",p:false,s:["rust lang","rust book"]});"#;
        let list = parse_baidu_jsonp(raw).unwrap();
        assert_eq!(list, vec!["rust lang", "rust book"]);
    }

    #[test]
    fn test_parse_baidu_jsonp_gbk() {
        let payload = r#"window.baidu.sug({q:"天气",p:false,s:["天气预报","天气北京"]});"#;
        let (bytes, _, _) = encoding_rs::GBK.encode(payload);
        let list = parse_baidu_jsonp(&bytes).unwrap();
        assert_eq!(list, vec!["天气预报", "天气北京"]);
    }

    #[test]
    fn test_parse_baidu_jsonp_missing_array() {
        let raw = br#"window.baidu.sug({q:"x",p:false});"#;
        assert!(matches!(
            parse_baidu_jsonp(raw),
            Err(SuggestError::Decode(_))
        ));
    }
}
