use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// 新闻排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Date,
    Relevance,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Date => "date",
            SortOrder::Relevance => "relevance",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortOrder::Date),
            "relevance" => Ok(SortOrder::Relevance),
            other => Err(MarketDataError::Validation(format!(
                "Unknown sort order: {} (expected date or relevance)",
                other
            ))),
        }
    }
}

/// Perigon 返回的原始文章，字段均可能缺失
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawArticle {
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub pub_date: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub authors_byline: Option<String>,
    pub short_summary: Option<String>,
    pub labels: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub score: Option<f64>,
}

/// 存入缓存的新闻条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub source: Option<String>,
    pub pub_date: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub authors_byline: Option<String>,
    pub short_summary: Option<String>,
    pub labels: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub score: Option<f64>,
}

impl From<RawArticle> for NewsArticle {
    fn from(raw: RawArticle) -> Self {
        Self {
            title: raw
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "No Title".to_string()),
            content: raw
                .content
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "No Content".to_string()),
            url: raw.url,
            source: raw.domain,
            pub_date: raw.pub_date,
            summary: raw.summary,
            description: raw.description,
            authors_byline: raw.authors_byline,
            short_summary: raw.short_summary,
            labels: raw.labels,
            image_url: raw.image_url,
            score: raw.score,
        }
    }
}

/// 新闻查询参数
#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub symbol: String,
    pub limit: usize,
    pub sort: SortOrder,
}

impl NewsQuery {
    pub fn new(symbol: &str, limit: usize, sort: SortOrder) -> Self {
        Self {
            symbol: symbol.to_string(),
            limit,
            sort,
        }
    }
}

/// `/v1/all` 的响应体；缺少 articles 视为格式错误
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub num_results: Option<u64>,
    #[serde(default)]
    pub articles: Option<Vec<RawArticle>>,
}
