use crate::config::Config;
use crate::errors::{MarketDataError, Result};
use crate::fetchers::base::NewsFetcher;
use crate::models::news::{NewsQuery, NewsResponse};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;

const API_KEY_HEADER: &str = "x-api-key";

// 危机/争议相关关键词，内容查询使用 OR 连接
const CONTROVERSY_PHRASES: [&str; 34] = [
    "scandal",
    "\"corporate misconduct*\"",
    "fraud",
    "\"financial irregularities*\"",
    "lawsuit",
    "\"legal action*\"",
    "bankruptcy",
    "\"financial distress*\"",
    "\"data breach\"",
    "\"security vulnerability*\"",
    "\"environmental impact\"",
    "\"ecological damage*\"",
    "\"labor dispute\"",
    "\"worker rights*\"",
    "\"product failure\"",
    "\"quality issue*\"",
    "\"ethical concern\"",
    "\"moral dilemma*\"",
    "\"health risk\"",
    "\"safety hazard*\"",
    "\"regulatory violation\"",
    "\"compliance issue*\"",
    "\"market manipulation\"",
    "\"trading irregularity*\"",
    "\"public relations crisis\"",
    "\"reputation damage*\"",
    "\"political controversy\"",
    "\"government intervention*\"",
    "\"consumer complaint\"",
    "\"customer dissatisfaction*\"",
    "\"supply chain disruption\"",
    "\"logistics problem*\"",
    "\"intellectual property dispute\"",
    "\"patent infringement*\"",
];

/// 常见币种代码到名称的映射
pub fn symbol_name(symbol: &str) -> &str {
    match symbol {
        "BTC" => "Bitcoin",
        "ETH" => "Ethereum",
        "XRP" => "Ripple",
        "LTC" => "Litecoin",
        "ADA" => "Cardano",
        "DOGE" => "Dogecoin",
        "BNB" => "Binance Coin",
        "DOT" => "Polkadot",
        "SOL" => "Solana",
        "AVAX" => "Avalanche",
        other => other,
    }
}

pub fn content_query() -> String {
    CONTROVERSY_PHRASES.join(" OR ")
}

pub fn title_query(symbol: &str) -> String {
    let name = symbol_name(symbol);
    format!(
        "{name} OR {symbol} OR \"{name} price\" OR \"{name} market\" OR \"{name} news\"",
        name = name,
        symbol = symbol
    )
}

/// Perigon 新闻搜索客户端
pub struct PerigonClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PerigonClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .perigon_api_key
            .clone()
            .ok_or(MarketDataError::MissingApiKey("PERIGON_API_KEY"))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.perigon_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl NewsFetcher for PerigonClient {
    async fn fetch_news(&self, query: &NewsQuery) -> Result<NewsResponse> {
        if query.symbol.trim().is_empty() {
            return Err(MarketDataError::Validation("symbol must not be empty".to_string()));
        }
        if query.limit == 0 {
            return Err(MarketDataError::Validation("limit must be greater than 0".to_string()));
        }

        info!("获取 {} 相关新闻，数量 {}，排序 {}", query.symbol, query.limit, query.sort);

        let response = self
            .client
            .get(format!("{}/v1/all", self.base_url))
            .query(&[
                ("q", content_query()),
                ("title", title_query(&query.symbol)),
                ("size", query.limit.to_string()),
                ("sortBy", query.sort.as_str().to_string()),
            ])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(MarketDataError::upstream(
                Some(status.as_u16()),
                format!("news search failed: {}", text.trim()),
            ));
        }

        let mut news: NewsResponse = serde_json::from_str(&text)
            .map_err(|e| MarketDataError::MalformedResponse(format!("/v1/all: {}", e)))?;
        if news.status == 0 {
            news.status = status.as_u16();
        }

        debug!(
            "新闻接口返回 {} 条，共 {:?} 条匹配",
            news.articles.as_ref().map(Vec::len).unwrap_or_default(),
            news.num_results
        );
        Ok(news)
    }
}
