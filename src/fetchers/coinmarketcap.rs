use crate::config::Config;
use crate::errors::{MarketDataError, Result};
use crate::fetchers::base::{MarketMoversFetcher, QuoteFetcher};
use crate::models::quote::{MoversResponse, Quote, QuotesResponse};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

const API_KEY_HEADER: &str = "x-cmc_pro_api_key";

/// CoinMarketCap 行情客户端
pub struct CoinMarketCapClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CoinMarketCapClient {
    /// 使用配置中的 `coinmarketcap_api_key` 创建客户端
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .coinmarketcap_api_key
            .clone()
            .ok_or(MarketDataError::MissingApiKey("CCC_API_KEY"))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.coinmarketcap_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(MarketDataError::upstream(
                Some(status.as_u16()),
                error_message(&text).unwrap_or_else(|| format!("request to {} failed", path)),
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| MarketDataError::MalformedResponse(format!("{}: {}", path, e)))
    }
}

/// 从 `status.error_message` 提取上游错误信息
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("status")
        .and_then(|s| s.get("error_message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[async_trait]
impl QuoteFetcher for CoinMarketCapClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        info!("获取 {} 最新行情", symbol);

        let response: QuotesResponse = self
            .get_json(
                "/v2/cryptocurrency/quotes/latest",
                &[("symbol", symbol.to_string())],
            )
            .await?;

        response.into_quote(symbol)
    }
}

#[async_trait]
impl MarketMoversFetcher for CoinMarketCapClient {
    async fn fetch_gainers_losers(&self, limit: usize) -> Result<Vec<Quote>> {
        if limit == 0 {
            return Err(MarketDataError::Validation("limit must be greater than 0".to_string()));
        }
        info!("获取涨跌榜，数量 {}", limit);

        let response: MoversResponse = self
            .get_json(
                "/v1/cryptocurrency/trending/gainers-losers",
                &[("limit", limit.to_string())],
            )
            .await?;

        let quotes = response.into_quotes()?;
        debug!("涨跌榜返回 {} 条记录", quotes.len());
        Ok(quotes)
    }
}
