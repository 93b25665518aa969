use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::errors::{MarketDataError, Result};

/// USD 行情字段，上游对部分字段会返回 null
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsdQuote {
    pub price: Option<f64>,
    pub volume_24h: Option<f64>,
    pub volume_change_24h: Option<f64>,
    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
    pub percent_change_30d: Option<f64>,
    pub percent_change_60d: Option<f64>,
    pub percent_change_90d: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_dominance: Option<f64>,
    pub fully_diluted_market_cap: Option<f64>,
    pub tvl: Option<f64>,
    pub last_updated: Option<String>,
}

/// 规范化后的扁平行情记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub slug: String,
    pub tags: BTreeSet<String>,
    pub id: i64,
    #[serde(flatten)]
    pub usd: UsdQuote,
}

impl Quote {
    pub fn price(&self) -> Option<f64> {
        self.usd.price
    }
}

/// 报价接口返回详细标签对象，涨跌榜接口只返回字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Name(String),
    Detailed { slug: String },
}

impl RawTag {
    fn into_slug(self) -> String {
        match self {
            RawTag::Name(name) => name,
            RawTag::Detailed { slug } => slug,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cryptocurrency {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub symbol: String,
    pub slug: String,
    #[serde(default)]
    pub tags: Option<Vec<RawTag>>,
    #[serde(default)]
    pub cmc_rank: Option<i64>,
    #[serde(default)]
    pub quote: HashMap<String, UsdQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub credit_count: Option<i64>,
}

/// `/v2/cryptocurrency/quotes/latest` 的响应体
#[derive(Debug, Clone, Deserialize)]
pub struct QuotesResponse {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub data: Option<HashMap<String, Vec<Cryptocurrency>>>,
}

/// `/v1/cryptocurrency/trending/gainers-losers` 的响应体
#[derive(Debug, Clone, Deserialize)]
pub struct MoversResponse {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub data: Option<Vec<Cryptocurrency>>,
}

impl Cryptocurrency {
    /// 提取 symbol/slug/tags/id 并展开 USD 行情
    pub fn into_quote(mut self) -> Result<Quote> {
        let usd = self.quote.remove("USD").ok_or_else(|| {
            MarketDataError::MalformedResponse(format!("no USD quote for {}", self.symbol))
        })?;

        Ok(Quote {
            symbol: self.symbol,
            slug: self.slug,
            tags: self
                .tags
                .unwrap_or_default()
                .into_iter()
                .map(RawTag::into_slug)
                .collect(),
            id: self.id,
            usd,
        })
    }
}

impl QuotesResponse {
    /// 取 `data[symbol]` 的第一条记录
    pub fn into_quote(self, symbol: &str) -> Result<Quote> {
        let first = self
            .data
            .and_then(|mut data| data.remove(symbol))
            .and_then(|entries| entries.into_iter().next())
            .ok_or_else(|| {
                MarketDataError::MalformedResponse(format!("response has no data for {}", symbol))
            })?;

        first.into_quote()
    }
}

impl MoversResponse {
    pub fn into_quotes(self) -> Result<Vec<Quote>> {
        let data = self
            .data
            .ok_or_else(|| MarketDataError::MalformedResponse("response has no data".to_string()))?;

        data.into_iter().map(Cryptocurrency::into_quote).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_first_entry_into_flat_record() {
        let body = json!({
            "status": {"error_code": 0, "error_message": null},
            "data": {
                "BTC": [
                    {"symbol": "BTC", "slug": "bitcoin", "id": 1, "tags": [], "quote": {"USD": {"price": 50000.0, "volume_24h": 1.5e10}}},
                    {"symbol": "BTC", "slug": "batcat", "id": 2, "tags": [], "quote": {"USD": {"price": 0.01}}}
                ]
            }
        });

        let response: QuotesResponse = serde_json::from_value(body).unwrap();
        let quote = response.into_quote("BTC").unwrap();

        assert_eq!(quote.symbol, "BTC");
        assert_eq!(quote.slug, "bitcoin");
        assert_eq!(quote.id, 1);
        assert!(quote.tags.is_empty());
        assert_eq!(quote.price(), Some(50000.0));

        let flat = serde_json::to_value(&quote).unwrap();
        assert_eq!(flat["price"], json!(50000.0));
        assert_eq!(flat["volume_24h"], json!(1.5e10));
        assert_eq!(flat["slug"], json!("bitcoin"));
        assert!(flat.get("usd").is_none());
    }

    #[test]
    fn detailed_and_plain_tags_both_become_strings() {
        let body = json!({
            "data": {
                "ETH": [{
                    "symbol": "ETH", "slug": "ethereum", "id": 1027,
                    "tags": [{"slug": "pos", "name": "PoS", "category": "ALGORITHM"}, "smart-contracts", "pos"],
                    "quote": {"USD": {"price": 3000.0}}
                }]
            }
        });

        let quote = serde_json::from_value::<QuotesResponse>(body)
            .unwrap()
            .into_quote("ETH")
            .unwrap();

        let tags: Vec<&str> = quote.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["pos", "smart-contracts"]);
    }

    #[test]
    fn missing_symbol_entry_is_malformed() {
        let empty: QuotesResponse = serde_json::from_value(json!({"data": {"BTC": []}})).unwrap();
        assert!(matches!(empty.into_quote("BTC"), Err(MarketDataError::MalformedResponse(_))));

        let other: QuotesResponse = serde_json::from_value(json!({"data": {"ETH": []}})).unwrap();
        assert!(matches!(other.into_quote("BTC"), Err(MarketDataError::MalformedResponse(_))));

        let no_data: QuotesResponse = serde_json::from_value(json!({"status": {}})).unwrap();
        assert!(matches!(no_data.into_quote("BTC"), Err(MarketDataError::MalformedResponse(_))));
    }

    #[test]
    fn entry_without_usd_quote_is_malformed() {
        let body = json!({"data": {"BTC": [{"symbol": "BTC", "slug": "bitcoin", "id": 1, "quote": {"EUR": {"price": 1.0}}}]}});
        let response: QuotesResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(response.into_quote("BTC"), Err(MarketDataError::MalformedResponse(_))));
    }

    #[test]
    fn movers_normalize_every_entry() {
        let body = json!({
            "data": [
                {"id": 5, "symbol": "AAA", "slug": "aaa", "tags": ["meme"], "quote": {"USD": {"price": 1.0, "percent_change_24h": 40.0}}},
                {"id": 6, "symbol": "BBB", "slug": "bbb", "tags": [], "quote": {"USD": {"price": 2.0, "percent_change_24h": -30.0}}}
            ],
            "status": {"error_code": 0}
        });

        let quotes = serde_json::from_value::<MoversResponse>(body)
            .unwrap()
            .into_quotes()
            .unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].symbol, "AAA");
        assert!(quotes[0].tags.contains("meme"));
        assert_eq!(quotes[1].usd.percent_change_24h, Some(-30.0));
    }
}
