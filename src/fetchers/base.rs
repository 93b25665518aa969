use crate::errors::Result;
use crate::models::news::{NewsQuery, NewsResponse};
use crate::models::quote::Quote;
use async_trait::async_trait;

/// Fetches the latest quote for a single symbol
#[async_trait]
pub trait QuoteFetcher {
    /// 每次调用恰好发出一个请求，不重试
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;
}

/// Fetches the trending gainers and losers listing
#[async_trait]
pub trait MarketMoversFetcher {
    async fn fetch_gainers_losers(&self, limit: usize) -> Result<Vec<Quote>>;
}

/// Searches news articles related to a symbol
#[async_trait]
pub trait NewsFetcher {
    async fn fetch_news(&self, query: &NewsQuery) -> Result<NewsResponse>;
}
