use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::config::Config;
use crate::errors::Result;
use crate::fetchers::base::{NewsFetcher, QuoteFetcher};
use crate::fetchers::coinmarketcap::CoinMarketCapClient;
use crate::fetchers::perigon::PerigonClient;
use crate::models::news::{NewsArticle, SortOrder};
use crate::models::quote::Quote;
use crate::stores::news_store::NewsStore;
use crate::stores::quote_store::QuoteStore;

/// 进程启动时构建一次，持有行情与新闻存储
pub struct MarketContext {
    pub quotes: QuoteStore,
    pub news: NewsStore,
    symbols: Vec<String>,
}

/// 多个代码的行情与新闻汇总
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub generated_at: DateTime<Utc>,
    pub quotes: BTreeMap<String, Quote>,
    pub news: BTreeMap<String, Vec<NewsArticle>>,
}

impl MarketContext {
    pub fn new(
        quote_fetcher: Arc<dyn QuoteFetcher + Send + Sync>,
        news_fetcher: Arc<dyn NewsFetcher + Send + Sync>,
        symbols: Vec<String>,
    ) -> Self {
        Self {
            quotes: QuoteStore::new(quote_fetcher),
            news: NewsStore::new(news_fetcher),
            symbols,
        }
    }

    /// 使用 CoinMarketCap 与 Perigon 客户端构建，两个 API key 都必须配置
    pub fn from_config(config: &Config) -> Result<Self> {
        let quote_fetcher = Arc::new(CoinMarketCapClient::new(config)?);
        let news_fetcher = Arc::new(PerigonClient::new(config)?);

        Ok(Self::new(
            quote_fetcher,
            news_fetcher,
            config.tracked_symbols.clone(),
        ))
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// 获取行情与新闻；`symbols` 为空时使用跟踪列表。
    /// 已有新闻的代码不会重复请求。
    pub async fn snapshot(&self, symbols: &[String], news_limit: usize, sort: SortOrder) -> Result<MarketSnapshot> {
        let symbols = if symbols.is_empty() { &self.symbols[..] } else { symbols };
        info!("生成 {} 个代码的快照", symbols.len());

        let quotes = self.quotes.fetch_quotes(symbols).await?;

        let mut news = BTreeMap::new();
        for symbol in symbols {
            if !self.news.has_news_for_symbol(symbol) {
                self.news.fetch_news_for_symbol(symbol, news_limit, sort).await?;
            }
            news.insert(symbol.clone(), self.news.get_news_for_symbol(symbol));
        }

        Ok(MarketSnapshot {
            generated_at: Utc::now(),
            quotes: quotes.into_iter().collect(),
            news,
        })
    }
}
