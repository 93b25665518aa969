use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info};
use tokio::sync::Mutex as AsyncMutex;

use crate::errors::Result;
use crate::fetchers::base::QuoteFetcher;
use crate::models::quote::Quote;
use crate::stores::quote_cache::QuoteCache;

/// 行情缓存存储
///
/// 先查缓存再请求；同一代码的并发请求只会有一个真正发往上游，
/// 其余调用等待后直接读取缓存。
pub struct QuoteStore {
    fetcher: Arc<dyn QuoteFetcher + Send + Sync>,
    cache: Mutex<QuoteCache>,
    // 每个代码一把锁，用于单飞
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl QuoteStore {
    pub fn new(fetcher: Arc<dyn QuoteFetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(QuoteCache::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, QuoteCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_quote(&self, symbol: &str) -> Option<Quote> {
        self.cache().get(symbol).cloned()
    }

    pub fn has_quote(&self, symbol: &str) -> bool {
        self.cache().has(symbol)
    }

    pub fn cached_symbols(&self) -> Vec<String> {
        self.cache().symbols()
    }

    /// 获取单个代码的行情，命中缓存时不发请求
    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        if let Some(quote) = self.get_quote(symbol) {
            debug!("{} 命中缓存", symbol);
            return Ok(quote);
        }

        let key_lock = self.key_lock(symbol);
        let result = {
            let _guard = key_lock.lock().await;

            // 等锁期间其他调用可能已经写入
            match self.get_quote(symbol) {
                Some(quote) => {
                    debug!("{} 在等待期间已被写入缓存", symbol);
                    Ok(quote)
                }
                None => self.fetch_and_store(symbol).await,
            }
        };
        self.release_key(symbol, key_lock);

        result
    }

    async fn fetch_and_store(&self, symbol: &str) -> Result<Quote> {
        let generation = self.cache().generation();
        match self.fetcher.fetch_quote(symbol).await {
            Ok(quote) => {
                let mut cache = self.cache();
                // 请求期间缓存被清空过，结果只返回给调用方
                if cache.generation() == generation {
                    cache.set(symbol, quote.clone());
                } else {
                    debug!("{} 的请求早于清空缓存，不写入", symbol);
                }
                Ok(quote)
            }
            Err(e) => {
                error!("An error occurred fetching the quote for symbol {}: {}", symbol, e);
                Err(e)
            }
        }
    }

    /// 按顺序逐个解析，重复代码只解析一次；遇到第一个错误即返回
    pub async fn fetch_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Result<HashMap<String, Quote>> {
        let mut results = HashMap::with_capacity(symbols.len());

        for symbol in symbols {
            let symbol = symbol.as_ref();
            if results.contains_key(symbol) {
                continue;
            }

            let quote = match self.get_quote(symbol) {
                Some(quote) => quote,
                // fetch_quote 的结果已经是规范化后的记录
                None => self.fetch_quote(symbol).await?,
            };
            results.insert(symbol.to_string(), quote);
        }

        Ok(results)
    }

    /// 清空缓存；清空前已发出的请求结果不会再写回
    pub fn clear_cache(&self) {
        let mut cache = self.cache();
        info!("清空行情缓存，共 {} 条", cache.len());
        cache.clear();
    }

    fn key_lock(&self, symbol: &str) -> Arc<AsyncMutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    // 没有其他等待者时移除该代码的锁
    fn release_key(&self, symbol: &str, key_lock: Arc<AsyncMutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let is_current = in_flight
            .get(symbol)
            .is_some_and(|current| Arc::ptr_eq(current, &key_lock));
        if is_current && Arc::strong_count(&key_lock) <= 2 {
            in_flight.remove(symbol);
        }
        // 引用计数必须在持有 in_flight 锁时减少
        drop(key_lock);
    }
}
