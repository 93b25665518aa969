use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{error, info};

use crate::errors::{MarketDataError, Result};
use crate::fetchers::base::NewsFetcher;
use crate::models::news::{NewsArticle, NewsQuery, RawArticle, SortOrder};

#[derive(Debug, Default)]
struct NewsState {
    symbols_news: HashMap<String, Vec<NewsArticle>>,
    // 代码首次出现的顺序
    symbols: Vec<String>,
    // 进行中的请求数，大于 0 即为加载中
    in_flight: usize,
    error: Option<String>,
}

/// 按代码缓存新闻列表，只追加，直到显式清空
pub struct NewsStore {
    fetcher: Arc<dyn NewsFetcher + Send + Sync>,
    state: Mutex<NewsState>,
}

impl NewsStore {
    pub fn new(fetcher: Arc<dyn NewsFetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            state: Mutex::new(NewsState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, NewsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 追加文章，返回该代码当前的文章总数
    pub fn add_news(&self, symbol: &str, articles: Vec<RawArticle>) -> usize {
        let mut state = self.state();
        append(&mut state, symbol, articles)
    }

    /// 清空已有代码的列表，不存在的代码保持不存在
    pub fn clear_news(&self, symbol: &str) {
        if let Some(list) = self.state().symbols_news.get_mut(symbol) {
            list.clear();
        }
    }

    /// 请求新闻并追加，返回本次追加的数量
    ///
    /// 失败时错误信息同时写入 `error()` 并返回给调用方。
    pub async fn fetch_news_for_symbol(&self, symbol: &str, limit: usize, sort: SortOrder) -> Result<usize> {
        let loading = Loading::start(&self.state);

        let query = NewsQuery::new(symbol, limit, sort);
        let result = self.fetcher.fetch_news(&query).await.and_then(|response| {
            response.articles.ok_or_else(|| {
                MarketDataError::MalformedResponse(
                    "Failed to fetch news or invalid response format.".to_string(),
                )
            })
        });

        let mut state = self.state();
        loading.finish(&mut state);

        match result {
            Ok(articles) => {
                let added = articles.len();
                let total = append(&mut state, symbol, articles);
                info!("{} 新增 {} 条新闻，共 {} 条", symbol, added, total);
                Ok(added)
            }
            Err(e) => {
                error!("Error fetching news for {}: {}", symbol, e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn get_news_for_symbol(&self, symbol: &str) -> Vec<NewsArticle> {
        self.state()
            .symbols_news
            .get(symbol)
            .cloned()
            .unwrap_or_default()
    }

    /// 按首次出现的顺序返回所有代码
    pub fn get_all_symbols(&self) -> Vec<String> {
        self.state().symbols.clone()
    }

    pub fn has_news_for_symbol(&self, symbol: &str) -> bool {
        self.state()
            .symbols_news
            .get(symbol)
            .is_some_and(|list| !list.is_empty())
    }

    pub fn is_loading(&self) -> bool {
        self.state().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }
}

fn append(state: &mut NewsState, symbol: &str, articles: Vec<RawArticle>) -> usize {
    if !state.symbols_news.contains_key(symbol) {
        state.symbols.push(symbol.to_string());
    }
    let list = state.symbols_news.entry(symbol.to_string()).or_default();
    list.extend(articles.into_iter().map(NewsArticle::from));
    list.len()
}

// 计入一次进行中的请求；future 被丢弃时在 Drop 里退回计数
struct Loading<'a> {
    state: &'a Mutex<NewsState>,
    finished: bool,
}

impl<'a> Loading<'a> {
    fn start(state: &'a Mutex<NewsState>) -> Self {
        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.in_flight += 1;
        guard.error = None;
        Self { state, finished: false }
    }

    // 调用方已持有锁，直接在其上退回计数
    fn finish(mut self, state: &mut NewsState) {
        state.in_flight = state.in_flight.saturating_sub(1);
        self.finished = true;
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::news::NewsResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Reply {
        Articles(usize),
        Missing,
        Fail,
        FailOnce(usize),
    }

    struct FakeNews {
        reply: Reply,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeNews {
        fn new(reply: Reply) -> Self {
            Self { reply, delay: None, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl NewsFetcher for FakeNews {
        async fn fetch_news(&self, query: &NewsQuery) -> Result<NewsResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.reply {
                Reply::Fail => Err(MarketDataError::upstream(Some(401), "invalid api key")),
                Reply::FailOnce(_) if call == 0 => Err(MarketDataError::upstream(Some(401), "invalid api key")),
                Reply::Articles(n) | Reply::FailOnce(n) => Ok(articles(&query.symbol, n)),
                Reply::Missing => Ok(NewsResponse { status: 200, ..Default::default() }),
            }
        }
    }

    fn articles(symbol: &str, n: usize) -> NewsResponse {
        NewsResponse {
            status: 200,
            num_results: Some(n as u64),
            articles: Some(
                (0..n)
                    .map(|i| RawArticle {
                        title: Some(format!("{} story {}", symbol, i)),
                        content: Some("body".to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
        }
    }

    fn raw(title: &str) -> RawArticle {
        RawArticle {
            title: Some(title.to_string()),
            content: Some(format!("{} content", title)),
            url: Some(format!("http://example.com/{}", title)),
            ..Default::default()
        }
    }

    fn titles(articles: &[NewsArticle]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn new_store_is_idle_and_empty() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Articles(1))));

        assert!(!store.is_loading());
        assert_eq!(store.error(), None);
        assert!(store.get_all_symbols().is_empty());
        assert!(store.get_news_for_symbol("BTC").is_empty());
    }

    #[test]
    fn add_news_appends_in_insertion_order() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Articles(1))));

        assert_eq!(store.add_news("BTC", vec![raw("a1"), raw("a2")]), 2);
        assert_eq!(titles(&store.get_news_for_symbol("BTC")), vec!["a1", "a2"]);

        assert_eq!(store.add_news("BTC", vec![raw("a3")]), 3);
        assert_eq!(titles(&store.get_news_for_symbol("BTC")), vec!["a1", "a2", "a3"]);
        assert!(store.has_news_for_symbol("BTC"));
        assert!(!store.is_loading());
    }

    #[test]
    fn clear_news_empties_list_but_keeps_symbol() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Articles(1))));
        store.add_news("BTC", vec![raw("a1"), raw("a2"), raw("a3")]);

        store.clear_news("BTC");
        store.clear_news("ETH");

        assert!(store.get_news_for_symbol("BTC").is_empty());
        assert!(!store.has_news_for_symbol("BTC"));
        assert_eq!(store.get_all_symbols(), vec!["BTC"]);
    }

    #[test]
    fn empty_add_creates_symbol_without_news() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Articles(1))));
        store.add_news("SOL", Vec::new());
        store.add_news("ADA", vec![raw("x")]);
        store.add_news("SOL", vec![raw("y")]);

        assert_eq!(store.get_all_symbols(), vec!["SOL", "ADA"]);
        assert!(!store.has_news_for_symbol("SOL"));
    }

    #[tokio::test]
    async fn fetch_appends_results() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Articles(3))));
        store.add_news("BTC", vec![raw("old")]);

        let added = store.fetch_news_for_symbol("BTC", 3, SortOrder::Date).await.unwrap();

        assert_eq!(added, 3);
        let news = store.get_news_for_symbol("BTC");
        assert_eq!(titles(&news), vec!["old", "BTC story 0", "BTC story 1", "BTC story 2"]);
        assert!(!store.is_loading());
        assert_eq!(store.error(), None);
    }

    #[tokio::test]
    async fn fetch_failure_records_error_and_keeps_list() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Fail)));
        store.add_news("BTC", vec![raw("a1")]);

        let err = store.fetch_news_for_symbol("BTC", 10, SortOrder::Relevance).await.unwrap_err();

        assert!(matches!(err, MarketDataError::Upstream { status: Some(401), .. }));
        assert!(!store.is_loading());
        let message = store.error().unwrap();
        assert!(!message.is_empty());
        assert!(message.contains("invalid api key"));
        assert_eq!(titles(&store.get_news_for_symbol("BTC")), vec!["a1"]);
    }

    #[tokio::test]
    async fn response_without_articles_is_malformed() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Missing)));

        let err = store.fetch_news_for_symbol("ETH", 5, SortOrder::Date).await.unwrap_err();

        assert!(matches!(err, MarketDataError::MalformedResponse(_)));
        assert!(store.error().unwrap().contains("invalid response format"));
        assert!(!store.has_news_for_symbol("ETH"));
        assert!(store.get_all_symbols().is_empty());
    }

    #[tokio::test]
    async fn successful_fetch_resets_previous_error() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::FailOnce(2))));

        assert!(store.fetch_news_for_symbol("BTC", 2, SortOrder::Date).await.is_err());
        assert!(store.error().is_some());

        store.fetch_news_for_symbol("BTC", 2, SortOrder::Date).await.unwrap();
        assert_eq!(store.error(), None);
        assert_eq!(store.get_news_for_symbol("BTC").len(), 2);
    }

    #[tokio::test]
    async fn loading_stays_set_while_any_fetch_is_in_flight() {
        let fetcher = Arc::new(FakeNews {
            delay: Some(Duration::from_millis(50)),
            ..FakeNews::new(Reply::Articles(2))
        });
        let store = Arc::new(NewsStore::new(fetcher.clone()));

        let background = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_news_for_symbol("BTC", 2, SortOrder::Date).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.is_loading());

        background.await.unwrap().unwrap();
        assert!(!store.is_loading());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_news_for_symbol("BTC").len(), 2);
    }

    #[tokio::test]
    async fn cancelled_fetch_does_not_leave_store_loading() {
        let fetcher = Arc::new(FakeNews {
            delay: Some(Duration::from_millis(200)),
            ..FakeNews::new(Reply::Articles(2))
        });
        let store = NewsStore::new(fetcher.clone());

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            store.fetch_news_for_symbol("BTC", 2, SortOrder::Date),
        )
        .await;

        assert!(timed_out.is_err());
        assert!(!store.is_loading());
        assert!(store.get_all_symbols().is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        // 之后的请求照常进行
        store.fetch_news_for_symbol("ETH", 1, SortOrder::Date).await.unwrap();
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn fetch_registers_new_symbols_after_existing_ones() {
        let store = NewsStore::new(Arc::new(FakeNews::new(Reply::Articles(1))));
        store.add_news("SOL", vec![raw("a")]);

        store.fetch_news_for_symbol("ADA", 1, SortOrder::Date).await.unwrap();
        store.fetch_news_for_symbol("SOL", 1, SortOrder::Date).await.unwrap();

        assert_eq!(store.get_all_symbols(), vec!["SOL", "ADA"]);
        assert_eq!(store.get_news_for_symbol("SOL").len(), 2);
    }
}
