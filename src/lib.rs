// 公开导出的模块，供外部使用
pub mod config;
pub mod context;
pub mod errors;
pub mod fetchers;
pub mod models;
pub mod stores;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use context::{MarketContext, MarketSnapshot};
pub use errors::{MarketDataError, Result};
pub use models::news::{NewsArticle, SortOrder};
pub use models::quote::Quote;
pub use stores::news_store::NewsStore;
pub use stores::quote_store::QuoteStore;
