pub mod news_store;
pub mod quote_cache;
pub mod quote_store;
