use std::env;
use std::time::Duration;

use log::warn;

pub const DEFAULT_CMC_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
pub const DEFAULT_PERIGON_BASE_URL: &str = "https://api.goperigon.com";

pub struct Config {
    pub coinmarketcap_api_key: Option<String>,
    pub perigon_api_key: Option<String>,
    pub coinmarketcap_base_url: String,
    pub perigon_base_url: String,
    pub request_timeout: Duration,
    pub tracked_symbols: Vec<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            coinmarketcap_api_key: None,
            perigon_api_key: None,
            coinmarketcap_base_url: DEFAULT_CMC_BASE_URL.to_string(),
            perigon_base_url: DEFAULT_PERIGON_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            tracked_symbols: Vec::new(),
        }
    }

    /// 从环境变量读取配置，未设置的项保持默认值
    pub fn from_env() -> Self {
        let mut config = Self::new();

        config.coinmarketcap_api_key = non_empty_var("CCC_API_KEY");
        config.perigon_api_key = non_empty_var("PERIGON_API_KEY");

        if let Some(url) = non_empty_var("CMC_API_BASE_URL") {
            config.coinmarketcap_base_url = url;
        }
        if let Some(url) = non_empty_var("PERIGON_API_BASE_URL") {
            config.perigon_base_url = url;
        }
        if let Some(symbols) = non_empty_var("MARKET_DATAHUB_SYMBOLS") {
            config.tracked_symbols = symbols
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(secs) = non_empty_var("MARKET_DATAHUB_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.request_timeout = Duration::from_secs(secs),
                Err(_) => warn!("Ignoring invalid MARKET_DATAHUB_TIMEOUT_SECS: {}", secs),
            }
        }

        config
    }

    pub fn with_coinmarketcap_api_key(mut self, key: &str) -> Self {
        self.coinmarketcap_api_key = Some(key.to_string());
        self
    }

    pub fn with_perigon_api_key(mut self, key: &str) -> Self {
        self.perigon_api_key = Some(key.to_string());
        self
    }

    pub fn with_coinmarketcap_base_url(mut self, url: &str) -> Self {
        self.coinmarketcap_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_perigon_base_url(mut self, url: &str) -> Self {
        self.perigon_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_tracked_symbols(mut self, symbols: &[&str]) -> Self {
        self.tracked_symbols = symbols.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
