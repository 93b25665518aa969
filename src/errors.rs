use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    /// 传输失败或非 2xx 响应
    #[error("Upstream error{}: {message}", status_suffix(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing API key: {0} is not set")]
    MissingApiKey(&'static str),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, MarketDataError>;

impl MarketDataError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        MarketDataError::Upstream {
            status,
            message: message.into(),
        }
    }
}

// reqwest 的错误一律视为上游错误
impl From<reqwest::Error> for MarketDataError {
    fn from(e: reqwest::Error) -> Self {
        MarketDataError::Upstream {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}
