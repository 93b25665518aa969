use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MarketDataError, Result};
use crate::models::news::NewsArticle;
use crate::models::quote::Quote;

/// 默认支持的加密货币列表
pub const DEFAULT_TOKENS: [&str; 20] = [
    "AAVE", "AVAX", "BAT", "BCH", "BTC",
    "CRV", "DOGE", "DOT", "ETH", "GRT",
    "LINK", "LTC", "MKR", "SHIB", "SUSHI",
    "UNI", "USDC", "USDT", "XTZ", "YFI",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    USD,
    BTC,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioCash {
    pub amount: f64,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

/// 资产上一次执行的操作；`Never` 表示从未记录过
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastAction {
    Buy,
    Sell,
    Hold,
    None,
    #[default]
    Never,
}

impl From<TradeAction> for LastAction {
    fn from(action: TradeAction) -> Self {
        match action {
            TradeAction::Buy => LastAction::Buy,
            TradeAction::Sell => LastAction::Sell,
            TradeAction::Hold => LastAction::Hold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAction {
    pub action: TradeAction,
    pub symbol: String,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAssetContext {
    pub timestamp: DateTime<Utc>,
    pub portfolio_snapshot: PortfolioCash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAsset {
    pub symbol: String,
    pub quantity: f64,
    pub recommended_action: Option<TradeAction>,
    pub last_taken_action: LastAction,
    pub context: PortfolioAssetContext,
}

/// 附加到组合上的行情快照，quote 为序列化后的 JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioQuote {
    pub symbol: String,
    pub quote: String,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioNews {
    pub symbol: String,
    pub date_created: DateTime<Utc>,
    pub news: Vec<NewsArticle>,
}

/// 模拟投资组合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub supported_symbols: Vec<String>,
    pub liquidity: PortfolioCash,
    pub actions: Vec<PortfolioAction>,
    pub assets: Vec<PortfolioAsset>,
    pub quotes: Vec<PortfolioQuote>,
    pub news: Vec<PortfolioNews>,
}

impl Portfolio {
    pub fn new(symbols: &[&str], liquidity: PortfolioCash) -> Result<Self> {
        validate_amount(liquidity.amount)?;
        Ok(Self::build(symbols, liquidity))
    }

    /// 20 个默认币种，10000 USD 初始资金
    pub fn crypto_default() -> Self {
        Self::build(
            &DEFAULT_TOKENS,
            PortfolioCash {
                amount: 10_000.0,
                currency: Currency::USD,
            },
        )
    }

    fn build(symbols: &[&str], liquidity: PortfolioCash) -> Self {
        let now = Utc::now();
        let assets = symbols
            .iter()
            .map(|symbol| PortfolioAsset {
                symbol: symbol.to_string(),
                quantity: 0.0,
                recommended_action: Some(TradeAction::Hold),
                last_taken_action: LastAction::default(),
                context: PortfolioAssetContext {
                    timestamp: now,
                    portfolio_snapshot: liquidity.clone(),
                },
            })
            .collect();

        Self {
            supported_symbols: symbols.iter().map(|s| s.to_string()).collect(),
            liquidity,
            actions: Vec::new(),
            assets,
            quotes: Vec::new(),
            news: Vec::new(),
        }
    }

    pub fn is_supported(&self, symbol: &str) -> bool {
        self.supported_symbols.iter().any(|s| s == symbol)
    }

    pub fn asset(&self, symbol: &str) -> Option<&PortfolioAsset> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }

    pub fn add_action(&mut self, action: TradeAction, symbol: &str, quantity: f64) -> Result<&PortfolioAction> {
        self.ensure_supported(symbol)?;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(MarketDataError::Validation(format!(
                "Quantity must be a positive number, got {}",
                quantity
            )));
        }

        if let Some(asset) = self.assets.iter_mut().find(|a| a.symbol == symbol) {
            asset.last_taken_action = action.into();
        }

        self.actions.push(PortfolioAction {
            action,
            symbol: symbol.to_string(),
            quantity,
            timestamp: Utc::now(),
        });
        Ok(&self.actions[self.actions.len() - 1])
    }

    pub fn add_quote(&mut self, quote: &Quote) -> Result<()> {
        self.ensure_supported(&quote.symbol)?;
        self.quotes.push(PortfolioQuote {
            symbol: quote.symbol.clone(),
            quote: serde_json::to_string(quote)?,
            date_created: Utc::now(),
        });
        Ok(())
    }

    pub fn add_news(&mut self, symbol: &str, articles: &[NewsArticle]) -> Result<()> {
        self.ensure_supported(symbol)?;
        self.news.push(PortfolioNews {
            symbol: symbol.to_string(),
            date_created: Utc::now(),
            news: articles.to_vec(),
        });
        Ok(())
    }

    pub fn update_liquidity(&mut self, amount: f64) -> Result<()> {
        validate_amount(amount)?;
        self.liquidity.amount = amount;
        Ok(())
    }

    fn ensure_supported(&self, symbol: &str) -> Result<()> {
        if self.is_supported(symbol) {
            Ok(())
        } else {
            Err(MarketDataError::Validation(format!(
                "Invalid symbol: {}. Must be one of {}.",
                symbol,
                self.supported_symbols.join(", ")
            )))
        }
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(MarketDataError::Validation(format!(
            "Liquidity must be a non-negative number, got {}",
            amount
        )));
    }
    Ok(())
}
