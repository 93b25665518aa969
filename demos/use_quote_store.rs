use market_datahub::config::Config;
use market_datahub::fetchers::coinmarketcap::CoinMarketCapClient;
use market_datahub::models::portfolio::{Portfolio, TradeAction};
use market_datahub::stores::quote_store::QuoteStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 需要设置 CCC_API_KEY
    let config = Config::from_env();
    let store = QuoteStore::new(Arc::new(CoinMarketCapClient::new(&config)?));

    let quotes = store.fetch_quotes(&["BTC", "ETH", "BTC"]).await?;
    for (symbol, quote) in &quotes {
        println!(
            "{:<6} {:>14.2} USD  24h {:>7.2}%",
            symbol,
            quote.price().unwrap_or_default(),
            quote.usd.percent_change_24h.unwrap_or_default()
        );
    }

    // 第二次获取直接命中缓存
    let btc = store.fetch_quote("BTC").await?;
    println!("\n缓存中的代码: {:?}", store.cached_symbols());

    let mut portfolio = Portfolio::crypto_default();
    portfolio.add_quote(&btc)?;
    portfolio.add_action(TradeAction::Buy, "BTC", 0.05)?;
    println!("组合操作记录: {}", portfolio.actions.len());
    println!("BTC 上次操作: {:?}", portfolio.asset("BTC").map(|a| a.last_taken_action));

    Ok(())
}
