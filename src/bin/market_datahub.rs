use market_datahub::config::Config;
use market_datahub::context::MarketContext;
use market_datahub::fetchers::base::MarketMoversFetcher;
use market_datahub::fetchers::coinmarketcap::CoinMarketCapClient;
use market_datahub::fetchers::perigon::PerigonClient;
use market_datahub::models::news::SortOrder;
use market_datahub::stores::news_store::NewsStore;
use market_datahub::stores::quote_store::QuoteStore;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

fn parse_symbols(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_limit(matches: &ArgMatches, name: &str) -> anyhow::Result<usize> {
    let raw = matches.value_of(name).unwrap_or("10");
    raw.parse::<usize>()
        .with_context(|| format!("Invalid --{} value: {}", name, raw))
}

fn parse_sort(matches: &ArgMatches) -> anyhow::Result<SortOrder> {
    Ok(matches.value_of("sort").unwrap_or("date").parse::<SortOrder>()?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let symbols_arg = |help: &'static str| {
        Arg::with_name("symbols")
            .short('s')
            .long("symbols")
            .value_name("SYMBOLS")
            .help(help)
            .takes_value(true)
    };
    let limit_arg = |help: &'static str| {
        Arg::with_name("limit")
            .short('l')
            .long("limit")
            .value_name("LIMIT")
            .help(help)
            .takes_value(true)
            .default_value("10")
    };
    let sort_arg = || {
        Arg::with_name("sort")
            .long("sort")
            .value_name("SORT")
            .help("News ordering (date, relevance)")
            .takes_value(true)
            .default_value("date")
    };

    let app = App::new("market_datahub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Crypto quotes, market movers and news for agent scripts")
        .subcommand(
            SubCommand::with_name("quote")
                .about("Fetch the latest quotes for one or more symbols")
                .arg(symbols_arg("Comma separated symbols, e.g. BTC,ETH").required(true)),
        )
        .subcommand(
            SubCommand::with_name("movers")
                .about("List trending gainers and losers")
                .arg(limit_arg("Number of entries to return")),
        )
        .subcommand(
            SubCommand::with_name("news")
                .about("Search news related to a symbol")
                .arg(symbols_arg("Symbol to search news for").required(true))
                .arg(limit_arg("Number of articles to return"))
                .arg(sort_arg()),
        )
        .subcommand(
            SubCommand::with_name("snapshot")
                .about("Quotes and news for several symbols in one document")
                .arg(symbols_arg("Comma separated symbols; defaults to BTC,ETH"))
                .arg(limit_arg("Number of articles per symbol"))
                .arg(sort_arg()),
        );

    let matches = app.get_matches();
    let config = Config::from_env();

    if let Some(matches) = matches.subcommand_matches("quote") {
        let symbols = parse_symbols(matches.value_of("symbols"));
        if symbols.is_empty() {
            bail!("No symbols given");
        }

        let store = QuoteStore::new(Arc::new(CoinMarketCapClient::new(&config)?));
        let quotes = store.fetch_quotes(&symbols).await?;
        let quotes: BTreeMap<_, _> = quotes.into_iter().collect();
        print_json(&quotes)?;
    } else if let Some(matches) = matches.subcommand_matches("movers") {
        let limit = parse_limit(matches, "limit")?;
        let client = CoinMarketCapClient::new(&config)?;
        let movers = client.fetch_gainers_losers(limit).await?;
        info!("Fetched {} movers", movers.len());
        print_json(&movers)?;
    } else if let Some(matches) = matches.subcommand_matches("news") {
        let symbols = parse_symbols(matches.value_of("symbols"));
        let symbol = match symbols.as_slice() {
            [symbol] => symbol.clone(),
            [] => bail!("No symbol given"),
            [first, ..] => {
                warn!("news takes a single symbol, using {}", first);
                first.clone()
            }
        };
        let limit = parse_limit(matches, "limit")?;
        let sort = parse_sort(matches)?;

        let store = NewsStore::new(Arc::new(PerigonClient::new(&config)?));
        store.fetch_news_for_symbol(&symbol, limit, sort).await?;
        print_json(&store.get_news_for_symbol(&symbol))?;
    } else if let Some(matches) = matches.subcommand_matches("snapshot") {
        let mut symbols = parse_symbols(matches.value_of("symbols"));
        if symbols.is_empty() && config.tracked_symbols.is_empty() {
            symbols = vec!["BTC".to_string(), "ETH".to_string()];
        }
        let limit = parse_limit(matches, "limit")?;
        let sort = parse_sort(matches)?;

        let context = MarketContext::from_config(&config)?;
        let snapshot = context.snapshot(&symbols, limit, sort).await?;
        print_json(&snapshot)?;
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
