//! CLI definition and dispatch.

use chrono::Utc;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};

use crate::adapters::csv_catalog_adapter::CsvCatalogAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_store::FileStore;
use crate::adapters::memory_store::MemoryStore;
use crate::domain::catalog::Catalog;
use crate::domain::error::LedgerError;
use crate::domain::execution::{shares_for_amount, ExecutionOutcome};
use crate::domain::ledger::LedgerStore;
use crate::domain::performance::PerformanceReport;
use crate::domain::quotes::{self, PricePoint};
use crate::domain::settings::{QuoteSettings, Settings, StorageBackend};
use crate::domain::trade::TradeIntent;
use crate::ports::quote_port::QuoteFeed;
use crate::ports::storage_port::KeyValueStore;

#[derive(Parser, Debug)]
#[command(name = "paperledger", about = "Paper-trading portfolio ledger")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true, default_value = "paperledger.ini")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("size").required(true).args(["amount", "shares"])))]
pub struct TradeArgs {
    #[arg(short, long)]
    pub ticker: String,
    #[arg(short, long)]
    pub price: f64,
    /// Dollar amount, converted to shares at `price`
    #[arg(long)]
    pub amount: Option<f64>,
    #[arg(long)]
    pub shares: Option<f64>,
    /// Display name; looked up in the catalog when omitted
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Buy shares
    Buy(TradeArgs),
    /// Sell shares
    Sell(TradeArgs),
    /// Sell the entire holding of a ticker
    Liquidate {
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        price: f64,
    },
    /// Set the mark price of a held position
    Mark {
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        price: f64,
    },
    /// Show open positions and their valuation
    Positions,
    /// Show the trade log
    History,
    /// Show performance statistics
    Performance,
    /// Reset the ledger to its initial cash
    Clear,
    /// Browse the equity catalog
    Catalog {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Fetch recent closes and mark held positions
    Quotes {
        /// Comma-separated tickers; defaults to open positions
        #[arg(long)]
        tickers: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match dispatch(&cli.config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn dispatch(config_path: &Path, command: Command) -> Result<(), LedgerError> {
    let settings = load_settings(config_path)?;
    match command {
        Command::Buy(args) => run_trade(&settings, args, true),
        Command::Sell(args) => run_trade(&settings, args, false),
        Command::Liquidate { ticker, price } => run_liquidate(&settings, &ticker, price),
        Command::Mark { ticker, price } => run_mark(&settings, &ticker, price),
        Command::Positions => run_positions(&settings),
        Command::History => run_history(&settings),
        Command::Performance => run_performance(&settings),
        Command::Clear => {
            open_ledger(&settings)?.clear();
            println!("Ledger reset to ${:.2}", settings.initial_cash);
            Ok(())
        }
        Command::Catalog { category, search } => {
            run_catalog(&settings, category.as_deref(), search.as_deref())
        }
        Command::Quotes { tickers } => run_quotes(&settings, tickers.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, LedgerError> {
    FileConfigAdapter::from_file(path)
}

pub fn load_settings(path: &Path) -> Result<Settings, LedgerError> {
    debug!(path = %path.display(), "loading config");
    Settings::from_config(&load_config(path)?)
}

/// Build the key-value store selected by `[storage] backend`.
pub fn open_store(backend: &StorageBackend) -> Result<Box<dyn KeyValueStore + Send>, LedgerError> {
    match backend {
        StorageBackend::Memory => Ok(Box::new(MemoryStore::new())),
        StorageBackend::File { dir } => Ok(Box::new(FileStore::open(dir)?)),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite { path, pool_size } => Ok(Box::new(
            crate::adapters::sqlite_store::SqliteStore::open(path, *pool_size)?,
        )),
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite { .. } => Err(LedgerError::ConfigInvalid {
            section: "storage".into(),
            key: "backend".into(),
            reason: "sqlite feature is required for the sqlite backend".into(),
        }),
    }
}

pub fn open_ledger(settings: &Settings) -> Result<LedgerStore, LedgerError> {
    Ok(LedgerStore::open(
        open_store(&settings.storage)?,
        settings.initial_cash,
    ))
}

pub fn load_catalog(settings: &Settings) -> Result<Catalog, LedgerError> {
    let path = settings
        .catalog_path
        .as_ref()
        .ok_or_else(|| LedgerError::ConfigMissing {
            section: "catalog".into(),
            key: "path".into(),
        })?;
    CsvCatalogAdapter::load(path)
}

/// Turn `--amount`/`--shares` into a trade intent.
pub fn trade_intent(
    is_buy: bool,
    amount: Option<f64>,
    shares: Option<f64>,
    price: f64,
) -> Result<TradeIntent, LedgerError> {
    let quantity = match (shares, amount) {
        (Some(shares), _) => shares,
        (None, Some(amount)) => shares_for_amount(amount, price)?,
        (None, None) => return Err(LedgerError::InvalidQuantity { quantity: 0.0 }),
    };
    Ok(if is_buy {
        TradeIntent::Buy { quantity }
    } else {
        TradeIntent::Sell { quantity }
    })
}

/// Split a comma-separated ticker list.
pub fn parse_ticker_list(list: &str) -> Vec<String> {
    let raw: Vec<&str> = list.split(',').collect();
    quotes::normalize_tickers(raw.as_slice())
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn resolve_name(settings: &Settings, ticker: &str, name: Option<String>) -> String {
    if let Some(name) = name {
        return name;
    }
    if settings.catalog_path.is_none() {
        return ticker.to_string();
    }
    match load_catalog(settings) {
        Ok(catalog) => catalog.name_of(ticker).to_string(),
        Err(e) => {
            warn!(error = %e, "catalog unavailable, using ticker as name");
            ticker.to_string()
        }
    }
}

fn run_trade(settings: &Settings, args: TradeArgs, is_buy: bool) -> Result<(), LedgerError> {
    let ticker = normalize_ticker(&args.ticker);
    let intent = trade_intent(is_buy, args.amount, args.shares, args.price)?;
    let name = resolve_name(settings, &ticker, args.name);
    let mut ledger = open_ledger(settings)?;
    let outcome = ledger.execute(&ticker, &name, args.price, intent, Utc::now())?;
    report_outcome(&outcome, &ticker);
    Ok(())
}

fn run_liquidate(settings: &Settings, ticker: &str, price: f64) -> Result<(), LedgerError> {
    let ticker = normalize_ticker(ticker);
    let mut ledger = open_ledger(settings)?;
    let name = ledger
        .position(&ticker)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| ticker.clone());
    let outcome = ledger.execute(&ticker, &name, price, TradeIntent::Liquidate, Utc::now())?;
    report_outcome(&outcome, &ticker);
    Ok(())
}

fn report_outcome(outcome: &ExecutionOutcome, ticker: &str) {
    match outcome {
        ExecutionOutcome::Executed(record) => {
            println!(
                "{} {} x {} @ ${:.2} = ${:.2}",
                record.action, record.ticker, record.quantity, record.price, record.total
            );
            if record.action.is_sell() {
                println!("  Trade P/L:      {:+.2}", record.trade_pl);
            }
            println!("  Cash:           ${:.2}", record.bankroll_after);
            println!("  Equity:         ${:.2}", record.equity_after());
        }
        ExecutionOutcome::NoPosition => println!("No shares of {ticker} to liquidate"),
    }
}

fn run_mark(settings: &Settings, ticker: &str, price: f64) -> Result<(), LedgerError> {
    if !(price.is_finite() && price > 0.0) {
        return Err(LedgerError::InvalidPrice { price });
    }
    let ticker = normalize_ticker(ticker);
    let mut ledger = open_ledger(settings)?;
    let prices = HashMap::from([(ticker.clone(), price)]);
    if ledger.mark_prices(&prices) == 0 {
        println!("No position in {ticker}");
    } else {
        println!("{ticker} marked at ${price:.2}");
    }
    Ok(())
}

fn run_positions(settings: &Settings) -> Result<(), LedgerError> {
    let ledger = open_ledger(settings)?;
    let open = ledger.open_positions();
    if open.is_empty() {
        println!("No open positions");
    } else {
        println!(
            "{:<8} {:>12} {:>12} {:>12} {:>14} {:>14}",
            "Ticker", "Shares", "Avg Cost", "Last", "Value", "Unrealized"
        );
        for p in open {
            println!(
                "{:<8} {:>12.4} {:>12.2} {:>12.2} {:>14.2} {:>+14.2}",
                p.ticker,
                p.quantity,
                p.avg_buy_price,
                p.last_price,
                p.market_value(),
                p.unrealized_pl()
            );
        }
    }

    let valuation = ledger.current_value();
    println!();
    println!("Cash:             ${:.2}", ledger.cash());
    println!("Market Value:     ${:.2}", valuation.market_value);
    println!("Unrealized P/L:   {:+.2}", valuation.unrealized_pl);
    println!(
        "Total Equity:     ${:.2}",
        ledger.cash() + valuation.market_value
    );
    Ok(())
}

fn run_history(settings: &Settings) -> Result<(), LedgerError> {
    let ledger = open_ledger(settings)?;
    let trades = ledger.trades();
    if trades.is_empty() {
        println!("No trades");
        return Ok(());
    }
    for t in trades {
        println!(
            "{}  {:<9} {:<8} {:>12.4} @ {:>10.2}  P/L {:>+12.2}  cum {:>+12.2}  cash {:>14.2}",
            t.date.format("%Y-%m-%d %H:%M:%S"),
            t.action,
            t.ticker,
            t.quantity,
            t.price,
            t.trade_pl,
            t.cumulative_pl,
            t.bankroll_after
        );
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}{suffix}"))
}

/// Render a performance report the way `performance` prints it.
pub fn format_report(report: &PerformanceReport) -> String {
    [
        "=== Performance ===".to_string(),
        format!("Realized P/L:       {:+.2}", report.realized_pl),
        format!("Unrealized P/L:     {:+.2}", report.unrealized_pl),
        format!("Total P/L:          {:+.2}", report.total_pl),
        format!("Invested:           {:.2}", report.invested),
        format!(
            "Closing Trades:     {} ({} wins, {} losses)",
            report.trade_count, report.wins, report.losses
        ),
        format!("Win Rate:           {:.1}%", report.win_rate),
        format!("Avg P/L:            {:+.2}", report.avg_pl),
        format!("Largest Win:        {}", fmt_opt(report.largest_win, "")),
        format!("Largest Loss:       {}", fmt_opt(report.largest_loss, "")),
        format!("Sharpe-like:        {}", fmt_opt(report.sharpe_like, "")),
        format!("Max Drawdown:       {:.2}", report.max_drawdown),
        format!(
            "Annualized Return:  {}",
            fmt_opt(report.annualized_return, "%")
        ),
        format!(
            "Avg Holding Period: {}",
            fmt_opt(report.avg_holding_period, " days")
        ),
    ]
    .join("\n")
}

fn run_performance(settings: &Settings) -> Result<(), LedgerError> {
    let ledger = open_ledger(settings)?;
    println!("{}", format_report(&ledger.analyze()));
    Ok(())
}

fn run_catalog(
    settings: &Settings,
    category: Option<&str>,
    search: Option<&str>,
) -> Result<(), LedgerError> {
    let catalog = load_catalog(settings)?;
    if let Some(query) = search {
        for symbol in catalog.search(query) {
            println!("{:<8} {}", symbol, catalog.name_of(symbol));
        }
    } else if let Some(category) = category {
        let tickers = catalog.tickers(category);
        if tickers.is_empty() {
            return Err(LedgerError::Catalog {
                reason: format!("unknown category {category:?}"),
            });
        }
        for symbol in tickers {
            println!("{:<8} {}", symbol, catalog.name_of(symbol));
        }
    } else {
        for category in catalog.categories() {
            println!("{} ({})", category, catalog.tickers(category).len());
        }
    }
    Ok(())
}

/// Fetch histories for `tickers` and mark held positions at their latest
/// close. Returns the histories that came back.
pub fn refresh_quotes(
    ledger: &mut LedgerStore,
    feed: &dyn QuoteFeed,
    tickers: &[String],
    settings: &QuoteSettings,
) -> Result<HashMap<String, Vec<PricePoint>>, LedgerError> {
    let histories = quotes::fetch_all(
        feed,
        tickers,
        quotes::lookback_days(settings.lookback_weeks),
        settings.chunk_size,
    )?;
    let marked = ledger.mark_prices(&quotes::latest_closes(&histories));
    debug!(fetched = histories.len(), marked, "quotes refreshed");
    Ok(histories)
}

fn run_quotes(settings: &Settings, tickers: Option<&str>) -> Result<(), LedgerError> {
    #[cfg(feature = "fmp")]
    {
        use crate::adapters::fmp_quote_adapter::FmpQuoteAdapter;

        let feed = FmpQuoteAdapter::from_settings(&settings.quotes)?;
        let mut ledger = open_ledger(settings)?;
        let wanted = match tickers {
            Some(list) => parse_ticker_list(list),
            None => ledger
                .open_positions()
                .iter()
                .map(|p| p.ticker.clone())
                .collect(),
        };
        if wanted.is_empty() {
            println!("No tickers to quote");
            return Ok(());
        }

        let histories = refresh_quotes(&mut ledger, &feed, &wanted, &settings.quotes)?;
        for ticker in &wanted {
            match histories.get(ticker).and_then(|h| h.last().map(|p| (h, p))) {
                Some((history, last)) => {
                    let change = quotes::daily_changes(history)
                        .last()
                        .map_or_else(|| "n/a".to_string(), |c| format!("{c:+.2}"));
                    println!("{:<8} {} {:>10.2} {}", ticker, last.date, last.close, change);
                }
                None => println!("{ticker:<8} no data"),
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "fmp"))]
    {
        let _ = (settings, tickers);
        Err(LedgerError::QuoteFeed {
            reason: "fmp feature is required for quotes".into(),
        })
    }
}
