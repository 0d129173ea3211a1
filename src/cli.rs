//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    parse_date, parse_frequency, parse_weight, validate_backtest_config, validate_weights,
};
use crate::domain::error::FactorlabError;
use crate::domain::metrics::Metrics;
use crate::domain::planner::TargetWeights;
use crate::domain::prices::PriceTable;
use crate::domain::simulation::{run_simulation, SimulationConfig, SimulationResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSource;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "factorlab", about = "Target-weight portfolio backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overrides `[backtest] prices`
        #[arg(short, long)]
        prices: Option<PathBuf>,
        /// Report directory, overrides `[report] output_dir`
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for ticker(s) in a price file
    Info {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

/// Settings the pipeline needs beyond the simulation itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestOptions {
    pub risk_free_rate: f64,
    pub complete_dates_only: bool,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub result: SimulationResult,
    pub metrics: Metrics,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            prices,
            output_dir,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, prices.as_deref(), output_dir.as_deref())
            } else {
                run_backtest(&config, prices.as_deref(), output_dir.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { prices, ticker } => run_info(&prices, ticker.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FactorlabError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn report_error(err: &FactorlabError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), FactorlabError> {
    validate_backtest_config(adapter)?;
    validate_weights(adapter)
}

fn run_backtest(
    config_path: &Path,
    prices_override: Option<&Path>,
    output_override: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate config
    if let Err(e) = validate_all(&adapter) {
        return report_error(&e);
    }

    // Stage 3: Build simulation inputs
    let resolved = build_simulation_config(&adapter).and_then(|sim_config| {
        let weights = build_target_weights(&adapter)?;
        let prices_path = resolve_prices_path(prices_override, &adapter)?;
        Ok((sim_config, weights, prices_path))
    });
    let (sim_config, weights, prices_path) = match resolved {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    let options = BacktestOptions {
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
        complete_dates_only: adapter.get_bool("backtest", "complete_dates_only", false),
        output_dir: resolve_output_dir(output_override, &adapter),
    };

    // Stages 4-8: Price source dependent pipeline
    eprintln!("Loading prices from {}", prices_path.display());
    let source = CsvPriceAdapter::new(prices_path);
    let reporter = CsvReportAdapter::new();
    match run_backtest_pipeline(&source, &reporter, &sim_config, &weights, &options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

pub fn build_simulation_config(adapter: &dyn ConfigPort) -> Result<SimulationConfig, FactorlabError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(SimulationConfig {
        start_date,
        end_date,
        initial_cash: adapter.get_double("backtest", "initial_cash", 0.0),
        rebalance_frequency: parse_frequency(adapter)?,
        transaction_cost_bps: adapter.get_double("backtest", "transaction_cost_bps", 0.0),
    })
}

/// Read `[weights]`, upper-casing tickers.
pub fn build_target_weights(adapter: &dyn ConfigPort) -> Result<TargetWeights, FactorlabError> {
    adapter
        .get_section("weights")
        .into_iter()
        .map(|(ticker, raw)| {
            parse_weight(&ticker, &raw).map(|weight| (ticker.trim().to_uppercase(), weight))
        })
        .collect()
}

pub fn resolve_prices_path(
    prices_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, FactorlabError> {
    if let Some(p) = prices_override {
        return Ok(p.to_path_buf());
    }
    config
        .get_string("backtest", "prices")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| FactorlabError::ConfigMissing {
            section: "backtest".into(),
            key: "prices".into(),
        })
}

pub fn resolve_output_dir(
    output_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Option<PathBuf> {
    output_override.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("report", "output_dir")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    })
}

/// Tickers with a positive target, sorted.
fn weighted_tickers(weights: &TargetWeights) -> Vec<String> {
    let mut tickers: Vec<String> = weights
        .iter()
        .filter(|(_, w)| **w > 0.0)
        .map(|(t, _)| t.clone())
        .collect();
    tickers.sort();
    tickers
}

pub fn run_backtest_pipeline(
    source: &dyn PriceSource,
    reporter: &dyn ReportPort,
    sim_config: &SimulationConfig,
    weights: &TargetWeights,
    options: &BacktestOptions,
) -> Result<BacktestRun, FactorlabError> {
    if sim_config.transaction_cost_bps != 0.0 {
        eprintln!(
            "warning: transaction_cost_bps = {} is not applied; trades execute at close",
            sim_config.transaction_cost_bps
        );
    }

    // Stage 4: Fetch prices
    let tickers = weighted_tickers(weights);
    let rows = source.fetch_prices(&tickers, sim_config.start_date, sim_config.end_date)?;
    let mut table = PriceTable::from_rows(rows);

    let available = table.tickers();
    for ticker in &tickers {
        if !available.contains(ticker) {
            eprintln!("warning: no prices for {ticker} in range");
        }
    }

    if options.complete_dates_only {
        let before = table.date_count();
        table.retain_complete_dates(&tickers);
        eprintln!(
            "  Kept {} of {} dates with prices for every ticker",
            table.date_count(),
            before
        );
    }

    if table.is_empty() {
        return Err(FactorlabError::NoData {
            reason: format!(
                "no prices between {} and {}",
                sim_config.start_date, sim_config.end_date
            ),
        });
    }

    // Complete-date runs only span the retained dates.
    let mut sim_config = sim_config.clone();
    if options.complete_dates_only {
        if let (Some(first), Some(last)) = (table.first_date(), table.last_date()) {
            sim_config.start_date = sim_config.start_date.max(first);
            sim_config.end_date = sim_config.end_date.min(last);
        }
    }

    // Stage 5: Run simulation
    eprintln!(
        "Running backtest: {} tickers, {} to {}, rebalance {}",
        tickers.len(),
        sim_config.start_date,
        sim_config.end_date,
        sim_config.rebalance_frequency,
    );
    eprintln!(
        "  Price data: {} dates, {} rows",
        table.date_count(),
        table.row_count()
    );
    let result = run_simulation(&table, weights, &sim_config)?;

    // Stage 6: Compute metrics
    let metrics = Metrics::compute(&result, sim_config.initial_cash, options.risk_free_rate);

    // Stage 7: Print console summary to stderr
    print_summary(&result, &metrics, sim_config.initial_cash);

    // Stage 8: Export reports
    if let Some(dir) = &options.output_dir {
        reporter.write(&result, dir)?;
        eprintln!("\nReports written to: {}", dir.display());
    }

    Ok(BacktestRun { result, metrics })
}

fn print_summary(result: &SimulationResult, metrics: &Metrics, initial_cash: f64) {
    eprintln!("\n=== Performance ===");
    eprintln!("Initial Cash:     {:.2}", initial_cash);
    eprintln!("Final Value:      {:.2}", metrics.final_value);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!(
        "Volatility:       {:.2}%",
        metrics.annualized_volatility * 100.0
    );
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Realized P&L:     {:.2}", result.ledger.realized_pnl());

    eprintln!("\n=== Trades ===");
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("  Buys:           {}", metrics.buy_trades);
    eprintln!("  Sells:          {}", metrics.sell_trades);
    eprintln!("Traded Volume:    {:.2}", metrics.traded_volume);

    if result.ledger.position_count() > 0 {
        eprintln!("\n=== Final Positions ===");
        for position in result.ledger.positions() {
            eprintln!(
                "  {}:  {:.4} shares @ avg {:.2}",
                position.ticker, position.shares, position.avg_cost
            );
        }
    }
}

pub fn run_dry_run(
    config_path: &Path,
    prices_override: Option<&Path>,
    output_override: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        return report_error(&e);
    }
    eprintln!("Config validated successfully");

    let resolved = build_simulation_config(&adapter).and_then(|sim_config| {
        let weights = build_target_weights(&adapter)?;
        let prices_path = resolve_prices_path(prices_override, &adapter)?;
        Ok((sim_config, weights, prices_path))
    });
    let (sim_config, weights, prices_path) = match resolved {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    eprintln!("\nSimulation:");
    eprintln!("  start_date:          {}", sim_config.start_date);
    eprintln!("  end_date:            {}", sim_config.end_date);
    eprintln!("  initial_cash:        {:.2}", sim_config.initial_cash);
    eprintln!("  rebalance_frequency: {}", sim_config.rebalance_frequency);
    eprintln!("  transaction_cost_bps: {}", sim_config.transaction_cost_bps);

    print_weights(&weights);

    eprintln!("\nInputs:");
    eprintln!("  prices:     {}", prices_path.display());
    match resolve_output_dir(output_override, &adapter) {
        Some(dir) => eprintln!("  output_dir: {}", dir.display()),
        None => eprintln!("  output_dir: (none, reports disabled)"),
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn print_weights(weights: &TargetWeights) {
    let mut sorted: Vec<(&String, &f64)> = weights.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let invested: f64 = weights.values().sum();

    eprintln!("\nTarget weights:");
    for (ticker, weight) in sorted {
        eprintln!("  {:<8} {:>7.2}%", ticker, weight * 100.0);
    }
    eprintln!("  {:<8} {:>7.2}%", "CASH", (1.0 - invested).max(0.0) * 100.0);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        return report_error(&e);
    }

    match build_target_weights(&adapter) {
        Ok(weights) => print_weights(&weights),
        Err(e) => return report_error(&e),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(prices_path: &Path, ticker: Option<&str>) -> ExitCode {
    let source = CsvPriceAdapter::new(prices_path.to_path_buf());

    let tickers = match ticker {
        Some(t) => vec![t.trim().to_uppercase()],
        None => match source.list_tickers() {
            Ok(t) => t,
            Err(e) => return report_error(&e),
        },
    };

    if tickers.is_empty() {
        eprintln!("No tickers found in {}", prices_path.display());
        return ExitCode::SUCCESS;
    }

    for t in &tickers {
        match source.get_data_range(t) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} rows, {} to {}", t, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", t);
            }
            Err(e) => return report_error(&e),
        }
    }
    ExitCode::SUCCESS
}
