mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use commands::attribution::{
    BrinsonArgs, DurationAttributionArgs, LinkedAttributionArgs, TotalReturnArgs,
};
use commands::credit::{
    ConcentrationArgs, CreditLossArgs, CumulativeDefaultArgs, EadArgs, MarketLgdArgs, MigrationArgs,
    WorkoutLgdArgs,
};
use commands::optimization::{CovarianceArgs, MeanVarianceArgs, RiskParityArgs};
use commands::performance::{BenchmarkArgs, DrawdownArgs, RatiosArgs, RiskSummaryArgs};
use commands::regulatory::{AllowanceArgs, LcrArgs, MarketImpactArgs, StressCapitalArgs};

/// Environment variable holding the tracing filter directive.
const LOG_ENV: &str = "RAC_LOG";
/// Filter applied when `RAC_LOG` is unset or invalid.
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::WARN;
/// Level of the failure event. The error itself goes to stderr as `error:`.
const FAILURE_LOG_LEVEL: Level = Level::DEBUG;

/// Portfolio and credit risk analytics
#[derive(Parser)]
#[command(
    name = "rac",
    version,
    about = "Portfolio and credit risk analytics",
    long_about = "A CLI over the risk-analytics core with decimal precision. Supports \
                  return attribution, performance ratios, portfolio optimisation, credit \
                  risk (EL/UL/RAROC, LGD, migration P&L, concentration) and liquidity \
                  and regulatory capital analytics. Inputs are JSON or YAML documents \
                  read from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Holding-period total return with optional decomposition
    TotalReturn(TotalReturnArgs),
    /// Brinson allocation / selection / interaction attribution
    Brinson(BrinsonArgs),
    /// Multi-period Brinson attribution linked with Carino coefficients
    LinkedAttribution(LinkedAttributionArgs),
    /// Fixed-income duration and spread attribution
    DurationAttribution(DurationAttributionArgs),
    /// Sharpe and Sortino ratios of a return series
    Ratios(RatiosArgs),
    /// Maximum drawdown from value levels or period returns
    Drawdown(DrawdownArgs),
    /// Active returns, tracking error, information ratio and beta
    Benchmark(BenchmarkArgs),
    /// Annualised risk-adjusted return summary
    RiskSummary(RiskSummaryArgs),
    /// Mean-variance portfolio optimisation
    MeanVariance(MeanVarianceArgs),
    /// Equal-risk-contribution (risk parity) weights
    RiskParity(RiskParityArgs),
    /// Sample covariance matrix from aligned return series
    Covariance(CovarianceArgs),
    /// Expected loss, unexpected loss and RAROC
    CreditLoss(CreditLossArgs),
    /// Exposure at default for drawn and undrawn balances
    Ead(EadArgs),
    /// Workout LGD from collateral recovery
    WorkoutLgd(WorkoutLgdArgs),
    /// Market LGD lookup from reference data
    MarketLgd(MarketLgdArgs),
    /// Concentration (HHI, top-N, grouped HHI)
    Concentration(ConcentrationArgs),
    /// Rating-migration P&L
    MigrationPnl(MigrationArgs),
    /// Cumulative default probability over a horizon
    CumulativeDefault(CumulativeDefaultArgs),
    /// Liquidity coverage ratio
    Lcr(LcrArgs),
    /// Market impact of walking the order book
    MarketImpact(MarketImpactArgs),
    /// Post-stress regulatory capital ratios
    StressCapital(StressCapitalArgs),
    /// Credit loss allowance from segment ECL
    Allowance(AllowanceArgs),
    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::TotalReturn(_) => "total-return",
            Commands::Brinson(_) => "brinson",
            Commands::LinkedAttribution(_) => "linked-attribution",
            Commands::DurationAttribution(_) => "duration-attribution",
            Commands::Ratios(_) => "ratios",
            Commands::Drawdown(_) => "drawdown",
            Commands::Benchmark(_) => "benchmark",
            Commands::RiskSummary(_) => "risk-summary",
            Commands::MeanVariance(_) => "mean-variance",
            Commands::RiskParity(_) => "risk-parity",
            Commands::Covariance(_) => "covariance",
            Commands::CreditLoss(_) => "credit-loss",
            Commands::Ead(_) => "ead",
            Commands::WorkoutLgd(_) => "workout-lgd",
            Commands::MarketLgd(_) => "market-lgd",
            Commands::Concentration(_) => "concentration",
            Commands::MigrationPnl(_) => "migration-pnl",
            Commands::CumulativeDefault(_) => "cumulative-default",
            Commands::Lcr(_) => "lcr",
            Commands::MarketImpact(_) => "market-impact",
            Commands::StressCapital(_) => "stress-capital",
            Commands::Allowance(_) => "allowance",
            Commands::Version => "version",
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let span = tracing::info_span!("command", name = cli.command.name());
    let _guard = span.enter();
    tracing::info!("started");

    let result: commands::CommandResult = match cli.command {
        Commands::TotalReturn(args) => commands::attribution::run_total_return(args),
        Commands::Brinson(args) => commands::attribution::run_brinson(args),
        Commands::LinkedAttribution(args) => commands::attribution::run_linked_attribution(args),
        Commands::DurationAttribution(args) => {
            commands::attribution::run_duration_attribution(args)
        }
        Commands::Ratios(args) => commands::performance::run_ratios(args),
        Commands::Drawdown(args) => commands::performance::run_drawdown(args),
        Commands::Benchmark(args) => commands::performance::run_benchmark(args),
        Commands::RiskSummary(args) => commands::performance::run_risk_summary(args),
        Commands::MeanVariance(args) => commands::optimization::run_mean_variance(args),
        Commands::RiskParity(args) => commands::optimization::run_risk_parity(args),
        Commands::Covariance(args) => commands::optimization::run_covariance(args),
        Commands::CreditLoss(args) => commands::credit::run_credit_loss(args),
        Commands::Ead(args) => commands::credit::run_ead(args),
        Commands::WorkoutLgd(args) => commands::credit::run_workout_lgd(args),
        Commands::MarketLgd(args) => commands::credit::run_market_lgd(args),
        Commands::Concentration(args) => commands::credit::run_concentration(args),
        Commands::MigrationPnl(args) => commands::credit::run_migration_pnl(args),
        Commands::CumulativeDefault(args) => commands::credit::run_cumulative_default(args),
        Commands::Lcr(args) => commands::regulatory::run_lcr(args),
        Commands::MarketImpact(args) => commands::regulatory::run_market_impact(args),
        Commands::StressCapital(args) => commands::regulatory::run_stress_capital(args),
        Commands::Allowance(args) => commands::regulatory::run_allowance(args),
        Commands::Version => {
            println!("rac {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::event!(FAILURE_LOG_LEVEL, error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_subcommand_with_global_output() {
        let cli =
            Cli::try_parse_from(["rac", "lcr", "--input", "lcr.yaml", "--output", "table"])
                .unwrap();
        assert!(matches!(cli.output, OutputFormat::Table));
        match cli.command {
            Commands::Lcr(args) => assert_eq!(args.input.as_deref(), Some("lcr.yaml")),
            _ => panic!("expected lcr"),
        }
    }

    #[test]
    fn test_failure_event_hidden_at_default_level() {
        assert!(FAILURE_LOG_LEVEL > DEFAULT_LOG_LEVEL);
        assert_eq!(DEFAULT_LOG_LEVEL.to_string(), "warn");
    }

    #[test]
    fn test_migration_requires_reference() {
        assert!(Cli::try_parse_from(["rac", "migration-pnl", "--input", "m.json"]).is_err());
    }
}
