use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use industry_metrics::api::{FundamentalsClient, FundamentalsProvider};
use industry_metrics::database_sqlx::DatabaseManagerSqlx;
use industry_metrics::models::config::{database_path_from_env, parse_industry_list};
use industry_metrics::models::Config;
use industry_metrics::pipeline::{MetricsPipeline, PipelineState};

/// Derive per-security financial ratios and per-industry aggregates
#[derive(Parser)]
#[command(name = "industry-metrics")]
#[command(version)]
#[command(about = "Compute security ratios and industry aggregates from fundamentals data")]
#[command(long_about = "
Fetches company profiles, financial statements and end-of-day prices for every
symbol of the data provider, stores PE ratio, revenue growth, TTM net income and
debt ratio per security, and aggregates them per target industry.

`run` and `health` require FIRST_NAME and LAST_NAME (environment or .env) for
the bearer token. `report` only reads the database.

Examples:
  industry-metrics run
  industry-metrics --industries 'Banks - Regional,Semiconductors' run
  industry-metrics report --json
")]
struct Args {
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long = "db", value_name = "FILE", global = true)]
    database: Option<String>,

    /// Comma-separated target industries (overrides TARGET_INDUSTRIES)
    #[arg(long, value_name = "LIST", global = true)]
    industries: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline (default)
    Run,

    /// Only probe the data provider's health endpoint
    Health,

    /// Print the persisted industry aggregates
    Report {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("industry_metrics=info")),
        )
        .init();

    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Run);

    if let Commands::Report { json } = command {
        let database_path = args.database.unwrap_or_else(database_path_from_env);
        return print_report(&database_path, json).await;
    }

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            eprintln!("Make sure FIRST_NAME and LAST_NAME are set (environment or .env file).");
            std::process::exit(1);
        }
    };

    if let Some(path) = args.database {
        config.database_path = path;
    }
    if let Some(raw) = args.industries {
        let industries = parse_industry_list(&raw);
        if industries.is_empty() {
            eprintln!("❌ --industries must name at least one industry");
            std::process::exit(1);
        }
        config.target_industries = industries;
    }

    match command {
        Commands::Health => check_health(&config).await,
        _ => run_pipeline(config).await,
    }
}

async fn run_pipeline(config: Config) -> Result<()> {
    info!("🚀 Starting run for industries: {}", config.target_industries.join(", "));

    let client = FundamentalsClient::new(&config)?;
    let database = DatabaseManagerSqlx::new(&config.database_path).await?;

    let mut pipeline = MetricsPipeline::new(client, database.clone(), config.target_industries.clone());
    let report = pipeline.run().await?;
    database.close().await;

    info!(
        "Run finished in state {:?}: {} symbols, {} committed, {} out of scope, {} without profile, {} without data, {} industries",
        report.final_state,
        report.symbols_total,
        report.securities_committed,
        report.out_of_scope,
        report.missing_profile,
        report.missing_data,
        report.industries_aggregated
    );

    if report.final_state == PipelineState::Aborted {
        std::process::exit(1);
    }
    Ok(())
}

async fn check_health(config: &Config) -> Result<()> {
    let client = FundamentalsClient::new(config)?;
    if client.check_health().await {
        println!("✅ Data provider at {} is healthy", config.base_url);
        Ok(())
    } else {
        println!("❌ Data provider at {} is not healthy", config.base_url);
        std::process::exit(1);
    }
}

async fn print_report(database_path: &str, json: bool) -> Result<()> {
    let database = DatabaseManagerSqlx::new(database_path).await?;
    let (securities, industries) = database.get_stats().await?;
    let aggregates = database.list_industry_aggregations().await?;
    database.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&aggregates)?);
        return Ok(());
    }

    println!("📊 {} securities, {} industry aggregates in {}", securities, industries, database_path);
    println!("{}", "=".repeat(80));
    println!("{:<32} {:>12} {:>16} {:>16}", "Industry", "Avg P/E", "Avg Rev Growth", "Sum Revenue");
    for agg in &aggregates {
        println!(
            "{:<32} {:>12} {:>16} {:>16}",
            agg.industry,
            format_optional(agg.avg_pe_ratio, 2),
            format_optional(agg.avg_revenue_growth, 4),
            format_optional(agg.sum_revenue, 0),
        );
    }
    Ok(())
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}
