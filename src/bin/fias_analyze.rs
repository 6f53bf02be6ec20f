use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use fias_search::backend::render_plan;
use fias_search::regression::{RegressionCase, RegressionRunner};
use fias_search::{AddressSearchService, ElasticBackend, FiasConfig};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "fias-analyze",
    version,
    about = "Prints the normalized query and its search plan for a FIAS address"
)]
struct Args {
    /// TOML config file; environment variables are used when omitted
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Run the query against Elasticsearch instead of printing the plan
    #[arg(long, conflicts_with = "regression")]
    search: bool,

    /// Maximum number of hits, clamped to the configured bounds
    #[arg(long)]
    limit: Option<usize>,

    /// Evaluate a JSON file of (query, expected_answer) cases
    #[arg(long, value_name = "CASES.json")]
    regression: Option<String>,

    /// Address query; the words are joined with spaces
    #[arg(required_unless_present = "regression", conflicts_with = "regression")]
    query: Vec<String>,
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("fias_search={level},fias_analyze={level}")))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    Ok(())
}

// The Elasticsearch client blocks, so main stays synchronous and only the regression
// mode builds a runtime.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FiasConfig::load(path)?,
        None => FiasConfig::from_env(),
    };
    init_tracing(&config.log_level)?;

    let backend = Arc::new(ElasticBackend::new(&config)?);
    let service = AddressSearchService::new(backend, config.clone());

    if let Some(path) = &args.regression {
        let cases = RegressionCase::load_all(path)?;
        info!("Loaded {} regression cases from {}", cases.len(), path);
        let runner = RegressionRunner::new(Arc::new(service), &config);
        let report = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(runner.run(cases));
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let text = args.query.join(" ");
    if text.trim().is_empty() {
        bail!("no query given");
    }
    let limit = config.clamp_limit(args.limit.unwrap_or(config.search_limit));

    if args.search {
        let response = service.respond_blocking(&text, limit);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let (query, plan) = service.explain(&text);
        let output = json!({
            "normalized": query,
            "plan": plan,
            "request": render_plan(&plan, limit),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
