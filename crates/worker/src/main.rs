use anyhow::Context;
use clap::Parser;
use screener_core::engine::{build_report, RecommendationEngine, DEFAULT_FORECAST_HORIZONS};
use screener_core::ingest::fixture::FixtureProvider;
use screener_core::ingest::provider::Providers;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod universe;

#[derive(Debug, Parser)]
#[command(name = "screener_worker")]
struct Args {
    /// Comma-separated symbols to screen. Overrides the configured universe.
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Recommendation horizon in days. Defaults to RECOMMENDATION_HORIZON_DAYS.
    #[arg(long)]
    horizon_days: Option<u32>,

    /// Market as-of date (YYYY-MM-DD). Defaults to the latest completed NSE session.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Read collaborator data from a JSON fixture file instead of the data provider.
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Maximum symbols analyzed at once. Defaults to RECOMMENDATION_CONCURRENCY.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Resolve inputs and exit without analyzing anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = screener_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "screening run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(args: Args, settings: &screener_core::config::Settings) -> anyhow::Result<()> {
    let as_of_date =
        screener_core::time::in_market::resolve_as_of_date(args.as_of_date.as_deref(), chrono::Utc::now())?;
    let horizon_days = args.horizon_days.unwrap_or(settings.default_horizon_days);
    anyhow::ensure!(horizon_days > 0, "horizon must be > 0");
    let concurrency = args.concurrency.unwrap_or(settings.concurrency);

    let symbols = universe::build_universe(&args.symbols, &universe::UniverseOptions::from_env()?)?;

    if args.dry_run {
        tracing::info!(
            %as_of_date,
            horizon_days,
            dry_run = true,
            symbols_len = symbols.len(),
            "resolved screening run (dry-run)"
        );
        return Ok(());
    }

    let engine = match &args.fixtures {
        Some(path) => {
            let provider = FixtureProvider::from_json_file(path)?;
            tracing::info!(
                path = %path.display(),
                fixture_symbols = provider.symbols().count(),
                "using fixture data"
            );
            let horizons = if settings.forecast_horizons.is_empty() {
                DEFAULT_FORECAST_HORIZONS.to_vec()
            } else {
                settings.forecast_horizons.clone()
            };
            RecommendationEngine::new(Providers::from_source(Arc::new(provider)), horizons)
        }
        None => RecommendationEngine::from_settings(settings)?,
    };
    let engine = Arc::new(engine);

    let t0 = std::time::Instant::now();
    let items = engine
        .generate_batch(&symbols, horizon_days, concurrency)
        .await?;
    let report = build_report(as_of_date, horizon_days, &items);

    tracing::info!(
        %as_of_date,
        horizon_days,
        analyzed = report.rows.len(),
        unavailable = report.unavailable.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "screening run complete"
    );
    for symbol in &report.unavailable {
        tracing::warn!(%symbol, "could not analyze symbol");
    }

    let out = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &screener_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
