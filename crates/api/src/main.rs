use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use screener_core::domain::contract::normalize_symbol;
use screener_core::domain::recommendation::{Recommendation, RecommendationReport};
use screener_core::engine::{build_report, RecommendationEngine};

const MAX_BATCH_SYMBOLS: usize = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = screener_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let engine = match RecommendationEngine::from_settings(&settings) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "data provider unavailable; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        engine,
        default_horizon_days: settings.default_horizon_days,
        concurrency: settings.concurrency.max(1),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/recommendations", get(get_recommendations))
        .route("/recommendations/:symbol", get(get_recommendation))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = screener_core::config::parse_env("PORT", 3000)?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    engine: Option<Arc<RecommendationEngine>>,
    default_horizon_days: u32,
    concurrency: usize,
}

impl AppState {
    fn engine(&self) -> Result<&Arc<RecommendationEngine>, StatusCode> {
        self.engine.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }

    fn horizon(&self, requested: Option<u32>) -> Result<u32, StatusCode> {
        match requested.unwrap_or(self.default_horizon_days) {
            0 => Err(StatusCode::BAD_REQUEST),
            h => Ok(h),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HorizonQuery {
    horizon_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BatchQuery {
    symbols: Option<String>,
    horizon_days: Option<u32>,
}

async fn get_recommendation(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(q): Query<HorizonQuery>,
) -> Result<Json<Recommendation>, StatusCode> {
    let engine = state.engine()?;
    let horizon_days = state.horizon(q.horizon_days)?;
    let symbol = normalize_symbol(&symbol).ok_or(StatusCode::BAD_REQUEST)?;

    let recommendation = engine
        .generate_recommendation(&symbol, horizon_days)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(recommendation))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Query(q): Query<BatchQuery>,
) -> Result<Json<RecommendationReport>, StatusCode> {
    let engine = state.engine()?;
    let horizon_days = state.horizon(q.horizon_days)?;
    let symbols = parse_symbols(q.symbols.as_deref().unwrap_or_default());
    if symbols.is_empty() || symbols.len() > MAX_BATCH_SYMBOLS {
        return Err(StatusCode::BAD_REQUEST);
    }

    let as_of_date = screener_core::time::in_market::resolve_as_of_date(None, chrono::Utc::now())
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let items = engine
        .generate_batch(&symbols, horizon_days, state.concurrency)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(build_report(as_of_date, horizon_days, &items)))
}

fn parse_symbols(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for symbol in raw.split(',').filter_map(normalize_symbol) {
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
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
