use crate::config::Settings;
use crate::domain::recommendation::{Recommendation, RecommendationReport, RecommendationRow};
use crate::ingest::gather::gather_bundle;
use crate::ingest::provider::{HttpJsonDataProvider, Providers};
use crate::synthesis::synthesize;
use anyhow::{ensure, Context, Result};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_FORECAST_HORIZONS: [u32; 5] = [7, 14, 30, 60, 90];

/// Outcome for one symbol of a batch run.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub symbol: String,
    pub recommendation: Option<Recommendation>,
}

/// Stateless apart from shared provider handles; safe to call concurrently.
#[derive(Clone)]
pub struct RecommendationEngine {
    providers: Providers,
    forecast_horizons: Vec<u32>,
}

impl RecommendationEngine {
    pub fn new(providers: Providers, forecast_horizons: Vec<u32>) -> Self {
        let mut forecast_horizons = forecast_horizons;
        forecast_horizons.sort_unstable();
        forecast_horizons.dedup();
        Self {
            providers,
            forecast_horizons,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = Arc::new(HttpJsonDataProvider::from_settings(settings)?);
        Ok(Self::new(Providers::from_source(source), settings.forecast_horizons.clone()))
    }

    /// `Ok(None)` when there is not enough data to analyze the symbol.
    pub async fn generate_recommendation(
        &self,
        symbol: &str,
        time_horizon_days: u32,
    ) -> Result<Option<Recommendation>> {
        ensure!(time_horizon_days > 0, "time_horizon_days must be > 0");
        let symbol = symbol.trim();
        ensure!(!symbol.is_empty(), "symbol must be non-empty");

        let Some(bundle) = gather_bundle(&self.providers, symbol, time_horizon_days, &self.forecast_horizons).await
        else {
            return Ok(None);
        };

        let recommendation = synthesize(&bundle, time_horizon_days);
        if recommendation.is_none() {
            tracing::info!(symbol, time_horizon_days, "insufficient data for recommendation");
        }
        Ok(recommendation)
    }

    /// One task per symbol, at most `concurrency` in flight. Results keep input order.
    pub async fn generate_batch(
        self: &Arc<Self>,
        symbols: &[String],
        time_horizon_days: u32,
        concurrency: usize,
    ) -> Result<Vec<BatchItem>> {
        ensure!(time_horizon_days > 0, "time_horizon_days must be > 0");
        ensure!(concurrency >= 1, "concurrency must be >= 1");

        let permits = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();
        for (idx, symbol) in symbols.iter().cloned().enumerate() {
            let engine = Arc::clone(self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let res = engine.generate_recommendation(&symbol, time_horizon_days).await;
                (idx, symbol, res)
            });
        }

        let mut slots: Vec<Option<BatchItem>> = vec![None; symbols.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, symbol, res) = joined.context("recommendation task panicked")?;
            let recommendation = match res {
                Ok(r) => r,
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "recommendation request rejected");
                    None
                }
            };
            slots[idx] = Some(BatchItem {
                symbol,
                recommendation,
            });
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

pub fn build_report(as_of_date: NaiveDate, horizon_days: u32, items: &[BatchItem]) -> RecommendationReport {
    let mut rows = Vec::new();
    let mut unavailable = Vec::new();
    for item in items {
        match &item.recommendation {
            Some(r) => rows.push(RecommendationRow::from(r)),
            None => unavailable.push(item.symbol.clone()),
        }
    }

    RecommendationReport {
        as_of_date,
        generated_at: Utc::now(),
        horizon_days,
        rows,
        unavailable,
    }
}
