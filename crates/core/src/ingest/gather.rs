use crate::domain::bundle::{AnalysisBundle, MlPredictions, Projections, TechnicalReport};
use crate::ingest::provider::Providers;
use crate::projection::with_ensemble;
use crate::risk::compute_risk_stats;

/// Collect everything one recommendation needs.
///
/// Only a missing price history yields `None`. Every other collaborator failure is
/// logged and degrades to an empty sub-report.
pub async fn gather_bundle(
    providers: &Providers,
    symbol: &str,
    horizon_days: u32,
    forecast_horizons: &[u32],
) -> Option<AnalysisBundle> {
    let price_series = match providers.prices.get_price_history(symbol).await {
        Ok(series) => series,
        Err(err) => {
            tracing::warn!(symbol, stage = "price_history", error = %err, "price history unavailable");
            return None;
        }
    };
    if price_series.is_empty() {
        tracing::info!(symbol, "no price history; skipping");
        return None;
    }

    let (technical_report, projections, ml_predictions) = tokio::join!(
        fetch_technical_report(providers, symbol),
        fetch_projections(providers, symbol, horizon_days),
        fetch_ml_predictions(providers, symbol, horizon_days, forecast_horizons),
    );

    let risk_stats = compute_risk_stats(&price_series);

    Some(AnalysisBundle {
        symbol: symbol.to_string(),
        price_series,
        technical_report,
        ml_predictions,
        projections,
        risk_stats,
    })
}

async fn fetch_technical_report(providers: &Providers, symbol: &str) -> Option<TechnicalReport> {
    match providers.technical.get_technical_report(symbol).await {
        Ok(report) => report,
        Err(err) => {
            tracing::warn!(symbol, stage = "technical_report", error = %err, "technical report unavailable; scoring neutral");
            None
        }
    }
}

async fn fetch_projections(providers: &Providers, symbol: &str, horizon_days: u32) -> Projections {
    match providers.projections.get_projection(symbol, horizon_days).await {
        Ok(p) => with_ensemble(p),
        Err(err) => {
            tracing::warn!(symbol, stage = "projection", error = %err, "projections unavailable");
            Projections::new()
        }
    }
}

async fn fetch_ml_predictions(
    providers: &Providers,
    symbol: &str,
    horizon_days: u32,
    forecast_horizons: &[u32],
) -> MlPredictions {
    let mut out = MlPredictions::new();
    for &days in forecast_horizons.iter().filter(|d| **d <= horizon_days) {
        match providers.forecaster.predict(symbol, days).await {
            Ok(Some(prediction)) => {
                out.insert(days, prediction);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(symbol, stage = "forecast", forecast_days = days, error = %err, "forecast failed");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::{MlPrediction, PriceBar, Projection};
    use crate::ingest::fixture::{FixtureProvider, FixtureStage, SymbolFixture};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn fixture() -> SymbolFixture {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let price_series = (0..30)
            .map(|i| PriceBar {
                date: start + chrono::Duration::days(i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + i as f64,
                volume: 1_000.0,
            })
            .collect();

        let mut forecasts = MlPredictions::new();
        for days in [7, 14, 30, 60] {
            forecasts.insert(
                days,
                MlPrediction {
                    predicted_price: 130.0,
                    confidence: Some(0.5),
                },
            );
        }

        let mut projections = Projections::new();
        projections.insert(
            "trend".to_string(),
            Projection {
                prices: vec![130.0, 131.0],
                method: "Linear trend".to_string(),
            },
        );

        SymbolFixture {
            price_series,
            technical_report: Some(TechnicalReport::default()),
            projections,
            forecasts,
            failing: vec![],
        }
    }

    #[tokio::test]
    async fn forecasts_capped_at_requested_horizon() {
        let providers = Providers::from_source(Arc::new(FixtureProvider::new().with_symbol("HDFCBANK", fixture())));
        let bundle = gather_bundle(&providers, "HDFCBANK", 30, &[7, 14, 30, 60, 90]).await.unwrap();

        assert_eq!(bundle.ml_predictions.keys().copied().collect::<Vec<_>>(), vec![7, 14, 30]);
        assert!(bundle.ensemble_projection().is_some());
        assert!(bundle.risk_stats.volatility > 0.0);
        assert_eq!(bundle.price_series.len(), 30);
    }

    #[tokio::test]
    async fn collaborator_failures_degrade() {
        let mut f = fixture();
        f.failing = vec![FixtureStage::Technical, FixtureStage::Forecast, FixtureStage::Projection];
        let providers = Providers::from_source(Arc::new(FixtureProvider::new().with_symbol("ITC", f)));

        let bundle = gather_bundle(&providers, "ITC", 30, &[7, 30]).await.unwrap();
        assert!(bundle.technical_report.is_none());
        assert!(bundle.ml_predictions.is_empty());
        assert!(bundle.projections.is_empty());
    }

    #[tokio::test]
    async fn missing_prices_short_circuit() {
        let mut f = fixture();
        f.failing = vec![FixtureStage::Prices];
        let providers = Providers::from_source(Arc::new(FixtureProvider::new().with_symbol("ITC", f)));

        assert!(gather_bundle(&providers, "ITC", 30, &[30]).await.is_none());
        assert!(gather_bundle(&providers, "UNKNOWNTICKER", 30, &[30]).await.is_none());
    }
}
