use crate::domain::bundle::{MlPredictions, MlPrediction, PriceBar, Projections, TechnicalReport};
use crate::domain::contract::{normalize_price_series, sanitize_projections};
use crate::ingest::error::ProviderError;
use crate::ingest::provider::{PriceForecaster, PriceHistoryProvider, ProjectionProvider, TechnicalReportProvider};
use crate::ingest::types::ForecastResponse;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const PROVIDER_NAME: &str = "fixture";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStage {
    Prices,
    Technical,
    Projection,
    Forecast,
}

impl FixtureStage {
    fn as_str(self) -> &'static str {
        match self {
            FixtureStage::Prices => "price_history",
            FixtureStage::Technical => "technical_report",
            FixtureStage::Projection => "projection",
            FixtureStage::Forecast => "forecast",
        }
    }
}

/// Canned collaborator output for one symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolFixture {
    #[serde(default)]
    pub price_series: Vec<PriceBar>,
    #[serde(default)]
    pub technical_report: Option<TechnicalReport>,
    #[serde(default)]
    pub projections: Projections,
    #[serde(default)]
    pub forecasts: MlPredictions,
    /// Stages that fail with a provider error, to exercise degradation.
    #[serde(default)]
    pub failing: Vec<FixtureStage>,
}

/// In-memory provider keyed by upper-case symbol.
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    symbols: BTreeMap<String, SymbolFixture>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: &str, fixture: SymbolFixture) -> Self {
        self.symbols.insert(symbol.trim().to_ascii_uppercase(), fixture);
        self
    }

    /// Load `{ "SYMBOL": { ...fixture... }, ... }` from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture file {}", path.display()))?;
        let symbols: BTreeMap<String, SymbolFixture> = serde_json::from_str(&text)
            .with_context(|| format!("fixture file {} has an unexpected shape", path.display()))?;

        Ok(symbols
            .into_iter()
            .fold(Self::new(), |acc, (symbol, fixture)| acc.with_symbol(&symbol, fixture)))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    fn lookup(&self, symbol: &str, stage: FixtureStage) -> Result<Option<&SymbolFixture>> {
        let fixture = self.symbols.get(&symbol.trim().to_ascii_uppercase());
        if let Some(f) = fixture {
            if f.failing.contains(&stage) {
                return Err(ProviderError::new(PROVIDER_NAME, stage.as_str(), format!("simulated failure for {symbol}")).into());
            }
        }
        Ok(fixture)
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for FixtureProvider {
    async fn get_price_history(&self, symbol: &str) -> Result<Vec<PriceBar>> {
        Ok(self
            .lookup(symbol, FixtureStage::Prices)?
            .map(|f| normalize_price_series(f.price_series.clone()))
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl TechnicalReportProvider for FixtureProvider {
    async fn get_technical_report(&self, symbol: &str) -> Result<Option<TechnicalReport>> {
        Ok(self
            .lookup(symbol, FixtureStage::Technical)?
            .and_then(|f| f.technical_report.clone()))
    }
}

#[async_trait::async_trait]
impl ProjectionProvider for FixtureProvider {
    async fn get_projection(&self, symbol: &str, _horizon_days: u32) -> Result<Projections> {
        Ok(self
            .lookup(symbol, FixtureStage::Projection)?
            .map(|f| sanitize_projections(f.projections.clone()))
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl PriceForecaster for FixtureProvider {
    async fn predict(&self, symbol: &str, horizon_days: u32) -> Result<Option<MlPrediction>> {
        let Some(prediction) = self
            .lookup(symbol, FixtureStage::Forecast)?
            .and_then(|f| f.forecasts.get(&horizon_days).copied())
        else {
            return Ok(None);
        };

        let resp = ForecastResponse {
            predicted_price: prediction.predicted_price,
            confidence: prediction.confidence,
            horizon_days: Some(horizon_days),
        };
        resp.validate_and_into_prediction(horizon_days)
            .map(Some)
            .map_err(|e| {
                anyhow::Error::new(ProviderError::new(
                    PROVIDER_NAME,
                    FixtureStage::Forecast.as_str(),
                    format!("{e:#}"),
                ))
            })
    }
}
