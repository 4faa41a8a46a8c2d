use crate::config::{parse_env, Settings};
use crate::domain::bundle::{MlPrediction, PriceBar, Projections, TechnicalReport};
use crate::domain::contract::{normalize_price_series, normalize_symbol, sanitize_projections};
use crate::ingest::error::ProviderError;
use crate::ingest::types::{ForecastResponse, PriceHistoryResponse, ProjectionResponse};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER_NAME: &str = "external_http_json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_SYMBOL_SUFFIX: &str = ".NS";
const MAX_BACKOFF_SECS: u64 = 30;

#[async_trait::async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Chronological daily bars; empty when the symbol is unknown.
    async fn get_price_history(&self, symbol: &str) -> Result<Vec<PriceBar>>;
}

#[async_trait::async_trait]
pub trait TechnicalReportProvider: Send + Sync {
    async fn get_technical_report(&self, symbol: &str) -> Result<Option<TechnicalReport>>;
}

#[async_trait::async_trait]
pub trait ProjectionProvider: Send + Sync {
    async fn get_projection(&self, symbol: &str, horizon_days: u32) -> Result<Projections>;
}

#[async_trait::async_trait]
pub trait PriceForecaster: Send + Sync {
    async fn predict(&self, symbol: &str, horizon_days: u32) -> Result<Option<MlPrediction>>;
}

/// The four collaborators the engine gathers from.
#[derive(Clone)]
pub struct Providers {
    pub prices: Arc<dyn PriceHistoryProvider>,
    pub technical: Arc<dyn TechnicalReportProvider>,
    pub projections: Arc<dyn ProjectionProvider>,
    pub forecaster: Arc<dyn PriceForecaster>,
}

impl Providers {
    /// Use one source for every collaborator.
    pub fn from_source<S>(source: Arc<S>) -> Self
    where
        S: PriceHistoryProvider + TechnicalReportProvider + ProjectionProvider + PriceForecaster + 'static,
    {
        Self {
            prices: source.clone(),
            technical: source.clone(),
            projections: source.clone(),
            forecaster: source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpJsonDataProvider {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    symbol_suffix: String,
    retries: u32,
}

impl HttpJsonDataProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let raw_base = settings.require_data_provider_base_url()?;
        let base_url = Url::parse(raw_base)
            .with_context(|| format!("DATA_PROVIDER_BASE_URL is not a valid URL: {raw_base}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "DATA_PROVIDER_BASE_URL cannot be used as a base URL: {raw_base}"
        );

        let timeout_secs: u64 = parse_env("DATA_PROVIDER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let retries: u32 = parse_env("DATA_PROVIDER_RETRIES", DEFAULT_RETRIES)?.max(1);

        let symbol_suffix = std::env::var("DATA_PROVIDER_SYMBOL_SUFFIX")
            .unwrap_or_else(|_| DEFAULT_SYMBOL_SUFFIX.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build data provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.data_provider_api_key.clone(),
            symbol_suffix,
            retries,
        })
    }

    fn exchange_symbol(&self, symbol: &str) -> String {
        let bare = normalize_symbol(symbol).unwrap_or_default();
        format!("{bare}{}", self.symbol_suffix)
    }

    fn url(&self, resource: &str, symbol: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("data provider base URL cannot have path segments"))?
            .pop_if_empty()
            .extend(["v1", resource, &self.exchange_symbol(symbol)]);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    /// `Ok(None)` on 404: the provider has nothing for this symbol.
    async fn fetch_once(
        &self,
        stage: &'static str,
        url: &Url,
        query: &[(&str, String)],
    ) -> Result<Option<Value>, FetchFailure> {
        let headers = self.headers().map_err(FetchFailure::Fatal)?;
        let res = self
            .http
            .get(url.clone())
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchFailure::Transient(ProviderError::new(PROVIDER_NAME, stage, e.to_string()).into()))?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = res.text().await.map_err(|e| {
            FetchFailure::Transient(anyhow::Error::new(e).context("failed to read provider response"))
        })?;

        if !status.is_success() {
            let err: anyhow::Error = ProviderError::new(PROVIDER_NAME, stage, format!("HTTP {status}: {text}")).into();
            return Err(if is_retryable_status(status) {
                FetchFailure::Transient(err)
            } else {
                FetchFailure::Fatal(err)
            });
        }

        let raw_json = serde_json::from_str::<Value>(&text).map_err(|e| {
            FetchFailure::Fatal(
                ProviderError::new(PROVIDER_NAME, stage, format!("response is not valid JSON ({e}): {text}")).into(),
            )
        })?;
        Ok(Some(raw_json))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        stage: &'static str,
        resource: &str,
        symbol: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = self.url(resource, symbol)?;
        let mut attempt: u32 = 0;
        let raw = loop {
            attempt += 1;
            match self.fetch_once(stage, &url, query).await {
                Ok(raw) => break raw,
                Err(FetchFailure::Fatal(err)) => return Err(err),
                Err(FetchFailure::Transient(err)) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(stage, symbol, attempt, ?backoff, error = %err, "data provider fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };
        let parsed = serde_json::from_value::<T>(raw)
            .map_err(|e| ProviderError::new(PROVIDER_NAME, stage, format!("unexpected response shape: {e}")))?;
        Ok(Some(parsed))
    }
}

enum FetchFailure {
    /// Worth another attempt: transport errors, 429 and 5xx.
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// 1s, 2s, 4s, ... capped at `MAX_BACKOFF_SECS`.
fn backoff_for(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

#[async_trait::async_trait]
impl PriceHistoryProvider for HttpJsonDataProvider {
    async fn get_price_history(&self, symbol: &str) -> Result<Vec<PriceBar>> {
        let resp: Option<PriceHistoryResponse> = self.get_json("price_history", "prices", symbol, &[]).await?;
        Ok(resp.map(|r| normalize_price_series(r.rows)).unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl TechnicalReportProvider for HttpJsonDataProvider {
    async fn get_technical_report(&self, symbol: &str) -> Result<Option<TechnicalReport>> {
        self.get_json("technical_report", "technical", symbol, &[]).await
    }
}

#[async_trait::async_trait]
impl ProjectionProvider for HttpJsonDataProvider {
    async fn get_projection(&self, symbol: &str, horizon_days: u32) -> Result<Projections> {
        let query = [("horizon_days", horizon_days.to_string())];
        let resp: Option<ProjectionResponse> = self.get_json("projection", "projections", symbol, &query).await?;
        Ok(resp.map(|r| sanitize_projections(r.projections)).unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl PriceForecaster for HttpJsonDataProvider {
    async fn predict(&self, symbol: &str, horizon_days: u32) -> Result<Option<MlPrediction>> {
        let query = [("horizon_days", horizon_days.to_string())];
        let resp: Option<ForecastResponse> = self.get_json("forecast", "forecast", symbol, &query).await?;
        resp.map(|r| {
            r.validate_and_into_prediction(horizon_days)
                .map_err(|e| anyhow::Error::new(ProviderError::new(PROVIDER_NAME, "forecast", format!("{e:#}"))))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(base: &str) -> HttpJsonDataProvider {
        HttpJsonDataProvider {
            http: reqwest::Client::new(),
            base_url: Url::parse(base).unwrap(),
            api_key: None,
            symbol_suffix: ".NS".to_string(),
            retries: 1,
        }
    }

    #[test]
    fn builds_resource_urls_with_exchange_suffix() {
        let p = provider("https://data.example.com/api/");
        let url = p.url("prices", " reliance ").unwrap();
        assert_eq!(url.as_str(), "https://data.example.com/api/v1/prices/RELIANCE.NS");
        let url = p.url("prices", "RELIANCE.NS").unwrap();
        assert_eq!(url.path(), "/api/v1/prices/RELIANCE.NS");

        // Ampersand tickers must stay inside one path segment.
        let url = p.url("forecast", "M&M").unwrap();
        assert_eq!(url.path(), "/api/v1/forecast/M&M.NS");
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_for(1), Duration::from_secs(1));
        assert_eq!(backoff_for(2), Duration::from_secs(2));
        assert_eq!(backoff_for(4), Duration::from_secs(8));
        assert_eq!(backoff_for(6), Duration::from_secs(30));
        assert_eq!(backoff_for(64), Duration::from_secs(30));
        assert_eq!(backoff_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn only_throttling_and_server_errors_are_retried() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn parses_price_history_shape() {
        let v = json!({
            "symbol": "TCS.NS",
            "rows": [
                {"date": "2026-01-02", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 1000.0},
                {"date": "2026-01-01", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.4, "volume": 900.0}
            ]
        });
        let parsed: PriceHistoryResponse = serde_json::from_value(v).unwrap();
        let series = normalize_price_series(parsed.rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].close, 1.4);
    }

    #[test]
    fn rejects_non_numeric_prices_via_deserialize() {
        let v = json!({
            "symbol": "TCS.NS",
            "rows": [{"date": "2026-01-02", "open": "1.0", "high": 2.0, "low": 0.5, "close": 1.5, "volume": 1.0}]
        });
        assert!(serde_json::from_value::<PriceHistoryResponse>(v).is_err());
    }
}
