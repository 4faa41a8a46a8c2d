pub mod domain;
pub mod engine;
pub mod ingest;
pub mod projection;
pub mod risk;
pub mod scoring;
pub mod synthesis;
pub mod time;

pub mod config {
    use crate::engine::DEFAULT_FORECAST_HORIZONS;
    use anyhow::Context;

    const DEFAULT_HORIZON_DAYS: u32 = 30;
    const DEFAULT_CONCURRENCY: usize = 4;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub data_provider_base_url: Option<String>,
        pub data_provider_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub default_horizon_days: u32,
        pub concurrency: usize,
        pub forecast_horizons: Vec<u32>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                data_provider_base_url: std::env::var("DATA_PROVIDER_BASE_URL").ok(),
                data_provider_api_key: std::env::var("DATA_PROVIDER_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                default_horizon_days: parse_env("RECOMMENDATION_HORIZON_DAYS", DEFAULT_HORIZON_DAYS)?,
                concurrency: parse_env("RECOMMENDATION_CONCURRENCY", DEFAULT_CONCURRENCY)?,
                forecast_horizons: match std::env::var("ML_FORECAST_HORIZONS") {
                    Ok(s) => parse_horizons(&s).context("ML_FORECAST_HORIZONS is invalid")?,
                    Err(_) => DEFAULT_FORECAST_HORIZONS.to_vec(),
                },
            })
        }

        pub fn require_data_provider_base_url(&self) -> anyhow::Result<&str> {
            self.data_provider_base_url
                .as_deref()
                .context("DATA_PROVIDER_BASE_URL is required")
        }
    }

    /// Value of `key`, or `default` when unset or blank. A malformed value is an error.
    pub fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a number (got {s:?})")),
            _ => Ok(default),
        }
    }

    /// Comma-separated list of positive day counts, e.g. `7,14,30`.
    pub fn parse_horizons(s: &str) -> anyhow::Result<Vec<u32>> {
        let mut out = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let days: u32 = part
                .parse()
                .with_context(|| format!("invalid horizon {part:?}"))?;
            anyhow::ensure!(days > 0, "horizon must be > 0");
            out.push(days);
        }
        anyhow::ensure!(!out.is_empty(), "at least one horizon is required");
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_horizon_lists() {
            assert_eq!(parse_horizons("30, 7,14,7").unwrap(), vec![7, 14, 30]);
            assert!(parse_horizons("").is_err());
            assert!(parse_horizons("7,0").is_err());
            assert!(parse_horizons("7,abc").is_err());
        }

        #[test]
        fn malformed_numbers_are_errors() {
            std::env::set_var("SCREENER_CONFIG_TEST_RETRIES", "three");
            std::env::set_var("SCREENER_CONFIG_TEST_PORT", " 8080 ");
            std::env::set_var("SCREENER_CONFIG_TEST_BLANK", "  ");

            assert!(parse_env::<u32>("SCREENER_CONFIG_TEST_RETRIES", 3).is_err());
            assert_eq!(parse_env::<u16>("SCREENER_CONFIG_TEST_PORT", 3000).unwrap(), 8080);
            assert_eq!(parse_env::<u16>("SCREENER_CONFIG_TEST_BLANK", 3000).unwrap(), 3000);
            assert_eq!(parse_env::<u16>("SCREENER_CONFIG_TEST_UNSET", 3000).unwrap(), 3000);
        }
    }
}
