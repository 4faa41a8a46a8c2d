use crate::domain::bundle::{MlPrediction, PriceBar, Projections};
use crate::ingest::types::ForecastResponse;
use anyhow::ensure;
use std::collections::BTreeMap;

/// Chronological series with one bar per date. Rows with a non-finite or
/// non-positive close are dropped; on duplicate dates the later row wins.
pub fn normalize_price_series(rows: Vec<PriceBar>) -> Vec<PriceBar> {
    let mut by_date = BTreeMap::new();
    for row in rows {
        if !(row.close.is_finite() && row.close > 0.0) {
            continue;
        }
        let volume = if row.volume.is_finite() && row.volume >= 0.0 {
            row.volume
        } else {
            0.0
        };
        by_date.insert(row.date, PriceBar { volume, ..row });
    }
    by_date.into_values().collect()
}

impl ForecastResponse {
    pub fn validate_and_into_prediction(self, requested_days: u32) -> anyhow::Result<MlPrediction> {
        if let Some(days) = self.horizon_days {
            ensure!(
                days == requested_days,
                "forecast horizon mismatch: expected {requested_days}, got {days}"
            );
        }

        ensure!(
            self.predicted_price.is_finite() && self.predicted_price > 0.0,
            "predicted_price must be positive (got {})",
            self.predicted_price
        );

        if let Some(confidence) = self.confidence {
            ensure!(
                (0.0..=1.0).contains(&confidence),
                "confidence must be between 0 and 1 (got {confidence})"
            );
        }

        Ok(MlPrediction {
            predicted_price: self.predicted_price,
            confidence: self.confidence,
        })
    }
}

/// Bare upper-case NSE ticker: exchange suffixes (`.NS`, `.BO`) are stripped.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let s = raw.trim().to_ascii_uppercase();
    let s = s
        .strip_suffix(".NS")
        .or_else(|| s.strip_suffix(".BO"))
        .unwrap_or(&s)
        .trim()
        .to_string();
    (!s.is_empty()).then_some(s)
}

/// Keep only projections that carry at least one finite price.
pub fn sanitize_projections(projections: Projections) -> Projections {
    projections
        .into_iter()
        .filter_map(|(name, mut p)| {
            p.prices.retain(|x| x.is_finite() && *x > 0.0);
            let name = name.trim().to_string();
            (!p.prices.is_empty() && !name.is_empty()).then_some((name, p))
        })
        .collect()
}
