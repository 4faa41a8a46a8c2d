use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_RSI: f64 = 50.0;
pub const DEFAULT_TREND_STRENGTH: f64 = 0.5;
pub const DEFAULT_ML_CONFIDENCE: f64 = 0.5;
pub const ENSEMBLE_METHOD: &str = "ensemble";

/// Number of trailing sessions used for the average-volume baseline.
pub const VOLUME_BASELINE_DAYS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObvTrend {
    Bullish,
    Bearish,
    Neutral,
}

/// Indicator report produced by the technical-analysis collaborator.
///
/// Every field is optional on the wire; the accessors below substitute the
/// neutral defaults used by the scoring layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalReport {
    #[serde(default)]
    pub basic_indicators: BasicIndicators,
    #[serde(default)]
    pub trend_analysis: TrendAnalysis,
    #[serde(default)]
    pub support_resistance: SupportResistance,
    #[serde(default)]
    pub volume_analysis: VolumeAnalysis,
}

impl TechnicalReport {
    /// No sub-report carries a value, e.g. `{}` on the wire.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicIndicators {
    #[serde(default, rename = "RSI", alias = "rsi")]
    pub rsi: Option<f64>,
    #[serde(default, rename = "MACD", alias = "macd")]
    pub macd: Option<f64>,
    #[serde(default, rename = "MACD_Signal", alias = "macd_signal")]
    pub macd_signal: Option<f64>,
    #[serde(default, rename = "Price_vs_SMA20", alias = "price_vs_sma20")]
    pub price_vs_sma20: Option<f64>,
    #[serde(default, rename = "Price_vs_SMA50", alias = "price_vs_sma50")]
    pub price_vs_sma50: Option<f64>,
}

impl BasicIndicators {
    pub fn rsi(&self) -> f64 {
        finite_or(self.rsi, DEFAULT_RSI)
    }

    pub fn macd(&self) -> f64 {
        finite_or(self.macd, 0.0)
    }

    pub fn macd_signal(&self) -> f64 {
        finite_or(self.macd_signal, 0.0)
    }

    pub fn price_vs_sma20(&self) -> f64 {
        finite_or(self.price_vs_sma20, 0.0)
    }

    pub fn price_vs_sma50(&self) -> f64 {
        finite_or(self.price_vs_sma50, 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    #[serde(default)]
    pub direction: Option<TrendDirection>,
    #[serde(default)]
    pub strength: Option<f64>,
    #[serde(default)]
    pub adx: Option<f64>,
}

impl TrendAnalysis {
    pub fn direction(&self) -> TrendDirection {
        self.direction.unwrap_or(TrendDirection::Neutral)
    }

    /// Trend strength in [0, 1].
    pub fn strength(&self) -> f64 {
        finite_or(self.strength, DEFAULT_TREND_STRENGTH).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub resistance_levels: Vec<f64>,
    #[serde(default)]
    pub support_levels: Vec<f64>,
}

impl SupportResistance {
    pub fn current_price(&self) -> f64 {
        finite_or(self.current_price, 0.0)
    }

    /// Lowest resistance level, i.e. the first ceiling above the price.
    pub fn nearest_resistance(&self) -> Option<f64> {
        self.resistance_levels
            .iter()
            .copied()
            .filter(|l| l.is_finite() && *l > 0.0)
            .reduce(f64::min)
    }

    /// Highest support level, i.e. the first floor below the price.
    pub fn nearest_support(&self) -> Option<f64> {
        self.support_levels
            .iter()
            .copied()
            .filter(|l| l.is_finite() && *l > 0.0)
            .reduce(f64::max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    #[serde(default)]
    pub current_vs_average: Option<f64>,
    #[serde(default)]
    pub volume_trend: Option<VolumeTrend>,
    #[serde(default)]
    pub obv_trend: Option<ObvTrend>,
    #[serde(default)]
    pub volume_breakout: Option<bool>,
}

impl VolumeAnalysis {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn volume_trend(&self) -> VolumeTrend {
        self.volume_trend.unwrap_or(VolumeTrend::Neutral)
    }

    pub fn obv_trend(&self) -> ObvTrend {
        self.obv_trend.unwrap_or(ObvTrend::Neutral)
    }

    pub fn volume_breakout(&self) -> bool {
        self.volume_breakout.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlPrediction {
    pub predicted_price: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl MlPrediction {
    pub fn confidence(&self) -> f64 {
        finite_or(self.confidence, DEFAULT_ML_CONFIDENCE).clamp(0.0, 1.0)
    }
}

/// Forecasts keyed by horizon in days.
pub type MlPredictions = BTreeMap<u32, MlPrediction>;

/// The forecast with the largest horizon that does not exceed `horizon_days`.
pub fn prediction_for_horizon(
    predictions: &MlPredictions,
    horizon_days: u32,
) -> Option<(u32, &MlPrediction)> {
    predictions
        .range(..=horizon_days)
        .next_back()
        .map(|(days, p)| (*days, p))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub prices: Vec<f64>,
    pub method: String,
}

impl Projection {
    /// Projected price for the given horizon, or the last available point when the
    /// projection is shorter than the horizon.
    pub fn price_at_horizon(&self, horizon_days: u32) -> Option<f64> {
        let last = self.prices.len().checked_sub(1)?;
        let idx = (horizon_days.max(1) as usize - 1).min(last);
        self.prices.get(idx).copied().filter(|p| p.is_finite())
    }
}

/// Projections keyed by method name (`trend`, `ma_based`, `ensemble`, ...).
pub type Projections = BTreeMap<String, Projection>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskStats {
    /// Annualized standard deviation of daily returns.
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline of cumulative return (<= 0).
    pub max_drawdown: f64,
    pub annual_return: f64,
    pub downside_deviation: f64,
    pub sortino_ratio: f64,
    /// 5th percentile of daily returns.
    pub var_95: f64,
    #[serde(default, skip_serializing)]
    pub return_series: Vec<f64>,
}

/// Everything one recommendation is computed from. Built fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisBundle {
    pub symbol: String,
    pub price_series: Vec<PriceBar>,
    pub technical_report: Option<TechnicalReport>,
    pub ml_predictions: MlPredictions,
    pub projections: Projections,
    pub risk_stats: RiskStats,
}

impl AnalysisBundle {
    pub fn current_price(&self) -> f64 {
        self.price_series.last().map(|b| b.close).unwrap_or(0.0)
    }

    pub fn current_volume(&self) -> f64 {
        self.price_series.last().map(|b| b.volume).unwrap_or(0.0)
    }

    /// Mean volume of the trailing baseline window; 0 when the history is shorter.
    pub fn avg_volume_20d(&self) -> f64 {
        let n = self.price_series.len();
        if n < VOLUME_BASELINE_DAYS {
            return 0.0;
        }
        let window = &self.price_series[n - VOLUME_BASELINE_DAYS..];
        window.iter().map(|b| b.volume).sum::<f64>() / VOLUME_BASELINE_DAYS as f64
    }

    pub fn support_resistance(&self) -> Option<&SupportResistance> {
        self.technical_report.as_ref().map(|r| &r.support_resistance)
    }

    pub fn ensemble_projection(&self) -> Option<&Projection> {
        self.projections.get(ENSEMBLE_METHOD)
    }
}

fn finite_or(v: Option<f64>, default: f64) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(default)
}
