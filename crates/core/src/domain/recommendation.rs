use crate::scoring::ComponentScores;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recommendation tiers, declared from most bearish to most bullish so the derived
/// ordering is the action rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "STRONG SELL")]
    StrongSell,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "WEAK SELL")]
    WeakSell,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "WEAK BUY")]
    WeakBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::StrongSell => "STRONG SELL",
            Action::Sell => "SELL",
            Action::WeakSell => "WEAK SELL",
            Action::Hold => "HOLD",
            Action::WeakBuy => "WEAK BUY",
            Action::Buy => "BUY",
            Action::StrongBuy => "STRONG BUY",
        }
    }

    /// 0 for STRONG SELL up to 6 for STRONG BUY.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn is_buy_side(self) -> bool {
        self > Action::Hold
    }

    pub fn is_sell_side(self) -> bool {
        self < Action::Hold
    }

    pub fn confidence(self) -> Confidence {
        match self {
            Action::StrongBuy | Action::StrongSell => Confidence::High,
            Action::Buy | Action::Sell => Confidence::MediumHigh,
            Action::WeakBuy | Action::Hold | Action::WeakSell => Confidence::Medium,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    Medium,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::MediumHigh => "Medium-High",
            Confidence::Medium => "Medium",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub action: Action,
    pub confidence: Confidence,
    pub overall_score: f64,
    pub component_scores: ComponentScores,
    pub current_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub risk_reward_ratio: f64,
    /// Percent.
    pub expected_return: f64,
    pub reasoning: Vec<String>,
    pub time_horizon_days: u32,
}

/// Flat, one-row-per-symbol view for tabular display and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRow {
    pub symbol: String,
    pub action: Action,
    pub confidence: Confidence,
    pub overall_score: f64,
    pub technical_score: f64,
    pub ml_prediction_score: f64,
    pub momentum_score: f64,
    pub risk_score: f64,
    pub volume_score: f64,
    pub current_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub risk_reward_ratio: f64,
    pub expected_return: f64,
    pub time_horizon_days: u32,
    pub reasoning: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(r: &Recommendation) -> Self {
        let s = &r.component_scores;
        Self {
            symbol: r.symbol.clone(),
            action: r.action,
            confidence: r.confidence,
            overall_score: r.overall_score,
            technical_score: s.technical.value,
            ml_prediction_score: s.ml_prediction.value,
            momentum_score: s.momentum.value,
            risk_score: s.risk.value,
            volume_score: s.volume.value,
            current_price: r.current_price,
            target_price: r.target_price,
            stop_loss: r.stop_loss,
            risk_reward_ratio: r.risk_reward_ratio,
            expected_return: r.expected_return,
            time_horizon_days: r.time_horizon_days,
            reasoning: r.reasoning.join("\n"),
        }
    }
}

/// Result of a batch screen over a symbol universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub as_of_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub horizon_days: u32,
    pub rows: Vec<RecommendationRow>,
    /// Symbols for which no recommendation could be produced.
    pub unavailable: Vec<String>,
}
