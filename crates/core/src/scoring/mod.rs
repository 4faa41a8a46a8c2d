//! Component scoring: each analysis facet is mapped onto a bounded [0, 100] scale
//! where 50 is neutral.

pub mod ml;
pub mod momentum;
pub mod risk;
pub mod technical;
pub mod volume;

pub use ml::ml_score;
pub use momentum::momentum_score;
pub use risk::risk_score;
pub use technical::technical_score;
pub use volume::volume_score;

use crate::domain::bundle::AnalysisBundle;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NEUTRAL_SCORE: f64 = 50.0;
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Technical,
    MlPrediction,
    Momentum,
    Risk,
    Volume,
}

impl Component {
    /// Fixed component order, also used for reasoning output.
    pub const ALL: [Component; 5] = [
        Component::Technical,
        Component::MlPrediction,
        Component::Momentum,
        Component::Risk,
        Component::Volume,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Component::Technical => "technical",
            Component::MlPrediction => "ml_prediction",
            Component::Momentum => "momentum",
            Component::Risk => "risk",
            Component::Volume => "volume",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a component fell back to the neutral score instead of being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutralReason {
    MissingTechnicalReport,
    NoForecast,
    NoForecastWithinHorizon,
    NonPositivePrice,
    /// Fewer than two bars, so no return can be measured.
    InsufficientHistory,
    NoReturnSeries,
    NoVolumeBaseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ScoreBasis {
    Computed,
    Neutral(NeutralReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub value: f64,
    pub basis: ScoreBasis,
}

impl ComponentScore {
    /// A computed score, clamped into [0, 100].
    pub fn computed(raw: f64) -> Self {
        Self {
            value: clamp_score(raw),
            basis: ScoreBasis::Computed,
        }
    }

    pub fn neutral(reason: NeutralReason) -> Self {
        Self {
            value: NEUTRAL_SCORE,
            basis: ScoreBasis::Neutral(reason),
        }
    }

    pub fn is_neutral_default(&self) -> bool {
        matches!(self.basis, ScoreBasis::Neutral(_))
    }
}

/// One score per component; all five are always present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub technical: ComponentScore,
    pub ml_prediction: ComponentScore,
    pub momentum: ComponentScore,
    pub risk: ComponentScore,
    pub volume: ComponentScore,
}

impl ComponentScores {
    /// Scores every component from the same bundle snapshot.
    pub fn from_bundle(bundle: &AnalysisBundle, horizon_days: u32) -> Self {
        let report = bundle.technical_report.as_ref();
        let risk = &bundle.risk_stats;

        Self {
            technical: technical_score(report),
            ml_prediction: ml_score(&bundle.ml_predictions, bundle.current_price(), horizon_days),
            momentum: momentum_score(&bundle.price_series, report),
            risk: risk_score(risk.volatility, risk.sharpe_ratio, &risk.return_series),
            volume: volume_score(
                bundle.current_volume(),
                bundle.avg_volume_20d(),
                report.map(|r| &r.volume_analysis),
            ),
        }
    }

    pub fn get(&self, component: Component) -> &ComponentScore {
        match component {
            Component::Technical => &self.technical,
            Component::MlPrediction => &self.ml_prediction,
            Component::Momentum => &self.momentum,
            Component::Risk => &self.risk,
            Component::Volume => &self.volume,
        }
    }

    pub fn value(&self, component: Component) -> f64 {
        self.get(component).value
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, &ComponentScore)> + '_ {
        Component::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return NEUTRAL_SCORE;
    }
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_scores_in_range() {
        assert_eq!(clamp_score(-12.0), 0.0);
        assert_eq!(clamp_score(140.0), 100.0);
        assert_eq!(clamp_score(f64::NAN), NEUTRAL_SCORE);
        assert_eq!(clamp_score(63.5), 63.5);
    }

    #[test]
    fn neutral_score_records_reason() {
        let s = ComponentScore::neutral(NeutralReason::MissingTechnicalReport);
        assert_eq!(s.value, 50.0);
        assert!(s.is_neutral_default());
        assert_eq!(
            s.basis,
            ScoreBasis::Neutral(NeutralReason::MissingTechnicalReport)
        );
        assert!(!ComponentScore::computed(50.0).is_neutral_default());
    }

    #[test]
    fn single_bar_bundle_is_neutral_everywhere() {
        use crate::domain::bundle::{MlPredictions, PriceBar, Projections};
        use crate::risk::compute_risk_stats;

        let series = vec![PriceBar {
            date: chrono::NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 5_000.0,
        }];
        let bundle = AnalysisBundle {
            symbol: "SBIN".to_string(),
            risk_stats: compute_risk_stats(&series),
            price_series: series,
            technical_report: None,
            ml_predictions: MlPredictions::new(),
            projections: Projections::new(),
        };

        let scores = ComponentScores::from_bundle(&bundle, 30);
        for (component, score) in scores.iter() {
            assert_eq!(score.value, NEUTRAL_SCORE, "{component}");
            assert!(score.is_neutral_default(), "{component} was {:?}", score.basis);
        }
        assert_eq!(
            scores.momentum.basis,
            ScoreBasis::Neutral(NeutralReason::InsufficientHistory)
        );
        assert_eq!(scores.risk.basis, ScoreBasis::Neutral(NeutralReason::NoReturnSeries));
        assert_eq!(scores.volume.basis, ScoreBasis::Neutral(NeutralReason::NoVolumeBaseline));
    }
}
