use crate::domain::bundle::{ObvTrend, VolumeAnalysis};
use crate::scoring::{ComponentScore, NeutralReason, NEUTRAL_SCORE};

pub fn volume_score(
    current_volume: f64,
    avg_volume_20d: f64,
    analysis: Option<&VolumeAnalysis>,
) -> ComponentScore {
    let has_baseline = avg_volume_20d > 0.0 && current_volume.is_finite();
    let analysis = analysis.filter(|a| !a.is_empty());
    if !has_baseline && analysis.is_none() {
        return ComponentScore::neutral(NeutralReason::NoVolumeBaseline);
    }

    let mut score = NEUTRAL_SCORE;

    if has_baseline {
        let ratio = current_volume / avg_volume_20d;
        if ratio > 2.0 {
            score += 15.0;
        } else if ratio > 1.5 {
            score += 10.0;
        } else if ratio < 0.5 {
            score -= 10.0;
        }
    }

    if let Some(analysis) = analysis {
        if analysis.volume_breakout() {
            score += 20.0;
        }
        match analysis.obv_trend() {
            ObvTrend::Bullish => score += 10.0,
            ObvTrend::Bearish => score -= 10.0,
            ObvTrend::Neutral => {}
        }
    }

    ComponentScore::computed(score)
}
