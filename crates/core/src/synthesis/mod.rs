//! Combines the component scores into the final recommendation.

pub mod pricing;
pub mod reasoning;

use crate::domain::bundle::AnalysisBundle;
use crate::domain::recommendation::{Action, Recommendation};
use crate::scoring::{clamp_score, Component, ComponentScores};

/// Component weights in basis points; they sum to exactly 10_000.
pub const WEIGHT_BPS: [(Component, u32); 5] = [
    (Component::Technical, 3_500),
    (Component::MlPrediction, 2_500),
    (Component::Momentum, 2_000),
    (Component::Risk, 1_000),
    (Component::Volume, 1_000),
];

pub fn weight(component: Component) -> f64 {
    WEIGHT_BPS
        .iter()
        .find(|(c, _)| *c == component)
        .map(|(_, bps)| *bps as f64 / 10_000.0)
        .unwrap_or(0.0)
}

pub fn overall_score(scores: &ComponentScores) -> f64 {
    let sum: f64 = scores
        .iter()
        .map(|(component, score)| weight(component) * score.value)
        .sum();
    clamp_score(sum)
}

/// Thresholds are inclusive lower bounds, so a boundary score lands in the higher tier.
pub fn map_action(overall_score: f64) -> Action {
    match overall_score {
        s if s >= 75.0 => Action::StrongBuy,
        s if s >= 60.0 => Action::Buy,
        s if s >= 55.0 => Action::WeakBuy,
        s if s >= 45.0 => Action::Hold,
        s if s >= 40.0 => Action::WeakSell,
        s if s >= 25.0 => Action::Sell,
        _ => Action::StrongSell,
    }
}

/// Produce the recommendation for an already-gathered bundle. `None` when the bundle
/// has no usable price.
pub fn synthesize(bundle: &AnalysisBundle, horizon_days: u32) -> Option<Recommendation> {
    let current_price = bundle.current_price();
    if !(current_price.is_finite() && current_price > 0.0) {
        return None;
    }

    let component_scores = ComponentScores::from_bundle(bundle, horizon_days);
    let overall = overall_score(&component_scores);
    let action = map_action(overall);

    let target_price = pricing::target_price(bundle, horizon_days, overall, action);
    let stop_loss = pricing::stop_loss(bundle, overall);
    let risk_reward_ratio = pricing::risk_reward_ratio(action, current_price, target_price, stop_loss);
    let reasoning = reasoning::build_reasoning(&component_scores, bundle.technical_report.as_ref());

    tracing::debug!(
        symbol = %bundle.symbol,
        horizon_days,
        overall_score = overall,
        %action,
        "recommendation synthesized"
    );

    Some(Recommendation {
        symbol: bundle.symbol.clone(),
        action,
        confidence: action.confidence(),
        overall_score: overall,
        component_scores,
        current_price,
        target_price,
        stop_loss,
        risk_reward_ratio,
        expected_return: (target_price - current_price) / current_price * 100.0,
        reasoning,
        time_horizon_days: horizon_days,
    })
}
