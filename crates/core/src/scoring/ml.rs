use crate::domain::bundle::{prediction_for_horizon, MlPredictions};
use crate::scoring::{ComponentScore, NeutralReason, NEUTRAL_SCORE};

/// Points per unit of expected return: +/-20% spans the whole scale.
const RETURN_SCALE: f64 = 250.0;

/// Score the forecast at the most advanced horizon that does not exceed
/// `horizon_days`, shrunk toward neutral by the forecast's own confidence.
pub fn ml_score(predictions: &MlPredictions, current_price: f64, horizon_days: u32) -> ComponentScore {
    if predictions.is_empty() {
        return ComponentScore::neutral(NeutralReason::NoForecast);
    }
    if !(current_price.is_finite() && current_price > 0.0) {
        return ComponentScore::neutral(NeutralReason::NonPositivePrice);
    }
    let Some((_, prediction)) = prediction_for_horizon(predictions, horizon_days) else {
        return ComponentScore::neutral(NeutralReason::NoForecastWithinHorizon);
    };

    let expected_return = (prediction.predicted_price - current_price) / current_price;
    let raw = NEUTRAL_SCORE + expected_return * RETURN_SCALE;
    ComponentScore::computed(NEUTRAL_SCORE + (raw - NEUTRAL_SCORE) * prediction.confidence())
}
