use crate::domain::bundle::{prediction_for_horizon, AnalysisBundle};
use crate::domain::recommendation::Action;
use crate::risk::TRADING_DAYS_PER_YEAR;

/// Maximum conviction tilt applied to the target, as a fraction of price.
const MAX_TILT: f64 = 0.2;
const RESISTANCE_CAP: f64 = 0.95;
const SUPPORT_BUFFER: f64 = 0.98;
const DEFAULT_STOP: f64 = 0.90;
const STRONG_BUY_STOP_FLOOR: f64 = 0.92;
const STRONG_SELL_STOP_CAP: f64 = 1.15;

/// Point target for the horizon.
///
/// Blends the current price with the forecast and the ensemble projection, tilts it by
/// conviction, caps bullish targets below the nearest resistance, and finally keeps it
/// on the side of the current price implied by `action`.
pub fn target_price(bundle: &AnalysisBundle, horizon_days: u32, overall_score: f64, action: Action) -> f64 {
    let current = bundle.current_price();
    let mut target = current;

    if let Some((_, prediction)) = prediction_for_horizon(&bundle.ml_predictions, horizon_days) {
        target = (target + prediction.predicted_price) / 2.0;
    }

    if let Some(projected) = bundle
        .ensemble_projection()
        .and_then(|p| p.price_at_horizon(horizon_days))
    {
        target = (target + projected) / 2.0;
    }

    target *= 1.0 + (overall_score - 50.0) / 100.0 * MAX_TILT;

    if overall_score > 50.0 {
        if let Some(resistance) = bundle.support_resistance().and_then(|sr| sr.nearest_resistance()) {
            target = target.min(resistance * RESISTANCE_CAP);
        }
    }

    if action.is_sell_side() {
        target = target.min(current);
    } else if action.is_buy_side() {
        target = target.max(current);
    }
    target
}

/// The less aggressive of a two-sigma daily volatility stop and a stop just under the
/// nearest support, tightened for strong conviction either way.
pub fn stop_loss(bundle: &AnalysisBundle, overall_score: f64) -> f64 {
    let current = bundle.current_price();
    let daily_vol = bundle.risk_stats.volatility.max(0.0) / TRADING_DAYS_PER_YEAR.sqrt();
    let vol_stop = current * (1.0 - 2.0 * daily_vol);

    let support_stop = bundle
        .support_resistance()
        .and_then(|sr| sr.nearest_support())
        .map(|s| s * SUPPORT_BUFFER)
        .unwrap_or(current * DEFAULT_STOP);

    let mut stop = vol_stop.max(support_stop);
    if overall_score > 70.0 {
        stop = stop.max(current * STRONG_BUY_STOP_FLOOR);
    } else if overall_score < 30.0 {
        stop = stop.min(current * STRONG_SELL_STOP_CAP);
    }
    stop
}

pub fn risk_reward_ratio(action: Action, current: f64, target: f64, stop: f64) -> f64 {
    if !action.is_buy_side() {
        return 0.0;
    }
    let risk = current - stop;
    if risk <= 0.0 {
        return 0.0;
    }
    ((target - current) / risk).max(0.0)
}
