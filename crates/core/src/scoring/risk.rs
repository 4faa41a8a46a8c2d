use crate::risk::max_drawdown;
use crate::scoring::{ComponentScore, NeutralReason, NEUTRAL_SCORE};

/// Risk-adjusted score: low volatility, a good Sharpe ratio and shallow drawdowns
/// push it up.
///
/// A volatility of zero means none could be measured (empty or constant series)
/// and leaves the volatility adjustment out. With no returns and no statistics
/// the score is the neutral default.
pub fn risk_score(volatility: f64, sharpe_ratio: f64, returns: &[f64]) -> ComponentScore {
    let has_volatility = volatility.is_finite() && volatility > 0.0;
    if returns.is_empty() && !has_volatility && sharpe_ratio == 0.0 {
        return ComponentScore::neutral(NeutralReason::NoReturnSeries);
    }

    let mut score = NEUTRAL_SCORE;

    if has_volatility {
        if volatility < 0.2 {
            score += 10.0;
        } else if volatility > 0.5 {
            score -= 15.0;
        }
    }

    if sharpe_ratio > 1.0 {
        score += 20.0;
    } else if sharpe_ratio > 0.5 {
        score += 10.0;
    } else if sharpe_ratio < 0.0 {
        score -= 20.0;
    }

    if let Some(dd) = max_drawdown(returns) {
        if dd > -0.1 {
            score += 10.0;
        } else if dd < -0.3 {
            score -= 15.0;
        }
    }

    ComponentScore::computed(score)
}
