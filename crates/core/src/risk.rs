//! Return-series statistics used by the risk component and the stop-loss sizing.

use crate::domain::bundle::{PriceBar, RiskStats};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Simple daily returns of the close series. Pairs with a non-positive previous
/// close are skipped.
pub fn daily_returns(series: &[PriceBar]) -> Vec<f64> {
    series
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| w[1].close / w[0].close - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

pub fn compute_risk_stats(series: &[PriceBar]) -> RiskStats {
    let returns = daily_returns(series);
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let volatility = sample_std(&returns).map(|s| s * annualizer).unwrap_or(0.0);
    let annual_return = mean(&returns).map(|m| m * TRADING_DAYS_PER_YEAR).unwrap_or(0.0);
    let sharpe_ratio = ratio_or_zero(annual_return, volatility);

    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_deviation = sample_std(&negatives).map(|s| s * annualizer).unwrap_or(0.0);
    let sortino_ratio = ratio_or_zero(annual_return, downside_deviation);

    RiskStats {
        volatility,
        sharpe_ratio,
        max_drawdown: max_drawdown(&returns).unwrap_or(0.0),
        annual_return,
        downside_deviation,
        sortino_ratio,
        var_95: percentile(&returns, 5.0).unwrap_or(0.0),
        return_series: returns,
    }
}

/// Largest decline of compounded return from its running peak (<= 0).
/// `None` for an empty series.
pub fn max_drawdown(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }

    let mut cumulative = 1.0;
    let mut peak = f64::MIN;
    let mut worst: f64 = 0.0;
    for r in returns {
        cumulative *= 1.0 + r;
        peak = peak.max(cumulative);
        if peak > 0.0 {
            worst = worst.min((cumulative - peak) / peak);
        }
    }
    Some(worst)
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample standard deviation (n - 1); needs at least two observations.
fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolated percentile, `pct` in [0, 100].
fn percentile(xs: &[f64], pct: f64) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        // 100 -> 120 -> 90 -> 130: worst is 90 vs 120 = -25%.
        let dd = max_drawdown(&[0.2, -0.25, 130.0 / 90.0 - 1.0]).unwrap();
        assert!((dd + 0.25).abs() < 1e-12);
        assert_eq!(max_drawdown(&[0.01, 0.02]), Some(0.0));
        assert_eq!(max_drawdown(&[]), None);
    }

    #[test]
    fn flat_series_has_zero_risk() {
        let stats = compute_risk_stats(&series(&[50.0; 30]));
        assert_eq!(stats.volatility, 0.0);
        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.return_series.len(), 29);
    }

    #[test]
    fn volatility_is_annualized_sample_std() {
        let stats = compute_risk_stats(&series(&[100.0, 101.0, 100.0, 101.0]));
        let r = stats.return_series.clone();
        let m = r.iter().sum::<f64>() / 3.0;
        let var = r.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 2.0;
        assert!((stats.volatility - var.sqrt() * 252f64.sqrt()).abs() < 1e-12);
        assert!(stats.downside_deviation == 0.0);
        assert!(stats.sortino_ratio == 0.0);
    }

    #[test]
    fn var_95_interpolates() {
        let xs: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
        assert!((percentile(&xs, 5.0).unwrap() - 0.05).abs() < 1e-12);
        assert_eq!(percentile(&[], 5.0), None);
    }

    #[test]
    fn empty_or_single_bar_series() {
        let stats = compute_risk_stats(&series(&[10.0]));
        assert_eq!(stats, RiskStats::default());
    }
}
