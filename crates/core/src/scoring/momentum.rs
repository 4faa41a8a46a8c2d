use crate::domain::bundle::{PriceBar, TechnicalReport, VolumeTrend};
use crate::risk::daily_returns;
use crate::scoring::{ComponentScore, NeutralReason, NEUTRAL_SCORE};

pub const MOMENTUM_WINDOW: usize = 20;

/// Turns an average daily drift of +/-2% into a +/-20 point swing.
const DRIFT_SCALE: f64 = 1000.0;

pub fn momentum_score(series: &[PriceBar], report: Option<&TechnicalReport>) -> ComponentScore {
    let report = report.filter(|r| !r.is_empty());
    if series.len() < 2 && report.is_none() {
        return ComponentScore::neutral(NeutralReason::InsufficientHistory);
    }

    let mut score = NEUTRAL_SCORE + mean_recent_return(series, MOMENTUM_WINDOW) * DRIFT_SCALE;

    if let Some(report) = report {
        match report.volume_analysis.volume_trend() {
            VolumeTrend::Increasing => score += 10.0,
            VolumeTrend::Decreasing => score -= 5.0,
            VolumeTrend::Neutral => {}
        }

        let basic = &report.basic_indicators;
        let (vs20, vs50) = (basic.price_vs_sma20(), basic.price_vs_sma50());
        if vs20 > 0.0 && vs50 > 0.0 {
            score += 15.0;
        } else if vs20 > 0.0 {
            score += 5.0;
        } else if vs20 < 0.0 && vs50 < 0.0 {
            score -= 15.0;
        }
    }

    ComponentScore::computed(score)
}

/// Mean of the last `window` daily returns; 0 for a series too short to have any.
fn mean_recent_return(series: &[PriceBar], window: usize) -> f64 {
    let returns = daily_returns(series);
    let recent = &returns[returns.len().saturating_sub(window)..];
    if recent.is_empty() {
        return 0.0;
    }
    recent.iter().sum::<f64>() / recent.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::{BasicIndicators, VolumeAnalysis};
    use crate::scoring::ScoreBasis;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: 1_000.0,
            })
            .collect()
    }

    #[test]
    fn flat_series_is_neutral() {
        let s = momentum_score(&series(&[100.0; 30]), None);
        assert_eq!(s.value, 50.0);
        let s = momentum_score(&series(&[100.0; 30]), Some(&TechnicalReport::default()));
        assert_eq!(s.value, 50.0);
    }

    #[test]
    fn drift_uses_only_recent_window() {
        // Big drop long ago, then 20 sessions of +1%.
        let mut closes = vec![200.0, 100.0];
        for i in 0..20 {
            closes.push(closes[i + 1] * 1.01);
        }
        let s = momentum_score(&series(&closes), None);
        assert!((s.value - 60.0).abs() < 1e-6);
    }

    #[test]
    fn moving_average_position_and_volume_trend() {
        let mut report = TechnicalReport {
            basic_indicators: BasicIndicators {
                price_vs_sma20: Some(0.02),
                price_vs_sma50: Some(0.05),
                ..Default::default()
            },
            volume_analysis: VolumeAnalysis {
                volume_trend: Some(VolumeTrend::Increasing),
                ..Default::default()
            },
            ..Default::default()
        };
        let flat = series(&[100.0; 25]);
        assert_eq!(momentum_score(&flat, Some(&report)).value, 75.0);

        report.basic_indicators.price_vs_sma50 = Some(-0.01);
        assert_eq!(momentum_score(&flat, Some(&report)).value, 65.0);

        report.basic_indicators.price_vs_sma20 = Some(-0.01);
        report.volume_analysis.volume_trend = Some(VolumeTrend::Decreasing);
        assert_eq!(momentum_score(&flat, Some(&report)).value, 30.0);
    }

    #[test]
    fn single_bar_without_report_is_neutral_default() {
        let s = momentum_score(&series(&[100.0]), None);
        assert_eq!(s.value, 50.0);
        assert_eq!(s.basis, ScoreBasis::Neutral(NeutralReason::InsufficientHistory));
        assert!(momentum_score(&[], Some(&TechnicalReport::default())).is_neutral_default());
    }

    #[test]
    fn single_bar_with_report_is_computed() {
        let report = TechnicalReport {
            volume_analysis: VolumeAnalysis {
                volume_trend: Some(VolumeTrend::Increasing),
                ..Default::default()
            },
            ..Default::default()
        };
        let s = momentum_score(&series(&[100.0]), Some(&report));
        assert_eq!(s.value, 60.0);
        assert_eq!(s.basis, ScoreBasis::Computed);
    }
}
