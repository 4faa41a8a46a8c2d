use crate::domain::bundle::{TechnicalReport, TrendDirection};
use crate::scoring::{ComponentScore, NeutralReason, NEUTRAL_SCORE};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;

/// Score the indicator report. A missing or empty report is fully neutral.
pub fn technical_score(report: Option<&TechnicalReport>) -> ComponentScore {
    let Some(report) = report.filter(|r| !r.is_empty()) else {
        return ComponentScore::neutral(NeutralReason::MissingTechnicalReport);
    };

    let mut score = NEUTRAL_SCORE;
    let basic = &report.basic_indicators;

    let rsi = basic.rsi();
    if rsi < RSI_OVERSOLD {
        score += 20.0;
    } else if rsi > RSI_OVERBOUGHT {
        score -= 20.0;
    } else if (40.0..=60.0).contains(&rsi) {
        score += 5.0;
    }

    if basic.macd() > basic.macd_signal() {
        score += 15.0;
    } else {
        score -= 10.0;
    }

    let trend = &report.trend_analysis;
    let swing = (trend.strength() * 20.0).round();
    match trend.direction() {
        TrendDirection::Up => score += swing,
        TrendDirection::Down => score -= swing,
        TrendDirection::Neutral => {}
    }

    let sr = &report.support_resistance;
    let price = sr.current_price();
    if price > 0.0 {
        if let Some(resistance) = sr.nearest_resistance() {
            let distance = (resistance - price) / price;
            if distance > 0.05 {
                score += 10.0;
            } else if distance < 0.02 {
                score -= 5.0;
            }
        }
        if let Some(support) = sr.nearest_support() {
            if (price - support) / price < 0.02 {
                score += 5.0;
            }
        }
    }

    ComponentScore::computed(score)
}
