use crate::domain::bundle::TechnicalReport;
use crate::scoring::{Component, ComponentScores};

pub const NEUTRAL_FALLBACK: &str = "Mixed signals suggest a neutral stance";

struct Note {
    bullish_above: f64,
    bearish_below: f64,
    bullish: &'static str,
    bearish: &'static str,
}

fn note_for(component: Component) -> Note {
    match component {
        Component::Technical => Note {
            bullish_above: 65.0,
            bearish_below: 35.0,
            bullish: "Strong technical indicators support upward movement",
            bearish: "Technical indicators suggest downward pressure",
        },
        Component::MlPrediction => Note {
            bullish_above: 60.0,
            bearish_below: 40.0,
            bullish: "Machine learning models predict positive price movement",
            bearish: "ML models indicate potential price decline",
        },
        Component::Momentum => Note {
            bullish_above: 60.0,
            bearish_below: 40.0,
            bullish: "Strong positive momentum in price and volume",
            bearish: "Negative momentum suggests caution",
        },
        Component::Risk => Note {
            bullish_above: 60.0,
            bearish_below: 40.0,
            bullish: "Favorable risk-adjusted returns profile",
            bearish: "Higher risk profile requires careful position sizing",
        },
        Component::Volume => Note {
            bullish_above: 60.0,
            bearish_below: 40.0,
            bullish: "Strong volume support confirms price movement",
            bearish: "Weak volume may limit price movement",
        },
    }
}

/// One sentence per notable component in component order, then an RSI call-out.
/// Never empty.
pub fn build_reasoning(scores: &ComponentScores, report: Option<&TechnicalReport>) -> Vec<String> {
    let mut out = Vec::new();

    for (component, score) in scores.iter() {
        let note = note_for(component);
        if score.value > note.bullish_above {
            out.push(note.bullish.to_string());
        } else if score.value < note.bearish_below {
            out.push(note.bearish.to_string());
        }
    }

    if let Some(report) = report {
        let rsi = report.basic_indicators.rsi();
        if rsi > 70.0 {
            out.push("RSI indicates overbought conditions - consider profit taking".to_string());
        } else if rsi < 30.0 {
            out.push("RSI shows oversold conditions - potential buying opportunity".to_string());
        }
    }

    if out.is_empty() {
        out.push(NEUTRAL_FALLBACK.to_string());
    }
    out
}
