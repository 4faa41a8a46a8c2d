use crate::domain::bundle::{PriceBar, Projections};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryResponse {
    pub symbol: String,
    #[serde(default)]
    pub rows: Vec<PriceBar>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionResponse {
    #[serde(default)]
    pub projections: Projections,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub predicted_price: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub horizon_days: Option<u32>,
}
