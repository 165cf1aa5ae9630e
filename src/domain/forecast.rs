// Forecast domain models
use super::series::{DailyPoint, StationSeries};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ARIMA (p, d, q) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ModelOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ModelOrder {
    fn default() -> Self {
        Self::new(5, 1, 2)
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({}, {}, {})", self.p, self.d, self.q)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub history: StationSeries,
    pub forecast: Vec<DailyPoint>,
    pub order: ModelOrder,
}

/// Outcome of a forecast request that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum Forecast {
    Available(ForecastResult),
    /// Not enough daily history to fit; an expected outcome, not an error
    InsufficientHistory { required: usize, available: usize },
}

impl Forecast {
    pub fn result(&self) -> Option<&ForecastResult> {
        match self {
            Forecast::Available(result) => Some(result),
            Forecast::InsufficientHistory { .. } => None,
        }
    }
}
