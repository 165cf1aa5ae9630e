// Forecaster - fixed-order ARIMA projection of a daily station series
use crate::domain::arima::{Arima, ArimaError};
use crate::domain::forecast::{Forecast, ForecastResult, ModelOrder};
use crate::domain::series::{DailyPoint, StationSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastPolicy {
    pub order: ModelOrder,
    /// Number of future daily steps
    pub horizon: usize,
    /// Forecasting needs strictly more points than this
    pub min_history: usize,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self {
            order: ModelOrder::default(),
            horizon: 30,
            min_history: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("could not fit {order}: {source}")]
    ModelFit {
        order: ModelOrder,
        #[source]
        source: ArimaError,
    },
    #[error("forecast dates run past the supported calendar")]
    CalendarOverflow,
}

#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    policy: ForecastPolicy,
}

impl Forecaster {
    pub fn new(policy: ForecastPolicy) -> Self {
        Self { policy }
    }

    /// Fit the model to `series` and project it `horizon` days ahead.
    ///
    /// Too little history is reported as `Forecast::InsufficientHistory`, not
    /// as an error; only a failed model fit is an `Err`.
    pub fn forecast(&self, series: &StationSeries) -> Result<Forecast, ForecastError> {
        let ForecastPolicy {
            order,
            horizon,
            min_history,
        } = self.policy;

        let last_date = match series.last_date() {
            Some(date) if series.len() > min_history => date,
            _ => {
                tracing::debug!(
                    station = %series.station,
                    available = series.len(),
                    required = min_history + 1,
                    "not enough history to forecast"
                );
                return Ok(Forecast::InsufficientHistory {
                    required: min_history + 1,
                    available: series.len(),
                });
            }
        };

        let fit_failed = |source| ForecastError::ModelFit { order, source };
        let mut model = Arima::new(order).map_err(fit_failed)?;
        model.fit(&series.values()).map_err(fit_failed)?;
        let values = model.predict(horizon).map_err(fit_failed)?;

        let forecast: Vec<DailyPoint> = last_date
            .iter_days()
            .skip(1)
            .zip(values)
            .map(|(date, value)| DailyPoint::new(date, value))
            .collect();
        if forecast.len() != horizon {
            return Err(ForecastError::CalendarOverflow);
        }

        tracing::debug!(
            station = %series.station,
            measurement = %series.measurement,
            history = series.len(),
            horizon,
            %order,
            sigma2 = model.residual_variance(),
            "forecast ready"
        );

        Ok(Forecast::Available(ForecastResult {
            history: series.clone(),
            forecast,
            order,
        }))
    }
}
