// Domain layer - Records, series and models, free of I/O
pub mod arima;
pub mod dataset;
pub mod forecast;
pub mod measurement;
pub mod record;
pub mod series;
