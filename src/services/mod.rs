// src/services/mod.rs
pub mod arima;
pub mod expo;
pub mod loader;

use crate::error::PipelineError;
use crate::models::{ForecastKind, ForecastResult, MonthlySeries};

/// The two forecasting models as a tagged variant with their per-model
/// configuration, behind one fitting capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForecastModel {
    Arima { confidence: f64 },
    ExponentialSmoothing,
}

impl ForecastModel {
    pub fn fit_and_forecast(
        &self,
        series: &MonthlySeries,
        horizon: usize,
    ) -> Result<ForecastResult, PipelineError> {
        match *self {
            ForecastModel::Arima { confidence } => {
                arima::forecast_arima_with_confidence(series, horizon, confidence)
            }
            ForecastModel::ExponentialSmoothing => expo::forecast_expo(series, horizon),
        }
    }
}

impl From<ForecastKind> for ForecastModel {
    fn from(kind: ForecastKind) -> Self {
        match kind {
            ForecastKind::Arima => ForecastModel::Arima {
                confidence: arima::DEFAULT_CONFIDENCE,
            },
            ForecastKind::Expo => ForecastModel::ExponentialSmoothing,
        }
    }
}

/// In-process forecast request interface consumed by the chat layer.
pub fn forecast(
    kind: ForecastKind,
    series: &MonthlySeries,
    horizon: usize,
) -> Result<ForecastResult, PipelineError> {
    ForecastModel::from(kind).fit_and_forecast(series, horizon)
}
