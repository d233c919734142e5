// src/handlers/export.rs
use csv::Writer;

use crate::error::PipelineError;
use crate::models::ForecastResult;

/// Render a forecast as UTF-8 CSV with a header row. Columns are
/// `Date,Forecasted_Demand`, extended with `Lower_Bound,Upper_Bound` when the
/// forecast carries confidence bounds. This shape is consumed downstream and
/// must stay stable.
pub fn forecast_to_csv(result: &ForecastResult) -> Result<String, PipelineError> {
    let mut writer = Writer::from_writer(Vec::new());

    let render =
        |e: csv::Error| PipelineError::DataFormat(format!("forecast CSV rendering failed: {}", e));

    match (&result.lower, &result.upper) {
        (Some(lower), Some(upper)) => {
            writer
                .write_record(["Date", "Forecasted_Demand", "Lower_Bound", "Upper_Bound"])
                .map_err(render)?;
            for i in 0..result.horizon() {
                writer
                    .write_record([
                        result.dates[i].format("%Y-%m-%d").to_string(),
                        format!("{:.4}", result.forecast[i]),
                        format!("{:.4}", lower[i]),
                        format!("{:.4}", upper[i]),
                    ])
                    .map_err(render)?;
            }
        }
        _ => {
            writer
                .write_record(["Date", "Forecasted_Demand"])
                .map_err(render)?;
            for i in 0..result.horizon() {
                writer
                    .write_record([
                        result.dates[i].format("%Y-%m-%d").to_string(),
                        format!("{:.4}", result.forecast[i]),
                    ])
                    .map_err(render)?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::DataFormat(format!("forecast CSV rendering failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| PipelineError::DataFormat(format!("forecast CSV is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{month_end, ArimaFit, ExpoFit, FittedModel};

    fn arima_result() -> ForecastResult {
        ForecastResult {
            dates: vec![month_end(2005, 6), month_end(2005, 7)],
            forecast: vec![310.25, 295.5],
            lower: Some(vec![280.0, 250.75]),
            upper: Some(vec![340.5, 340.25]),
            model: FittedModel::Arima(ArimaFit {
                ar: [0.3, -0.1],
                sigma2: 42.0,
            }),
        }
    }

    fn expo_result() -> ForecastResult {
        ForecastResult {
            dates: vec![month_end(2005, 6)],
            forecast: vec![312.125],
            lower: None,
            upper: None,
            model: FittedModel::ExponentialSmoothing(ExpoFit {
                alpha: 0.3,
                beta: 0.1,
                gamma: 0.1,
                level: 300.0,
                trend: 2.0,
                seasonals: vec![0.0; 12],
            }),
        }
    }

    #[test]
    fn arima_export_includes_bound_columns() {
        let csv = forecast_to_csv(&arima_result()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Forecasted_Demand,Lower_Bound,Upper_Bound"
        );
        assert_eq!(lines.next().unwrap(), "2005-06-30,310.2500,280.0000,340.5000");
        assert_eq!(lines.next().unwrap(), "2005-07-31,295.5000,250.7500,340.2500");
        assert!(lines.next().is_none());
    }

    #[test]
    fn expo_export_has_two_columns_only() {
        let csv = forecast_to_csv(&expo_result()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "Date,Forecasted_Demand");
        assert_eq!(lines.next().unwrap(), "2005-06-30,312.1250");
        assert!(lines.next().is_none());
    }
}
