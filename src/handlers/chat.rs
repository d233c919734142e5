// src/handlers/chat.rs
use log::{error, info};

use crate::handlers::export::forecast_to_csv;
use crate::handlers::intent::{self, Intent};
use crate::models::{ConversationState, ForecastKind, MonthlySeries};
use crate::services;

/// The chat shell always forecasts one year ahead.
pub const DEFAULT_HORIZON: usize = 12;

const HELP_TEXT: &str = "I can forecast monthly motorcycle demand. \
Try \"run an ARIMA forecast\" or \"use exponential smoothing\".";

const UNRECOGNIZED_TEXT: &str = "Sorry, I didn't catch that. \
Ask me about demand forecasts, e.g. \"forecast the next 12 months with ARIMA\".";

/// Handle one user query: route it, run the requested forecast against the
/// session's series, and record both sides of the exchange. Forecast failures
/// become reply text for the user; they never escape this function.
pub fn handle_query(
    state: &mut ConversationState,
    series: &MonthlySeries,
    input: &str,
) -> String {
    state.push_user(input);

    let reply = match intent::route(input) {
        Intent::RunArima => run_forecast(ForecastKind::Arima, series),
        Intent::RunExpo => run_forecast(ForecastKind::Expo, series),
        Intent::ShowForecastHelp => HELP_TEXT.to_string(),
        Intent::Unrecognized => UNRECOGNIZED_TEXT.to_string(),
    };

    state.push_assistant(&reply);
    reply
}

fn run_forecast(kind: ForecastKind, series: &MonthlySeries) -> String {
    let label = match kind {
        ForecastKind::Arima => "ARIMA",
        ForecastKind::Expo => "exponential smoothing",
    };
    info!("Running {} forecast for the next {} months", label, DEFAULT_HORIZON);

    let result = match services::forecast(kind, series, DEFAULT_HORIZON) {
        Ok(result) => result,
        Err(e) => {
            error!("{} forecast failed: {}", label, e);
            return format!("The {} forecast failed: {}", label, e);
        }
    };

    match forecast_to_csv(&result) {
        Ok(table) => format!(
            "Predicted demand for the next {} months ({}):\n{}",
            DEFAULT_HORIZON, label, table
        ),
        Err(e) => {
            error!("Failed to render {} forecast: {}", label, e);
            format!("The {} forecast could not be rendered: {}", label, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{month_end, next_month_end, Role};

    fn make_series(n: usize) -> MonthlySeries {
        let mut dates = Vec::with_capacity(n);
        let mut cursor = month_end(2003, 1);
        for _ in 0..n {
            dates.push(cursor);
            cursor = next_month_end(cursor);
        }
        let values = (0..n)
            .map(|i| {
                200.0
                    + 3.0 * i as f64
                    + 40.0 * (2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0).sin()
                    + ((i * 17 + 7) % 13) as f64
                    - 6.0
            })
            .collect();
        MonthlySeries::new(dates, values).unwrap()
    }

    #[test]
    fn arima_query_yields_a_table_and_records_history() {
        let series = make_series(36);
        let mut state = ConversationState::default();

        let reply = handle_query(&mut state, &series, "Forecast with ARIMA please");
        assert!(reply.contains("Date,Forecasted_Demand,Lower_Bound,Upper_Bound"));

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(state.messages[0].content, "Forecast with ARIMA please");
        assert_eq!(state.messages[1].role, Role::Assistant);
        assert_eq!(state.messages[1].content, reply);
    }

    #[test]
    fn expo_query_yields_a_table_without_bounds() {
        let series = make_series(36);
        let mut state = ConversationState::default();

        let reply = handle_query(&mut state, &series, "use exponential smoothing");
        assert!(reply.contains("Date,Forecasted_Demand"));
        assert!(!reply.contains("Lower_Bound"));
    }

    #[test]
    fn help_and_unrecognized_do_not_run_models() {
        let series = make_series(36);
        let mut state = ConversationState::default();

        let help = handle_query(&mut state, &series, "please forecast");
        assert_eq!(help, HELP_TEXT);

        let unknown = handle_query(&mut state, &series, "banana");
        assert_eq!(unknown, UNRECOGNIZED_TEXT);

        assert_eq!(state.messages.len(), 4);
    }

    #[test]
    fn fit_failure_surfaces_as_reply_text() {
        // Too short for ARIMA: the failure must become a message, not a panic.
        let series = make_series(20);
        let mut state = ConversationState::default();

        let reply = handle_query(&mut state, &series, "arima");
        assert!(reply.contains("failed"), "reply: {}", reply);
        assert!(reply.contains("series too short"), "reply: {}", reply);
        assert_eq!(state.messages.len(), 2);
    }
}
