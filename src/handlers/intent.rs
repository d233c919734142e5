// src/handlers/intent.rs

/// Routing outcome for one free-text user query. `Unrecognized` is a defined
/// outcome, not an error: the chat layer answers it with guidance text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    RunArima,
    RunExpo,
    ShowForecastHelp,
    Unrecognized,
}

/// Case-insensitive substring routing, first match wins: "arima" beats
/// "expo"/"exponential", which beat a generic "forecast".
pub fn route(input: &str) -> Intent {
    let query = input.to_lowercase();
    if query.contains("arima") {
        Intent::RunArima
    } else if query.contains("expo") || query.contains("exponential") {
        Intent::RunExpo
    } else if query.contains("forecast") {
        Intent::ShowForecastHelp
    } else {
        Intent::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arima_wins_even_when_forecast_is_present() {
        assert_eq!(route("Please FORECAST with ARIMA"), Intent::RunArima);
        assert_eq!(route("arima"), Intent::RunArima);
    }

    #[test]
    fn arima_wins_over_expo() {
        assert_eq!(route("arima or exponential?"), Intent::RunArima);
    }

    #[test]
    fn expo_keywords_route_to_expo() {
        assert_eq!(route("run EXPO please"), Intent::RunExpo);
        assert_eq!(route("use Exponential smoothing"), Intent::RunExpo);
    }

    #[test]
    fn bare_forecast_shows_help() {
        assert_eq!(route("please forecast"), Intent::ShowForecastHelp);
    }

    #[test]
    fn unrelated_input_is_unrecognized() {
        assert_eq!(route("banana"), Intent::Unrecognized);
        assert_eq!(route(""), Intent::Unrecognized);
    }
}
