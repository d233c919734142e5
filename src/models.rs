// src/models.rs
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::error::PipelineError;

/// One transactional order line as it appears in the raw sales CSV.
///
/// The date is kept as the raw string here; parsing happens in the loader so
/// that an unparseable date fails the load with a `DataFormat` error instead
/// of being swallowed at deserialization time. Exact duplicates (all three
/// fields equal) are removed before aggregation, hence `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct RawOrderRecord {
    #[serde(rename = "ORDERDATE")]
    pub order_date: String,
    #[serde(rename = "PRODUCTLINE")]
    pub product_line: String,
    #[serde(rename = "QUANTITYORDERED")]
    pub quantity_ordered: u32,
}

/// Last calendar day of the given month.
pub fn month_end(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // The first of a month is a valid date for any month 1-12.
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .expect("month in 1..=12")
}

/// Month-end of the calendar month immediately after `date`'s month.
pub fn next_month_end(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        month_end(date.year() + 1, 1)
    } else {
        month_end(date.year(), date.month() + 1)
    }
}

/// The canonical monthly demand series consumed by both forecasters.
///
/// Invariants, enforced at construction and never violated afterwards:
/// the index is non-empty, every date is a month-end, dates are strictly
/// increasing, and consecutive entries are exactly one calendar month apart.
/// The shell builds this once per session and passes it around by reference;
/// it is never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl MonthlySeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, PipelineError> {
        if dates.is_empty() {
            return Err(PipelineError::DataFormat(
                "monthly series must not be empty".into(),
            ));
        }
        if dates.len() != values.len() {
            return Err(PipelineError::DataFormat(format!(
                "monthly series has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        for (i, date) in dates.iter().enumerate() {
            if *date != month_end(date.year(), date.month()) {
                return Err(PipelineError::DataFormat(format!(
                    "monthly series index entry {} is not a month-end date",
                    date
                )));
            }
            if i > 0 && *date != next_month_end(dates[i - 1]) {
                return Err(PipelineError::DataFormat(format!(
                    "monthly series has a gap or overlap between {} and {}",
                    dates[i - 1],
                    date
                )));
            }
        }
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last_date(&self) -> NaiveDate {
        // Non-empty by construction.
        *self.dates.last().expect("monthly series is non-empty")
    }

    /// Month-end dates for `horizon` months immediately following the series,
    /// continuing its cadence with no gap or overlap.
    pub fn future_dates(&self, horizon: usize) -> Vec<NaiveDate> {
        let mut out = Vec::with_capacity(horizon);
        let mut cursor = self.last_date();
        for _ in 0..horizon {
            cursor = next_month_end(cursor);
            out.push(cursor);
        }
        out
    }
}

/// Which forecasting routine a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastKind {
    Arima,
    Expo,
}

/// Fitted seasonal ARIMA parameters, kept for potential reuse/inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaFit {
    /// AR(2) coefficients on the differenced series.
    pub ar: [f64; 2],
    /// Residual variance of the conditional least-squares fit.
    pub sigma2: f64,
}

/// Fitted Holt-Winters state after the final smoothing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpoFit {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub level: f64,
    pub trend: f64,
    pub seasonals: Vec<f64>,
}

/// Opaque handle to the fitted model behind a forecast.
#[derive(Debug, Clone, PartialEq)]
pub enum FittedModel {
    Arima(ArimaFit),
    ExponentialSmoothing(ExpoFit),
}

/// Output of a single forecast request. `lower`/`upper` are present for the
/// ARIMA path and absent (`None`, never zero-filled) for exponential
/// smoothing. The caller owns the result and may discard it after rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub dates: Vec<NaiveDate>,
    pub forecast: Vec<f64>,
    pub lower: Option<Vec<f64>>,
    pub upper: Option<Vec<f64>>,
    pub model: FittedModel,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Session-scoped conversation history, owned by the calling shell and passed
/// into the chat handler explicitly. Nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: content.to_string(),
        });
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: content.to_string(),
        });
    }
}
