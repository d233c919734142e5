// src/services/arima.rs
//
// Seasonal ARIMA(2,1,0)(0,2,0)[12] on the monthly demand series. The orders
// are fixed constants of this system, not inferred. With no MA terms the
// Gaussian maximum-likelihood fit of the differenced series reduces to
// conditional least squares on the AR lags, which keeps estimation exact and
// deterministic.

use log::info;

use crate::error::{ModelFitError, PipelineError};
use crate::models::{ArimaFit, FittedModel, ForecastResult, MonthlySeries};

/// Non-seasonal autoregressive order (p).
pub const AR_ORDER: usize = 2;
/// Non-seasonal differencing order (d).
pub const DIFF_ORDER: usize = 1;
/// Seasonal differencing order (D).
pub const SEASONAL_DIFF_ORDER: usize = 2;
/// Seasonal period (s): monthly data, yearly cycle.
pub const SEASONAL_PERIOD: usize = 12;

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Differencing consumes d + D*s observations and the AR fit needs p lagged
/// values plus at least one residual on top of that.
pub const fn min_observations() -> usize {
    DIFF_ORDER + SEASONAL_DIFF_ORDER * SEASONAL_PERIOD + AR_ORDER + 1
}

/// Forecast `horizon` months ahead with the default 95% confidence bounds.
pub fn forecast_arima(
    series: &MonthlySeries,
    horizon: usize,
) -> Result<ForecastResult, PipelineError> {
    forecast_arima_with_confidence(series, horizon, DEFAULT_CONFIDENCE)
}

/// Forecast with two-sided bounds at a caller-chosen confidence level.
pub fn forecast_arima_with_confidence(
    series: &MonthlySeries,
    horizon: usize,
    confidence: f64,
) -> Result<ForecastResult, PipelineError> {
    if horizon < 1 {
        return Err(PipelineError::DataFormat(
            "forecast horizon must be at least 1".into(),
        ));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(PipelineError::DataFormat(format!(
            "confidence level must be in (0, 1), got {}",
            confidence
        )));
    }

    let n = series.len();
    let needed = min_observations();
    if n < needed {
        return Err(ModelFitError::SeriesTooShort { needed, got: n }.into());
    }

    let y = series.values();

    // w = (1-B)(1-B^12)^2 y
    let w = difference(
        &seasonal_difference(&seasonal_difference(y, SEASONAL_PERIOD), SEASONAL_PERIOD),
        DIFF_ORDER,
    );

    let (phi, sigma2) = fit_ar2(&w)?;
    info!(
        "Fitted ARIMA(2,1,0)(0,2,0)[12]: phi=({:.4}, {:.4}), sigma2={:.4}",
        phi[0], phi[1], sigma2
    );

    // Recursive point forecast of the differenced series.
    let mut w_ext = w.clone();
    for _ in 0..horizon {
        let m = w_ext.len();
        w_ext.push(phi[0] * w_ext[m - 1] + phi[1] * w_ext[m - 2]);
    }

    // Invert the differencing polynomial back to the original scale:
    // y_t = w_t + y_{t-1} + 2 y_{t-12} - 2 y_{t-13} - y_{t-24} + y_{t-25}
    let mut y_ext = y.to_vec();
    for h in 0..horizon {
        let m = y_ext.len();
        let next = w_ext[w.len() + h] + y_ext[m - 1] + 2.0 * y_ext[m - 12]
            - 2.0 * y_ext[m - 13]
            - y_ext[m - 24]
            + y_ext[m - 25];
        if !next.is_finite() {
            return Err(ModelFitError::NotConverged(
                "forecast recursion produced a non-finite value".into(),
            )
            .into());
        }
        y_ext.push(next);
    }
    let forecast: Vec<f64> = y_ext[n..].to_vec();

    // Forecast-error variance grows with the cumulative squared psi-weights
    // of the full (stationary x differencing) AR polynomial.
    let full_poly = full_ar_polynomial(phi);
    let psi = psi_weights(&full_poly, horizon);
    let z = quantile_normal((1.0 + confidence) / 2.0);

    let mut lower = Vec::with_capacity(horizon);
    let mut upper = Vec::with_capacity(horizon);
    let mut cumulative = 0.0;
    for h in 0..horizon {
        cumulative += psi[h] * psi[h];
        let half_width = z * (sigma2 * cumulative).sqrt();
        if !half_width.is_finite() {
            return Err(ModelFitError::NotConverged(
                "confidence bound computation produced a non-finite value".into(),
            )
            .into());
        }
        lower.push(forecast[h] - half_width);
        upper.push(forecast[h] + half_width);
    }

    Ok(ForecastResult {
        dates: series.future_dates(horizon),
        forecast,
        lower: Some(lower),
        upper: Some(upper),
        model: FittedModel::Arima(ArimaFit { ar: phi, sigma2 }),
    })
}

fn seasonal_difference(series: &[f64], period: usize) -> Vec<f64> {
    (period..series.len())
        .map(|i| series[i] - series[i - period])
        .collect()
}

fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        result = (1..result.len())
            .map(|i| result[i] - result[i - 1])
            .collect();
    }
    result
}

/// Conditional least squares for w_t = phi1 w_{t-1} + phi2 w_{t-2} + e_t.
/// No intercept: differencing of order d + D > 0 removes the mean.
fn fit_ar2(w: &[f64]) -> Result<([f64; 2], f64), PipelineError> {
    let m = w.len();

    let (mut s11, mut s22, mut s12, mut sy1, mut sy2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for t in AR_ORDER..m {
        let (x1, x2, y) = (w[t - 1], w[t - 2], w[t]);
        s11 += x1 * x1;
        s22 += x2 * x2;
        s12 += x1 * x2;
        sy1 += x1 * y;
        sy2 += x2 * y;
    }

    let det = s11 * s22 - s12 * s12;
    if !det.is_finite() || det.abs() < 1e-12 {
        return Err(ModelFitError::NotConverged(
            "singular normal equations in the AR fit".into(),
        )
        .into());
    }

    let phi1 = (sy1 * s22 - sy2 * s12) / det;
    let phi2 = (sy2 * s11 - sy1 * s12) / det;
    if !phi1.is_finite() || !phi2.is_finite() {
        return Err(ModelFitError::NotConverged("non-finite AR coefficients".into()).into());
    }

    let mut sse = 0.0;
    for t in AR_ORDER..m {
        let e = w[t] - phi1 * w[t - 1] - phi2 * w[t - 2];
        sse += e * e;
    }
    let sigma2 = sse / (m - AR_ORDER) as f64;
    if !sigma2.is_finite() {
        return Err(ModelFitError::NotConverged("non-finite residual variance".into()).into());
    }

    Ok(([phi1, phi2], sigma2))
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Coefficients of (1 - phi1 B - phi2 B^2)(1 - B)(1 - B^12)^2, the AR
/// polynomial of the model on the original (undifferenced) scale.
fn full_ar_polynomial(phi: [f64; 2]) -> Vec<f64> {
    let ar = [1.0, -phi[0], -phi[1]];
    let nonseasonal = [1.0, -1.0];
    let mut seasonal = vec![0.0; SEASONAL_PERIOD + 1];
    seasonal[0] = 1.0;
    seasonal[SEASONAL_PERIOD] = -1.0;
    let seasonal_squared = poly_mul(&seasonal, &seasonal);
    poly_mul(&poly_mul(&ar, &nonseasonal), &seasonal_squared)
}

/// psi-weights of the MA(inf) representation: psi_0 = 1 and
/// psi_j = sum_k pi_k psi_{j-k} with pi_k = -poly[k].
fn psi_weights(poly: &[f64], horizon: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(horizon);
    psi.push(1.0);
    for j in 1..horizon {
        let mut sum = 0.0;
        for k in 1..=j.min(poly.len() - 1) {
            sum += -poly[k] * psi[j - k];
        }
        psi.push(sum);
    }
    psi
}

/// Inverse standard-normal CDF, Abramowitz & Stegun 26.2.23 rational
/// approximation (absolute error < 4.5e-4).
fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let t = if p < 0.5 {
        (-2.0 * p.ln()).sqrt()
    } else {
        (-2.0 * (1.0 - p).ln()).sqrt()
    };

    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let result = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    if p < 0.5 {
        -result
    } else {
        result
    }
}
