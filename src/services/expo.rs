// src/services/expo.rs
//
// Holt-Winters exponential smoothing with additive trend and additive
// seasonality (period 12). Smoothing parameters are estimated by minimizing
// the in-sample sum of squared one-step errors with a bounded Nelder-Mead
// simplex started from fixed coordinates, so fitting is deterministic. This
// path produces point forecasts only; no prediction intervals.

use log::info;

use crate::error::{ModelFitError, PipelineError};
use crate::models::{ExpoFit, FittedModel, ForecastResult, MonthlySeries};

pub const SEASONAL_PERIOD: usize = 12;

/// A seasonal component needs at least two full cycles to be identifiable.
pub const fn min_observations() -> usize {
    2 * SEASONAL_PERIOD
}

const PARAM_MIN: f64 = 1e-4;
const PARAM_MAX: f64 = 1.0 - 1e-4;

/// Forecast `horizon` months ahead with an additive-trend, additive-seasonal
/// exponential smoothing model.
pub fn forecast_expo(
    series: &MonthlySeries,
    horizon: usize,
) -> Result<ForecastResult, PipelineError> {
    if horizon < 1 {
        return Err(PipelineError::DataFormat(
            "forecast horizon must be at least 1".into(),
        ));
    }

    let n = series.len();
    let needed = min_observations();
    if n < needed {
        return Err(ModelFitError::SeriesTooShort { needed, got: n }.into());
    }

    let values = series.values();
    let (alpha, beta, gamma) = optimize_params(values)?;
    let (level, trend, seasonals, _) = smoothing_pass(values, alpha, beta, gamma);
    info!(
        "Fitted Holt-Winters(add,add)[12]: alpha={:.4}, beta={:.4}, gamma={:.4}",
        alpha, beta, gamma
    );

    let forecast: Vec<f64> = (1..=horizon)
        .map(|h| level + h as f64 * trend + seasonals[(n + h - 1) % SEASONAL_PERIOD])
        .collect();
    if forecast.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::NotConverged(
            "smoothing produced a non-finite forecast".into(),
        )
        .into());
    }

    Ok(ForecastResult {
        dates: series.future_dates(horizon),
        forecast,
        lower: None,
        upper: None,
        model: FittedModel::ExponentialSmoothing(ExpoFit {
            alpha,
            beta,
            gamma,
            level,
            trend,
            seasonals,
        }),
    })
}

/// Initial state from the first cycle: level is the first-season mean, trend
/// averages the season-over-season slope, seasonals are deviations from the
/// level normalized to sum to zero.
fn initialize_state(values: &[f64]) -> (f64, f64, Vec<f64>) {
    let period = SEASONAL_PERIOD;
    let level = values[..period].iter().sum::<f64>() / period as f64;

    let trend = (0..period)
        .map(|i| (values[period + i] - values[i]) / period as f64)
        .sum::<f64>()
        / period as f64;

    let mut seasonals: Vec<f64> = values[..period].iter().map(|y| y - level).collect();
    let adjustment = seasonals.iter().sum::<f64>() / period as f64;
    for s in seasonals.iter_mut() {
        *s -= adjustment;
    }

    (level, trend, seasonals)
}

/// One full smoothing pass. Returns the final state and the sum of squared
/// one-step-ahead errors over the post-initialization stretch.
fn smoothing_pass(values: &[f64], alpha: f64, beta: f64, gamma: f64) -> (f64, f64, Vec<f64>, f64) {
    let period = SEASONAL_PERIOD;
    let (mut level, mut trend, mut seasonals) = initialize_state(values);

    let mut sse = 0.0;
    for (t, &y) in values.iter().enumerate().skip(period) {
        let season_idx = t % period;
        let s = seasonals[season_idx];

        let one_step = level + trend + s;
        let error = y - one_step;
        sse += error * error;

        let level_prev = level;
        level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
        trend = beta * (level - level_prev) + (1.0 - beta) * trend;
        seasonals[season_idx] = gamma * (y - level) + (1.0 - gamma) * s;
    }

    (level, trend, seasonals, sse)
}

fn optimize_params(values: &[f64]) -> Result<(f64, f64, f64), PipelineError> {
    let objective = |p: &[f64; 3]| {
        let sse = smoothing_pass(values, p[0], p[1], p[2]).3;
        if sse.is_finite() {
            sse
        } else {
            f64::MAX
        }
    };

    let optimum = nelder_mead(objective, [0.3, 0.1, 0.1], 1000, 1e-8);
    let (alpha, beta, gamma) = (
        optimum[0].clamp(PARAM_MIN, PARAM_MAX),
        optimum[1].clamp(PARAM_MIN, PARAM_MAX),
        optimum[2].clamp(PARAM_MIN, PARAM_MAX),
    );

    if !smoothing_pass(values, alpha, beta, gamma).3.is_finite() {
        return Err(ModelFitError::NotConverged(
            "smoothing parameter search did not converge".into(),
        )
        .into());
    }

    Ok((alpha, beta, gamma))
}

fn clamp_point(p: [f64; 3]) -> [f64; 3] {
    [
        p[0].clamp(PARAM_MIN, PARAM_MAX),
        p[1].clamp(PARAM_MIN, PARAM_MAX),
        p[2].clamp(PARAM_MIN, PARAM_MAX),
    ]
}

/// centroid + t * (centroid - worst), clamped into the parameter box.
fn step_from(centroid: &[f64; 3], worst: &[f64; 3], t: f64) -> [f64; 3] {
    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = centroid[i] + t * (centroid[i] - worst[i]);
    }
    clamp_point(out)
}

/// Bounded Nelder-Mead over the unit cube of smoothing parameters. Standard
/// reflection/expansion/contraction/shrink coefficients; fixed initial
/// simplex, so the search is fully deterministic.
fn nelder_mead<F>(f: F, start: [f64; 3], max_iter: usize, tolerance: f64) -> [f64; 3]
where
    F: Fn(&[f64; 3]) -> f64,
{
    let p0 = clamp_point(start);
    let mut simplex: Vec<([f64; 3], f64)> = vec![(p0, f(&p0))];
    for i in 0..3 {
        let mut p = p0;
        p[i] = (p[i] + 0.15).clamp(PARAM_MIN, PARAM_MAX);
        simplex.push((p, f(&p)));
    }

    for _ in 0..max_iter {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        if (simplex[3].1 - simplex[0].1).abs() < tolerance {
            break;
        }

        let mut centroid = [0.0; 3];
        for (p, _) in &simplex[..3] {
            for i in 0..3 {
                centroid[i] += p[i] / 3.0;
            }
        }
        let worst = simplex[3];

        let reflected = step_from(&centroid, &worst.0, 1.0);
        let f_reflected = f(&reflected);

        if f_reflected < simplex[0].1 {
            let expanded = step_from(&centroid, &worst.0, 2.0);
            let f_expanded = f(&expanded);
            simplex[3] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
        } else if f_reflected < simplex[2].1 {
            simplex[3] = (reflected, f_reflected);
        } else {
            let contracted = step_from(&centroid, &worst.0, -0.5);
            let f_contracted = f(&contracted);
            if f_contracted < worst.1 {
                simplex[3] = (contracted, f_contracted);
            } else {
                let best = simplex[0].0;
                for entry in simplex.iter_mut().skip(1) {
                    let mut p = [0.0; 3];
                    for i in 0..3 {
                        p[i] = best[i] + 0.5 * (entry.0[i] - best[i]);
                    }
                    let p = clamp_point(p);
                    *entry = (p, f(&p));
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    simplex[0].0
}
