// src/error.rs
use std::fmt;

/// Failure during model fitting, distinguishing "not enough history" from
/// numerical trouble in the estimation itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelFitError {
    SeriesTooShort { needed: usize, got: usize },
    NotConverged(String),
}

impl fmt::Display for ModelFitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelFitError::SeriesTooShort { needed, got } => write!(
                f,
                "series too short to fit the model: need at least {} observations, got {}",
                needed, got
            ),
            ModelFitError::NotConverged(msg) => {
                write!(f, "model estimation did not converge: {}", msg)
            }
        }
    }
}

impl std::error::Error for ModelFitError {}

/// Errors surfaced by the forecasting pipeline. Any of these is terminal for
/// the current request; there is no retry logic.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Raw data unreachable, empty, or missing required columns.
    DataSource(String),
    /// A record or request parameter could not be parsed or validated.
    DataFormat(String),
    /// Model fitting failed.
    ModelFit(ModelFitError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::DataSource(msg) => write!(f, "data source error: {}", msg),
            PipelineError::DataFormat(msg) => write!(f, "data format error: {}", msg),
            PipelineError::ModelFit(err) => write!(f, "model fit error: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::ModelFit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelFitError> for PipelineError {
    fn from(err: ModelFitError) -> Self {
        PipelineError::ModelFit(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_counts() {
        let err = PipelineError::from(ModelFitError::SeriesTooShort { needed: 28, got: 10 });
        let msg = err.to_string();
        assert!(msg.contains("28"), "message: {}", msg);
        assert!(msg.contains("10"), "message: {}", msg);
    }

    #[test]
    fn model_fit_source_is_preserved() {
        use std::error::Error;
        let err = PipelineError::from(ModelFitError::NotConverged("singular".into()));
        assert!(err.source().is_some());
    }
}
