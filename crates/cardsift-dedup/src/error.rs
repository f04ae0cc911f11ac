use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("threshold must be a number within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("invalid scan options: {0}")]
    InvalidOptions(String),

    #[error("similarity of {left} and {right} is out of range: {score}")]
    InvalidScore {
        left: String,
        right: String,
        score: f64,
    },

    #[error("failed to compare {left} and {right}: {message}")]
    Metric {
        left: String,
        right: String,
        message: String,
    },
}

/// Failure reported by a [`SimilarityMetric`](crate::SimilarityMetric) for one pair.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct MetricError(pub String);

pub type Result<T> = std::result::Result<T, DedupError>;
