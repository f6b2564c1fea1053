//! Error Types for FUD Analysis

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Upstream {source_name} returned HTTP {status}")]
    Upstream { source_name: String, status: u16 },

    #[error("Coin not supported: {0}")]
    UnsupportedCoin(String),

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Whether a retry with backoff has any chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Network(_) => true,
            AnalysisError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AnalysisError::Upstream {
            source_name: "newsapi".into(),
            status: 503
        }
        .is_retryable());
        assert!(AnalysisError::Upstream {
            source_name: "newsapi".into(),
            status: 429
        }
        .is_retryable());
        assert!(!AnalysisError::Upstream {
            source_name: "newsapi".into(),
            status: 401
        }
        .is_retryable());
        assert!(!AnalysisError::UnsupportedCoin("WAT".into()).is_retryable());
    }
}
