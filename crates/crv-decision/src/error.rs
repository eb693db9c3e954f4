use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("stochastic decisions need temperature > 0, got {0}")]
    InvalidTemperature(f64),

    #[error("candidate {index} has non-finite score {score}")]
    NonFiniteScore { index: usize, score: f64 },
}

pub type DecisionResult<T> = Result<T, DecisionError>;
