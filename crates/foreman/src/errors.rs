use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Unknown step kind: {0}")]
    UnknownStep(String),

    #[error("Reached the limit of {0} steps without a final output")]
    MaxStepsExceeded(usize),
}

pub type AgentResult<T> = Result<T, AgentError>;
