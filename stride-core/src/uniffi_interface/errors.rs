use thiserror::Error as ThisError;
use uniffi::Error;

use crate::generator::PlanGenerationError;

#[derive(Debug, ThisError, Error)]
#[non_exhaustive]
pub enum StrideError {
    #[error("error: {0}")]
    Common(String),
    #[error("plan generation failed: {0}")]
    Generation(String),
    #[error("plan request was superseded")]
    Superseded,
}

impl From<anyhow::Error> for StrideError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast_ref::<PlanGenerationError>() {
            Some(PlanGenerationError::Superseded) => StrideError::Superseded,
            Some(other) => StrideError::Generation(other.to_string()),
            None => StrideError::Common(format!("{:#}", e)),
        }
    }
}
