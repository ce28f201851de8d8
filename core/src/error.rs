// checkout_saga/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SagaError {
  #[error("Handler missing for required step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Error in saga handler or external operation. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for SagaError {
  fn from(err: AnyhowError) -> Self {
    SagaError::Handler { source: err }
  }
}

pub type SagaResult<T, E = SagaError> = std::result::Result<T, E>;
