// ufo_storefront/src/errors.rs

use crate::db::StoreError;
use crate::services::gopay::GatewayError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use checkout_saga::SagaError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Configuration(String),

  #[error("Transient Infrastructure Error: {0}")]
  TransientInfrastructure(String),

  #[error("{service} Error: {technical}")]
  ExternalService {
    service: &'static str,
    technical: String,
    user_message: String,
  },

  #[error("Payment Gateway Error: {0}")]
  Gateway(#[from] GatewayError),

  #[error("Duplicate Key: {0}")]
  DuplicateKey(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),

  #[error("Saga Workflow Error: {source}")]
  Workflow {
    #[from]
    source: SagaError,
  },
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<StoreError>() {
      Ok(store_err) => AppError::from(store_err),
      Err(other) => AppError::TransientInfrastructure(format!("{:#}", other)),
    }
  }
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::DuplicateKey { constraint } => AppError::DuplicateKey(constraint),
      StoreError::NotFound(what) => AppError::NotFound(what),
      other => AppError::TransientInfrastructure(other.to_string()),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
  error: &'a str,
  error_id: &'a str,
}

impl AppError {
  /// Message that is safe to show to the customer. Technical detail stays in the logs.
  pub fn user_message(&self) -> &str {
    match self {
      AppError::Validation(m) => m,
      AppError::Configuration(_) => "The shop is temporarily unable to process this request.",
      AppError::TransientInfrastructure(_) | AppError::DuplicateKey(_) => {
        "A temporary problem occurred. Please try again."
      }
      AppError::ExternalService { user_message, .. } => user_message,
      AppError::Gateway(err) => err.user_message(),
      AppError::NotFound(_) => "The requested resource was not found.",
      AppError::Unauthorized(_) => "You are not allowed to access this resource.",
      AppError::Internal(_) | AppError::Workflow { .. } => "An internal error occurred.",
    }
  }

  /// Gateway failures keep the id they were raised with; everything else gets a fresh one.
  fn error_id(&self) -> String {
    match self {
      AppError::Gateway(err) => err.error_id.clone(),
      _ => Uuid::new_v4().to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let error_id = self.error_id();
    match self {
      AppError::Validation(_) | AppError::NotFound(_) | AppError::Unauthorized(_) => {
        tracing::warn!(error_id = %error_id, application_error = %self, "Rejecting request");
      }
      AppError::Workflow { source } => {
        tracing::error!(error_id = %error_id, saga_error = ?source, "Responding with workflow error");
      }
      _ => {
        tracing::error!(error_id = %error_id, application_error = %self, "Responding with error");
      }
    }
    HttpResponse::build(self.status_code()).json(ErrorBody {
      error: self.user_message(),
      error_id: &error_id,
    })
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
