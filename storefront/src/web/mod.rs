// ufo_storefront/src/web/mod.rs

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::configure_app_routes;

use crate::errors::AppError;
use actix_web::web;

/// JSON extractor settings: body errors are reported as validation errors in
/// the usual `{error, errorId}` envelope.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .limit(256 * 1024)
    .error_handler(|err, _req| AppError::Validation(format!("Invalid request body: {}", err)).into())
}
