// ufo_storefront/src/web/handlers/mod.rs

pub mod order_handlers;
pub mod payment_handlers;

use actix_web::{HttpMessage, HttpRequest};
use tracing_actix_web::RequestId;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id for the saga run: the caller's `X-Request-Id` if sent,
/// otherwise the id `TracingLogger` assigned to the request.
pub(crate) fn correlation_id(req: &HttpRequest) -> String {
  if let Some(id) = req
    .headers()
    .get(REQUEST_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
  {
    return id.to_string();
  }
  req
    .extensions()
    .get::<RequestId>()
    .map(|id| id.to_string())
    .unwrap_or_else(|| Uuid::new_v4().to_string())
}
