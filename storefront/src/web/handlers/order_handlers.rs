// ufo_storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{info, instrument, warn};

use super::correlation_id;
use crate::errors::AppError;
use crate::models::CheckoutRequest;
use crate::pipelines::Sagas;
use crate::services::token_service::verify_security_token;
use crate::state::AppState;
use crate::web::dto::{CreatedOrderResponse, OrderStatusResponse, TokenQuery};

#[instrument(name = "handler::create_order", skip_all)]
pub async fn create_order_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  sagas: web::Data<Sagas>,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let correlation_id = correlation_id(&req);
  info!(%correlation_id, items = payload.items.len(), "Order creation requested.");

  let created = sagas
    .orders
    .create_order(app_state.get_ref(), payload.into_inner(), &correlation_id)
    .await?;

  if !created.degraded_steps.is_empty() {
    warn!(
      %correlation_id,
      order_number = %created.order_number,
      degraded = ?created.degraded_steps,
      "Order created with follow-up steps missing."
    );
  }
  Ok(HttpResponse::Created().json(CreatedOrderResponse::from(created)))
}

/// Unauthenticated lookup. A wrong token and an unknown order number give the
/// same 404, so the endpoint does not reveal which order numbers exist.
#[instrument(name = "handler::order_status", skip(app_state, query))]
pub async fn order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  query: web::Query<TokenQuery>,
) -> Result<HttpResponse, AppError> {
  let order_number = path.into_inner();
  let not_found = || AppError::NotFound(format!("order {}", order_number));

  let token = query
    .token
    .as_deref()
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Unauthorized("security token missing".to_string()))?;

  let order = app_state
    .orders
    .find_by_number(&order_number)
    .await?
    .ok_or_else(not_found)?;
  if !verify_security_token(&order.security_token_hash, token)? {
    warn!(%order_number, "Order status requested with a wrong security token.");
    return Err(not_found());
  }
  Ok(HttpResponse::Ok().json(OrderStatusResponse::from(&order)))
}
