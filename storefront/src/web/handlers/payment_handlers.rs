// ufo_storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use super::correlation_id;
use crate::errors::AppError;
use crate::models::PaymentInitiationRequest;
use crate::pipelines::Sagas;
use crate::state::AppState;
use crate::web::dto::{NotificationQuery, PaymentInitiatedResponse};

#[instrument(name = "handler::initiate_payment", skip_all)]
pub async fn initiate_payment_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  sagas: web::Data<Sagas>,
  payload: web::Json<PaymentInitiationRequest>,
) -> Result<HttpResponse, AppError> {
  let correlation_id = correlation_id(&req);
  let payment = sagas
    .payments
    .initiate(app_state.get_ref(), payload.into_inner(), &correlation_id)
    .await?;
  info!(
    %correlation_id,
    payment_id = %payment.payment_id,
    linked_to_order = payment.linked_to_order,
    "Payment initiated."
  );
  Ok(HttpResponse::Ok().json(PaymentInitiatedResponse::from(payment)))
}

/// Gateway callback. Any non-2xx makes the gateway retry later, so only
/// failures worth retrying surface as errors.
#[instrument(name = "handler::payment_notification", skip_all)]
pub async fn payment_notification_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  sagas: web::Data<Sagas>,
  query: web::Query<NotificationQuery>,
) -> Result<HttpResponse, AppError> {
  let correlation_id = correlation_id(&req);
  let payment_id = query.id.clone().unwrap_or_default();
  let outcome = sagas
    .notifications
    .handle(app_state.get_ref(), &payment_id, &correlation_id)
    .await?;
  info!(
    %correlation_id,
    %payment_id,
    order_number = ?outcome.order_number,
    applied_status = ?outcome.applied_status,
    "Payment notification processed."
  );
  Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}
