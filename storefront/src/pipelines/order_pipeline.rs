// ufo_storefront/src/pipelines/order_pipeline.rs

//! Order creation.
//!
//! Steps, in order:
//!  1. `validate_request`  (Required)   reject bad input before any side effect
//!  2. `apply_promo_code`  (BestEffort) quote the discount; 0 on failure
//!  3. `price_order`       (Required)   server-side total
//!  4. `persist_order`     (Required)   allocate a number and insert, retrying on collision;
//!                                      the promo use is redeemed by the insert itself
//!  5. `book_shipment`     (BestEffort) carrier failure is recorded on the order
//!  6. `send_confirmation` (BestEffort)
//!
//! Once `persist_order` succeeds the order is returned as created, whatever
//! happens in the remaining steps.

use crate::db::StoreError;
use crate::errors::AppError;
use crate::models::{CheckoutRequest, NewOrder, ShipmentState, ShippingMethod};
use crate::pipelines::contexts::OrderCtxData;
use crate::services::notifier::NotificationTemplate;
use crate::services::order_number::{AllocationError, OrderNumberAllocator};
use crate::services::packeta::PacketAttributes;
use crate::services::promo::PromoCodeEngine;
use crate::services::token_service::{generate_security_token, hash_security_token};
use crate::state::AppState;
use checkout_saga::{Saga, SagaContext, SkipCondition, StepControl, StepPolicy};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// What the customer gets back from a successful checkout.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
  pub order_id: Uuid,
  pub order_number: String,
  /// Shown once; only its hash is stored.
  pub security_token: String,
  pub shipment: ShipmentState,
  /// Best-effort steps that failed while creating this order.
  pub degraded_steps: Vec<String>,
}

pub struct OrderOrchestrator {
  saga: Saga<OrderCtxData, AppError>,
}

impl Default for OrderOrchestrator {
  fn default() -> Self {
    Self::new()
  }
}

impl OrderOrchestrator {
  pub fn new() -> Self {
    Self { saga: build_saga() }
  }

  #[instrument(name = "orders::create", skip(self, state, request), fields(correlation_id = %correlation_id))]
  pub async fn create_order(
    &self,
    state: &AppState,
    request: CheckoutRequest,
    correlation_id: &str,
  ) -> Result<CreatedOrder, AppError> {
    let ctx = SagaContext::with_correlation_id(OrderCtxData::new(state.clone(), request), correlation_id);
    let report = self.saga.run(ctx.clone()).await?;

    let guard = ctx.read();
    match (&guard.order, &guard.security_token) {
      (Some(order), Some(token)) => {
        let degraded_steps: Vec<String> = report.degraded.iter().map(|d| d.step.clone()).collect();
        info!(
          order_number = %order.order_number,
          shipment = guard.shipment.label(),
          confirmation_sent = guard.confirmation_sent,
          degraded = ?degraded_steps,
          "Order created."
        );
        Ok(CreatedOrder {
          order_id: order.id,
          order_number: order.order_number.clone(),
          security_token: token.clone(),
          shipment: guard.shipment.clone(),
          degraded_steps,
        })
      }
      _ => Err(AppError::Internal(format!(
        "order saga ended ({:?}) without a persisted order",
        report.outcome
      ))),
    }
  }
}

fn shipping_price(state: &AppState, method: ShippingMethod) -> Decimal {
  match method {
    ShippingMethod::PickupPoint => state.config.shop.pickup_point_price,
    ShippingMethod::PersonalPickup => state.config.shop.personal_pickup_price,
  }
}

fn order_total(subtotal: Decimal, shipping: Decimal, discount: Decimal) -> Decimal {
  (subtotal + shipping - discount).max(Decimal::ZERO)
}

fn missing(what: &str) -> AppError {
  AppError::Internal(format!("{} not set before this step", what))
}

fn build_saga() -> Saga<OrderCtxData, AppError> {
  let no_promo_code: SkipCondition<OrderCtxData> = Arc::new(|ctx: &SagaContext<OrderCtxData>| {
    ctx
      .read()
      .input
      .as_ref()
      .map_or(true, |input| input.promo_code.is_none())
  });
  let no_carrier_booking: SkipCondition<OrderCtxData> = Arc::new(|ctx: &SagaContext<OrderCtxData>| {
    ctx
      .read()
      .input
      .as_ref()
      .map_or(true, |input| !input.shipping_method.requires_carrier_booking())
  });

  let mut saga = Saga::<OrderCtxData, AppError>::new(&[
    ("validate_request", StepPolicy::Required, None),
    ("apply_promo_code", StepPolicy::BestEffort, Some(no_promo_code)),
    ("price_order", StepPolicy::Required, None),
    ("persist_order", StepPolicy::Required, None),
    ("book_shipment", StepPolicy::BestEffort, Some(no_carrier_booking)),
    ("send_confirmation", StepPolicy::BestEffort, None),
  ]);

  saga.on_step("validate_request", |ctx: SagaContext<OrderCtxData>| async move {
    let input = ctx.read().request.validate()?;
    let mut guard = ctx.write();
    guard.subtotal = input.subtotal();
    guard.shipment = ShipmentState::initial_for(input.shipping_method);
    guard.input = Some(input);
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("apply_promo_code", |ctx: SagaContext<OrderCtxData>| async move {
    let (state, code, subtotal) = {
      let guard = ctx.read();
      (
        guard.app_state.clone(),
        guard.input.as_ref().and_then(|i| i.promo_code.clone()),
        guard.subtotal,
      )
    };
    let Some(code) = code else {
      return Ok::<_, AppError>(StepControl::Continue);
    };

    let engine = PromoCodeEngine::new(state.promo_codes.clone(), state.clock.clone());
    if let Some(applied) = engine.quote(&code, subtotal).await.map_err(AppError::from)? {
      let mut guard = ctx.write();
      guard.discount = applied.discount;
      guard.applied_promo_code = Some(applied.code);
    }
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("price_order", |ctx: SagaContext<OrderCtxData>| async move {
    let mut guard = ctx.write();
    let (method, client_total) = {
      let input = guard.input.as_ref().ok_or_else(|| missing("validated input"))?;
      (input.shipping_method, input.client_total)
    };
    let shipping = shipping_price(&guard.app_state, method);
    let total = order_total(guard.subtotal, shipping, guard.discount);
    if total != client_total {
      warn!(
        correlation_id = %ctx.correlation_id(),
        %client_total,
        server_total = %total,
        "Client total differs from the computed total; persisting the computed total."
      );
    }
    guard.shipping_price = shipping;
    guard.total = total;
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("persist_order", |ctx: SagaContext<OrderCtxData>| async move {
    let (state, input, subtotal, shipping_price) = {
      let guard = ctx.read();
      (
        guard.app_state.clone(),
        guard.input.clone().ok_or_else(|| missing("validated input"))?,
        guard.subtotal,
        guard.shipping_price,
      )
    };
    let (mut discount, mut promo_code, mut total, shipment) = {
      let guard = ctx.read();
      (guard.discount, guard.applied_promo_code.clone(), guard.total, guard.shipment.clone())
    };

    let token = generate_security_token();
    let token_hash = hash_security_token(&token)?;
    let allocator = OrderNumberAllocator::new(
      state.orders.clone(),
      state.clock.clone(),
      state.config.shop.order_number_prefix.clone(),
    );
    let attempts = state.config.shop.order_insert_attempts.max(1);
    let mut collisions = 0;

    loop {
      let order_number = allocator.allocate().await.map_err(|e| match e {
        AllocationError::Store { .. } => AppError::TransientInfrastructure(e.to_string()),
        other => AppError::Internal(other.to_string()),
      })?;
      let order = NewOrder {
        id: Uuid::new_v4(),
        order_number,
        customer: input.customer.clone(),
        items: input.items.clone(),
        total_price: total,
        discount_amount: discount,
        promo_code: promo_code.clone(),
        shipping_method: input.shipping_method,
        shipping_price,
        pickup_point: input.pickup_point.clone(),
        shipment: shipment.clone(),
        security_token_hash: token_hash.clone(),
        created_at: state.clock.now(),
      };

      match state.orders.insert_order(&order).await {
        Ok(()) => {
          info!(
            correlation_id = %ctx.correlation_id(),
            order_number = %order.order_number,
            order_id = %order.id,
            total = %order.total_price,
            promo_code = ?order.promo_code,
            "Order persisted."
          );
          let mut guard = ctx.write();
          guard.discount = discount;
          guard.applied_promo_code = promo_code;
          guard.total = total;
          guard.order = Some(order);
          guard.security_token = Some(token);
          return Ok::<_, AppError>(StepControl::Continue);
        }
        Err(StoreError::DuplicateKey { constraint }) => {
          collisions += 1;
          warn!(
            correlation_id = %ctx.correlation_id(),
            order_number = %order.order_number,
            attempt = collisions,
            %constraint,
            "Order number already taken, allocating again."
          );
          if collisions >= attempts {
            return Err(AppError::TransientInfrastructure(format!(
              "order number still taken after {} attempts",
              attempts
            )));
          }
        }
        // The last use went to a concurrent checkout after the quote; this
        // order goes through at full price.
        Err(StoreError::PromoCodeUnavailable { code }) => {
          warn!(
            correlation_id = %ctx.correlation_id(),
            %code,
            "Promo code ran out before the order was stored; persisting without discount."
          );
          discount = Decimal::ZERO;
          promo_code = None;
          total = order_total(subtotal, shipping_price, discount);
        }
        Err(other) => return Err(AppError::from(other)),
      }
    }
  });

  saga.on_step("book_shipment", |ctx: SagaContext<OrderCtxData>| async move {
    let (state, order) = {
      let guard = ctx.read();
      (guard.app_state.clone(), guard.order.clone().ok_or_else(|| missing("order"))?)
    };
    let currency = state.config.shop.currency.clone();

    let shipment = match PacketAttributes::for_order(&order, &state.config.packeta, &currency) {
      Some(attributes) => match state.carrier.create_packet(&attributes).await {
        Ok(booking) => {
          info!(
            correlation_id = %ctx.correlation_id(),
            order_number = %order.order_number,
            packet_id = %booking.id,
            "Shipment booked."
          );
          ShipmentState::Booked {
            packet_id: booking.id,
            barcode: booking.barcode,
          }
        }
        Err(e) => {
          warn!(
            correlation_id = %ctx.correlation_id(),
            order_number = %order.order_number,
            kind = %e.kind,
            technical = %e.technical_message,
            "Shipment booking failed; the order stands."
          );
          ShipmentState::Failed {
            reason: e.user_message().to_string(),
          }
        }
      },
      None => ShipmentState::Failed {
        reason: "No pickup point was selected for this order.".to_string(),
      },
    };
    ctx.write().shipment = shipment;
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.after_step("book_shipment", |ctx: SagaContext<OrderCtxData>| async move {
    let (state, order_id, shipment) = {
      let guard = ctx.read();
      let order_id = guard.order.as_ref().map(|o| o.id).ok_or_else(|| missing("order"))?;
      (guard.app_state.clone(), order_id, guard.shipment.clone())
    };
    state.orders.record_shipment(order_id, &shipment).await?;
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("send_confirmation", |ctx: SagaContext<OrderCtxData>| async move {
    let (state, recipient, data) = {
      let guard = ctx.read();
      let order = guard.order.as_ref().ok_or_else(|| missing("order"))?;
      let token = guard.security_token.as_deref().unwrap_or_default();
      let status_url = format!(
        "{}/orders/{}?token={}",
        guard.app_state.config.app_base_url, order.order_number, token
      );
      let data = json!({
        "orderNumber": order.order_number,
        "customerName": order.customer.name,
        "items": order.items,
        "discount": order.discount_amount,
        "promoCode": order.promo_code,
        "shippingMethod": order.shipping_method.as_str(),
        "shippingPrice": order.shipping_price,
        "pickupPoint": order.pickup_point,
        "totalPrice": order.total_price,
        "currency": guard.app_state.config.shop.currency,
        "trackingNumber": guard.shipment.tracking_number(),
        "statusUrl": status_url,
      });
      (guard.app_state.clone(), order.customer.email.clone(), data)
    };

    state
      .notifier
      .send(NotificationTemplate::OrderConfirmation, &recipient, data)
      .await
      .map_err(|e| AppError::ExternalService {
        service: "Email",
        technical: e.to_string(),
        user_message: "The order confirmation email could not be sent.".to_string(),
      })?;
    ctx.write().confirmation_sent = true;
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga
}
