// ufo_storefront/src/db/memory.rs

//! In-process store used when no `DATABASE_URL` is configured and in tests.

use super::{OrderStore, PromoCodeStore, StoreError};
use crate::models::{NewOrder, Order, OrderStatus, PaymentLink, PaymentStatus, PromoCode, ShipmentState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
  orders: Mutex<Vec<Order>>,
  promo_codes: Mutex<HashMap<String, PromoCode>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn orders(&self) -> Vec<Order> {
    self.orders.lock().clone()
  }

  pub fn promo_code(&self, code: &str) -> Option<PromoCode> {
    self.promo_codes.lock().get(code).cloned()
  }

  fn update_order<R>(&self, order_id: Uuid, f: impl FnOnce(&mut Order) -> R) -> Result<R, StoreError> {
    let mut orders = self.orders.lock();
    let order = orders
      .iter_mut()
      .find(|o| o.id == order_id)
      .ok_or_else(|| StoreError::NotFound(format!("order {}", order_id)))?;
    let result = f(order);
    order.updated_at = Utc::now();
    Ok(result)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn count_orders_with_prefix(
    &self,
    prefix: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  ) -> Result<u64, StoreError> {
    let orders = self.orders.lock();
    let count = orders
      .iter()
      .filter(|o| o.order_number.starts_with(prefix) && o.created_at >= from && o.created_at < until)
      .count();
    Ok(count as u64)
  }

  async fn insert_order(&self, order: &NewOrder) -> Result<(), StoreError> {
    let mut orders = self.orders.lock();
    if orders.iter().any(|o| o.order_number == order.order_number) {
      return Err(StoreError::DuplicateKey {
        constraint: "orders_order_number_key".to_string(),
      });
    }
    if let Some(code) = &order.promo_code {
      let mut codes = self.promo_codes.lock();
      match codes.get_mut(code) {
        Some(promo) if !promo.max_uses.is_some_and(|max| promo.current_uses >= max) => {
          promo.current_uses += 1;
        }
        _ => return Err(StoreError::PromoCodeUnavailable { code: code.clone() }),
      }
    }
    orders.push(Order::from(order.clone()));
    Ok(())
  }

  async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
    Ok(self.orders.lock().iter().find(|o| o.order_number == order_number).cloned())
  }

  async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, StoreError> {
    let orders = self.orders.lock();
    Ok(orders.iter().find(|o| o.payment.payment_id() == Some(payment_id)).cloned())
  }

  async fn record_shipment(&self, order_id: Uuid, shipment: &ShipmentState) -> Result<(), StoreError> {
    self.update_order(order_id, |order| order.shipment = shipment.clone())
  }

  async fn attach_payment_id(&self, order_number: &str, payment_id: &str) -> Result<(), StoreError> {
    let mut orders = self.orders.lock();
    let order = orders
      .iter_mut()
      .find(|o| o.order_number == order_number)
      .ok_or_else(|| StoreError::NotFound(format!("order {}", order_number)))?;
    order.payment = PaymentLink::Created {
      payment_id: payment_id.to_string(),
    };
    order.updated_at = Utc::now();
    Ok(())
  }

  async fn set_payment_status(&self, order_id: Uuid, status: PaymentStatus) -> Result<bool, StoreError> {
    self.update_order(order_id, |order| {
      let changed = order.payment_status != status;
      order.payment_status = status;
      changed
    })
  }

  async fn transition_status(&self, order_id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool, StoreError> {
    if !from.can_transition_to(to) {
      return Err(StoreError::IllegalTransition { from, to });
    }
    self.update_order(order_id, |order| {
      if order.status == from {
        order.status = to;
        true
      } else {
        false
      }
    })
  }
}

#[async_trait]
impl PromoCodeStore for MemoryStore {
  async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError> {
    Ok(self.promo_code(code))
  }

  async fn consume_use(&self, promo_id: Uuid) -> Result<bool, StoreError> {
    let mut codes = self.promo_codes.lock();
    let promo = codes
      .values_mut()
      .find(|p| p.id == promo_id)
      .ok_or_else(|| StoreError::NotFound(format!("promo code {}", promo_id)))?;
    if promo.max_uses.is_some_and(|max| promo.current_uses >= max) {
      return Ok(false);
    }
    promo.current_uses += 1;
    Ok(true)
  }

  async fn upsert_promo_code(&self, promo: &PromoCode) -> Result<(), StoreError> {
    let mut stored = promo.clone();
    stored.code = PromoCode::normalize_code(&promo.code);
    let mut codes = self.promo_codes.lock();
    if let Some(existing) = codes.get(&stored.code) {
      stored.id = existing.id;
      stored.current_uses = existing.current_uses;
    }
    codes.insert(stored.code.clone(), stored);
    Ok(())
  }
}
