// ufo_storefront/src/db/postgres.rs

use super::{OrderStore, PromoCodeStore, StoreError};
use crate::models::{
  CustomerContact, LineItem, NewOrder, Order, OrderStatus, PaymentLink, PaymentStatus, PickupPoint, PromoCode,
  ShipmentState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, items, \
  total_price, discount_amount, promo_code, shipping_method, shipping_price, pickup_point_id, \
  pickup_point_name, status, payment_status, payment_id, shipment_state, packet_id, tracking_number, \
  carrier_error, security_token_hash, created_at, updated_at";

const PROMO_COLUMNS: &str = "id, code, discount_type, discount_value, min_order_amount, max_uses, \
  current_uses, valid_from, valid_until, is_active";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await
      .map_err(StoreError::Backend)?;
    Ok(Self { pool })
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

impl From<sqlx::Error> for StoreError {
  fn from(err: sqlx::Error) -> Self {
    if let sqlx::Error::Database(db_err) = &err {
      if db_err.is_unique_violation() {
        return StoreError::DuplicateKey {
          constraint: db_err.constraint().unwrap_or("unknown").to_string(),
        };
      }
    }
    StoreError::Backend(err)
  }
}

fn parse_column<T: std::str::FromStr<Err = String>>(row: &PgRow, column: &str) -> Result<T, StoreError> {
  let raw: String = row.try_get(column)?;
  raw.parse::<T>().map_err(StoreError::Corrupt)
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
  let Json(items): Json<Vec<LineItem>> = row.try_get("items")?;
  let pickup_point = match (
    row.try_get::<Option<String>, _>("pickup_point_id")?,
    row.try_get::<Option<String>, _>("pickup_point_name")?,
  ) {
    (Some(id), name) => Some(PickupPoint {
      name: name.unwrap_or_else(|| id.clone()),
      id,
    }),
    (None, _) => None,
  };
  let shipment_label: String = row.try_get("shipment_state")?;
  let shipment = ShipmentState::from_columns(
    &shipment_label,
    row.try_get("packet_id")?,
    row.try_get("tracking_number")?,
    row.try_get("carrier_error")?,
  )
  .map_err(StoreError::Corrupt)?;

  Ok(Order {
    id: row.try_get("id")?,
    order_number: row.try_get("order_number")?,
    customer: CustomerContact {
      name: row.try_get("customer_name")?,
      email: row.try_get("customer_email")?,
      phone: row.try_get("customer_phone")?,
    },
    items,
    total_price: row.try_get("total_price")?,
    discount_amount: row.try_get("discount_amount")?,
    promo_code: row.try_get("promo_code")?,
    shipping_method: parse_column(row, "shipping_method")?,
    shipping_price: row.try_get("shipping_price")?,
    pickup_point,
    status: parse_column(row, "status")?,
    payment_status: parse_column(row, "payment_status")?,
    payment: PaymentLink::from_column(row.try_get("payment_id")?),
    shipment,
    security_token_hash: row.try_get("security_token_hash")?,
    created_at: row.try_get("created_at")?,
    updated_at: row.try_get("updated_at")?,
  })
}

fn promo_from_row(row: &PgRow) -> Result<PromoCode, StoreError> {
  Ok(PromoCode {
    id: row.try_get("id")?,
    code: row.try_get("code")?,
    discount_type: parse_column(row, "discount_type")?,
    discount_value: row.try_get("discount_value")?,
    min_order_amount: row.try_get("min_order_amount")?,
    max_uses: row.try_get("max_uses")?,
    current_uses: row.try_get("current_uses")?,
    valid_from: row.try_get("valid_from")?,
    valid_until: row.try_get("valid_until")?,
    is_active: row.try_get("is_active")?,
  })
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "pg::count_orders_with_prefix", skip(self))]
  async fn count_orders_with_prefix(
    &self,
    prefix: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  ) -> Result<u64, StoreError> {
    let pattern = format!("{}%", prefix);
    let count: i64 = sqlx::query_scalar(
      "SELECT COUNT(*) FROM orders WHERE order_number LIKE $1 AND created_at >= $2 AND created_at < $3",
    )
    .bind(pattern)
    .bind(from)
    .bind(until)
    .fetch_one(&self.pool)
    .await?;
    Ok(count.max(0) as u64)
  }

  #[instrument(name = "pg::insert_order", skip(self, order), fields(order_number = %order.order_number))]
  async fn insert_order(&self, order: &NewOrder) -> Result<(), StoreError> {
    let (shipment_state, packet_id, tracking_number, carrier_error) = order.shipment.to_columns();
    let mut tx = self.pool.begin().await?;

    if let Some(code) = &order.promo_code {
      let redeemed = sqlx::query(
        "UPDATE promo_codes SET current_uses = current_uses + 1 \
         WHERE code = $1 AND (max_uses IS NULL OR current_uses < max_uses)",
      )
      .bind(code)
      .execute(&mut *tx)
      .await?;
      if redeemed.rows_affected() != 1 {
        return Err(StoreError::PromoCodeUnavailable { code: code.clone() });
      }
    }

    sqlx::query(
      "INSERT INTO orders (id, order_number, customer_name, customer_email, customer_phone, items, \
       total_price, discount_amount, promo_code, shipping_method, shipping_price, pickup_point_id, \
       pickup_point_name, status, payment_status, shipment_state, packet_id, tracking_number, \
       carrier_error, security_token_hash, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $21)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(&order.customer.name)
    .bind(&order.customer.email)
    .bind(&order.customer.phone)
    .bind(Json(&order.items))
    .bind(order.total_price)
    .bind(order.discount_amount)
    .bind(&order.promo_code)
    .bind(order.shipping_method.as_str())
    .bind(order.shipping_price)
    .bind(order.pickup_point.as_ref().map(|p| p.id.as_str()))
    .bind(order.pickup_point.as_ref().map(|p| p.name.as_str()))
    .bind(OrderStatus::Pending.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(shipment_state)
    .bind(packet_id)
    .bind(tracking_number)
    .bind(carrier_error)
    .bind(&order.security_token_hash)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    debug!(promo_code = ?order.promo_code, "Order row inserted.");
    Ok(())
  }

  async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {} FROM orders WHERE order_number = $1", ORDER_COLUMNS);
    let row = sqlx::query(&sql).bind(order_number).fetch_optional(&self.pool).await?;
    row.as_ref().map(order_from_row).transpose()
  }

  async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {} FROM orders WHERE payment_id = $1", ORDER_COLUMNS);
    let row = sqlx::query(&sql).bind(payment_id).fetch_optional(&self.pool).await?;
    row.as_ref().map(order_from_row).transpose()
  }

  #[instrument(name = "pg::record_shipment", skip(self, shipment), fields(shipment_state = shipment.label()))]
  async fn record_shipment(&self, order_id: Uuid, shipment: &ShipmentState) -> Result<(), StoreError> {
    let (state, packet_id, tracking_number, carrier_error) = shipment.to_columns();
    let result = sqlx::query(
      "UPDATE orders SET shipment_state = $2, packet_id = $3, tracking_number = $4, carrier_error = $5, \
       updated_at = now() WHERE id = $1",
    )
    .bind(order_id)
    .bind(state)
    .bind(packet_id)
    .bind(tracking_number)
    .bind(carrier_error)
    .execute(&self.pool)
    .await?;
    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("order {}", order_id)));
    }
    Ok(())
  }

  #[instrument(name = "pg::attach_payment_id", skip(self))]
  async fn attach_payment_id(&self, order_number: &str, payment_id: &str) -> Result<(), StoreError> {
    let result = sqlx::query("UPDATE orders SET payment_id = $2, updated_at = now() WHERE order_number = $1")
      .bind(order_number)
      .bind(payment_id)
      .execute(&self.pool)
      .await?;
    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("order {}", order_number)));
    }
    Ok(())
  }

  async fn set_payment_status(&self, order_id: Uuid, status: PaymentStatus) -> Result<bool, StoreError> {
    let result = sqlx::query(
      "UPDATE orders SET payment_status = $2, updated_at = now() WHERE id = $1 AND payment_status <> $2",
    )
    .bind(order_id)
    .bind(status.as_str())
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn transition_status(&self, order_id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool, StoreError> {
    if !from.can_transition_to(to) {
      return Err(StoreError::IllegalTransition { from, to });
    }
    let result = sqlx::query("UPDATE orders SET status = $3, updated_at = now() WHERE id = $1 AND status = $2")
      .bind(order_id)
      .bind(from.as_str())
      .bind(to.as_str())
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl PromoCodeStore for PgStore {
  async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError> {
    let sql = format!("SELECT {} FROM promo_codes WHERE code = $1", PROMO_COLUMNS);
    let row = sqlx::query(&sql).bind(code).fetch_optional(&self.pool).await?;
    row.as_ref().map(promo_from_row).transpose()
  }

  #[instrument(name = "pg::consume_promo_use", skip(self))]
  async fn consume_use(&self, promo_id: Uuid) -> Result<bool, StoreError> {
    let result = sqlx::query(
      "UPDATE promo_codes SET current_uses = current_uses + 1 \
       WHERE id = $1 AND (max_uses IS NULL OR current_uses < max_uses)",
    )
    .bind(promo_id)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn upsert_promo_code(&self, promo: &PromoCode) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO promo_codes (id, code, discount_type, discount_value, min_order_amount, max_uses, \
       current_uses, valid_from, valid_until, is_active) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
       ON CONFLICT (code) DO UPDATE SET discount_type = EXCLUDED.discount_type, \
       discount_value = EXCLUDED.discount_value, min_order_amount = EXCLUDED.min_order_amount, \
       max_uses = EXCLUDED.max_uses, valid_from = EXCLUDED.valid_from, \
       valid_until = EXCLUDED.valid_until, is_active = EXCLUDED.is_active",
    )
    .bind(promo.id)
    .bind(PromoCode::normalize_code(&promo.code))
    .bind(promo.discount_type.as_str())
    .bind(promo.discount_value)
    .bind(promo.min_order_amount)
    .bind(promo.max_uses)
    .bind(promo.current_uses)
    .bind(promo.valid_from)
    .bind(promo.valid_until)
    .bind(promo.is_active)
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}
