// tests/common/mod.rs
#![allow(dead_code)]
#![allow(unused_macros)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use ufo_storefront::clock::FixedClock;
use ufo_storefront::config::{AppConfig, EmailConfig, GoPayConfig, PacketaConfig, ShopConfig};
use ufo_storefront::db::{MemoryStore, OrderStore, PromoCodeStore};
use ufo_storefront::models::{DiscountType, PromoCode};
use ufo_storefront::pipelines::Sagas;
use ufo_storefront::services::gopay::{
  AccessToken, CreatedPayment, GatewayError, GatewayPaymentState, PaymentGateway, PaymentRequest, TokenScope,
};
use ufo_storefront::services::notifier::{NotificationTemplate, Notifier, NotifyError};
use ufo_storefront::services::packeta::{
  PacketAttributes, PacketBooking, PacketStatus, ShipmentApiError, ShipmentCarrier, ShipmentErrorKind,
};
use ufo_storefront::state::AppState;
use uuid::Uuid;

// --- Configuration ---

/// Mid-2025, so the first order number of the year is `UFO25001`.
pub fn now_2025() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap()
}

pub fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 8080,
    app_base_url: "http://localhost:8080".to_string(),
    database_url: None,
    database_max_connections: 1,
    shop: ShopConfig::default(),
    packeta: PacketaConfig {
      // Nothing listens on port 9; stubs replace the client in most tests.
      api_url: "http://127.0.0.1:9/api/rest".to_string(),
      api_password: None,
      eshop: "ufo-shop".to_string(),
      default_weight_kg: Decimal::ONE,
    },
    gopay: GoPayConfig {
      base_url: "http://127.0.0.1:9/api".to_string(),
      goid: None,
      client_id: None,
      client_secret: None,
      lang: "CS".to_string(),
      return_url: "http://localhost:8080/checkout/complete".to_string(),
      notification_url: "http://localhost:8080/api/v1/payments/notify".to_string(),
    },
    email: EmailConfig {
      api_url: None,
      sender: "noreply@ufo-shop.example".to_string(),
    },
    http_timeout: Duration::from_secs(2),
    log_json: false,
    seed_db: false,
  }
}

// --- Carrier stubs ---

#[derive(Default)]
pub struct StubCarrier {
  pub booked: Mutex<Vec<PacketAttributes>>,
}

#[async_trait]
impl ShipmentCarrier for StubCarrier {
  async fn create_packet(&self, attributes: &PacketAttributes) -> Result<PacketBooking, ShipmentApiError> {
    let mut booked = self.booked.lock();
    booked.push(attributes.clone());
    Ok(PacketBooking {
      id: format!("{}", 1_000_000 + booked.len()),
      barcode: format!("Z{}", 1_000_000 + booked.len()),
    })
  }

  async fn packet_status(&self, _packet_id: &str) -> Result<PacketStatus, ShipmentApiError> {
    Ok(PacketStatus {
      code: "1".to_string(),
      code_text: "received data".to_string(),
      status_text: "Packet data received.".to_string(),
    })
  }

  async fn packet_tracking(&self, _packet_id: &str) -> Result<Option<String>, ShipmentApiError> {
    Ok(None)
  }

  async fn packet_attributes_valid(&self, _attributes: &PacketAttributes) -> Result<bool, ShipmentApiError> {
    Ok(true)
  }
}

/// Every call fails with the configured kind.
pub struct FailingCarrier {
  pub kind: ShipmentErrorKind,
}

impl FailingCarrier {
  pub fn error(&self) -> ShipmentApiError {
    ShipmentApiError::new(self.kind, "IncorrectApiPassword: Incorrect API password (stub)")
  }
}

#[async_trait]
impl ShipmentCarrier for FailingCarrier {
  async fn create_packet(&self, _attributes: &PacketAttributes) -> Result<PacketBooking, ShipmentApiError> {
    Err(self.error())
  }

  async fn packet_status(&self, _packet_id: &str) -> Result<PacketStatus, ShipmentApiError> {
    Err(self.error())
  }

  async fn packet_tracking(&self, _packet_id: &str) -> Result<Option<String>, ShipmentApiError> {
    Err(self.error())
  }

  async fn packet_attributes_valid(&self, _attributes: &PacketAttributes) -> Result<bool, ShipmentApiError> {
    Err(self.error())
  }
}

// --- Gateway stub ---

pub struct StubGateway {
  pub payment_id: String,
  pub state: Mutex<GatewayPaymentState>,
  pub scopes: Mutex<Vec<TokenScope>>,
  pub created: Mutex<Vec<PaymentRequest>>,
}

impl Default for StubGateway {
  fn default() -> Self {
    Self {
      payment_id: "3000006529".to_string(),
      state: Mutex::new(GatewayPaymentState::Created),
      scopes: Mutex::new(Vec::new()),
      created: Mutex::new(Vec::new()),
    }
  }
}

#[async_trait]
impl PaymentGateway for StubGateway {
  async fn acquire_token(&self, scope: TokenScope) -> Result<AccessToken, GatewayError> {
    self.scopes.lock().push(scope);
    Ok(AccessToken {
      value: SecretString::from("stub-token".to_string()),
      expires_in: Some(1800),
    })
  }

  async fn create_payment(&self, _token: &AccessToken, request: &PaymentRequest) -> Result<CreatedPayment, GatewayError> {
    self.created.lock().push(request.clone());
    Ok(CreatedPayment {
      payment_id: self.payment_id.clone(),
      gateway_url: format!("https://gw.sandbox.gopay.com/gw/v3/{}", self.payment_id),
      state: "CREATED".to_string(),
    })
  }

  async fn payment_state(&self, _token: &AccessToken, _payment_id: &str) -> Result<GatewayPaymentState, GatewayError> {
    Ok(self.state.lock().clone())
  }
}

// --- Notifier stubs ---

#[derive(Default)]
pub struct RecordingNotifier {
  pub sent: Mutex<Vec<(String, JsonValue)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn send(&self, _template: NotificationTemplate, recipient: &str, data: JsonValue) -> Result<(), NotifyError> {
    self.sent.lock().push((recipient.to_string(), data));
    Ok(())
  }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
  async fn send(&self, _template: NotificationTemplate, _recipient: &str, _data: JsonValue) -> Result<(), NotifyError> {
    Err(NotifyError::Rejected { status: 503 })
  }
}

// --- Harness ---

pub struct Harness {
  pub store: Arc<MemoryStore>,
  pub carrier: Arc<StubCarrier>,
  pub gateway: Arc<StubGateway>,
  pub notifier: Arc<RecordingNotifier>,
  pub state: AppState,
  pub sagas: Arc<Sagas>,
}

impl Harness {
  pub fn new() -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let carrier = Arc::new(StubCarrier::default());
    let gateway = Arc::new(StubGateway::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
      config: Arc::new(test_config()),
      orders: store.clone(),
      promo_codes: store.clone(),
      carrier: carrier.clone(),
      gateway: gateway.clone(),
      notifier: notifier.clone(),
      clock: Arc::new(FixedClock(now_2025())),
    };
    Self {
      store,
      carrier,
      gateway,
      notifier,
      state,
      sagas: Arc::new(Sagas::new()),
    }
  }

  pub fn with_carrier(mut self, carrier: Arc<dyn ShipmentCarrier>) -> Self {
    self.state.carrier = carrier;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.state.notifier = notifier;
    self
  }

  pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
    self.state.gateway = gateway;
    self
  }

  pub fn with_promo_codes(mut self, promo_codes: Arc<dyn PromoCodeStore>) -> Self {
    self.state.promo_codes = promo_codes;
    self
  }

  pub fn with_orders(mut self, orders: Arc<dyn OrderStore>) -> Self {
    self.state.orders = orders;
    self
  }

  pub fn with_config(mut self, config: AppConfig) -> Self {
    self.state.config = Arc::new(config);
    self
  }

  pub fn state_data(&self) -> actix_web::web::Data<AppState> {
    actix_web::web::Data::new(self.state.clone())
  }

  pub fn sagas_data(&self) -> actix_web::web::Data<Sagas> {
    actix_web::web::Data::from(self.sagas.clone())
  }
}

/// Builds the service the same way the binary does, minus the listener.
macro_rules! init_app {
  ($harness:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data($harness.state_data())
        .app_data($harness.sagas_data())
        .app_data(ufo_storefront::web::json_config())
        .wrap(tracing_actix_web::TracingLogger::default())
        .configure(ufo_storefront::web::configure_app_routes),
    )
    .await
  };
}

// --- Fixtures ---

/// One Tee at 500 × 2 delivered to a pickup point (79): total 1079.
pub fn checkout_body() -> JsonValue {
  json!({
    "items": [{ "productId": "p1", "name": "Tee", "size": "M", "price": 500, "quantity": 2 }],
    "customer": { "name": "Jan Novák", "email": "jan@example.cz", "phone": "+420777123456" },
    "shippingMethod": "pickup_point",
    "pickupPoint": { "id": "4321", "name": "Praha 1, Národní 37" },
    "totalPrice": 1079
  })
}

pub fn promo(code: &str, discount_type: DiscountType, value: i64) -> PromoCode {
  PromoCode {
    id: Uuid::new_v4(),
    code: code.to_string(),
    discount_type,
    discount_value: Decimal::from(value),
    min_order_amount: None,
    max_uses: None,
    current_uses: 0,
    valid_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    valid_until: Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap(),
    is_active: true,
  }
}

/// `^[A-Z]+[0-9]{2}[0-9]{3}$`
pub fn is_order_number(value: &str) -> bool {
  let letters = value.chars().take_while(|c| c.is_ascii_uppercase()).count();
  let digits = &value[letters..];
  letters > 0 && digits.len() == 5 && digits.chars().all(|c| c.is_ascii_digit())
}

// --- Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
