// ufo_storefront/src/models/mod.rs

//! Domain records shared by the stores, the services and the sagas.

pub mod checkout;
pub mod order;
pub mod payment;
pub mod promo_code;

pub use checkout::{CheckoutInput, CheckoutRequest};
pub use order::{
  CustomerContact, LineItem, NewOrder, Order, OrderStatus, PaymentLink, PaymentStatus, PickupPoint, ShipmentState,
  ShippingMethod,
};
pub use payment::{order_payment_items, PaymentInitiationRequest, PaymentItemRequest};
pub use promo_code::{DiscountType, PromoCode, PromoRejection};
