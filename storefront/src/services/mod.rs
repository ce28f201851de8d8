// ufo_storefront/src/services/mod.rs

pub mod gopay;
pub mod notifier;
pub mod order_number;
pub mod packeta;
pub mod promo;
pub mod token_service;
