// ufo_storefront/src/lib.rs

//! UFO storefront checkout service.
//!
//! Order creation, payment initiation and payment notification are each a
//! `checkout_saga::Saga` over a context that carries the shared `AppState`.
//! External services (carrier, payment gateway, email) sit behind traits so
//! they can be replaced in tests.

pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;
