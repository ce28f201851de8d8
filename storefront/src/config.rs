// ufo_storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use secrecy::SecretString;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const GOPAY_SANDBOX_URL: &str = "https://gw.sandbox.gopay.com/api";
const GOPAY_PRODUCTION_URL: &str = "https://gate.gopay.cz/api";
const PACKETA_DEFAULT_URL: &str = "https://www.zasilkovna.cz/api/rest";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub app_base_url: String,

  /// `None` runs the service on the in-memory store.
  pub database_url: Option<String>,
  pub database_max_connections: u32,

  pub shop: ShopConfig,
  pub packeta: PacketaConfig,
  pub gopay: GoPayConfig,
  pub email: EmailConfig,

  pub http_timeout: Duration,
  pub log_json: bool,
  pub seed_db: bool,
}

#[derive(Debug, Clone)]
pub struct ShopConfig {
  pub order_number_prefix: String,
  pub order_insert_attempts: u32,
  pub pickup_point_price: Decimal,
  pub personal_pickup_price: Decimal,
  pub currency: String,
}

#[derive(Debug, Clone)]
pub struct PacketaConfig {
  pub api_url: String,
  pub api_password: Option<SecretString>,
  pub eshop: String,
  pub default_weight_kg: Decimal,
}

#[derive(Debug, Clone)]
pub struct GoPayConfig {
  pub base_url: String,
  pub goid: Option<String>,
  pub client_id: Option<String>,
  pub client_secret: Option<SecretString>,
  pub lang: String,
  pub return_url: String,
  pub notification_url: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
  pub api_url: Option<String>,
  pub sender: String,
}

impl Default for ShopConfig {
  fn default() -> Self {
    ShopConfig {
      order_number_prefix: "UFO".to_string(),
      order_insert_attempts: 5,
      pickup_point_price: Decimal::from(79),
      personal_pickup_price: Decimal::ZERO,
      currency: "CZK".to_string(),
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_env("SERVER_PORT", get_env("SERVER_PORT"), 8080u16)?;
    let app_base_url =
      get_env("APP_BASE_URL").unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));

    let defaults = ShopConfig::default();
    let shop = ShopConfig {
      order_number_prefix: get_env("ORDER_NUMBER_PREFIX").unwrap_or(defaults.order_number_prefix),
      order_insert_attempts: parse_env(
        "ORDER_INSERT_ATTEMPTS",
        get_env("ORDER_INSERT_ATTEMPTS"),
        defaults.order_insert_attempts,
      )?,
      pickup_point_price: parse_env(
        "SHIPPING_PICKUP_POINT_PRICE",
        get_env("SHIPPING_PICKUP_POINT_PRICE"),
        defaults.pickup_point_price,
      )?,
      personal_pickup_price: parse_env(
        "SHIPPING_PERSONAL_PICKUP_PRICE",
        get_env("SHIPPING_PERSONAL_PICKUP_PRICE"),
        defaults.personal_pickup_price,
      )?,
      currency: get_env("CURRENCY").unwrap_or(defaults.currency),
    };
    if shop.order_insert_attempts == 0 {
      return Err(AppError::Configuration(
        "ORDER_INSERT_ATTEMPTS must be at least 1".to_string(),
      ));
    }
    if !shop.order_number_prefix.chars().all(|c| c.is_ascii_uppercase()) || shop.order_number_prefix.is_empty() {
      return Err(AppError::Configuration(
        "ORDER_NUMBER_PREFIX must be non-empty uppercase ASCII letters".to_string(),
      ));
    }

    let packeta = PacketaConfig {
      api_url: get_env("PACKETA_API_URL").unwrap_or_else(|| PACKETA_DEFAULT_URL.to_string()),
      api_password: get_env("PACKETA_API_PASSWORD").map(SecretString::from),
      eshop: get_env("PACKETA_ESHOP").unwrap_or_else(|| "ufo-shop".to_string()),
      default_weight_kg: parse_env(
        "PACKETA_DEFAULT_WEIGHT_KG",
        get_env("PACKETA_DEFAULT_WEIGHT_KG"),
        Decimal::ONE,
      )?,
    };

    let sandbox = parse_env("GOPAY_SANDBOX", get_env("GOPAY_SANDBOX"), true)?;
    let gopay = GoPayConfig {
      base_url: if sandbox { GOPAY_SANDBOX_URL } else { GOPAY_PRODUCTION_URL }.to_string(),
      goid: get_env("GOPAY_GOID"),
      client_id: get_env("GOPAY_CLIENT_ID"),
      client_secret: get_env("GOPAY_CLIENT_SECRET").map(SecretString::from),
      lang: get_env("GOPAY_LANG").unwrap_or_else(|| "CS".to_string()),
      return_url: format!("{}/checkout/complete", app_base_url),
      notification_url: format!("{}/api/v1/payments/notify", app_base_url),
    };

    let email = EmailConfig {
      api_url: get_env("EMAIL_API_URL"),
      sender: get_env("EMAIL_SENDER").unwrap_or_else(|| "noreply@ufo-shop.example".to_string()),
    };

    let config = Self {
      server_host,
      server_port,
      app_base_url,
      database_url: get_env("DATABASE_URL"),
      database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", get_env("DATABASE_MAX_CONNECTIONS"), 5u32)?,
      shop,
      packeta,
      gopay,
      email,
      http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", get_env("HTTP_TIMEOUT_SECS"), 15u64)?),
      log_json: get_env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
      seed_db: parse_env("SEED_DB", get_env("SEED_DB"), false)?,
    };

    // Secrets are wrapped in SecretString, so Debug output is redacted.
    tracing::debug!(config = ?config, "Loaded config details");
    Ok(config)
  }
}

fn parse_env<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Configuration(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_env_falls_back_to_default() {
    assert_eq!(parse_env("X", None, 15u64).unwrap(), 15);
  }

  #[test]
  fn parse_env_reports_variable_name_on_error() {
    let err = parse_env::<u16>("SERVER_PORT", Some("eighty".to_string()), 8080).unwrap_err();
    assert!(err.to_string().contains("SERVER_PORT"));
  }

  #[test]
  fn parse_env_reads_decimal_prices() {
    let price: Decimal = parse_env("P", Some("79".to_string()), Decimal::ZERO).unwrap();
    assert_eq!(price, Decimal::from(79));
  }
}
