// ufo_storefront/src/services/notifier.rs

//! Fire-and-forget customer notifications. Template rendering happens in the
//! email service; this side only names the template and ships the data.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
  OrderConfirmation,
}

impl NotificationTemplate {
  pub fn as_str(&self) -> &'static str {
    match self {
      NotificationTemplate::OrderConfirmation => "order_confirmation",
    }
  }
}

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("Email transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("Email service rejected the message with status {status}")]
  Rejected { status: u16 },
}

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send(&self, template: NotificationTemplate, recipient: &str, data: JsonValue) -> Result<(), NotifyError>;
}

/// Logs the notification instead of sending it. Used when no email service is configured.
#[derive(Debug, Clone)]
pub struct LogNotifier {
  sender: String,
}

impl LogNotifier {
  pub fn new(sender: impl Into<String>) -> Self {
    Self { sender: sender.into() }
  }
}

#[async_trait]
impl Notifier for LogNotifier {
  async fn send(&self, template: NotificationTemplate, recipient: &str, data: JsonValue) -> Result<(), NotifyError> {
    info!(
      template = template.as_str(),
      from = %self.sender,
      to = %recipient,
      payload = %data,
      "Notification not delivered (no email service configured)."
    );
    Ok(())
  }
}

#[derive(Serialize)]
struct EmailRequest<'a> {
  template: NotificationTemplate,
  from: &'a str,
  to: &'a str,
  data: JsonValue,
}

/// Posts `{template, from, to, data}` as JSON to the email service.
#[derive(Clone)]
pub struct HttpNotifier {
  client: reqwest::Client,
  api_url: String,
  sender: String,
}

impl HttpNotifier {
  pub fn new(api_url: impl Into<String>, sender: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_url: api_url.into(),
      sender: sender.into(),
    })
  }
}

#[async_trait]
impl Notifier for HttpNotifier {
  #[instrument(name = "notifier::send", skip(self, data), fields(template = template.as_str()))]
  async fn send(&self, template: NotificationTemplate, recipient: &str, data: JsonValue) -> Result<(), NotifyError> {
    let response = self
      .client
      .post(&self.api_url)
      .json(&EmailRequest {
        template,
        from: &self.sender,
        to: recipient,
        data,
      })
      .send()
      .await?;
    let status = response.status();
    if !status.is_success() {
      return Err(NotifyError::Rejected { status: status.as_u16() });
    }
    info!("Notification accepted by email service.");
    Ok(())
  }
}
