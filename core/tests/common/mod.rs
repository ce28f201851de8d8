// tests/common/mod.rs
#![allow(dead_code)]

use checkout_saga::{SagaContext, SagaError, StepControl};
use once_cell::sync::Lazy;
use std::future::Future;
use std::pin::Pin;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Context Structs ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_halt_at: Option<String>,
  pub recorded_failure: Option<String>,
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Saga framework error: {0}")]
  Saga(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<SagaError> for TestError {
  fn from(err: SagaError) -> Self {
    TestError::Saga(format!("{:?}", err))
  }
}

// --- Common Handler Creators ---
pub type TestHandlerFuture = Pin<Box<dyn Future<Output = Result<StepControl, TestError>> + Send>>;

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> impl Fn(SagaContext<TestContext>) -> TestHandlerFuture + Send + Sync + 'static {
  move |ctx: SagaContext<TestContext>| {
    let fut: TestHandlerFuture = Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      if guard.should_halt_at.as_deref() == Some(step_name) {
        return Ok(StepControl::Halt);
      }
      Ok(StepControl::Continue)
    });
    fut
  }
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> impl Fn(SagaContext<TestContext>) -> TestHandlerFuture + Send + Sync + 'static {
  move |ctx: SagaContext<TestContext>| {
    let fut: TestHandlerFuture = Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      Err(TestError::Handler(error_message.to_string()))
    });
    fut
  }
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

// --- Execution counter shared across handler creators ---
pub static HANDLER_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  HANDLER_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
