// tests/error_handling_tests.rs
mod common;
use checkout_saga::{Saga, SagaContext, SagaError, StepControl, StepPolicy};
use common::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_saga_run_catches_handler_missing() {
  setup_tracing();
  let saga = Saga::<TestContext, TestError>::new(&[("missing", StepPolicy::Required, None)]);
  let result = saga.run(SagaContext::new(TestContext::default())).await;
  match result.unwrap_err() {
    TestError::Saga(s) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("Expected TestError::Saga(HandlerMissing), got {:?}", other),
  }
}

// A saga whose error type IS SagaError, with handlers failing through anyhow.
#[tokio::test]
#[serial]
async fn test_saga_with_saga_error_type() {
  setup_tracing();
  let mut saga = Saga::<TestContext, SagaError>::new(&[("task", StepPolicy::Required, None)]);
  saga.on_step("task", |ctx: SagaContext<TestContext>| {
    Box::pin(async move {
      ctx.write().counter = 1;
      Ok::<StepControl, SagaError>(StepControl::Continue)
    })
  });
  let ctx = SagaContext::new(TestContext::default());
  assert!(saga.run(ctx.clone()).await.is_ok());
  assert_eq!(ctx.read().counter, 1);

  let mut failing = Saga::<TestContext, SagaError>::new(&[("fail_task", StepPolicy::Required, None)]);
  failing.on_step("fail_task", |_ctx| {
    Box::pin(async move { Err::<StepControl, anyhow::Error>(anyhow::anyhow!("Intentional failure")) })
  });
  match failing.run(SagaContext::new(TestContext::default())).await.unwrap_err() {
    SagaError::Handler { source } => assert_eq!(source.to_string(), "Intentional failure"),
    other => panic!("Expected SagaError::Handler, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_best_effort_error_text_is_display_of_error() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("notify", StepPolicy::BestEffort, None)]);
  saga.on_step("notify", create_failing_handler("notify", "smtp refused"));
  let report = saga.run(SagaContext::new(TestContext::default())).await.unwrap();
  assert_eq!(report.degraded[0].error, "Test handler failed: smtp refused");
}
