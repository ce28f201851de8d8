// tests/context_management_tests.rs
mod common;

use checkout_saga::{Saga, SagaContext, StepControl, StepPolicy};
use common::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_context_is_shared_and_modified_across_steps() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[
    ("step1_modify", StepPolicy::Required, None),
    ("step2_read_modify", StepPolicy::Required, None),
  ]);

  saga.on_step("step1_modify", |ctx: SagaContext<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter = 10;
      guard.message = "SetByStep1".to_string();
      Ok::<StepControl, TestError>(StepControl::Continue)
    })
  });

  saga.on_step("step2_read_modify", |ctx: SagaContext<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      assert_eq!(guard.counter, 10);
      guard.counter += 5;
      guard.message.push_str("_ThenStep2");
      Ok::<StepControl, TestError>(StepControl::Continue)
    })
  });

  let ctx = SagaContext::new(TestContext::default());
  saga.run(ctx.clone()).await.unwrap();

  let final_guard = ctx.read();
  assert_eq!(final_guard.counter, 15);
  assert_eq!(final_guard.message, "SetByStep1_ThenStep2");
}

#[test]
fn test_context_clone_shares_data_and_correlation_id() {
  let original = SagaContext::with_correlation_id(
    TestContext {
      counter: 1,
      ..Default::default()
    },
    "req-42",
  );
  let cloned = original.clone();

  original.write().counter = 5;
  assert_eq!(cloned.read().counter, 5);
  assert_eq!(cloned.correlation_id(), "req-42");
}

#[test]
fn test_new_context_gets_distinct_correlation_ids() {
  let a = SagaContext::new(TestContext::default());
  let b = SagaContext::new(TestContext::default());
  assert_ne!(a.correlation_id(), b.correlation_id());
  assert!(!a.correlation_id().is_empty());
}

#[tokio::test]
#[serial]
async fn test_handlers_see_run_correlation_id() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("capture", StepPolicy::Required, None)]);
  saga.on_step("capture", |ctx: SagaContext<TestContext>| {
    Box::pin(async move {
      let id = ctx.correlation_id().to_string();
      ctx.write().message = id;
      Ok::<StepControl, TestError>(StepControl::Continue)
    })
  });

  let ctx = SagaContext::with_correlation_id(TestContext::default(), "corr-7");
  saga.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "corr-7");
}
