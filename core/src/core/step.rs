// checkout_saga/src/core/step.rs

//! Defines the structure for a single step within a saga.

use super::SagaContext;
use std::sync::Arc;

/// Condition evaluated before a step runs. If it returns true, the step is skipped.
pub type SkipCondition<TData> = Arc<dyn Fn(&SagaContext<TData>) -> bool + Send + Sync + 'static>;

/// What a handler failure in this step means for the whole saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
  /// A failure aborts the saga and is returned to the caller.
  Required,
  /// A failure is logged and recorded in the report; the saga continues.
  BestEffort,
}

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub policy: StepPolicy,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("policy", &self.policy)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
