// checkout_saga/src/saga/definition.rs

//! Contains the `Saga<TData, Err>` struct and methods for its construction.

use crate::core::context::Handler;
use crate::core::step::{SkipCondition, StepDef, StepPolicy};
use crate::error::SagaError;
use std::collections::HashMap;

/// An ordered, named sequence of steps run against a `SagaContext<TData>`.
///
/// `Err` is the error type returned by handlers and by `run`. It must be
/// constructible from `SagaError` so the engine can report its own failures
/// (e.g. a required step without handlers) in the caller's error type.
pub struct Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Creates a saga from `(name, policy, skip_if)` triples, in run order.
  ///
  /// # Panics
  /// Panics if a step name appears twice.
  pub fn new(step_defs: &[(&str, StepPolicy, Option<SkipCondition<TData>>)]) -> Self {
    let mut saga = Self {
      steps: Vec::with_capacity(step_defs.len()),
      on: HashMap::new(),
      after: HashMap::new(),
    };
    for (name, policy, skip_if) in step_defs {
      saga.ensure_step_not_exists(name);
      saga.steps.push(StepDef {
        name: (*name).to_string(),
        policy: *policy,
        skip_if: skip_if.clone(),
      });
    }
    saga
  }

  /// Step names in run order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Saga setup error: step '{}' not found in saga definition.", step_name);
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.steps.iter().any(|s| s.name == step_name) {
      panic!("Saga setup error: step '{}' already exists in saga definition.", step_name);
    }
  }

  /// Replaces the skip condition of an existing step.
  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    self.ensure_step_exists(step_name);
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.skip_if = skip_if;
    }
  }
}
