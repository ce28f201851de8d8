// checkout_saga/src/core/control.rs

//! Signals for controlling saga flow and the report of a finished run.

/// Signal from a handler indicating whether the saga should continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Continue with the next handler or step.
  Continue,
  /// Stop the saga. No further handlers or steps run.
  Halt,
}

/// How a saga run ended, when it did not end with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
  /// Every step ran, was skipped, or degraded.
  Completed,
  /// A handler of `step` returned `StepControl::Halt`.
  Halted { step: String },
}

/// A best-effort step whose handler failed. The run continued past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedStep {
  pub step: String,
  pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaReport {
  pub outcome: SagaOutcome,
  pub degraded: Vec<DegradedStep>,
  pub skipped: Vec<String>,
}

impl SagaReport {
  pub(crate) fn new() -> Self {
    SagaReport {
      outcome: SagaOutcome::Completed,
      degraded: Vec::new(),
      skipped: Vec::new(),
    }
  }

  pub fn is_completed(&self) -> bool {
    self.outcome == SagaOutcome::Completed
  }

  pub fn degraded_step(&self, step: &str) -> Option<&DegradedStep> {
    self.degraded.iter().find(|d| d.step == step)
  }

  pub fn was_skipped(&self, step: &str) -> bool {
    self.skipped.iter().any(|s| s == step)
  }
}
