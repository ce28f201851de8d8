// checkout_saga/src/saga/execution.rs

//! Contains `Saga::run()`, which executes the steps in order and applies each
//! step's failure policy.

use crate::core::context::{Handler, SagaContext};
use crate::core::control::{DegradedStep, SagaOutcome, SagaReport, StepControl};
use crate::core::step::StepPolicy;
use crate::error::SagaError;
use crate::saga::definition::Saga;
use tracing::{event, Instrument, Level};

/// What happened to one step.
enum StepRun<Err> {
  Finished,
  Halted,
  Failed(Err),
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Executes the saga against `ctx`.
  ///
  /// Returns `Err` only when a `Required` step fails (or has no handlers).
  /// Failures of `BestEffort` steps are listed in `SagaReport::degraded`.
  pub async fn run(&self, ctx: SagaContext<TData>) -> Result<SagaReport, Err> {
    let correlation_id = ctx.correlation_id().to_string();
    let saga_span = tracing::info_span!(
      "saga_run",
      saga_data_type = %std::any::type_name::<TData>(),
      correlation_id = %correlation_id,
      num_steps = self.steps.len(),
    );
    self.run_steps(ctx).instrument(saga_span).await
  }

  async fn run_steps(&self, ctx: SagaContext<TData>) -> Result<SagaReport, Err> {
    event!(Level::DEBUG, "Saga execution starting.");
    let mut report = SagaReport::new();

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = tracing::info_span!(
        "saga_step",
        step_name = step_name,
        step_index = step_idx,
        policy = ?step_def.policy,
        correlation_id = %ctx.correlation_id(),
      );

      if let Some(skip_cond) = &step_def.skip_if {
        if skip_cond(&ctx) {
          step_span.in_scope(|| event!(Level::INFO, "Step skipped by condition."));
          report.skipped.push(step_def.name.clone());
          continue;
        }
      }

      let on_handlers = self.on.get(step_name).filter(|v| !v.is_empty());
      let after_handlers = self.after.get(step_name).filter(|v| !v.is_empty());

      if on_handlers.is_none() && after_handlers.is_none() {
        match step_def.policy {
          StepPolicy::BestEffort => {
            step_span.in_scope(|| event!(Level::DEBUG, "Best-effort step has no handlers, skipping."));
            report.skipped.push(step_def.name.clone());
            continue;
          }
          StepPolicy::Required => {
            step_span.in_scope(|| event!(Level::ERROR, "Required step has no handlers."));
            return Err(Err::from(SagaError::HandlerMissing {
              step_name: step_def.name.clone(),
            }));
          }
        }
      }

      let step_result = run_step(on_handlers, after_handlers, &ctx)
        .instrument(step_span.clone())
        .await;

      match step_result {
        StepRun::Finished => {
          step_span.in_scope(|| event!(Level::DEBUG, "Step finished."));
        }
        StepRun::Halted => {
          step_span.in_scope(|| event!(Level::INFO, "Saga halted by step handler."));
          report.outcome = SagaOutcome::Halted {
            step: step_def.name.clone(),
          };
          return Ok(report);
        }
        StepRun::Failed(err) => match step_def.policy {
          StepPolicy::Required => {
            step_span.in_scope(|| event!(Level::ERROR, error = %err, "Required step failed, aborting saga."));
            return Err(err);
          }
          StepPolicy::BestEffort => {
            step_span.in_scope(|| event!(Level::WARN, error = %err, "Best-effort step failed, continuing."));
            report.degraded.push(DegradedStep {
              step: step_def.name.clone(),
              error: err.to_string(),
            });
          }
        },
      }
    }

    event!(Level::DEBUG, degraded = report.degraded.len(), "Saga execution completed.");
    Ok(report)
  }
}

async fn run_step<TData, Err>(
  on_handlers: Option<&Vec<Handler<TData, Err>>>,
  after_handlers: Option<&Vec<Handler<TData, Err>>>,
  ctx: &SagaContext<TData>,
) -> StepRun<Err>
where
  TData: 'static + Send + Sync,
{
  match run_phase(on_handlers, "on", ctx).await {
    StepRun::Finished => run_phase(after_handlers, "after", ctx).await,
    other => other,
  }
}

async fn run_phase<TData, Err>(
  handlers: Option<&Vec<Handler<TData, Err>>>,
  phase: &'static str,
  ctx: &SagaContext<TData>,
) -> StepRun<Err>
where
  TData: 'static + Send + Sync,
{
  let Some(handlers) = handlers else {
    return StepRun::Finished;
  };
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    event!(Level::TRACE, phase, handler_index = handler_idx, "Executing handler.");
    match handler_fn(ctx.clone()).await {
      Ok(StepControl::Continue) => {}
      Ok(StepControl::Halt) => return StepRun::Halted,
      Err(e) => return StepRun::Failed(e),
    }
  }
  StepRun::Finished
}
