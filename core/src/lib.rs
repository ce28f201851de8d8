// checkout_saga/src/lib.rs

//! checkout-saga: an async, step-oriented saga engine.
//!
//! A saga is an ordered list of named steps run against one shared context:
//!  - Each step carries a failure policy. A `Required` step aborts the run when
//!    its handler fails; a `BestEffort` step is logged, recorded as degraded,
//!    and the run moves on.
//!  - Steps can be skipped by a condition evaluated against the context.
//!  - Handlers are asynchronous and may halt the saga early.
//!  - Every run carries a correlation id that is stamped on all step spans.

pub mod core;
pub mod error;
pub mod saga;

// --- Re-exports for the Public API ---

pub use crate::core::context::{Handler, SagaContext};
pub use crate::core::control::{DegradedStep, SagaOutcome, SagaReport, StepControl};
pub use crate::core::step::{SkipCondition, StepDef, StepPolicy};

pub use crate::saga::definition::Saga;

pub use crate::error::{SagaError, SagaResult};

/*
    Core Workflow:
    1. Define a data struct `MyData` for your process.
    2. Create a `Saga<MyData, MyErr>` with its ordered steps and their policies.
    3. Register handlers with `.on_step()` (and `.after_step()` when a step has a
       follow-up phase, e.g. recording the result of a remote call).
    4. Wrap the data: `SagaContext::new(my_data)` (or `with_correlation_id`).
    5. `saga.run(ctx.clone()).await` and inspect the returned `SagaReport`.
*/
