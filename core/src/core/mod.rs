pub mod context;
pub mod control;
pub mod step;

pub use context::{Handler, SagaContext};
pub use control::{DegradedStep, SagaOutcome, SagaReport, StepControl};
pub use step::{StepDef, StepPolicy};
