// checkout_saga/src/core/context.rs

//! The shared saga context and the handler type that operates on it.

use crate::core::control::StepControl;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

/// Shared, lockable data for one saga run plus the run's correlation id.
///
/// Cloning is cheap and every clone sees the same data. Handlers receive a clone.
///
/// IMPORTANT: guards returned by `read`/`write` are blocking and MUST be dropped
/// before any `.await` point.
pub struct SagaContext<T: Send + Sync + 'static> {
  data: Arc<RwLock<T>>,
  correlation_id: Arc<str>,
}

impl<T: Send + Sync + 'static> SagaContext<T> {
  /// Wraps `data` with a freshly generated correlation id.
  pub fn new(data: T) -> Self {
    Self::with_correlation_id(data, Uuid::new_v4().to_string())
  }

  /// Wraps `data` under a caller-supplied correlation id, e.g. one already
  /// attached to the incoming request.
  pub fn with_correlation_id(data: T, correlation_id: impl Into<String>) -> Self {
    let id: String = correlation_id.into();
    SagaContext {
      data: Arc::new(RwLock::new(data)),
      correlation_id: Arc::from(id),
    }
  }

  pub fn correlation_id(&self) -> &str {
    &self.correlation_id
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.data.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.data.write()
  }
}

impl<T: Send + Sync + 'static> Clone for SagaContext<T> {
  fn clone(&self) -> Self {
    SagaContext {
      data: Arc::clone(&self.data),
      correlation_id: Arc::clone(&self.correlation_id),
    }
  }
}

impl<T: Send + Sync + 'static> fmt::Debug for SagaContext<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SagaContext")
      .field("data_type", &std::any::type_name::<T>())
      .field("correlation_id", &self.correlation_id)
      .finish()
  }
}

/// Type alias for a saga step handler.
///
/// A handler takes a clone of the saga context and returns a future resolving
/// to the control signal for the saga, or the saga's error type.
pub type Handler<TData, Err> = Box<
  dyn Fn(SagaContext<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>>
    + Send
    + Sync,
>;
