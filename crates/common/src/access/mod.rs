//! Authorize-then-act operations over the storage ports.
//!
//! Every operation takes the caller's identity as a plain id (the boundary
//! authenticates) and a [`CancellationToken`]. Each port call races the
//! token; when it fires the in-flight call is dropped and the operation
//! returns [`AccessError::Cancelled`] without running later steps.

mod error;
mod file_access;
mod identity;
mod share_access;

use std::future::Future;

use tokio_util::sync::CancellationToken;

pub use error::{AccessError, ErrorKind};
pub use file_access::{Download, FileAccess};
pub use identity::Identity;
pub use share_access::ShareAccess;

use crate::ports::StoreError;

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn guard<F>(
    cancel: &CancellationToken,
    op: &'static str,
    fut: F,
) -> Result<F::Output, AccessError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AccessError::Cancelled { op }),
        out = fut => Ok(out),
    }
}

/// Guarded metadata store call.
pub(crate) async fn metadata<T, F>(
    cancel: &CancellationToken,
    op: &'static str,
    fut: F,
) -> Result<T, AccessError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    guard(cancel, op, fut)
        .await?
        .map_err(|e| AccessError::persistence(op, e))
}

/// Guarded content store call.
pub(crate) async fn content<T, F>(
    cancel: &CancellationToken,
    op: &'static str,
    fut: F,
) -> Result<T, AccessError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    guard(cancel, op, fut)
        .await?
        .map_err(|e| AccessError::storage(op, e))
}

/// Fail fast between the steps of a multi-store operation.
pub(crate) fn checkpoint(cancel: &CancellationToken, op: &'static str) -> Result<(), AccessError> {
    if cancel.is_cancelled() {
        return Err(AccessError::Cancelled { op });
    }
    Ok(())
}
