//! Running blocking resource calls from async code.
//!
//! Every [`Resource`] method may block on filesystem or network I/O. These
//! helpers move the work onto tokio's blocking pool so the calling task never
//! stalls its worker thread.

use std::io;
use std::sync::Arc;

use super::error::ResourceError;
use super::loader::ResourceLoader;
use super::resource::{Resource, ResourceResult, ResourceSnapshot};

/// Run `task` on the blocking pool and wait for it.
pub async fn run_blocking<T, F>(task: F) -> ResourceResult<T>
where
    F: FnOnce() -> ResourceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ResourceError::Io(io::Error::other(e)))?
}

/// Capture a [`ResourceSnapshot`] off the async runtime.
pub async fn inspect(resource: Arc<dyn Resource>) -> ResourceResult<ResourceSnapshot> {
    run_blocking(move || Ok(ResourceSnapshot::capture(resource.as_ref()))).await
}

/// Read the whole content off the async runtime.
pub async fn read_to_vec(resource: Arc<dyn Resource>) -> ResourceResult<Vec<u8>> {
    run_blocking(move || resource.read_to_vec()).await
}

/// Resolve `location` and snapshot it, entirely on the blocking pool.
///
/// The handle never reaches async code, which matters for handlers whose
/// clients must not be dropped on a runtime thread.
pub async fn load_and_inspect(
    loader: Arc<ResourceLoader>,
    location: String,
) -> ResourceResult<ResourceSnapshot> {
    run_blocking(move || {
        let resource = loader.get_resource(&location)?;
        Ok(ResourceSnapshot::capture(resource.as_ref()))
    })
    .await
}
