//! HTTP handlers, one module per resource

pub mod canvas;
pub mod credentials;
pub mod health;
pub mod notes;
pub mod portal;
pub mod sync;
pub mod tasks;

use std::future::Future;
use std::time::Instant;

use goldfish_domain::Result;

use crate::utils::logging::log_command_execution;

/// Await a command and log its outcome and duration.
pub(crate) async fn timed<T, F>(command: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let result = future.await;
    log_command_execution(command, started.elapsed(), result.as_ref().err());
    result
}
