//! Fire-and-forget background tasks.

use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;

/// Spawn `fut` on the runtime. An error result is logged here and goes
/// nowhere else; the webhook response never waits on it.
pub fn spawn_logged<F, T, E>(name: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(_) => tracing::debug!(task = name, "Background task finished"),
            Err(e) => tracing::error!(task = name, "Background task failed: {}", e),
        }
    })
}
