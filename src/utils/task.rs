//! Handle for background loops with deterministic shutdown.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Owns a spawned loop and the signal that stops it.
///
/// The loop receives a `watch::Receiver<bool>` and is expected to
/// `select!` on it changing. Dropping the handle without calling
/// [`TaskHandle::stop`] aborts the task.
pub struct TaskHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawn `run` with a fresh shutdown receiver.
    pub fn spawn<F, Fut>(name: &'static str, run: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let join = tokio::spawn(run(rx));
        Self {
            name,
            shutdown,
            join: Some(join),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                if !e.is_cancelled() {
                    warn!(task = self.name, error = %e, "Background task ended abnormally");
                }
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Resolve once the shutdown flag is raised or its sender is gone.
pub async fn stopped(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
