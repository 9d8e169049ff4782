//! Remote subscription handle

use tokio::task::JoinHandle;
use tracing::debug;

/// A live subscription to remote page updates
///
/// Updates are delivered for as long as the handle is held. Dropping the
/// handle or calling [`Subscription::unsubscribe`] stops delivery.
#[derive(Debug)]
pub struct Subscription {
    label: String,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps the task delivering updates
    pub fn new(label: impl Into<String>, task: JoinHandle<()>) -> Self {
        Self {
            label: label.into(),
            task: Some(task),
        }
    }

    /// Location this subscription follows
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether updates can still arrive
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits until the remote side ends the subscription
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.as_mut() {
            let _ = task.await;
        }
        self.task = None;
    }

    /// Stops delivering updates
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(label = %self.label, "Unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
