use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Live, cancellable view of an ordered query
///
/// Each item is the complete, ordered result set after a change. The
/// forwarding task that produces snapshots is owned by the handle: calling
/// [`Subscription::cancel`] or dropping the handle aborts it, and no
/// snapshot is observed afterwards.
pub struct Subscription<T> {
    updates: mpsc::UnboundedReceiver<Vec<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Subscription<T> {
    /// Create an unbound sender/subscription pair; the producer task is attached with `attach`
    pub fn channel() -> (mpsc::UnboundedSender<Vec<T>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { updates: rx, task: None })
    }
    
    /// Tie the lifetime of the producing task to this handle
    pub fn attach(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }
    
    /// Wait for the next snapshot; `None` once the producer has stopped
    pub async fn next(&mut self) -> Option<Vec<T>> {
        self.updates.recv().await
    }
    
    /// Next snapshot if one is already queued
    pub fn try_next(&mut self) -> Option<Vec<T>> {
        self.updates.try_recv().ok()
    }
    
    /// Drain queued snapshots, keeping only the most recent
    pub fn latest(&mut self) -> Option<Vec<T>> {
        let mut latest = None;
        while let Ok(snapshot) = self.updates.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }
    
    pub fn is_active(&self) -> bool {
        self.task.as_ref().map_or(true, |t| !t.is_finished())
    }
    
    pub fn cancel(mut self) {
        self.shutdown();
    }
    
    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.updates.close();
        // Anything already queued belongs to the cancelled view
        while self.updates.try_recv().is_ok() {}
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
