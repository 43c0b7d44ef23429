use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use threadline_persist::Subscription;

/// Engine-side live view fed by at most one store subscription at a time
///
/// Each [`LiveView::reset`] starts a new generation. Snapshots published
/// for an older generation are discarded, and the check happens under the
/// channel's write lock, so once a reset returns no stale snapshot can
/// reach receivers.
pub struct LiveView<T> {
    tx: watch::Sender<Vec<T>>,
    generation: AtomicU64,
}

impl<T> LiveView<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Arc<Self> {
        let (tx, _) = watch::channel(Vec::new());
        Arc::new(Self {
            tx,
            generation: AtomicU64::new(0),
        })
    }
    
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.tx.subscribe()
    }
    
    pub fn snapshot(&self) -> Vec<T> {
        self.tx.borrow().clone()
    }
    
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
    
    /// Empty the view and fence off every earlier feed
    pub fn reset(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|items| {
            next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            items.clear();
        });
        next
    }
    
    /// Replace the content if `generation` is still current; true if receivers were notified
    pub fn publish(&self, generation: u64, snapshot: Vec<T>) -> bool {
        self.tx.send_if_modified(|items| {
            if self.generation.load(Ordering::SeqCst) != generation || *items == snapshot {
                return false;
            }
            *items = snapshot;
            true
        })
    }
}

/// Forwarding task from a store [`Subscription`] into a [`LiveView`]
///
/// Dropping the listener aborts the task, which drops the subscription
/// and with it the store-side producer.
pub struct Listener {
    label: String,
    task: JoinHandle<()>,
}

impl Listener {
    pub fn spawn<T>(
        label: impl Into<String>,
        view: Arc<LiveView<T>>,
        generation: u64,
        mut subscription: Subscription<T>,
        order: fn(&mut [T]),
    ) -> Self
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        let label = label.into();
        let task_label = label.clone();
        
        let task = tokio::spawn(async move {
            while let Some(mut snapshot) = subscription.next().await {
                // Delivery order is not trusted
                order(&mut snapshot);
                if !view.publish(generation, snapshot) && view.generation() != generation {
                    break;
                }
            }
            tracing::debug!(listener = %task_label, "Listener stopped");
        });
        
        tracing::debug!(listener = %label, generation, "Listener attached");
        Self { label, task }
    }
    
    /// Wrap a task spawned elsewhere so it is aborted along with the listener
    pub fn from_task(label: impl Into<String>, task: JoinHandle<()>) -> Self {
        Self {
            label: label.into(),
            task,
        }
    }
    
    pub fn label(&self) -> &str {
        &self.label
    }
    
    pub fn cancel(self) {
        tracing::debug!(listener = %self.label, "Listener cancelled");
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.task.abort();
    }
}
