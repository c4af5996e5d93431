//! Worker pools over shared unbounded FIFO queues.
//!
//! Each queue is a tokio unbounded channel whose receiver is shared by all
//! workers of a stage; a worker holds the lock only while waiting for the
//! next task. When every sender is dropped the workers drain what is left
//! and exit.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Multi-consumer end of a stage queue.
pub(crate) struct WorkQueue<T> {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T: Send + 'static> WorkQueue<T> {
    pub fn channel() -> (mpsc::UnboundedSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                rx: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Next task, or None once the queue is closed and empty.
    pub async fn next(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

/// Workers for a stage: one per stream, capped.
pub(crate) fn pool_size(streams: usize, cap: usize) -> usize {
    streams.min(cap).max(1)
}

/// Spawn `count` workers running `receive → handle` until the queue closes.
pub(crate) fn spawn_workers<T, F, Fut>(
    set: &mut JoinSet<()>,
    stage: &'static str,
    count: usize,
    queue: WorkQueue<T>,
    handler: F,
) where
    T: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    for worker in 0..count {
        let queue = queue.clone();
        let handler = handler.clone();
        set.spawn(async move {
            while let Some(task) = queue.next().await {
                handler(task).await;
            }
            tracing::debug!(stage, worker, "queue closed, worker exiting");
        });
    }
}

/// Wait for every worker of a stage; panics are logged, not propagated.
pub(crate) async fn join_workers(set: &mut JoinSet<()>, stage: &'static str) {
    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            tracing::error!(stage, "worker task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn pool_size_is_stream_count_capped() {
        assert_eq!(pool_size(3, 120), 3);
        assert_eq!(pool_size(500, 120), 120);
        assert_eq!(pool_size(0, 120), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_task_is_handled_once_and_workers_exit() {
        let (tx, queue) = WorkQueue::<u32>::channel();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let mut set = JoinSet::new();
        let sink = Arc::clone(&seen);
        spawn_workers(&mut set, "test", 4, queue, move |n| {
            let sink = Arc::clone(&sink);
            async move {
                tokio::task::yield_now().await;
                sink.lock().unwrap().push(n);
            }
        });

        for n in 0..200 {
            tx.send(n).unwrap();
        }
        drop(tx);
        join_workers(&mut set, "test").await;

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn single_worker_preserves_fifo_order() {
        let (tx, queue) = WorkQueue::<u32>::channel();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let mut set = JoinSet::new();
        let sink = Arc::clone(&seen);
        spawn_workers(&mut set, "test", 1, queue, move |n| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().unwrap().push(n) }
        });
        for n in [5, 1, 9, 3] {
            tx.send(n).unwrap();
        }
        drop(tx);
        join_workers(&mut set, "test").await;
        assert_eq!(*seen.lock().unwrap(), vec![5, 1, 9, 3]);
    }
}
