//! Pipeline shutdown: a trigger held by the caller and cloneable signals
//! handed to every stage.
//!
//! Pollers race each sleep against the signal and exit at their next
//! suspension point; downstream stages then drain their queues and stop.

use std::time::Duration;

use tokio::sync::watch;

/// Creates a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Held by the owner of the pipeline (e.g. the CLI's Ctrl-C handler).
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// A new signal observing this trigger.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observed by pipeline tasks.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested. Never resolves if the
    /// trigger is dropped without firing.
    pub async fn triggered(&mut self) {
        let observed = self.rx.wait_for(|stop| *stop).await.map(|_| ());
        if observed.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleeps for `duration`. Returns false if shutdown fired first.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleep_completes_without_trigger() {
        let (_trigger, mut signal) = shutdown_channel();
        assert!(signal.sleep(Duration::from_millis(5)).await);
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn trigger_interrupts_sleep() {
        let (trigger, mut signal) = shutdown_channel();
        let handle = tokio::spawn(async move { signal.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.trigger();
        let completed = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sleep should be interrupted")
            .unwrap();
        assert!(!completed);
    }

    #[tokio::test]
    async fn subscribers_see_earlier_trigger() {
        let (trigger, _signal) = shutdown_channel();
        trigger.trigger();
        let mut late = trigger.subscribe();
        assert!(late.is_triggered());
        assert!(!late.sleep(Duration::from_secs(60)).await);
    }
}
