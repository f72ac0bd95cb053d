//! Interrupt signalling for in-flight transfers.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Shared flag that aborts the streamed copy when triggered.
///
/// Clones observe the same flag. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct Interrupt {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    /// Creates an untriggered interrupt.
    #[must_use]
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Marks the interrupt as triggered and wakes every waiter.
    pub fn trigger(&self) {
        self.flag.send_replace(true);
    }

    /// Returns whether the interrupt has been triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once the interrupt is triggered.
    pub async fn triggered(&self) {
        let mut rx = self.flag.subscribe();
        let closed = rx.wait_for(|triggered| *triggered).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Spawns a task that triggers this interrupt on Ctrl-C.
    #[must_use = "the handle can be aborted once the batch is over"]
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let interrupt = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, aborting current transfer");
                interrupt.trigger();
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_interrupt_starts_untriggered() {
        assert!(!Interrupt::new().is_triggered());
    }

    #[test]
    fn test_trigger_is_visible_to_clones() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();
        clone.trigger();
        assert!(interrupt.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_resolves_after_trigger() {
        let interrupt = Interrupt::new();
        let waiter = interrupt.clone();
        let handle = tokio::spawn(async move { waiter.triggered().await });

        interrupt.trigger();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("waiter should wake")
            .expect("waiter task should not panic");
    }

    #[tokio::test]
    async fn test_triggered_resolves_immediately_when_already_set() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        tokio::time::timeout(Duration::from_secs(2), interrupt.triggered())
            .await
            .expect("already-triggered interrupt should resolve");
    }
}
