//! Shutdown coordination for the background jobs.
//!
//! The server keeps one [`ShutdownState`] and hands clones to every periodic
//! job. Jobs race their next tick against [`ShutdownState::wait`] and exit as
//! soon as shutdown is initiated; the final save happens after they stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ShutdownState {
    /// Set once background jobs must stop; never cleared
    shutdown_initiated: Arc<AtomicBool>,
    /// Set once the final save finished
    shutdown_complete: Arc<AtomicBool>,
    notifier: Arc<watch::Sender<bool>>,
}

impl ShutdownState {
    pub fn new() -> Self {
        let (notifier, _) = watch::channel(false);
        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
            notifier: Arc::new(notifier),
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Signals every job to stop. Calling it twice is harmless.
    pub fn initiate_shutdown(&self) {
        if self.shutdown_initiated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.notifier.send_replace(true);
        info!("🛑 Shutdown initiated - background jobs stopping");
    }

    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ Island data flushed - ready for exit");
    }

    /// Resolves once shutdown has been initiated.
    pub async fn wait(&self) {
        let mut receiver = self.notifier.subscribe();
        if *receiver.borrow_and_update() {
            return;
        }
        // the sender lives as long as `self`, so this only ends on a change
        while receiver.changed().await.is_ok() {
            if *receiver.borrow_and_update() {
                return;
            }
        }
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_resolves_after_initiation() {
        let state = ShutdownState::new();
        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.wait().await })
        };

        tokio::task::yield_now().await;
        assert!(!state.is_shutdown_initiated());
        state.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .expect("waiter should not panic");
        assert!(state.is_shutdown_initiated());
        assert!(!state.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_wait_after_initiation_returns_immediately() {
        let state = ShutdownState::new();
        state.initiate_shutdown();
        state.initiate_shutdown();
        state.wait().await;
        state.complete_shutdown();
        assert!(state.is_shutdown_complete());
    }
}
