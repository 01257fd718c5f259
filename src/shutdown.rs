//! Cooperative interruption
//!
//! A `Shutdown` is a shared flag. The Ctrl-C listener sets it; crawlers poll
//! it between documents and stop early, leaving the caller to write a partial
//! report.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Spawns a task that triggers this flag on the first Ctrl-C
    ///
    /// A second Ctrl-C exits the process at once, for runs stuck in a
    /// request. Must be called from within a tokio runtime.
    pub fn listen_for_ctrl_c(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            if shutdown.watch(tokio::signal::ctrl_c).await {
                std::process::exit(130);
            }
        });
    }

    /// Waits on `next_signal` twice
    ///
    /// The first signal triggers the flag. Returns true once a second signal
    /// arrives, false if listening fails.
    async fn watch<F, Fut>(&self, mut next_signal: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        if let Err(e) = next_signal().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            return false;
        }
        tracing::warn!("Interrupt received, stopping after the current document (Ctrl-C again to abort)");
        self.trigger();

        match next_signal().await {
            Ok(()) => {
                tracing::error!("Second interrupt received, aborting");
                true
            }
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                false
            }
        }
    }
}
