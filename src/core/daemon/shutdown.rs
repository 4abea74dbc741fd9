use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::{PanelError, Result};

/// Cooperative stop request shared between the signal handler and the loop.
///
/// The flag is what the loop trusts; the broadcast only wakes a loop that is
/// waiting for its next tick.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    wake_tx: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (wake_tx, _) = broadcast::channel(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            wake_tx,
        }
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // No receivers just means nobody is waiting right now
        let _ = self.wake_tx.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.wake_tx.subscribe()
    }

    /// Trigger on Ctrl-C. Can only be installed once per process.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            log::info!("Interrupt received, stopping after the current cycle");
            signal.trigger();
        })
        .map_err(|e| PanelError::other(format!("Failed to install Ctrl-C handler: {}", e)))
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
