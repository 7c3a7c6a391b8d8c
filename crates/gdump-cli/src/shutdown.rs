use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

/// Cooperative cancellation flag shared with long-running scans.
pub struct CancelSignal {
    cancelled: AtomicBool,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    /// Create a signal that is triggered by Ctrl+C.
    pub fn with_ctrlc() -> anyhow::Result<Arc<Self>> {
        let signal = Arc::new(Self::new());
        let handler = Arc::clone(&signal);
        ctrlc::set_handler(move || {
            info!("Interrupted, stopping scan...");
            handler.trigger();
        })?;
        Ok(signal)
    }

    pub fn trigger(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// The underlying flag, as accepted by the scanner.
    pub fn as_atomic(&self) -> &AtomicBool {
        &self.cancelled
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
