//! Cooperative cancellation for long-running transfers
//!
//! The token wraps a `'static` flag so a SIGINT handler can set it
//! directly. Only the fetcher polls it: interrupting a download discards
//! the partial file, while an in-flight flash is deliberately not
//! interruptible (stopping mid-write leaves the controller in an
//! indeterminate state).

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Handle polled between transfer chunks
#[derive(Debug, Clone, Copy)]
pub struct CancelToken {
    flag: &'static AtomicBool,
}

impl CancelToken {
    /// Wrap a flag, typically a static set from a signal handler
    pub const fn new(flag: &'static AtomicBool) -> Self {
        Self { flag }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Cancelled`] once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_trips_once_cancelled() {
        static FLAG: AtomicBool = AtomicBool::new(false);
        let token = CancelToken::new(&FLAG);

        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        token.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }
}
