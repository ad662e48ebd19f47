//! Cooperative cancellation for long-running pipeline stages.
//!
//! Every stage checks its token after each top-level statement or block
//! and returns [`UdmfError::Cancelled`](crate::UdmfError::Cancelled) once
//! the source has been tripped.
//!
//! ```
//! use udmf::cancel::CancelSource;
//!
//! let source = CancelSource::new();
//! let token = source.token();
//! assert!(!token.is_cancelled());
//!
//! source.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, UdmfError};

/// A cloneable, thread-safe token that can be checked for cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Returns `Err(Cancelled)` if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(UdmfError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The controlling side; every token it hands out observes the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelSource {
    flag: Arc<AtomicBool>,
}

impl CancelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            flag: Arc::clone(&self.flag),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Check an optional token.
pub(crate) fn check(token: Option<&CancelToken>) -> Result<()> {
    match token {
        Some(token) => token.check(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_share_flag() {
        let source = CancelSource::new();
        let a = source.token();
        let b = a.clone();

        source.cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(matches!(b.check(), Err(UdmfError::Cancelled)));
    }

    #[test]
    fn test_none_never_cancels() {
        assert!(CancelToken::none().check().is_ok());
        assert!(check(None).is_ok());
    }

    #[test]
    fn test_token_crosses_threads() {
        let source = CancelSource::new();
        let token = source.token();
        let handle = std::thread::spawn(move || {
            while !token.is_cancelled() {
                std::thread::yield_now();
            }
            true
        });
        source.cancel();
        assert!(handle.join().unwrap());
    }
}
