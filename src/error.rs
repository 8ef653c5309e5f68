//! Error types for lock acquisition and release.
//!
//! # Error Categories
//!
//! - **Monitor-state violations**: release called without a matching hold
//! - **Unsupported operations**: adapter methods with no meaning for this lock
//! - **Overflow**: a mode's reentrancy counter would exceed its 16-bit capacity

use thiserror::Error;

use crate::mode::Mode;

/// Result type alias for lock operations.
pub type LockResult<T> = std::result::Result<T, LockError>;

/// Errors that can occur while acquiring, releasing, or inspecting a [`crate::MultiLock`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Release was called by a thread that does not currently hold the mode.
    #[error("monitor-state violation: thread does not hold {mode} on this lock")]
    MonitorStateViolation { mode: Mode },

    /// `unlock_x` was called by a thread other than the current exclusive owner.
    #[error("monitor-state violation: calling thread is not the exclusive owner")]
    NotExclusiveOwner,

    /// An adapter operation with no equivalent in this lock's model was invoked.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A mode's 16-bit reentrancy counter would have overflowed.
    #[error("overflow: {mode} count would exceed 65535 reentrant holds")]
    Overflow { mode: Mode },
}

impl LockError {
    pub fn monitor_state(mode: Mode) -> Self {
        LockError::MonitorStateViolation { mode }
    }

    pub fn overflow(mode: Mode) -> Self {
        LockError::Overflow { mode }
    }

    pub fn unsupported(op: &'static str) -> Self {
        LockError::Unsupported(op)
    }

    /// True for errors that indicate caller misuse rather than contention.
    ///
    /// Contention is never an error in this lock: it is represented by blocking.
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            LockError::MonitorStateViolation { .. } | LockError::NotExclusiveOwner
        )
    }
}
