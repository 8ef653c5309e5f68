//! Read/write lock adapters (C5): thin facades over [`MultiLock`] exposing
//! S-as-read and X-as-write behind a generic lock interface, for callers
//! that want to depend on an abstract lock shape rather than `MultiLock`
//! directly.

use crate::error::{LockError, LockResult};
use crate::multilock::MultiLock;

/// A minimal generic lock interface. Interruptible, timed, try, and
/// condition-variable operations have no meaning for this lock and signal
/// [`LockError::Unsupported`].
pub trait GenericLock {
    fn lock(&self) -> LockResult<()>;
    fn unlock(&self) -> LockResult<()>;

    fn try_lock(&self) -> LockResult<bool> {
        Err(LockError::unsupported("try_lock"))
    }

    fn lock_interruptibly(&self) -> LockResult<()> {
        Err(LockError::unsupported("lock_interruptibly"))
    }

    fn lock_timed(&self, _timeout: std::time::Duration) -> LockResult<bool> {
        Err(LockError::unsupported("lock_timed"))
    }

    fn new_condition(&self) -> LockResult<()> {
        Err(LockError::unsupported("new_condition"))
    }
}

/// Exposes `S` as a generic read lock.
pub struct ReadLock<'a>(pub &'a MultiLock);

impl GenericLock for ReadLock<'_> {
    fn lock(&self) -> LockResult<()> {
        self.0.lock_s()
    }
    fn unlock(&self) -> LockResult<()> {
        self.0.unlock_s()
    }
}

/// Exposes `X` as a generic write lock.
pub struct WriteLock<'a>(pub &'a MultiLock);

impl GenericLock for WriteLock<'_> {
    fn lock(&self) -> LockResult<()> {
        self.0.lock_x()
    }
    fn unlock(&self) -> LockResult<()> {
        self.0.unlock_x()
    }
}
