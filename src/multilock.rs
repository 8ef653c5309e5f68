//! The `MultiLock` facade (C4): the public lock/unlock entry points, and
//! the intention-mode cascade up a parent chain.

use std::sync::Arc;

use tracing::trace;

use crate::error::LockResult;
use crate::mode::Mode;
use crate::sync::Synchronizer;

/// A multi-granularity lock supporting IS, IX, S, and X, optionally nested
/// under a parent lock.
///
/// Acquiring S or X on a child automatically acquires the matching
/// intention mode (IS or IX respectively) on the parent, recursively. The
/// parent link is read-only after construction; callers are responsible
/// for building a cycle-free tree and keeping parents alive at least as
/// long as their children (enforced here by `Arc` ownership).
#[derive(Debug)]
pub struct MultiLock {
    sync: Synchronizer,
    parent: Option<Arc<MultiLock>>,
}

impl MultiLock {
    /// Creates a new lock, optionally nested under `parent`.
    pub fn new(parent: Option<Arc<MultiLock>>) -> Self {
        Self {
            sync: Synchronizer::new(),
            parent,
        }
    }

    /// Creates a root lock with no parent.
    pub fn root() -> Self {
        Self::new(None)
    }

    /// Creates a lock nested under `parent`.
    pub fn child_of(parent: &Arc<MultiLock>) -> Self {
        Self::new(Some(Arc::clone(parent)))
    }

    pub fn lock_is(&self) -> LockResult<()> {
        self.lock(Mode::IS)
    }
    pub fn lock_ix(&self) -> LockResult<()> {
        self.lock(Mode::IX)
    }
    pub fn lock_s(&self) -> LockResult<()> {
        self.lock(Mode::S)
    }
    pub fn lock_x(&self) -> LockResult<()> {
        self.lock(Mode::X)
    }

    pub fn unlock_is(&self) -> LockResult<()> {
        self.unlock(Mode::IS)
    }
    pub fn unlock_ix(&self) -> LockResult<()> {
        self.unlock(Mode::IX)
    }
    pub fn unlock_s(&self) -> LockResult<()> {
        self.unlock(Mode::S)
    }
    pub fn unlock_x(&self) -> LockResult<()> {
        self.unlock(Mode::X)
    }

    /// SIX is not a distinct admission path: it is simply S then IX by the
    /// same thread. Releasing mirrors acquisition order in reverse.
    pub fn lock_six(&self) -> LockResult<()> {
        self.lock_s()?;
        if let Err(e) = self.lock_ix() {
            // Best effort to not leave a half-acquired SIX behind; the S
            // hold is this thread's own, so releasing it cannot fail.
            let _ = self.unlock_s();
            return Err(e);
        }
        Ok(())
    }

    pub fn unlock_six(&self) -> LockResult<()> {
        self.unlock_ix()?;
        self.unlock_s()
    }

    fn lock(&self, mode: Mode) -> LockResult<()> {
        if let Some(parent) = &self.parent {
            parent.lock(mode.parent_intention())?;
        }
        if let Err(e) = self.sync.acquire(mode) {
            if let Some(parent) = &self.parent {
                let _ = parent.unlock(mode.parent_intention());
            }
            return Err(e);
        }
        trace!(%mode, "locked");
        Ok(())
    }

    fn unlock(&self, mode: Mode) -> LockResult<()> {
        self.sync.release(mode)?;
        if let Some(parent) = &self.parent {
            parent.unlock(mode.parent_intention())?;
        }
        trace!(%mode, "unlocked");
        Ok(())
    }

    pub fn global_count(&self, mode: Mode) -> u16 {
        self.sync.global_count(mode)
    }

    pub fn held_count(&self, mode: Mode) -> u16 {
        self.sync.held_count(mode)
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> crate::stats::LockStats {
        self.sync.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_cascades_intention_to_parent() {
        let parent = Arc::new(MultiLock::root());
        let child = MultiLock::child_of(&parent);

        child.lock_x().unwrap();
        assert_eq!(parent.global_count(Mode::IX), 1);
        assert_eq!(child.global_count(Mode::X), 1);

        child.unlock_x().unwrap();
        assert_eq!(parent.global_count(Mode::IX), 0);
    }

    #[test]
    fn shared_child_cascades_is_to_parent() {
        let parent = Arc::new(MultiLock::root());
        let child = MultiLock::child_of(&parent);

        child.lock_s().unwrap();
        assert_eq!(parent.global_count(Mode::IS), 1);
        child.unlock_s().unwrap();
        assert_eq!(parent.global_count(Mode::IS), 0);
    }

    #[test]
    fn six_composes_s_and_ix() {
        let lock = MultiLock::root();
        lock.lock_six().unwrap();
        assert_eq!(lock.global_count(Mode::S), 1);
        assert_eq!(lock.global_count(Mode::IX), 1);
        lock.unlock_six().unwrap();
        assert_eq!(lock.global_count(Mode::S), 0);
        assert_eq!(lock.global_count(Mode::IX), 0);
    }

    #[test]
    fn grandparent_sees_cascaded_intention() {
        let grandparent = Arc::new(MultiLock::root());
        let parent = Arc::new(MultiLock::child_of(&grandparent));
        let child = MultiLock::child_of(&parent);

        child.lock_x().unwrap();
        assert_eq!(parent.global_count(Mode::IX), 1);
        assert_eq!(grandparent.global_count(Mode::IX), 1);
    }
}
