//! Multi-granularity lock implementing the five classical lock modes of
//! Gray et al., 1975: Intention-Shared (IS), Intention-Exclusive (IX),
//! Shared (S), Shared-Intention-Exclusive (SIX), and Exclusive (X).
//!
//! A [`MultiLock`] may be held concurrently by many threads in different
//! modes as long as the modes are pairwise compatible; modes are reentrant
//! per thread, and a lock may be nested under a parent so that acquiring a
//! mode on a child automatically acquires the matching intention mode on
//! every ancestor.

pub mod error;
pub mod hold;
pub mod mode;
pub mod multilock;
pub mod rwlock;
pub mod state;
pub mod stats;
pub mod sync;

pub use error::{LockError, LockResult};
pub use mode::Mode;
pub use multilock::MultiLock;
pub use rwlock::{GenericLock, ReadLock, WriteLock};
