//! Per-thread hold counters (C2): each thread's own contribution to the
//! lock's state word, mirroring the same field layout so that
//! `other = state - hold` isolates what *other* threads hold.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;

use crate::error::LockError;
use crate::mode::Mode;

/// One thread's contribution to a single lock's state word.
///
/// Fields are plain atomics so the record can sit behind an `Arc` shared
/// across a `DashMap`, even though in steady state only the owning thread
/// ever writes its own fields.
#[derive(Debug, Default)]
pub struct HoldCounter {
    is: AtomicU16,
    ix: AtomicU16,
    s: AtomicU16,
    x: AtomicU16,
}

impl HoldCounter {
    fn cell(&self, mode: Mode) -> &AtomicU16 {
        match mode {
            Mode::IS => &self.is,
            Mode::IX => &self.ix,
            Mode::S => &self.s,
            Mode::X => &self.x,
        }
    }

    pub fn get(&self, mode: Mode) -> u16 {
        self.cell(mode).load(Ordering::Relaxed)
    }

    pub fn increment(&self, mode: Mode) -> Result<(), LockError> {
        let cell = self.cell(mode);
        let prev = cell.load(Ordering::Relaxed);
        if prev == u16::MAX {
            return Err(LockError::overflow(mode));
        }
        cell.store(prev + 1, Ordering::Relaxed);
        Ok(())
    }

    pub fn decrement(&self, mode: Mode) -> Result<(), LockError> {
        let cell = self.cell(mode);
        let prev = cell.load(Ordering::Relaxed);
        if prev == 0 {
            return Err(LockError::monitor_state(mode));
        }
        cell.store(prev - 1, Ordering::Relaxed);
        Ok(())
    }

    /// This thread's hold packed into the same layout as [`crate::state::StateWord`].
    pub fn packed(&self) -> u64 {
        use crate::state::{IS_UNIT, IX_UNIT, S_UNIT, X_UNIT};
        self.get(Mode::IS) as u64 * IS_UNIT
            + self.get(Mode::IX) as u64 * IX_UNIT
            + self.get(Mode::S) as u64 * S_UNIT
            + self.get(Mode::X) as u64 * X_UNIT
    }
}

/// Registry of per-thread hold counters for one lock instance.
///
/// Every [`crate::MultiLock`] owns one `HoldRegistry`. Entries are created
/// lazily on first acquisition and persist for the registry's lifetime —
/// sparse and never reclaimed mid-run, matching a thread's own hold on the
/// lock for as long as the lock exists.
#[derive(Debug, Default)]
pub struct HoldRegistry {
    by_thread: DashMap<ThreadId, Arc<HoldCounter>>,
}

thread_local! {
    // Single-slot cache: the most recently touched (lock id, hold counter)
    // pair for the current OS thread. A miss costs one DashMap lookup; it
    // never costs correctness, because the id comparison below always
    // rejects a stale entry.
    static LAST_TOUCHED: RefCell<Option<(u64, Arc<HoldCounter>)>> = const { RefCell::new(None) };
}

static NEXT_LOCK_ID: AtomicU64 = AtomicU64::new(1);

impl HoldRegistry {
    pub fn new() -> Self {
        Self {
            by_thread: DashMap::new(),
        }
    }

    /// Returns this thread's hold counter, creating it on first use.
    ///
    /// `lock_id` disambiguates the thread-local cache slot across distinct
    /// lock instances touched by the same thread.
    pub fn counter_for(&self, lock_id: u64) -> Arc<HoldCounter> {
        if let Some(hit) = LAST_TOUCHED.with(|slot| {
            slot.borrow()
                .as_ref()
                .filter(|(cached_lock, _)| *cached_lock == lock_id)
                .map(|(_, counter)| Arc::clone(counter))
        }) {
            return hit;
        }

        let tid = thread::current().id();
        let counter = self
            .by_thread
            .entry(tid)
            .or_insert_with(|| Arc::new(HoldCounter::default()))
            .clone();

        LAST_TOUCHED.with(|slot| *slot.borrow_mut() = Some((lock_id, Arc::clone(&counter))));
        counter
    }
}

/// Allocates a process-unique id for a new [`crate::MultiLock`], used to key
/// the thread-local hold-counter cache.
pub fn next_lock_id() -> u64 {
    NEXT_LOCK_ID.fetch_add(1, Ordering::Relaxed)
}
