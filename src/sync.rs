//! The synchronizer (C3): admission rules, state transitions, and the
//! waiter queue. This is the core of the lock; everything else is
//! bookkeeping around it.

use std::sync::atomic::Ordering;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

/// Bounds how long a blocked acquirer sleeps between re-checking its
/// admission predicate, so a notify that lands just before a thread parks
/// is never missed for longer than this.
const RECHECK_INTERVAL: Duration = Duration::from_millis(10);

use crate::error::{LockError, LockResult};
use crate::hold::{HoldCounter, HoldRegistry};
use crate::mode::Mode;
use crate::state::{self, StateWord};

/// Owns the packed state word, the per-thread hold registry, the exclusive
/// owner slot, and the waiter queue for one lock instance.
#[derive(Debug)]
pub struct Synchronizer {
    lock_id: u64,
    state: StateWord,
    holds: HoldRegistry,
    owner: Mutex<Option<ThreadId>>,
    waiters: Mutex<()>,
    wake: Condvar,
    #[cfg(feature = "stats")]
    pub(crate) counters: crate::stats::AtomicLockCounters,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self {
            lock_id: crate::hold::next_lock_id(),
            state: StateWord::new(),
            holds: HoldRegistry::new(),
            owner: Mutex::new(None),
            waiters: Mutex::new(()),
            wake: Condvar::new(),
            #[cfg(feature = "stats")]
            counters: crate::stats::AtomicLockCounters::default(),
        }
    }

    fn my_hold(&self) -> std::sync::Arc<HoldCounter> {
        self.holds.counter_for(self.lock_id)
    }

    pub fn global_count(&self, mode: Mode) -> u16 {
        self.state.field(mode, Ordering::Acquire)
    }

    pub fn held_count(&self, mode: Mode) -> u16 {
        if self.global_count(mode) == 0 {
            return 0;
        }
        self.my_hold().get(mode)
    }

    /// Acquires `mode` for the calling thread, blocking until admitted.
    pub fn acquire(&self, mode: Mode) -> LockResult<()> {
        let tid = thread::current().id();
        let hold = self.my_hold();
        let mut guard = None;

        loop {
            match self.try_admit(mode, tid, &hold) {
                Admission::Admitted => {
                    trace!(thread = ?tid, %mode, "lock admitted");
                    #[cfg(feature = "stats")]
                    self.counters.record_admit(mode);
                    // Exclusive ownership itself is recorded inside try_admit
                    // before the CAS publishes; the hold counter mirrors the
                    // per-thread contribution to every field, X included, so
                    // introspection and the `other = state - hold` subtraction
                    // both see a thread's own reentrant X holds.
                    hold.increment(mode).map_err(|e| {
                        // The CAS already went through; roll the global
                        // field back so accounting stays consistent, then
                        // surface the overflow to the caller.
                        self.state.sub(state::unit(mode), Ordering::AcqRel);
                        e
                    })?;
                    drop(guard);
                    #[cfg(feature = "stats")]
                    self.counters.record_wake(mode);
                    self.wake.notify_all();
                    return Ok(());
                }
                Admission::Blocked => {
                    #[cfg(feature = "stats")]
                    self.counters.record_block(mode);
                    debug!(thread = ?tid, %mode, "lock blocked, parking");
                    // The state word is mutated via CAS without holding
                    // `waiters`, so a release's notify can in principle land
                    // between this thread's failed admission check and the
                    // call to `wait`. Bound that race with a timed wait
                    // instead of an indefinite one: any missed wakeup costs
                    // at most one retry interval, and every retry re-runs
                    // the admission check against fresh state regardless of
                    // whether it was actually woken or just timed out.
                    let g = guard.get_or_insert_with(|| self.waiters.lock());
                    self.wake.wait_for(g, RECHECK_INTERVAL);
                }
                Admission::Overflow => return Err(LockError::overflow(mode)),
            }
        }
    }

    fn try_admit(&self, mode: Mode, tid: ThreadId, hold: &HoldCounter) -> Admission {
        let mut overflowed = false;
        let result = self.state.try_update(|current| {
            let other = current.wrapping_sub(hold.packed());
            let admit = match mode {
                Mode::X => self.admit_x(current, other, tid),
                Mode::IS => field_x(current) == 0 || self.owns_x(tid),
                Mode::IX => {
                    (field_x(current) == 0 || self.owns_x(tid)) && field_s(other) == 0
                }
                Mode::S => {
                    (field_x(current) == 0 || self.owns_x(tid)) && field_ix(other) == 0
                }
            };
            if !admit {
                return None;
            }
            if field(current, mode) == u16::MAX {
                overflowed = true;
                return None;
            }
            Some(current + state::unit(mode))
        });

        if overflowed {
            return Admission::Overflow;
        }
        match result {
            Some(_) => {
                if mode == Mode::X {
                    *self.owner.lock() = Some(tid);
                }
                Admission::Admitted
            }
            None => Admission::Blocked,
        }
    }

    fn admit_x(&self, current: u64, other: u64, tid: ThreadId) -> bool {
        if current == 0 {
            return true;
        }
        if field_x(current) != 0 {
            return self.owns_x(tid);
        }
        // X field is zero; every remaining holder must be `tid` itself.
        field_is(other) == 0 && field_ix(other) == 0 && field_s(other) == 0
    }

    fn owns_x(&self, tid: ThreadId) -> bool {
        *self.owner.lock() == Some(tid)
    }

    /// Releases `mode` for the calling thread.
    pub fn release(&self, mode: Mode) -> LockResult<()> {
        let tid = thread::current().id();
        let hold = self.my_hold();

        if mode == Mode::X {
            {
                let mut owner = self.owner.lock();
                if *owner != Some(tid) {
                    return Err(LockError::NotExclusiveOwner);
                }
                let new = self.state.try_update(|current| {
                    if field_x(current) == 0 {
                        return None;
                    }
                    Some(current - state::unit(Mode::X))
                });
                match new {
                    Some(word) if field_x(word) == 0 => *owner = None,
                    Some(_) => {}
                    None => return Err(LockError::NotExclusiveOwner),
                }
                hold.decrement(Mode::X)?;
            }
            trace!(thread = ?tid, "X released");
            #[cfg(feature = "stats")]
            self.counters.record_wake(Mode::X);
            self.wake.notify_all();
            return Ok(());
        }

        if hold.get(mode) == 0 {
            return Err(LockError::monitor_state(mode));
        }
        hold.decrement(mode)?;
        self.state.sub(state::unit(mode), Ordering::AcqRel);
        trace!(thread = ?tid, %mode, "lock released");
        #[cfg(feature = "stats")]
        self.counters.record_wake(mode);
        self.wake.notify_all();
        Ok(())
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

enum Admission {
    Admitted,
    Blocked,
    Overflow,
}

fn field(word: u64, mode: Mode) -> u16 {
    state::field(word, mode)
}
fn field_is(word: u64) -> u16 {
    state::field(word, Mode::IS)
}
fn field_ix(word: u64) -> u16 {
    state::field(word, Mode::IX)
}
fn field_s(word: u64) -> u16 {
    state::field(word, Mode::S)
}
fn field_x(word: u64) -> u16 {
    state::field(word, Mode::X)
}
