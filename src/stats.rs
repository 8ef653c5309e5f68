//! Introspection (C6): read-only hold counts, and, under the `stats`
//! feature, cumulative admit/block/wake counters per mode.

use crate::mode::Mode;
use crate::multilock::MultiLock;

/// A snapshot of global and current-thread hold counts for every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSnapshot {
    pub global_is: u16,
    pub global_ix: u16,
    pub global_s: u16,
    pub global_x: u16,
    pub held_is: u16,
    pub held_ix: u16,
    pub held_s: u16,
    pub held_x: u16,
}

/// Reads a full [`HoldSnapshot`] off `lock` for the calling thread.
pub fn snapshot(lock: &MultiLock) -> HoldSnapshot {
    HoldSnapshot {
        global_is: lock.global_count(Mode::IS),
        global_ix: lock.global_count(Mode::IX),
        global_s: lock.global_count(Mode::S),
        global_x: lock.global_count(Mode::X),
        held_is: lock.held_count(Mode::IS),
        held_ix: lock.held_count(Mode::IX),
        held_s: lock.held_count(Mode::S),
        held_x: lock.held_count(Mode::X),
    }
}

#[cfg(feature = "stats")]
mod counters {
    use std::sync::atomic::{AtomicU64, Ordering};

    use serde::Serialize;

    use crate::mode::Mode;

    #[derive(Debug, Default)]
    pub struct AtomicLockCounters {
        admits: [AtomicU64; 4],
        blocks: [AtomicU64; 4],
        wakes: [AtomicU64; 4],
    }

    fn index(mode: Mode) -> usize {
        match mode {
            Mode::IS => 0,
            Mode::IX => 1,
            Mode::S => 2,
            Mode::X => 3,
        }
    }

    impl AtomicLockCounters {
        pub fn record_admit(&self, mode: Mode) {
            self.admits[index(mode)].fetch_add(1, Ordering::Relaxed);
        }

        pub fn record_block(&self, mode: Mode) {
            self.blocks[index(mode)].fetch_add(1, Ordering::Relaxed);
        }

        /// Records a broadcast wake triggered by an admit or release of `mode`.
        pub fn record_wake(&self, mode: Mode) {
            self.wakes[index(mode)].fetch_add(1, Ordering::Relaxed);
        }

        pub fn snapshot(&self) -> LockStats {
            LockStats {
                admits_is: self.admits[0].load(Ordering::Relaxed),
                admits_ix: self.admits[1].load(Ordering::Relaxed),
                admits_s: self.admits[2].load(Ordering::Relaxed),
                admits_x: self.admits[3].load(Ordering::Relaxed),
                blocks_is: self.blocks[0].load(Ordering::Relaxed),
                blocks_ix: self.blocks[1].load(Ordering::Relaxed),
                blocks_s: self.blocks[2].load(Ordering::Relaxed),
                blocks_x: self.blocks[3].load(Ordering::Relaxed),
                wakes_is: self.wakes[0].load(Ordering::Relaxed),
                wakes_ix: self.wakes[1].load(Ordering::Relaxed),
                wakes_s: self.wakes[2].load(Ordering::Relaxed),
                wakes_x: self.wakes[3].load(Ordering::Relaxed),
            }
        }
    }

    /// Cumulative admit/block/wake counts per mode, serializable for
    /// external monitoring. Gated behind `stats` so the hot path pays
    /// nothing for it by default.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct LockStats {
        pub admits_is: u64,
        pub admits_ix: u64,
        pub admits_s: u64,
        pub admits_x: u64,
        pub blocks_is: u64,
        pub blocks_ix: u64,
        pub blocks_s: u64,
        pub blocks_x: u64,
        pub wakes_is: u64,
        pub wakes_ix: u64,
        pub wakes_s: u64,
        pub wakes_x: u64,
    }
}

#[cfg(feature = "stats")]
pub use counters::{AtomicLockCounters, LockStats};
