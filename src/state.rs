//! The packed atomic state word (C1): four 16-bit hold counters in one
//! `AtomicU64`, one per primitive [`Mode`].
//!
//! A single compare-and-swap validates the full admission condition against
//! a consistent snapshot. Four separate atomics would need a protecting lock
//! or an ABA-hardened protocol of their own; packing sidesteps that.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::mode::Mode;

pub const IS_UNIT: u64 = 0x0000_0000_0000_0001;
pub const IX_UNIT: u64 = 0x0000_0000_0001_0000;
pub const S_UNIT: u64 = 0x0000_0001_0000_0000;
pub const X_UNIT: u64 = 0x0001_0000_0000_0000;

const FIELD_MASK: u64 = 0xFFFF;

/// Returns the bit-packing unit for one increment of `mode`.
pub fn unit(mode: Mode) -> u64 {
    match mode {
        Mode::IS => IS_UNIT,
        Mode::IX => IX_UNIT,
        Mode::S => S_UNIT,
        Mode::X => X_UNIT,
    }
}

/// Extracts the 16-bit field for `mode` out of a packed word.
pub fn field(word: u64, mode: Mode) -> u16 {
    let shift = match mode {
        Mode::IS => 0,
        Mode::IX => 16,
        Mode::S => 32,
        Mode::X => 48,
    };
    ((word >> shift) & FIELD_MASK) as u16
}

/// Packed representation of the lock's global hold counters.
///
/// Bits 63..48 = X, 47..32 = S, 31..16 = IX, 15..0 = IS.
#[derive(Debug, Default)]
pub struct StateWord(AtomicU64);

impl StateWord {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn load(&self, order: Ordering) -> u64 {
        self.0.load(order)
    }

    pub fn field(&self, mode: Mode, order: Ordering) -> u16 {
        field(self.load(order), mode)
    }

    /// Attempts `current + delta`, retrying on contention until it succeeds
    /// or `admit` rejects the freshly observed value.
    ///
    /// `admit` is re-evaluated on every retry so a CAS loss never commits a
    /// stale admission decision.
    pub fn try_update<F>(&self, mut admit: F) -> Option<u64>
    where
        F: FnMut(u64) -> Option<u64>,
    {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let next = admit(current)?;
            match self.0.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(next),
                Err(observed) => current = observed,
            }
        }
    }

    /// Unconditionally adds `delta` to the packed word. Used on release paths
    /// where the field being decremented is known-held by the caller and
    /// cannot race with itself.
    pub fn add(&self, delta: u64, order: Ordering) -> u64 {
        self.0.fetch_add(delta, order).wrapping_add(delta)
    }

    /// Unconditionally subtracts `delta` from the packed word.
    pub fn sub(&self, delta: u64, order: Ordering) -> u64 {
        self.0.fetch_sub(delta, order).wrapping_sub(delta)
    }
}
