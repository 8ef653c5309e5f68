//! The four primitive lock modes and the bit-packing units they occupy
//! in the state word (see [`crate::state`]).

use std::fmt;

/// One of the four primitive multi-granularity lock modes.
///
/// SIX is intentionally absent here: it is not a distinct admission path,
/// only the simultaneous hold of [`Mode::S`] and [`Mode::IX`] by one thread.
/// See [`crate::MultiLock::lock_six`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Intention-Shared: declares intent to acquire S on some descendant.
    IS,
    /// Intention-Exclusive: declares intent to acquire X or SIX on some descendant.
    IX,
    /// Shared: read lock.
    S,
    /// Exclusive: write lock.
    X,
}

impl Mode {
    /// All primitive modes, in state-word field order (X is most significant).
    pub const ALL: [Mode; 4] = [Mode::IS, Mode::IX, Mode::S, Mode::X];

    /// The intention mode a parent must hold while a child holds `self`.
    ///
    /// S and IS cascade to IS on the parent; IX and X cascade to IX.
    pub fn parent_intention(self) -> Mode {
        match self {
            Mode::IS | Mode::S => Mode::IS,
            Mode::IX | Mode::X => Mode::IX,
        }
    }

    /// Whether this mode's admission is exclusive (single holder) rather than shared.
    pub fn is_exclusive(self) -> bool {
        matches!(self, Mode::X)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::IS => "IS",
            Mode::IX => "IX",
            Mode::S => "S",
            Mode::X => "X",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_intention_cascades() {
        assert_eq!(Mode::S.parent_intention(), Mode::IS);
        assert_eq!(Mode::IS.parent_intention(), Mode::IS);
        assert_eq!(Mode::X.parent_intention(), Mode::IX);
        assert_eq!(Mode::IX.parent_intention(), Mode::IX);
    }

    #[test]
    fn only_x_is_exclusive() {
        assert!(Mode::X.is_exclusive());
        assert!(!Mode::S.is_exclusive());
        assert!(!Mode::IX.is_exclusive());
        assert!(!Mode::IS.is_exclusive());
    }
}
