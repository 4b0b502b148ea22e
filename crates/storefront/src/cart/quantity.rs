//! Per-row quantity editing.
//!
//! A row moves `Idle → Editing → Submitting → Idle`. Typing only changes the
//! local `buy_count`; a commit (blur, `+`, `-`) sends an update when the new
//! value is in stock range and differs from what the server last reported.

/// What triggered a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    /// `+` button.
    Increase,
    /// `-` button.
    Decrease,
    /// Input lost focus.
    Blur,
}

/// Observable quantity state of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityState {
    /// Local value equals the server value.
    Idle,
    /// Local value edited, nothing sent yet.
    Editing {
        /// Value currently shown.
        value: u32,
    },
    /// Update in flight; the row ignores further commits.
    Submitting {
        /// Value sent to the backend.
        value: u32,
    },
}

impl QuantityState {
    /// Derive the state from a row's flags and values.
    #[must_use]
    pub const fn of(local: u32, server: u32, disabled: bool) -> Self {
        if disabled {
            Self::Submitting { value: local }
        } else if local == server {
            Self::Idle
        } else {
            Self::Editing { value: local }
        }
    }
}

/// Whether `value` may be sent as the new quantity.
///
/// `stock` is the product's available quantity; `server` the last quantity
/// the backend reported for this row.
#[must_use]
pub const fn should_commit(value: u32, stock: u32, server: u32) -> bool {
    value >= 1 && value <= stock && value != server
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_commit_range() {
        assert!(!should_commit(0, 5, 2));
        assert!(should_commit(1, 5, 2));
        assert!(should_commit(5, 5, 2));
        assert!(!should_commit(6, 5, 2));
    }

    #[test]
    fn test_should_commit_requires_change() {
        assert!(!should_commit(2, 5, 2));
    }

    #[test]
    fn test_should_commit_out_of_stock() {
        assert!(!should_commit(1, 0, 3));
    }

    #[test]
    fn test_state_of() {
        assert_eq!(QuantityState::of(2, 2, false), QuantityState::Idle);
        assert_eq!(
            QuantityState::of(3, 2, false),
            QuantityState::Editing { value: 3 }
        );
        assert_eq!(
            QuantityState::of(3, 2, true),
            QuantityState::Submitting { value: 3 }
        );
    }
}
