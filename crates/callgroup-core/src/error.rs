//! Error types for the node wiring layer
//!
//! The group registry itself reports no failures: lookups return
//! `Option`, removal of an absent waitable is a no-op, registration
//! always succeeds. The only failure mode lives at the wiring boundary,
//! where a caller hands a group to a node that does not own it.

use core::fmt;

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors raised by the node wiring interfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiringError {
    /// The target callback group was not created by this node
    ForeignGroup,
}

impl fmt::Display for WiringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WiringError::ForeignGroup => {
                write!(f, "callback group was not created by this node")
            }
        }
    }
}

impl std::error::Error for WiringError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = WiringError::ForeignGroup;
        assert_eq!(
            format!("{}", e),
            "callback group was not created by this node"
        );
    }
}
