//! Concurrency mode for callback groups

use core::fmt;

/// How callbacks belonging to one group may overlap in time
///
/// The mode is a pure declaration consumed by the executor; the group
/// itself never runs callbacks. Callbacks in `Reentrant` groups must be
/// able to:
///   - run at the same time as themselves
///   - run at the same time as other callbacks in their group
///   - run at the same time as callbacks in other groups
///
/// Whereas callbacks in `Exclusive` groups:
///   - will not be run multiple times simultaneously
///   - will not be run at the same time as other callbacks in their group
///   - may still run at the same time as callbacks in other groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GroupMode {
    /// At most one callback from this group runs at any instant
    Exclusive = 0,

    /// Callbacks from this group may overlap freely, including with themselves
    Reentrant = 1,
}

impl GroupMode {
    /// Check whether the executor must serialize callbacks of this group
    #[inline]
    pub const fn is_exclusive(&self) -> bool {
        matches!(self, GroupMode::Exclusive)
    }

    /// Check whether callbacks of this group may overlap
    #[inline]
    pub const fn is_reentrant(&self) -> bool {
        matches!(self, GroupMode::Reentrant)
    }
}

impl Default for GroupMode {
    fn default() -> Self {
        GroupMode::Exclusive
    }
}

impl From<u8> for GroupMode {
    fn from(v: u8) -> Self {
        match v {
            1 => GroupMode::Reentrant,
            _ => GroupMode::Exclusive, // Default for invalid values
        }
    }
}

impl From<GroupMode> for u8 {
    fn from(mode: GroupMode) -> u8 {
        mode as u8
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMode::Exclusive => write!(f, "exclusive"),
            GroupMode::Reentrant => write!(f, "reentrant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_predicates() {
        assert!(GroupMode::Exclusive.is_exclusive());
        assert!(!GroupMode::Exclusive.is_reentrant());
        assert!(GroupMode::Reentrant.is_reentrant());
        assert!(!GroupMode::Reentrant.is_exclusive());
    }

    #[test]
    fn test_mode_default() {
        assert_eq!(GroupMode::default(), GroupMode::Exclusive);
    }

    #[test]
    fn test_mode_conversions() {
        assert_eq!(GroupMode::from(0u8), GroupMode::Exclusive);
        assert_eq!(GroupMode::from(1u8), GroupMode::Reentrant);
        // Invalid values fall back to the default
        assert_eq!(GroupMode::from(7u8), GroupMode::Exclusive);

        let raw: u8 = GroupMode::Reentrant.into();
        assert_eq!(raw, 1);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(format!("{}", GroupMode::Exclusive), "exclusive");
        assert_eq!(format!("{}", GroupMode::Reentrant), "reentrant");
    }
}
