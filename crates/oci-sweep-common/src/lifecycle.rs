//! Provider lifecycle-state constants
//!
//! Discovery only returns resources that are still alive. Anything already
//! gone, or already on its way out, is excluded so that the teardown never
//! spends an attempt on it.

/// Resource has been terminated (compute-style resources)
pub const TERMINATED: &str = "TERMINATED";

/// Resource is being terminated
pub const TERMINATING: &str = "TERMINATING";

/// Resource has been deleted
pub const DELETED: &str = "DELETED";

/// Resource is being deleted
pub const DELETING: &str = "DELETING";

/// Resource is waiting for a scheduled deletion to elapse
pub const PENDING_DELETION: &str = "PENDING_DELETION";

/// Resource is in the process of scheduling its deletion
pub const SCHEDULING_DELETION: &str = "SCHEDULING_DELETION";

/// Resource is active
pub const ACTIVE: &str = "ACTIVE";

/// States excluded from the search query.
///
/// This is the set the search capability is asked to filter on; it mirrors
/// what the provider considers "already gone or going away".
pub const SEARCH_EXCLUDED_STATES: &[&str] = &[TERMINATED, DELETED, DELETING, TERMINATING];

/// States excluded when listing kinds directly.
///
/// Direct listings also surface keys and vaults that are already waiting on
/// a scheduled deletion, so those are dropped as well.
pub const LIST_EXCLUDED_STATES: &[&str] = &[
    TERMINATED,
    DELETED,
    DELETING,
    TERMINATING,
    PENDING_DELETION,
    SCHEDULING_DELETION,
];

/// Check whether a lifecycle state means the resource is gone or going away.
pub fn is_terminal(state: &str) -> bool {
    LIST_EXCLUDED_STATES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(is_terminal("TERMINATED"));
        assert!(is_terminal("deleting"));
        assert!(is_terminal("PENDING_DELETION"));
        assert!(!is_terminal("ACTIVE"));
        assert!(!is_terminal("AVAILABLE"));
        assert!(!is_terminal(""));
    }

    #[test]
    fn test_search_states_are_terminal() {
        for state in SEARCH_EXCLUDED_STATES {
            assert!(is_terminal(state), "{state} should be terminal");
        }
    }
}
