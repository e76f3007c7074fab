//! Confirmation hooks for destructive steps

use super::discovery::Discovered;

/// Asks whoever drives the run before anything is mutated.
///
/// Implementations block; the CLI reads from stdin.
pub trait Confirmer: Send + Sync {
    /// Delete everything in `discovered`?
    fn confirm_teardown(&self, discovered: &Discovered) -> bool;

    /// Delete the scope container itself?
    fn confirm_scope_deletion(&self, scope: &str) -> bool;
}

/// Confirms everything. Used for forced and non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm_teardown(&self, _discovered: &Discovered) -> bool {
        true
    }

    fn confirm_scope_deletion(&self, _scope: &str) -> bool {
        true
    }
}
