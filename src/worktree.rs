//! Worktree id validation for request handlers.
//!
//! Checked in two stages: the id must be well-formed before anything looks
//! it up, so a malformed id never reaches the existence check.

use crate::terminal::validate_session_id;

/// Format check only. Worktree ids follow the session id rules.
pub fn is_valid_worktree_id_format(id: &str) -> bool {
    validate_session_id(id).is_ok()
}

/// Format check, then `exists`.
pub fn is_valid_worktree_id(id: &str, exists: impl Fn(&str) -> bool) -> bool {
    is_valid_worktree_id_format(id) && exists(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_format_rejects_traversal() {
        assert!(is_valid_worktree_id_format("feature-login_2"));
        assert!(!is_valid_worktree_id_format("../main"));
        assert!(!is_valid_worktree_id_format(""));
    }

    #[test]
    fn test_lookup_skipped_for_bad_format() {
        let calls = Cell::new(0);
        let exists = |_: &str| {
            calls.set(calls.get() + 1);
            true
        };
        assert!(!is_valid_worktree_id("a/b", exists));
        assert_eq!(calls.get(), 0);
        assert!(is_valid_worktree_id("wt1", exists));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unknown_id_is_invalid() {
        assert!(!is_valid_worktree_id("wt1", |id| id == "wt2"));
    }
}
