//! Deterministic multiplexer session names.
//!
//! Session names end up as tmux targets and shell arguments, so the ids they
//! are built from are restricted to ASCII letters, digits, `-` and `_`. Path
//! separators, dots and tmux's `:` target separator are all rejected.

use crate::ToolVariant;
use crate::error::SessionNameError;
use crate::patterns::profile;

pub const MAX_SESSION_ID_LEN: usize = 64;

pub const DEFAULT_SESSION_PREFIX: &str = "pw";

/// Check that `id` is safe to embed in a session name.
pub fn validate_session_id(id: &str) -> Result<(), SessionNameError> {
    if id.is_empty() {
        return Err(SessionNameError::Empty);
    }
    if id.len() > MAX_SESSION_ID_LEN {
        return Err(SessionNameError::TooLong {
            max: MAX_SESSION_ID_LEN,
        });
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !id.chars().all(allowed) || id.starts_with('-') {
        return Err(SessionNameError::InvalidCharacters);
    }
    Ok(())
}

/// Builds `<prefix>-<tool tag>-<session id>` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNaming {
    prefix: String,
}

impl Default for SessionNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_SESSION_PREFIX.to_string(),
        }
    }
}

impl SessionNaming {
    /// The prefix obeys the same rules as session ids.
    pub fn new(prefix: impl Into<String>) -> Result<Self, SessionNameError> {
        let prefix = prefix.into();
        validate_session_id(&prefix)?;
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn session_name(&self, session_id: &str, tool: ToolVariant) -> Result<String, SessionNameError> {
        validate_session_id(session_id)?;
        Ok(format!(
            "{}-{}-{}",
            self.prefix,
            profile(tool).session_tag,
            session_id
        ))
    }
}

/// Session name with the default prefix.
pub fn session_name(session_id: &str, tool: ToolVariant) -> Result<String, SessionNameError> {
    SessionNaming::default().session_name(session_id, tool)
}
