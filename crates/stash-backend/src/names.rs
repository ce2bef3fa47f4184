//! Key name validation for backends that map keys onto file names.
//!
//! Valid key names:
//! - Must be non-empty
//! - Must not contain path separators (`/`, `\`) or `..`
//! - Must not contain control characters or `:`, `*`, `?`, `"`, `<`, `>`, `|`
//! - Must not start with `.`

use crate::error::{BackendError, BackendResult};

/// Characters that are forbidden anywhere in a key name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Validate a key name, returning `Ok(())` if it can be stored as a file.
///
/// # Examples
///
/// ```
/// use stash_backend::names::validate_key_name;
///
/// assert!(validate_key_name("settings").is_ok());
/// assert!(validate_key_name("user-prefs.v2").is_ok());
/// assert!(validate_key_name("").is_err());
/// assert!(validate_key_name("../escape").is_err());
/// ```
pub fn validate_key_name(key: &str) -> BackendResult<()> {
    let invalid = |reason: String| BackendError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    if key.is_empty() {
        return Err(invalid("key must not be empty".into()));
    }

    if let Some(ch) = key
        .chars()
        .find(|ch| ch.is_control() || FORBIDDEN_CHARS.contains(ch))
    {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }

    if key.contains("..") {
        return Err(invalid("must not contain '..'".into()));
    }

    if key.starts_with('.') {
        return Err(invalid("must not start with '.'".into()));
    }

    Ok(())
}
