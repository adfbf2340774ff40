//! Ref name normalization and validation.
//!
//! Names are hierarchical (`fetch/aapl`, `heads/main`) and map directly onto
//! paths under `refs/`, so anything that could escape that directory or
//! collide with the store's own bookkeeping files is rejected.
//!
//! Valid names:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..`
//! - Must not start or end with `/`, and components must be non-empty
//! - Components must not start with `.`
//! - Must not end with `.` or `.lock`

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Suffix reserved for compare-and-swap lock files.
pub const LOCK_SUFFIX: &str = ".lock";

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Lower-case a ref name and validate it.
///
/// This is the only way names enter the store, so `FETCH/AAPL` and
/// `fetch/aapl` always address the same file.
///
/// ```
/// use cndl_refs::names::normalize_ref_name;
///
/// assert_eq!(normalize_ref_name("FETCH/AAPL").unwrap(), "fetch/aapl");
/// assert!(normalize_ref_name("heads/../escape").is_err());
/// ```
pub fn normalize_ref_name(name: &str) -> Result<String> {
    let name = name.to_lowercase();
    validate_ref_name(&name)?;
    Ok(name)
}

/// Validate an already-normalized ref name.
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "ref name must not be empty"));
    }

    if let Some(ch) = name
        .chars()
        .find(|ch| ch.is_whitespace() || ch.is_control() || FORBIDDEN_CHARS.contains(ch))
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }

    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }

    if name.ends_with(LOCK_SUFFIX) {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }

    Ok(())
}
