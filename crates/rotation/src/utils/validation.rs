//! Safe-identifier validation for credentials
//!
//! `CREATE ROLE` and `GRANT ... TO` take identifiers, not bind parameters,
//! so usernames (and the password literal in `CREATE ROLE ... PASSWORD`)
//! reach the database through string construction. Restricting both to
//! `^[A-Za-z0-9_]+$` is the injection defense; this check runs for every
//! principal on every run, before any statement referencing the value is
//! built.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Principal, ValidationError};

static SAFE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9_]+$").expect("hard-coded pattern compiles"));

/// Whether `value` is non-empty and matches `^[A-Za-z0-9_]+$`
#[must_use]
pub fn is_safe_identifier(value: &str) -> bool {
    SAFE_IDENTIFIER.is_match(value)
}

/// Validate a role name against the safe-identifier policy
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if is_safe_identifier(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername {
            username: username.to_string(),
        })
    }
}

/// Validate a password against the safe-identifier policy
///
/// The username is carried for error attribution; the password value itself
/// never appears in the error.
pub fn validate_password(username: &str, password: &str) -> Result<(), ValidationError> {
    if is_safe_identifier(password) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPassword {
            username: username.to_string(),
        })
    }
}

/// Validate both fields of a principal
pub fn validate_principal(principal: &Principal) -> Result<(), ValidationError> {
    validate_username(&principal.username)?;
    validate_password(&principal.username, &principal.password)
}
