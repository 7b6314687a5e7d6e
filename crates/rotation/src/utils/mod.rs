//! Password derivation and credential validation

mod crypto;
mod validation;

pub use crypto::derive_password;
pub use validation::{is_safe_identifier, validate_password, validate_principal, validate_username};
