//! Error types for the rotation pipeline
//!
//! Two-tier hierarchy: [`RotationError`] is the top-level error attached to
//! one unit of work (a principal, a secret target, a deployment resource),
//! wrapping the phase-specific enums below. Every variant carries the
//! identity needed to diagnose and safely re-run - there is no failure
//! without context.
//!
//! Phase errors hold `reason: String` payloads rather than driver error
//! types so that test doubles can construct them without pulling in sqlx or
//! the AWS SDK.

use thiserror::Error;

/// Top-level pipeline error
#[derive(Debug, Error)]
pub enum RotationError {
    /// A derived credential violated the safe-identifier policy.
    ///
    /// Raised before any external side effect; a single occurrence aborts
    /// the entire run.
    #[error("credential validation failed: {source}")]
    Validation {
        /// Underlying policy violation
        #[source]
        source: ValidationError,
    },

    /// Database-side failure while provisioning one principal
    #[error("provisioning failed for principal '{username}': {source}")]
    Provision {
        /// Principal the transaction was opened for
        username: String,
        /// Underlying database error
        #[source]
        source: ProvisionError,
    },

    /// Secret-store failure for one container/key target
    #[error("secret sync failed for {container}[{key}]: {source}")]
    Secret {
        /// Secret-store document identifier
        container: String,
        /// Field inside the document
        key: String,
        /// Underlying store error
        #[source]
        source: SecretError,
    },

    /// Restart-trigger failure for one deployment resource
    #[error("restart failed for resource '{resource_name}': {source}")]
    Restart {
        /// Deployment resource name
        resource_name: String,
        /// Underlying HTTP error
        #[source]
        source: RestartError,
    },
}

impl From<ValidationError> for RotationError {
    fn from(source: ValidationError) -> Self {
        Self::Validation { source }
    }
}

/// Safe-identifier policy violations
///
/// Usernames and passwords are interpolated into statements that cannot
/// take parameter placeholders (`CREATE ROLE`, `GRANT ... TO`), so both
/// must match `^[A-Za-z0-9_]+$` exactly. Password values are never echoed
/// into error messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Username contains characters outside the allowed class
    #[error("invalid username '{username}': only A-Z, a-z, 0-9 and _ are allowed")]
    InvalidUsername {
        /// The offending username
        username: String,
    },

    /// Password contains characters outside the allowed class
    #[error(
        "invalid password for user '{username}': contains disallowed characters \
         (only A-Z, a-z, 0-9 and _ are allowed)"
    )]
    InvalidPassword {
        /// Principal the password belongs to (the value itself is withheld)
        username: String,
    },
}

/// Database-side provisioning failures
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Connection or authentication failure against the admin cluster
    #[error("connection to admin cluster failed: {reason}")]
    Connection {
        /// Driver-reported reason
        reason: String,
    },

    /// Failure to open or commit the provisioning transaction
    #[error("transaction failed: {reason}")]
    Transaction {
        /// Driver-reported reason
        reason: String,
    },

    /// A single statement inside the transaction failed; the whole
    /// transaction is rolled back
    #[error("statement failed ({statement}): {reason}")]
    Statement {
        /// The statement that failed (identifiers only, never literals)
        statement: String,
        /// Driver-reported reason
        reason: String,
    },
}

/// Secret-store synchronization failures
#[derive(Debug, Error)]
pub enum SecretError {
    /// Network or permission failure fetching the document
    #[error("failed to fetch secret document: {reason}")]
    FetchFailed {
        /// Store-reported reason
        reason: String,
    },

    /// Document does not exist or has no well-formed JSON object payload
    #[error("secret document missing or malformed: {reason}")]
    MalformedDocument {
        /// What was wrong with the payload
        reason: String,
    },

    /// Serialization failure of the merged document
    #[error("failed to encode merged secret document: {reason}")]
    EncodeFailed {
        /// Serializer-reported reason
        reason: String,
    },

    /// Write of the merged document failed
    #[error("failed to write secret document: {reason}")]
    WriteFailed {
        /// Store-reported reason
        reason: String,
    },
}

/// Deployment restart-trigger failures
#[derive(Debug, Error)]
pub enum RestartError {
    /// The configured endpoint URL could not be parsed
    #[error("invalid restart endpoint '{url}': {reason}")]
    InvalidEndpoint {
        /// Configured base URL
        url: String,
        /// Parser-reported reason
        reason: String,
    },

    /// The request never produced an HTTP response
    #[error("restart request failed: {reason}")]
    Request {
        /// Client-reported reason
        reason: String,
    },

    /// The endpoint answered with a non-2xx status; not retried
    #[error("restart rejected with HTTP status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
    },
}
