//! Core types, run context, and error hierarchy

mod context;
mod error;
mod user;

pub use context::{ClusterConfig, RotationRun};
pub use error::{
    ProvisionError, RestartError, RotationError, SecretError, ValidationError,
};
pub use user::{DatabaseGrant, Deployment, Principal, SecretTarget, ServiceUser};
