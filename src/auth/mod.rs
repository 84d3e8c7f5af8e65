//! Authentication and authorization for minidrive.
//!
//! - [`password`]: Argon2id hashing
//! - [`token`]: signed session tokens
//! - [`validation`]: registration input checks
//! - [`registration`]: register and login workflows
//! - [`policy`]: the single place access decisions are made

pub mod password;
pub mod policy;
pub mod registration;
pub mod token;
pub mod validation;

pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use policy::{authorize, enforce, Action, Caller, Decision, Denied, DenyReason};
pub use registration::{login, register, RegistrationRequest};
pub use token::{Claims, TokenError, TokenService};
pub use validation::ValidationError;
