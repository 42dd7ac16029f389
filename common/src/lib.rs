//! Shared primitives for the AList server shell.
//!
//! Everything here is dependency-light and used by every other crate:
//!
//! - **common** (this crate): error locations, secret handling, status codes
//! - **models**: plain data passed between layers
//! - **server-core**: lifecycle, credentials, network identity, session bridge
//! - **alist-server**: the Tauri host wiring everything together

pub mod error;
pub mod http_status;
pub mod redacted_secret;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;
