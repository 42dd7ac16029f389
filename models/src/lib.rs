//! Domain models for the AList server shell.
//!
//! Pure data: the server run-state, admin credentials, network identity and
//! the loopback endpoint. Behaviour lives in `server-core`.

pub mod access_info;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod network;
pub mod server_state;

#[cfg(test)]
mod tests;

pub use access_info::AccessInfo;
pub use common::ErrorLocation;
pub use credentials::Credentials;
pub use endpoint::ServerEndpoint;
pub use endpoint::builder::ServerEndpointBuilder;
pub use error::model_error::ModelError;
pub use network::{
    ConnectivityEvent, ConnectivityKind, IdentityKind, NetworkIdentity, UNREACHABLE_ADDRESS,
    WebConnectionReport,
};
pub use server_state::ServerState;
