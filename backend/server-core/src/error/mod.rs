pub mod config;
pub mod credentials;
pub mod lifecycle;
pub mod liveness;
pub mod network;
pub mod platform;
pub mod process;
pub mod session;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Process(#[from] process::ProcessError),

    #[error(transparent)]
    Lifecycle(#[from] lifecycle::LifecycleError),

    #[error(transparent)]
    Credentials(#[from] credentials::CredentialError),

    #[error(transparent)]
    Session(#[from] session::SessionError),

    #[error(transparent)]
    Network(#[from] network::NetworkError),

    #[error(transparent)]
    Platform(#[from] platform::PlatformError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Model(#[from] models::ModelError),
}
