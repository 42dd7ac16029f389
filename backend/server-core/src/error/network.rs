use common::ErrorLocation;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum NetworkError {
    #[error("LAN Address Error: {message} {location}")]
    AddressQuery {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("LAN Address Unavailable: {message} {location}")]
    NoAddress {
        message: String,
        location: ErrorLocation,
    },
}
