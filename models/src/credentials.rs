use common::RedactedSecret;

/// Admin account of the embedded server.
///
/// Only meaningful while the server is running; consumers drop it on stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: RedactedSecret,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<RedactedSecret>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}
