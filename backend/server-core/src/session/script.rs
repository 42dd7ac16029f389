//! Scripts injected into the embedded browser.

/// Key the web UI reads its auth token from in `localStorage`.
pub const TOKEN_STORAGE_KEY: &str = "token";

/// Injected when no token could be fetched; the page loads unauthenticated.
pub const NOOP_SCRIPT: &str = "true;";

/// Script storing `token` in the page's persistent storage.
///
/// Both key and value are emitted as JSON string literals, so a token can
/// never terminate the literal and inject code of its own.
pub fn token_script(token: &str) -> String {
    format!(
        "localStorage.setItem({key}, {value});\ntrue;",
        key = js_string(TOKEN_STORAGE_KEY),
        value = js_string(token),
    )
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}
