// Unit tests for the browser scripts injected by the session bridge

use crate::session::script::{NOOP_SCRIPT, TOKEN_STORAGE_KEY, token_script};

/// **VALUE**: Verifies the token script writes the token under the key the web UI reads.
///
/// **WHY THIS MATTERS**: The web UI only considers itself logged in when `localStorage.token`
/// holds a valid token. A different key means the user lands on the login page.
///
/// **BUG THIS CATCHES**: Would catch a renamed storage key or a script that forgets to store it.
#[test]
fn given_plain_token_when_token_script_built_then_sets_token_key() {
    // GIVEN: A typical token
    let token = "alist-4f1c2b9e";

    // WHEN: Building the injection script
    let script = token_script(token);

    // THEN: It stores the token under the expected key
    assert_eq!(TOKEN_STORAGE_KEY, "token");
    assert!(
        script.starts_with(r#"localStorage.setItem("token", "alist-4f1c2b9e");"#),
        "Unexpected script: {script}"
    );
}

/// **VALUE**: Verifies every script ends in a harmless trailing expression.
///
/// **WHY THIS MATTERS**: Some webviews report the value of the last expression back to the
/// host; a non-serializable result there is logged as an injection error.
///
/// **BUG THIS CATCHES**: Would catch dropping the trailing `true;`.
#[test]
fn given_token_when_token_script_built_then_ends_with_noop_expression() {
    // GIVEN / WHEN
    let script = token_script("abc");

    // THEN
    assert!(script.ends_with(NOOP_SCRIPT));
    assert_eq!(NOOP_SCRIPT, "true;");
}

/// **VALUE**: Verifies hostile characters in the token cannot break out of the string literal.
///
/// **WHY THIS MATTERS**: The token comes from a CLI's output. Quotes or newlines pasted
/// verbatim into JavaScript would change what the script does.
///
/// **BUG THIS CATCHES**: Would catch building the script with naive `format!("'{token}'")`.
#[test]
fn given_token_with_quotes_and_newline_when_token_script_built_then_escapes_them() {
    // GIVEN: A token containing quote, backslash and newline characters
    let token = "a\"b\\c\nd');alert(1);//";

    // WHEN
    let script = token_script(token);

    // THEN: The value is a valid, escaped JSON string literal
    assert!(script.contains(r#""a\"b\\c\nd');alert(1);//""#), "Unexpected script: {script}");
    assert_eq!(script.lines().count(), 2, "Token must not add lines: {script}");
}
