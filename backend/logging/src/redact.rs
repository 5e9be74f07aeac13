//! Log Redaction Layer
//!
//! Scrubs API keys and access tokens from strings prior to logging or
//! returning them to callers.

use regex::Regex;
use std::sync::LazyLock;

static GOOGLE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIza[0-9A-Za-z\-_]{35}").unwrap());
static KEY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&](?:key|api_key)=)[^&\s]+").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = KEY_PARAM_RE.replace_all(input, "${1}[REDACTED]").to_string();

    redacted = GOOGLE_KEY_RE
        .replace_all(&redacted, "[REDACTED_KEY]")
        .to_string();

    // Redact API keys and bearer tokens
    redacted = API_KEY_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .to_string();

    redacted
}
