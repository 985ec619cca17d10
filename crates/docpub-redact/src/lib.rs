//! Secret scrubbing for docpub.
//!
//! This crate provides the redaction primitives used everywhere docpub
//! surfaces text that may contain a credential: captured command output,
//! error messages, and operator-facing diagnostics.
//!
//! # Example
//!
//! ```
//! use docpub_redact::{Secret, scrub};
//!
//! let token = Secret::new("s3cr3t");
//! let diag = "fatal: unable to access 'https://s3cr3t@github.com/acme/widget.git'";
//! let clean = scrub(token.expose(), diag);
//! assert!(!clean.contains("s3cr3t"));
//! ```

use std::fmt;

/// Placeholder substituted for every scrubbed value.
pub const PLACEHOLDER: &str = "[REDACTED]";

/// A credential that must never appear in logs or error messages.
///
/// `Debug` prints the placeholder instead of the value, and there is
/// deliberately no `Display` implementation. Code that needs the raw value
/// (e.g. to embed it in a push URL) calls [`Secret::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Callers own the obligation not to log it.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every occurrence of this secret inside `text`.
    pub fn scrub_from(&self, text: &str) -> String {
        scrub(&self.0, text)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({PLACEHOLDER})")
    }
}

/// Replace every occurrence of the literal `secret` in `text` with
/// [`PLACEHOLDER`].
///
/// An empty secret is a no-op: replacing the empty string would mangle the
/// text without protecting anything.
pub fn scrub(secret: &str, text: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, PLACEHOLDER)
}

/// Redact credential-shaped patterns from output strings.
///
/// This is the defense-in-depth pass applied to the final error path: it
/// catches secrets we never held as a value, such as a token echoed back by
/// a remote inside an URL. Handles `Authorization: Bearer` headers,
/// `token = "..."` and `<NAME>_TOKEN=...` assignments, and userinfo
/// embedded in URLs.
pub fn scrub_patterns(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, line) in s.lines().enumerate() {
        if i > 0 {
            result.push('\n');
        }
        result.push_str(&scrub_line(line));
    }
    if s.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn scrub_line(line: &str) -> String {
    let mut out = line.to_string();

    // `Authorization: Bearer <token>` headers. Redact to end of line.
    let lower = out.to_lowercase();
    if let Some(pos) = lower.find("bearer ") {
        let start = pos + "bearer ".len();
        if start < out.len() {
            out = format!("{}{}", &out[..start], PLACEHOLDER);
        }
    }

    // Userinfo in URLs: `scheme://user@host/...`.
    if let Some(scheme) = out.find("://") {
        let rest_start = scheme + "://".len();
        let rest = &out[rest_start..];
        let path_end = rest.find('/').unwrap_or(rest.len());
        if let Some(at) = rest[..path_end].rfind('@') {
            out = format!("{}{}{}", &out[..rest_start], PLACEHOLDER, &rest[at..]);
        }
    }

    // `token = "..."` and `<NAME>_TOKEN=...` assignments. Only `=` counts:
    // prose like "no auth token found: ..." must survive untouched.
    let lower = out.to_lowercase();
    if let Some(tok_pos) = lower.find("token")
        && let Some(eq_off) = out[tok_pos..].find('=')
    {
        let abs_eq = tok_pos + eq_off;
        let value = out[abs_eq + 1..].trim();
        if !value.is_empty() {
            let quoted = value.starts_with('"');
            out = if quoted {
                format!("{} \"{}\"", &out[..=abs_eq], PLACEHOLDER)
            } else {
                format!("{}{}", &out[..=abs_eq], PLACEHOLDER)
            };
        }
    }

    out
}
