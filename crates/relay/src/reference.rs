//! Request references embedded in prompt text.
//!
//! The requester prefixes every prompt with `<<request-id>>`; the image bot
//! echoes the prompt in each of its messages, which is how events are tied
//! back to the request that caused them.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const OPEN: &str = "<<";
const CLOSE: &str = ">>";

/// Opaque identifier of one outstanding generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for RequestId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Prefix a prompt with its request reference.
#[must_use]
pub fn wrap_reference(id: &RequestId, prompt: &str) -> String {
    format!("{OPEN}{id}{CLOSE} {}", prompt.trim())
}

/// Recover the request id from message text.
///
/// Returns the id and the text with the reference removed.
pub fn parse_reference(text: &str) -> Result<(RequestId, String)> {
    let start = text.find(OPEN).ok_or(Error::MalformedReference {
        reason: "missing opening marker",
    })?;
    let after_open = &text[start + OPEN.len()..];
    let len = after_open.find(CLOSE).ok_or(Error::MalformedReference {
        reason: "missing closing marker",
    })?;

    let id = after_open[..len].trim();
    if id.is_empty() {
        return Err(Error::MalformedReference {
            reason: "empty request id",
        });
    }

    let before = &text[..start];
    let after = after_open[len + CLOSE.len()..].trim_start();
    let remainder = format!("{before}{after}").trim().to_string();

    Ok((RequestId::new(id), remainder))
}
