//! Semantic validation of a loaded [`RelayConfig`].

use {secrecy::ExposeSecret, url::Url};

use crate::schema::RelayConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "discord.channel_id"
    pub path: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Check a config for values the relay cannot run with.
pub fn validate(config: &RelayConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let token = config.discord.token.expose_secret();
    if token.is_empty() {
        result.push(Severity::Error, "discord.token", "bot token is required");
    } else if token.contains("${") {
        result.push(
            Severity::Error,
            "discord.token",
            "unresolved environment placeholder",
        );
    }

    let channel_id = config.discord.channel_id.trim();
    if channel_id.is_empty() {
        result.push(Severity::Error, "discord.channel_id", "channel id is required");
    } else if channel_id.parse::<u64>().is_err() {
        result.push(
            Severity::Error,
            "discord.channel_id",
            format!("`{channel_id}` is not a numeric Discord snowflake"),
        );
    }

    match config.callback.url.as_deref().map(str::trim) {
        None | Some("") => result.push(
            Severity::Warning,
            "callback.url",
            "no callback url configured, scene forwarding is disabled",
        ),
        Some(raw) => match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {},
            Ok(url) => result.push(
                Severity::Error,
                "callback.url",
                format!("unsupported scheme `{}`", url.scheme()),
            ),
            Err(e) => result.push(Severity::Error, "callback.url", format!("invalid url: {e}")),
        },
    }

    if config.callback.timeout_secs == 0 {
        result.push(
            Severity::Error,
            "callback.timeout_secs",
            "timeout must be at least one second",
        );
    }

    if config.requests.channel_capacity == 0 {
        result.push(
            Severity::Error,
            "requests.channel_capacity",
            "channel capacity must be at least 1",
        );
    }

    result
}
