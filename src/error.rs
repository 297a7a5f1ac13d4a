//! Error taxonomy for the auth bootstrap.
//!
//! ERROR HANDLING
//! ==============
//! Errors raised on protected pages are converted into a trust verdict by the
//! verifier and never reach the UI. Errors raised by the login flow are
//! returned to the caller verbatim so the form can render them.

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable machine-readable code plus retry hint for a displayable error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// AUTH ERROR
// =============================================================================

/// Errors surfaced by the session adapter and the login flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No identity configuration could be resolved from any source.
    #[error("authentication is not configured; refresh the page and try again")]
    ConfigUnavailable,

    /// The session adapter was used before `configure` succeeded.
    #[error("session store used before configuration")]
    NotConfigured,

    /// Transient failure talking to the identity provider.
    #[error("{0}")]
    Network(String),

    /// The identity provider rejected the credentials.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Login succeeded but the follow-up session check did not confirm it.
    #[error("signed in, but the session could not be established; please try again")]
    SessionNotEstablished,

    /// Form input failed local validation.
    #[error("{0}")]
    InvalidInput(&'static str),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigUnavailable => "E_CONFIG_UNAVAILABLE",
            Self::NotConfigured => "E_NOT_CONFIGURED",
            Self::Network(_) => "E_NETWORK",
            Self::InvalidCredentials(_) => "E_INVALID_CREDENTIALS",
            Self::SessionNotEstablished => "E_SESSION_NOT_ESTABLISHED",
            Self::InvalidInput(_) => "E_INVALID_INPUT",
        }
    }

    /// `ConfigUnavailable` needs a page refresh, so an immediate retry is pointless.
    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::InvalidCredentials(_) | Self::SessionNotEstablished | Self::InvalidInput(_)
        )
    }
}

// =============================================================================
// CONFIG ERROR
// =============================================================================

/// Failures fetching the remote config document. Swallowed by the bootstrapper.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response.
    #[error("config request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("config request failed: status {0}")]
    Status(u16),

    /// The body was not a valid config document.
    #[error("config parse failed: {0}")]
    Parse(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_CONFIG_REQUEST",
            Self::Status(_) => "E_CONFIG_STATUS",
            Self::Parse(_) => "E_CONFIG_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status(429 | 500..=599))
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
