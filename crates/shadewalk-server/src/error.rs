//! Request-level error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

/// Longest upstream body excerpt quoted back to clients or logs.
pub const UPSTREAM_EXCERPT_MAX: usize = 200;

#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Malformed input; rejected before any provider call.
    #[error("{0}")]
    Validation(String),

    /// The primary route request failed; no usable geometry exists.
    #[error("Route optimization failed: {0}")]
    RouteProvider(String),

    /// Generation produced zero candidates.
    #[error("No walking routes found between the selected points.")]
    NoRoutes,
}

impl OptimizeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RouteProvider(_) | Self::NoRoutes => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Failure talking to an upstream provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport or decode failure from the HTTP client.
    #[error("{0}")]
    Transport(String),

    /// Non-success response, quoted with a bounded body excerpt.
    #[error("HTTP {status}: {excerpt}")]
    Upstream {
        status: reqwest::StatusCode,
        excerpt: String,
    },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Truncate an upstream message so internal details are never echoed
/// verbatim past a bounded excerpt.
pub fn bounded_excerpt(message: &str) -> String {
    if message.len() <= UPSTREAM_EXCERPT_MAX {
        return message.to_string();
    }
    let mut end = UPSTREAM_EXCERPT_MAX;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}
