use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Failure of a single call to the upstream listings API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream responded with {status}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("malformed upstream response: {0}")]
    Decode(String),

    #[error("unusable access token: {0}")]
    Token(String),
}

impl UpstreamError {
    /// Whether a retry of an idempotent call might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Timeout | UpstreamError::Transport(_) => true,
            UpstreamError::Status { status, .. } => matches!(
                *status,
                reqwest::StatusCode::BAD_GATEWAY
                    | reqwest::StatusCode::SERVICE_UNAVAILABLE
                    | reqwest::StatusCode::GATEWAY_TIMEOUT
            ),
            UpstreamError::Decode(_) | UpstreamError::Token(_) => false,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err)
        }
    }
}

/// Errors surfaced at the route-handler boundary.
///
/// Every variant except `Config` becomes a redirect; causes are logged and
/// never rendered to the browser.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("authentication failed: {0}")]
    Auth(#[source] UpstreamError),

    #[error("listings fetch failed: {0}")]
    Fetch(#[source] UpstreamError),

    #[error("listing creation failed: {0}")]
    Create(#[source] UpstreamError),

    #[error("rejected form submission: {reason}")]
    InvalidForm {
        redirect_to: &'static str,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl FrontendError {
    /// Page the browser is sent back to.
    pub fn fallback(&self) -> Option<&'static str> {
        match self {
            FrontendError::Auth(_) | FrontendError::Fetch(_) => Some("/"),
            FrontendError::Create(_) => Some("/add"),
            FrontendError::InvalidForm { redirect_to, .. } => Some(*redirect_to),
            FrontendError::Config(_) => None,
        }
    }
}

impl IntoResponse for FrontendError {
    fn into_response(self) -> Response {
        match self.fallback() {
            Some(target) => {
                match &self {
                    FrontendError::InvalidForm { .. } => {
                        tracing::warn!(error = %self, redirect_to = target, "Request rejected")
                    }
                    FrontendError::Auth(UpstreamError::Status { status, .. })
                        if status.is_client_error() =>
                    {
                        tracing::warn!(error = %self, redirect_to = target, "Login refused by upstream")
                    }
                    _ => tracing::error!(error = %self, redirect_to = target, "Upstream call failed"),
                }
                Redirect::to(target).into_response()
            }
            None => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    fn status(code: reqwest::StatusCode) -> UpstreamError {
        UpstreamError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn failures_redirect_to_their_fallback() {
        let cases = [
            (FrontendError::Auth(status(reqwest::StatusCode::UNAUTHORIZED)), "/"),
            (FrontendError::Fetch(UpstreamError::Timeout), "/"),
            (FrontendError::Create(status(reqwest::StatusCode::BAD_REQUEST)), "/add"),
        ];

        for (error, expected) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers().get(LOCATION).unwrap(), expected);
        }
    }

    #[test]
    fn upstream_body_is_not_rendered() {
        let error = FrontendError::Fetch(UpstreamError::Status {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "stack trace from upstream".to_string(),
        });

        assert!(!error.to_string().contains("stack trace"));
    }

    #[test]
    fn only_gateway_failures_are_transient() {
        assert!(UpstreamError::Timeout.is_transient());
        assert!(status(reqwest::StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(!status(reqwest::StatusCode::UNAUTHORIZED).is_transient());
        assert!(!UpstreamError::Decode("eof".to_string()).is_transient());
    }
}
