//! HTTP error mapping.
//!
//! Handlers return [`AppError`]; every [`DomainError`] converts into one with
//! a fixed status and code. Server-side failures keep their cause as a
//! logged source and show the client a generic message.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use farmlink_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application error returned by handlers.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    /// Logged for 5xx responses, never serialised.
    source: Option<anyhow::Error>,
    /// Respond with no body at all.
    empty: bool,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            source: None,
            empty: false,
        }
    }

    /// Attach an internal cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 400 `VALIDATION_ERROR`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    /// 400 with an empty body, for webhook authentication failures.
    #[must_use]
    pub fn bad_signature() -> Self {
        Self {
            empty: true,
            ..Self::new(StatusCode::BAD_REQUEST, "SIGNATURE_MISMATCH", "")
        }
    }

    /// 500 `INTERNAL_SERVER_ERROR` with a generic message.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) => Self::validation(message),
            DomainError::SlotUnavailable => {
                Self::new(StatusCode::BAD_REQUEST, "SLOT_UNAVAILABLE", "Slot not available")
            }
            DomainError::SignatureMismatch => Self::bad_signature(),
            DomainError::PaymentGateway(cause) => Self::new(
                StatusCode::BAD_GATEWAY,
                "PAYMENT_GATEWAY_ERROR",
                "Payment gateway unavailable, please retry",
            )
            .with_source(cause),
            DomainError::Provider(cause) => {
                Self::new(StatusCode::BAD_REQUEST, "PROVIDER_ERROR", cause.to_string())
            }
            err @ DomainError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            DomainError::InvalidTransition(cause) => {
                Self::new(StatusCode::CONFLICT, "INVALID_TRANSITION", cause.to_string())
            }
            DomainError::Store(cause) => Self::internal().with_source(cause),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(status = %self.status, code = self.code, "Request failed"),
            }
        } else {
            tracing::debug!(status = %self.status, code = self.code, message = %self.message, "Request rejected");
        }

        if self.empty {
            return self.status.into_response();
        }
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmlink_core::{GatewayError, ProviderError, StoreError};

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::Validation("bad".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (DomainError::SlotUnavailable, StatusCode::BAD_REQUEST, "SLOT_UNAVAILABLE"),
            (DomainError::SignatureMismatch, StatusCode::BAD_REQUEST, "SIGNATURE_MISMATCH"),
            (
                DomainError::PaymentGateway(GatewayError::Timeout),
                StatusCode::BAD_GATEWAY,
                "PAYMENT_GATEWAY_ERROR",
            ),
            (
                DomainError::Provider(ProviderError::NotConfigured("OPENWEATHER_API_KEY".into())),
                StatusCode::BAD_REQUEST,
                "PROVIDER_ERROR",
            ),
            (DomainError::not_found("Expert", 3), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                DomainError::Store(StoreError::Database("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
            ),
        ];
        for (domain, status, code) in cases {
            let err = AppError::from(domain);
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = AppError::from(DomainError::Store(StoreError::Database(
            "password authentication failed for user farmlink".into(),
        )));
        assert_eq!(err.to_string(), "[INTERNAL_SERVER_ERROR] An internal error occurred");
    }

    #[test]
    fn gateway_message_is_generic() {
        let err = AppError::from(DomainError::PaymentGateway(GatewayError::Rejected {
            status: 401,
            message: "key_secret invalid".into(),
        }));
        assert!(!err.to_string().contains("key_secret"));
    }
}
