//! Error taxonomy for the marketplace.
//!
//! [`DomainError`] is what services return to the API boundary. The narrower
//! errors ([`StoreError`], [`GatewayError`], [`ProviderError`]) are produced by
//! the environment implementations and folded into it.

use crate::lifecycle::TransitionError;
use thiserror::Error;

/// Errors surfaced by marketplace operations.
///
/// Each variant maps to exactly one HTTP status class at the API boundary.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested slot does not exist, belongs to another expert, or was
    /// already booked (possibly by a concurrent request).
    #[error("Slot not available")]
    SlotUnavailable,

    /// Webhook signature missing or wrong. Carries no detail on purpose.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// The payment gateway failed to create an order.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(#[from] GatewayError),

    /// An upstream provider (weather, meeting, email) failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A referenced entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A booking was asked to make a transition its status forbids.
    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    /// The persistence layer failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Shorthand for a [`DomainError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Persistence failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Database connection or query failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A row could not be mapped into a domain type.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A write violated a relational constraint.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Payment gateway failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Gateway credentials are not configured.
    #[error("Payment gateway credentials not configured")]
    NotConfigured,

    /// Gateway did not answer within the configured timeout.
    #[error("Payment gateway timeout")]
    Timeout,

    /// Transport-level failure.
    #[error("Payment gateway request failed: {0}")]
    Request(String),

    /// Gateway answered with a non-success status.
    #[error("Payment gateway returned HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body or description
        message: String,
    },

    /// Gateway response could not be decoded.
    #[error("Invalid payment gateway response: {0}")]
    InvalidResponse(String),
}

/// Failures of the weather, meeting and email collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Required credential is missing.
    #[error("{0} not configured")]
    NotConfigured(String),

    /// Provider did not answer within the configured timeout.
    #[error("{provider} timed out")]
    Timeout {
        /// Provider name
        provider: String,
    },

    /// Transport-level failure.
    #[error("{provider} request failed: {message}")]
    Request {
        /// Provider name
        provider: String,
        /// Failure description
        message: String,
    },

    /// Provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}")]
    Http {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
    },

    /// Provider response could not be decoded or was missing fields.
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse {
        /// Provider name
        provider: String,
        /// Failure description
        message: String,
    },

    /// Email could not be built or delivered.
    #[error("Email delivery failed: {0}")]
    Email(String),
}

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, DomainError>;
