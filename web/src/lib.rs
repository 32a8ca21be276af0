//! HTTP API for the FarmLink marketplace.
//!
//! Handlers are thin: they decode the request, call one runtime service and
//! encode the result. All error translation happens in [`AppError`].
//!
//! # Example
//!
//! ```ignore
//! let state = AppState::new(services).with_metrics(prometheus);
//! let app = farmlink_web::router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extract::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id};
pub use router::router;
pub use state::AppState;
