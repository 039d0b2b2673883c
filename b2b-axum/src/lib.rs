//! b2b-axum: mounts `B2BApp` services as REST routes on an axum router.

pub mod app;
pub mod context;
pub mod rest;
mod error;

pub use error::B2BAxumError;

pub use app::{axum, AxumApp, REQUEST_ID_HEADER};
pub use context::context_from_headers;
