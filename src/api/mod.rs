//! Thin client for the platform's tenant-scoped REST API
//!
//! Requests are issued one at a time with bearer authentication. There is no
//! retry or rate limiting layer: a failed call surfaces as an [`ApiError`].

pub mod client;
pub mod constants;
pub mod error;
pub mod models;

pub use client::{TenantClient, build_http_client};
pub use error::ApiError;
pub use models::MediaType;
