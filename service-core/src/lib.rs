//! service-core: Shared infrastructure for the invoice form service.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
