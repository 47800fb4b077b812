//! Hospital admin console: configuration and the development backend.
//!
//! The resource models, transport and query cache live in `hms-core`.

pub mod config;
pub mod server;
