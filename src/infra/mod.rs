//! Infrastructure adapters and runtime bootstrap.

pub mod client;
pub mod error;
pub mod http;
pub mod request_id;
pub mod telemetry;
pub mod upstream;
