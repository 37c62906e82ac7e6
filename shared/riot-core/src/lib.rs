//! rIOT Core - Stream metadata model and wire documents
//!
//! This crate provides:
//! - Stream, schema and measurement value types
//! - The fixed timestamp format used on the wire
//! - JSON documents exchanged by server and client
//! - Problem details for pre-stream failures

pub mod error;
pub mod model;
pub mod problem;
pub mod time;
pub mod wire;

pub use error::{ModelError, Result};
pub use model::*;
pub use problem::ProblemDetails;
pub use time::{format_timestamp, parse_timestamp};

/// Media type of the dataset representation
pub const TEXT_CSV: &str = "text/csv";

/// Media type of problem details bodies
pub const PROBLEM_JSON: &str = "application/problem+json";
