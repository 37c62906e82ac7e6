//! rIOT HAL
//!
//! HAL+JSON style hypermedia collections: a relation-keyed multi-map of
//! link-like entries whose wire shape depends on how many entries a
//! relation carries.

mod collection;
mod error;

pub use collection::{create_link, Collection, ExtraValue, Link};
pub use error::{HalError, Result};

/// Media type for hypermedia documents
pub const HAL_JSON: &str = "application/hal+json";
