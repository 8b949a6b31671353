//! Core types shared by every preprocessing stage.
//!
//! - [`error`]: the crate-wide error enum and result alias
//! - [`schema`]: column-role configuration and typed column access

pub mod error;
pub mod schema;

pub use error::{PrepError, PrepResult};
pub use schema::TrackSchema;
