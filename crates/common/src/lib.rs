//! Record types and errors shared across the replay crates.

pub mod error;
pub mod protocol;

pub use error::RecordError;
