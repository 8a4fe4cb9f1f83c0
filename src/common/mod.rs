//! Common types and utilities shared by every stage of the loader.

// Submodule declarations
pub mod constants;
pub mod error;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
