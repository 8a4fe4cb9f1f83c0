//! Unified error type for the ReqIF loader.
//!
//! Every stage of the loading pipeline (container extraction, document
//! parsing, merge, embedded-object resolution, schema validation) reports
//! failures through this one enum.
use thiserror::Error;

/// Main error type for ReqIF loading operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The call itself was malformed (empty path, callback without validation)
    #[error("Invalid argument: {0}")]
    ArgumentInvalid(String),

    /// A document entry, attachment entry or attachment file is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rich text markup references an object the loader cannot interpret
    #[error("Malformed content: {0}")]
    MalformedContent(String),

    /// Structurally invalid XML or ReqIF content, or an undecodable image
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A bundled schema resource could not be located
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Archive failure that is not a container-format mismatch
    #[error("Container error: {0}")]
    Container(String),
}

/// Result type for ReqIF loading operations.
pub type Result<T> = std::result::Result<T, Error>;
