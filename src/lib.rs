//! reqif-loader - a Rust library for loading ReqIF requirements packages
//!
//! ReqIF (Requirements Interchange Format) exchanges requirements between
//! tools as XML documents, optionally bundled with attachments in a ZIP
//! container (`.reqifz`). This crate turns either form into one in-memory
//! [`ReqIfDocument`].
//!
//! # Features
//!
//! - **Containers and plain files**: ZIP containers are detected by signature;
//!   anything else is read as a single plain document
//! - **Merging**: containers with several documents are folded into one,
//!   keeping the first definition of every identifier
//! - **Embedded objects**: `<object>` references in rich text are resolved to
//!   [`Attachment`]s with decoded preview images
//! - **Schema validation**: an optional mode checks a document against the
//!   bundled ReqIF schemas and reports every issue through a callback
//! - **Round trip**: [`ReqIfDocument::to_xml`] writes a document back out, tool
//!   extensions untouched
//!
//! # Example - Loading a container
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = reqif_loader::load("requirements.reqifz")?;
//!
//! if let Some(content) = document.content() {
//!     for object in &content.spec_objects {
//!         println!("{} ({} values)", object.identity.identifier, object.values.len());
//!     }
//! }
//! for attachment in &document.attachments {
//!     println!("{}: {} bytes", attachment.name, attachment.object_value.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Validating a document
//!
//! ```no_run
//! use reqif_loader::schema::ValidationEvent;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut report = |event: &ValidationEvent| eprintln!("{}", event);
//! let document = reqif_loader::load_with("spec.reqif", true, Some(&mut report))?;
//! println!("{:?}", document.header);
//! # Ok(())
//! # }
//! ```

/// Shared infrastructure: errors, constants and XML utilities
pub mod common;

/// Embedded object discovery and attachment resolution
pub mod embedded;

/// Load entry points and options
pub mod loader;

/// The in-memory document model
pub mod model;

/// Containers, attachment sources and document merging
pub mod package;

/// ReqIF XML reading and writing
pub mod reqif;

/// Bundled schemas and validation
pub mod schema;

pub use common::{Error, Result};
pub use loader::{LoadOptions, ValidationHandler, load, load_with, load_with_options};
pub use model::{Attachment, ReqIfContent, ReqIfDocument, ReqIfHeader, ToolExtension};
pub use package::AttachmentSource;
pub use reqif::parse_document;
pub use schema::{ValidationEvent, ValidationSeverity};
