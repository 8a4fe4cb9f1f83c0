//! Entry points: load a ReqIF package from a path.
//!
//! Without validation a load goes through the package pipeline: open the
//! container (or fall back to a plain document), merge its documents, then
//! resolve embedded objects against the package's attachments. With
//! validation exactly one plain document is checked against the bundled
//! schemas and mapped; containers, merging and attachments are not involved.

use crate::common::{Error, Result};
use crate::embedded::resolve_embedded_objects;
use crate::model::ReqIfDocument;
use crate::package::{ExtractedPackage, extract, merge_documents};
use crate::schema::{BundledSchemas, SchemaResolver, ValidationEvent, validate_document};
use log::{debug, warn};
use std::path::Path;

/// Callback receiving validation issues.
pub type ValidationHandler<'a> = Box<dyn FnMut(&ValidationEvent) + 'a>;

/// Per-call configuration of a load.
///
/// # Examples
///
/// ```no_run
/// use reqif_loader::{LoadOptions, load_with_options};
///
/// let mut errors = 0;
/// let options = LoadOptions::new()
///     .with_validation(true)
///     .with_validation_handler(|event| {
///         eprintln!("{}", event);
///         errors += 1;
///     });
/// let document = load_with_options("spec.reqif", options).unwrap();
/// ```
pub struct LoadOptions<'a> {
    validate: bool,
    handler: Option<ValidationHandler<'a>>,
    schemas: Box<dyn SchemaResolver + 'a>,
}

impl Default for LoadOptions<'_> {
    fn default() -> Self {
        Self {
            validate: false,
            handler: None,
            schemas: Box::new(BundledSchemas),
        }
    }
}

impl std::fmt::Debug for LoadOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("validate", &self.validate)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> LoadOptions<'a> {
    /// Package pipeline, no validation, bundled schemas.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the document against the schemas while loading it.
    #[inline]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Receive validation issues instead of having them logged.
    ///
    /// Only valid together with [`with_validation(true)`](Self::with_validation).
    pub fn with_validation_handler(mut self, handler: impl FnMut(&ValidationEvent) + 'a) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Serve schema resources from `resolver` instead of the bundled set.
    pub fn with_schema_resolver(mut self, resolver: impl SchemaResolver + 'a) -> Self {
        self.schemas = Box::new(resolver);
        self
    }
}

/// Load the package at `path` without validation.
///
/// # Errors
///
/// See [`load_with_options`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<ReqIfDocument> {
    load_with_options(path, LoadOptions::new())
}

/// Load the package at `path`, optionally validating it.
///
/// Passing a callback while `validate` is false is an
/// [`Error::ArgumentInvalid`].
pub fn load_with<P: AsRef<Path>>(
    path: P,
    validate: bool,
    on_validation_event: Option<&mut dyn FnMut(&ValidationEvent)>,
) -> Result<ReqIfDocument> {
    let mut options = LoadOptions::new().with_validation(validate);
    if let Some(callback) = on_validation_event {
        options = options.with_validation_handler(callback);
    }
    load_with_options(path, options)
}

/// Load the package at `path` as configured by `options`.
///
/// # Errors
///
/// * [`Error::ArgumentInvalid`] for an empty path, or a validation handler
///   without validation.
/// * [`Error::Io`] when the file cannot be read.
/// * [`Error::NotFound`] for a container without documents, or a missing
///   attachment.
/// * [`Error::MalformedContent`] for embedded objects lacking attributes or a
///   preview.
/// * [`Error::InvalidFormat`] for malformed XML, missing ReqIF structure, or
///   an undecodable preview image.
/// * [`Error::MissingResource`] when a schema resource is unavailable.
/// * [`Error::Container`] for archive failures other than "not an archive".
pub fn load_with_options<P: AsRef<Path>>(
    path: P,
    options: LoadOptions<'_>,
) -> Result<ReqIfDocument> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(Error::ArgumentInvalid("Path must not be empty".to_string()));
    }
    if options.handler.is_some() && !options.validate {
        return Err(Error::ArgumentInvalid(
            "A validation handler requires validation to be enabled".to_string(),
        ));
    }

    if options.validate {
        load_validated(path, options)
    } else {
        load_package(path)
    }
}

fn load_validated(path: &Path, options: LoadOptions<'_>) -> Result<ReqIfDocument> {
    debug!("Loading {} with schema validation", path.display());
    let bytes = std::fs::read(path)?;

    let mut handler = options.handler;
    let mut log_issue = |event: &ValidationEvent| warn!("{}: {}", path.display(), event);
    let report: &mut dyn FnMut(&ValidationEvent) = match handler.as_mut() {
        Some(handler) => handler,
        None => &mut log_issue,
    };

    validate_document(&bytes, &*options.schemas, report)
}

fn load_package(path: &Path) -> Result<ReqIfDocument> {
    debug!("Loading package {}", path.display());
    let ExtractedPackage {
        layout,
        documents,
        mut source,
    } = extract(path)?;
    debug!("Read {} document(s) as {:?}", documents.len(), layout);

    let mut document = merge_documents(documents)?;
    resolve_embedded_objects(&mut document, &mut *source)?;
    Ok(document)
}
