//! Container extraction with plain-document fallback.
//!
//! A `.reqifz` package is a ZIP archive. Entries whose path ends in `.reqif`
//! (any case) are documents; everything else is an attachment that rich text
//! may reference. Input that turns out not to be a container at all is read
//! as one plain document whose attachments sit next to it on disk.

use crate::common::constants::{DOCUMENT_SUFFIX, ZIP_SIGNATURE_LEN, ZIP_SIGNATURES};
use crate::common::{Error, Result};
use crate::model::ReqIfDocument;
use crate::package::source::{AttachmentSource, ContainerSource, DirectorySource};
use crate::reqif::parse_document;
use log::{debug, trace};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Role of an archive entry, decided by its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A ReqIF document payload
    Document,
    /// Any other file, addressable from rich text
    Attachment,
}

/// Classify an archive entry path. The suffix check ignores case.
pub fn classify_entry(path: &str) -> EntryKind {
    let suffix_len = DOCUMENT_SUFFIX.len();
    let is_document = path.len() >= suffix_len
        && path.is_char_boundary(path.len() - suffix_len)
        && path[path.len() - suffix_len..].eq_ignore_ascii_case(DOCUMENT_SUFFIX);

    if is_document {
        EntryKind::Document
    } else {
        EntryKind::Attachment
    }
}

/// How the package was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageLayout {
    /// ZIP container with document and attachment entries
    Container,
    /// A single plain document; attachments come from its directory
    PlainFile,
}

/// Parsed documents plus the source their attachments resolve against.
pub struct ExtractedPackage {
    pub layout: PackageLayout,
    /// Documents in archive order (exactly one for a plain file)
    pub documents: Vec<ReqIfDocument>,
    pub source: Box<dyn AttachmentSource>,
}

impl std::fmt::Debug for ExtractedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractedPackage")
            .field("layout", &self.layout)
            .field("documents", &self.documents.len())
            .finish_non_exhaustive()
    }
}

/// Why a container could not be opened.
enum OpenError {
    /// The input is not a container; read it as a plain document instead
    NotAContainer(String),
    /// Anything else; propagated to the caller
    Failed(Error),
}

impl From<Error> for OpenError {
    fn from(err: Error) -> Self {
        OpenError::Failed(err)
    }
}

impl From<std::io::Error> for OpenError {
    fn from(err: std::io::Error) -> Self {
        OpenError::Failed(Error::Io(err))
    }
}

impl From<zip::result::ZipError> for OpenError {
    fn from(err: zip::result::ZipError) -> Self {
        OpenError::Failed(Error::from(err))
    }
}

/// Open `path` as a container, or as a plain document if it is not one.
///
/// # Errors
///
/// * I/O failures opening or reading the file propagate as [`Error::Io`].
/// * A container without any `.reqif` entry is [`Error::NotFound`].
/// * Documents that fail to parse propagate their error unchanged.
pub fn extract<P: AsRef<Path>>(path: P) -> Result<ExtractedPackage> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let mut signature = Vec::with_capacity(ZIP_SIGNATURE_LEN);
    file.by_ref()
        .take(ZIP_SIGNATURE_LEN as u64)
        .read_to_end(&mut signature)?;
    file.seek(SeekFrom::Start(0))?;

    if !ZIP_SIGNATURES.iter().any(|zip| signature[..] == zip[..]) {
        debug!(
            "{} has no ZIP signature, reading it as a plain document",
            path.display()
        );
        return extract_plain(path, file);
    }

    match open_container(BufReader::new(file)) {
        Ok(package) => Ok(package),
        Err(OpenError::NotAContainer(reason)) => {
            debug!(
                "{} is not a usable container ({}), reading it as a plain document",
                path.display(),
                reason
            );
            extract_plain(path, File::open(path)?)
        },
        Err(OpenError::Failed(err)) => Err(err),
    }
}

fn extract_plain(path: &Path, mut file: File) -> Result<ExtractedPackage> {
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    drop(file);

    let document = parse_document(&bytes)?;
    Ok(ExtractedPackage {
        layout: PackageLayout::PlainFile,
        documents: vec![document],
        source: Box::new(DirectorySource::for_document(path)),
    })
}

fn open_container<R>(reader: R) -> std::result::Result<ExtractedPackage, OpenError>
where
    R: Read + Seek + 'static,
{
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| match e {
        zip::result::ZipError::InvalidArchive(_) | zip::result::ZipError::UnsupportedArchive(_) => {
            OpenError::NotAContainer(e.to_string())
        },
        other => OpenError::from(other),
    })?;

    let mut document_entries = Vec::new();
    let mut attachment_entries = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        match classify_entry(&name) {
            EntryKind::Document => document_entries.push(name),
            EntryKind::Attachment => attachment_entries.push(name),
        }
    }

    debug!(
        "Container holds {} document entries and {} attachment entries",
        document_entries.len(),
        attachment_entries.len()
    );

    if document_entries.is_empty() {
        return Err(OpenError::Failed(Error::NotFound(format!(
            "Container has no '{}' document entry",
            DOCUMENT_SUFFIX
        ))));
    }

    let mut documents = Vec::with_capacity(document_entries.len());
    for name in &document_entries {
        trace!("Parsing document entry {}", name);
        let mut bytes = Vec::new();
        archive.by_name(name)?.read_to_end(&mut bytes)?;
        documents.push(parse_document(&bytes)?);
    }

    Ok(ExtractedPackage {
        layout: PackageLayout::Container,
        documents,
        source: Box::new(ContainerSource::new(archive, attachment_entries)),
    })
}
