//! Attachment sources: where the bytes behind an `<object data="...">`
//! reference come from.
//!
//! A package read from a container resolves names against its attachment
//! entries; a plain document resolves them against files in its directory.
//! The resolver only sees the [`AttachmentSource`] trait.

use crate::common::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};

/// Resolves a logical attachment name to its raw bytes.
pub trait AttachmentSource {
    /// Bytes of the attachment called `name`, or [`Error::NotFound`].
    ///
    /// Names are matched exactly; separators and case are not normalized.
    fn lookup(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// Attachment entries of an open ZIP container.
pub struct ContainerSource<R> {
    archive: zip::ZipArchive<R>,
    entries: HashSet<String>,
}

impl<R: Read + Seek> ContainerSource<R> {
    /// Bind a source to `archive`, exposing only the listed entries.
    pub fn new(archive: zip::ZipArchive<R>, entries: impl IntoIterator<Item = String>) -> Self {
        Self {
            archive,
            entries: entries.into_iter().collect(),
        }
    }
}

impl<R: Read + Seek> AttachmentSource for ContainerSource<R> {
    fn lookup(&mut self, name: &str) -> Result<Vec<u8>> {
        // Document entries live in the same archive but are not attachments
        if !self.entries.contains(name) {
            return Err(Error::NotFound(format!(
                "Attachment entry '{}' not found in container",
                name
            )));
        }

        let mut entry = self.archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => Error::NotFound(format!(
                "Attachment entry '{}' not found in container",
                name
            )),
            other => Error::from(other),
        })?;

        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        Ok(content)
    }
}

/// Files in the directory of a plain document.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Source rooted at the directory containing `document`.
    pub fn for_document(document: &Path) -> Self {
        let root = match document.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `name` under the root, if it stays inside the root.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let stays_inside = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        stays_inside.then(|| self.root.join(relative))
    }
}

impl AttachmentSource for DirectorySource {
    fn lookup(&mut self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name).ok_or_else(|| {
            Error::NotFound(format!(
                "Attachment '{}' does not name a file below {}",
                name,
                self.root.display()
            ))
        })?;

        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::NotFound(format!("Attachment file {} not found", path.display()))
            },
            _ => Error::Io(e),
        })
    }
}

/// In-memory source, handy for documents assembled without a package.
impl AttachmentSource for HashMap<String, Vec<u8>> {
    fn lookup(&mut self, name: &str) -> Result<Vec<u8>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Attachment '{}' not found", name)))
    }
}
