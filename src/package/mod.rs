//! Package handling: container extraction, attachment sources and merging.

pub mod container;
pub mod merge;
pub mod source;

pub use container::{EntryKind, ExtractedPackage, PackageLayout, classify_entry, extract};
pub use merge::merge_documents;
pub use source::{AttachmentSource, ContainerSource, DirectorySource};
