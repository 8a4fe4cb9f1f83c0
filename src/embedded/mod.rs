//! Embedded objects in rich text values.
//!
//! ReqIF rich text references binary attachments with XHTML `<object>`
//! elements, usually an OLE or PDF object wrapping a PNG preview. This module
//! finds those references and loads the bytes through an
//! [`AttachmentSource`](crate::package::AttachmentSource).

pub mod objects;
pub mod resolver;

pub use objects::{ObjectRef, ObjectReference, classify_objects, find_objects};
pub use resolver::resolve_embedded_objects;
