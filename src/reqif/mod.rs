//! ReqIF XML reading and writing.
//!
//! [`parse_document`] turns the bytes of one `.reqif` document into a
//! [`ReqIfDocument`](crate::model::ReqIfDocument); [`to_xml`] goes the other
//! way. Neither touches attachments.

pub mod reader;
pub mod writer;

pub use reader::{document_from_tree, parse_document};
pub use writer::to_xml;

impl crate::model::ReqIfDocument {
    /// Serialize this document to ReqIF XML.
    pub fn to_xml(&self) -> String {
        writer::to_xml(self)
    }
}
