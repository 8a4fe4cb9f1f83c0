//! XML helpers shared by the ReqIF reader/writer, the rich text scanner and
//! the schema validator.

pub mod escape;
pub mod tree;

pub use escape::{escape_xml, unescape_xml};
pub use tree::{XmlAttribute, XmlDocument, XmlElement, XmlFragment};
