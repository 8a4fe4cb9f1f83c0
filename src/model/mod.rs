//! In-memory ReqIF document graph.
//!
//! A [`ReqIfDocument`] is what a load returns: the header, the content
//! sections, opaque tool extensions, and the attachments that rich text values
//! reference. All types are plain owned data.

pub mod attachment;
pub mod content;
pub mod values;

pub use attachment::Attachment;
pub use content::{
    AttributeDefinition, DatatypeDefinition, DatatypeKind, EnumValue, Identifiable, Identified,
    RelationGroup, ReqIfContent, SpecHierarchy, SpecObject, SpecRelation, SpecType, SpecTypeKind,
    Specification,
};
pub use values::{AttributeKind, AttributeValue, XhtmlContent};

/// The `REQ-IF-HEADER` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReqIfHeader {
    pub identifier: String,
    pub comment: Option<String>,
    pub creation_time: Option<String>,
    pub repository_id: Option<String>,
    pub req_if_tool_id: Option<String>,
    pub req_if_version: Option<String>,
    pub source_tool_id: Option<String>,
    pub title: Option<String>,
}

/// Vendor data kept as raw markup and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolExtension {
    markup: String,
}

impl ToolExtension {
    /// Wrap raw markup (the content of one `REQ-IF-TOOL-EXTENSION`).
    pub fn from_markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    /// The markup exactly as read.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Replace the markup; it is not checked or parsed.
    pub fn set_markup(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
    }
}

/// A loaded ReqIF document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReqIfDocument {
    /// Header, absent only in hand-built or partial documents
    pub header: Option<ReqIfHeader>,
    /// Content sections in document order
    pub core_content: Vec<ReqIfContent>,
    /// Opaque vendor extensions in document order
    pub tool_extensions: Vec<ToolExtension>,
    /// Attachments resolved from rich text values
    pub attachments: Vec<Attachment>,
    /// Language tag from `xml:lang` on the root element
    pub lang: Option<String>,
}

impl ReqIfDocument {
    /// The first content section, the only one scanned for embedded objects.
    pub fn content(&self) -> Option<&ReqIfContent> {
        self.core_content.first()
    }

    /// Look up a resolved attachment by name.
    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }

    /// Find a spec object by identifier in any content section.
    pub fn spec_object(&self, identifier: &str) -> Option<&SpecObject> {
        self.core_content
            .iter()
            .flat_map(|content| content.spec_objects.iter())
            .find(|object| object.identity.identifier == identifier)
    }
}
