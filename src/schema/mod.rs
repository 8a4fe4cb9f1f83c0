//! Schema-validating document loading.
//!
//! The ReqIF schema set ships inside the crate (see [`BundledSchemas`]) and is
//! compiled on every validating load. Validation reports issues through a
//! callback and never aborts the load; only XML that cannot be read at all is
//! fatal.
//!
//! ```no_run
//! use reqif_loader::schema::{BundledSchemas, validate_document};
//!
//! let bytes = std::fs::read("spec.reqif").unwrap();
//! let mut issues = Vec::new();
//! let document = validate_document(&bytes, &BundledSchemas, &mut |event| {
//!     issues.push(event.to_string())
//! })
//! .unwrap();
//! println!("{} issues, {:?}", issues.len(), document.header);
//! ```

pub mod compile;
pub mod model;
pub mod resolver;
pub mod validate;

pub use compile::compile_schema;
pub use model::Schema;
pub use resolver::{BundledSchemas, SchemaResolver};
pub use validate::Validator;

use crate::common::constants::ROOT_SCHEMA;
use crate::common::xml::XmlDocument;
use crate::common::Result;
use crate::model::ReqIfDocument;
use crate::reqif::document_from_tree;
use log::debug;
use std::fmt;

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationSeverity {
    /// Suspicious but structurally acceptable (e.g. a dangling reference)
    Warning,
    /// The document violates the schema
    Error,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Warning => f.write_str("warning"),
            ValidationSeverity::Error => f.write_str("error"),
        }
    }
}

/// One-based line and column (in characters) of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut end = offset.min(source.len());
        while !source.is_char_boundary(end) {
            end -= 1;
        }
        let before = &source[..end];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

/// A schema issue found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationEvent {
    pub severity: ValidationSeverity,
    pub message: String,
    /// Where the offending element starts, when known
    pub position: Option<TextPosition>,
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(p) => write!(f, "{} at {}:{}: {}", self.severity, p.line, p.column, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Validate one plain document against the schema set served by `resolver`
/// and map it onto the model.
///
/// Every issue goes to `report`; the document is returned regardless.
///
/// # Errors
///
/// * [`Error::MissingResource`](crate::common::Error::MissingResource) if the
///   root schema or one it imports is unavailable.
/// * [`Error::InvalidFormat`](crate::common::Error::InvalidFormat) if the bytes
///   are not well-formed XML, or lack the structure the model requires.
pub fn validate_document(
    bytes: &[u8],
    resolver: &dyn SchemaResolver,
    report: &mut dyn FnMut(&ValidationEvent),
) -> Result<ReqIfDocument> {
    let schema = compile_schema(resolver, ROOT_SCHEMA)?;
    let tree = XmlDocument::from_bytes(bytes)?;

    let issues = Validator::new(&schema, tree.source(), report).validate(tree.root());
    debug!("Schema validation reported {} issues", issues);

    document_from_tree(&tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use std::collections::HashMap;

    pub(crate) const VALID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<REQ-IF xmlns="http://www.omg.org/spec/ReqIF/20110401/reqif.xsd" xmlns:xhtml="http://www.w3.org/1999/xhtml">
  <THE-HEADER>
    <REQ-IF-HEADER IDENTIFIER="h-1">
      <CREATION-TIME>2017-03-13T10:15:09.017+01:00</CREATION-TIME>
      <REQ-IF-TOOL-ID>tool</REQ-IF-TOOL-ID>
      <REQ-IF-VERSION>1.0</REQ-IF-VERSION>
      <SOURCE-TOOL-ID>source</SOURCE-TOOL-ID>
      <TITLE>Sample</TITLE>
    </REQ-IF-HEADER>
  </THE-HEADER>
  <CORE-CONTENT>
    <REQ-IF-CONTENT>
      <DATATYPES>
        <DATATYPE-DEFINITION-XHTML IDENTIFIER="dt-x" LAST-CHANGE="2017-03-13T10:15:09Z"/>
      </DATATYPES>
      <SPEC-TYPES>
        <SPEC-OBJECT-TYPE IDENTIFIER="sot" LAST-CHANGE="2017-03-13T10:15:09Z">
          <SPEC-ATTRIBUTES>
            <ATTRIBUTE-DEFINITION-XHTML IDENTIFIER="ad-x" LAST-CHANGE="2017-03-13T10:15:09Z">
              <TYPE><DATATYPE-DEFINITION-XHTML-REF>dt-x</DATATYPE-DEFINITION-XHTML-REF></TYPE>
            </ATTRIBUTE-DEFINITION-XHTML>
          </SPEC-ATTRIBUTES>
        </SPEC-OBJECT-TYPE>
      </SPEC-TYPES>
      <SPEC-OBJECTS>
        <SPEC-OBJECT IDENTIFIER="o-1" LAST-CHANGE="2017-03-13T10:15:09Z">
          <VALUES>
            <ATTRIBUTE-VALUE-XHTML>
              <THE-VALUE><xhtml:div>See <xhtml:object data="pic.png" type="image/png">pic</xhtml:object></xhtml:div></THE-VALUE>
              <DEFINITION><ATTRIBUTE-DEFINITION-XHTML-REF>ad-x</ATTRIBUTE-DEFINITION-XHTML-REF></DEFINITION>
            </ATTRIBUTE-VALUE-XHTML>
          </VALUES>
          <TYPE><SPEC-OBJECT-TYPE-REF>sot</SPEC-OBJECT-TYPE-REF></TYPE>
        </SPEC-OBJECT>
      </SPEC-OBJECTS>
    </REQ-IF-CONTENT>
  </CORE-CONTENT>
  <TOOL-EXTENSIONS>
    <REQ-IF-TOOL-EXTENSION><vendor:cfg xmlns:vendor="urn:vendor"><vendor:item/></vendor:cfg></REQ-IF-TOOL-EXTENSION>
  </TOOL-EXTENSIONS>
</REQ-IF>"#;

    fn collect(bytes: &[u8]) -> (Result<ReqIfDocument>, Vec<ValidationEvent>) {
        let mut events = Vec::new();
        let result = validate_document(bytes, &BundledSchemas, &mut |e| events.push(e.clone()));
        (result, events)
    }

    #[test]
    fn test_valid_document_passes_cleanly() {
        let (result, events) = collect(VALID.as_bytes());
        assert_eq!(events, Vec::new());
        let document = result.unwrap();
        assert_eq!(document.header.unwrap().identifier, "h-1");
        assert_eq!(document.tool_extensions.len(), 1);
    }

    #[test]
    fn test_issues_are_reported_and_document_still_returned() {
        let broken = VALID
            .replace(r#" LAST-CHANGE="2017-03-13T10:15:09Z">"#, ">")
            .replace(r#" type="image/png""#, "");
        let (result, events) = collect(broken.as_bytes());

        let document = result.unwrap();
        assert_eq!(document.content().unwrap().spec_objects.len(), 1);
        assert!(events.iter().any(|e| e.message.contains("'LAST-CHANGE'")));
        assert!(events.iter().any(|e| e.message.contains("'type'")));
        assert!(events.iter().all(|e| e.position.is_some()));
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        let (result, events) = collect(b"<REQ-IF><THE-HEADER></REQ-IF>");
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
        assert!(events.is_empty());
    }

    #[test]
    fn test_missing_schema_resource() {
        let empty: HashMap<String, String> = HashMap::new();
        let result = validate_document(VALID.as_bytes(), &empty, &mut |_| {});
        assert!(matches!(result, Err(Error::MissingResource(_))));
    }

    #[test]
    fn test_text_position() {
        let source = "ab\ncdé\nf";
        assert_eq!(
            TextPosition::from_offset(source, 0),
            TextPosition { line: 1, column: 1 }
        );
        assert_eq!(
            TextPosition::from_offset(source, 8),
            TextPosition { line: 3, column: 1 }
        );
        assert_eq!(
            TextPosition::from_offset(source, 7),
            TextPosition { line: 2, column: 4 }
        );
    }

    #[test]
    fn test_event_display() {
        let event = ValidationEvent {
            severity: ValidationSeverity::Error,
            message: "bad".to_string(),
            position: Some(TextPosition { line: 2, column: 5 }),
        };
        assert_eq!(event.to_string(), "error at 2:5: bad");
    }
}
