//! Attribute values and their kinds.

/// The seven value kinds ReqIF defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Boolean,
    Date,
    Enumeration,
    Integer,
    Real,
    String,
    Xhtml,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 7] = [
        AttributeKind::Boolean,
        AttributeKind::Date,
        AttributeKind::Enumeration,
        AttributeKind::Integer,
        AttributeKind::Real,
        AttributeKind::String,
        AttributeKind::Xhtml,
    ];

    /// Suffix used in element names, e.g. `STRING` in `ATTRIBUTE-VALUE-STRING`.
    pub fn tag_suffix(self) -> &'static str {
        match self {
            AttributeKind::Boolean => "BOOLEAN",
            AttributeKind::Date => "DATE",
            AttributeKind::Enumeration => "ENUMERATION",
            AttributeKind::Integer => "INTEGER",
            AttributeKind::Real => "REAL",
            AttributeKind::String => "STRING",
            AttributeKind::Xhtml => "XHTML",
        }
    }

    /// Parse the suffix of a ReqIF element name.
    pub fn from_tag_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag_suffix() == suffix)
    }
}

/// Rich text markup as it appeared inside `THE-VALUE`.
///
/// The content is kept verbatim; it is only parsed when embedded objects are
/// resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XhtmlContent(String);

impl XhtmlContent {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for XhtmlContent {
    fn from(markup: &str) -> Self {
        Self::new(markup)
    }
}

/// A value of one attribute on a spec object, relation or specification.
///
/// `definition` is the identifier of the matching attribute definition.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Boolean {
        definition: String,
        the_value: bool,
    },
    Date {
        definition: String,
        the_value: String,
    },
    Enumeration {
        definition: String,
        /// Identifiers of the selected enum values
        values: Vec<String>,
    },
    Integer {
        definition: String,
        the_value: i64,
    },
    Real {
        definition: String,
        the_value: f64,
    },
    String {
        definition: String,
        the_value: String,
    },
    Xhtml {
        definition: String,
        the_value: XhtmlContent,
        the_original_value: Option<XhtmlContent>,
        is_simplified: bool,
    },
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Boolean { .. } => AttributeKind::Boolean,
            AttributeValue::Date { .. } => AttributeKind::Date,
            AttributeValue::Enumeration { .. } => AttributeKind::Enumeration,
            AttributeValue::Integer { .. } => AttributeKind::Integer,
            AttributeValue::Real { .. } => AttributeKind::Real,
            AttributeValue::String { .. } => AttributeKind::String,
            AttributeValue::Xhtml { .. } => AttributeKind::Xhtml,
        }
    }

    pub fn definition(&self) -> &str {
        match self {
            AttributeValue::Boolean { definition, .. }
            | AttributeValue::Date { definition, .. }
            | AttributeValue::Enumeration { definition, .. }
            | AttributeValue::Integer { definition, .. }
            | AttributeValue::Real { definition, .. }
            | AttributeValue::String { definition, .. }
            | AttributeValue::Xhtml { definition, .. } => definition,
        }
    }

    /// The rich text payload, if this is an XHTML value.
    pub fn xhtml(&self) -> Option<&XhtmlContent> {
        match self {
            AttributeValue::Xhtml { the_value, .. } => Some(the_value),
            _ => None,
        }
    }

    /// The `THE-VALUE` date parsed as an RFC 3339 timestamp.
    pub fn date_time(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        match self {
            AttributeValue::Date { the_value, .. } => {
                chrono::DateTime::parse_from_rfc3339(the_value).ok()
            },
            _ => None,
        }
    }
}
