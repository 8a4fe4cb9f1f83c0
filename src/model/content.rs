//! Identifier-keyed elements of a `REQ-IF-CONTENT` section.

use crate::model::values::{AttributeKind, AttributeValue};

/// Identity and descriptive fields every keyed ReqIF element carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiable {
    pub identifier: String,
    pub long_name: Option<String>,
    pub last_change: Option<String>,
    pub desc: Option<String>,
}

impl Identifiable {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = Some(long_name.into());
        self
    }
}

/// Elements addressed by their `IDENTIFIER`.
pub trait Identified {
    fn identifier(&self) -> &str;
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn identifier(&self) -> &str {
                    &self.identity.identifier
                }
            }
        )*
    };
}

impl_identified!(
    DatatypeDefinition,
    SpecType,
    AttributeDefinition,
    SpecObject,
    SpecRelation,
    Specification,
    SpecHierarchy,
    RelationGroup,
    EnumValue,
);

/// One literal of an enumeration datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub identity: Identifiable,
    pub key: i64,
    pub other_content: Option<String>,
}

/// Datatype-specific facets.
#[derive(Debug, Clone, PartialEq)]
pub enum DatatypeKind {
    Boolean,
    Date,
    Enumeration { values: Vec<EnumValue> },
    Integer { min: Option<i64>, max: Option<i64> },
    Real {
        min: Option<f64>,
        max: Option<f64>,
        accuracy: Option<u32>,
    },
    String { max_length: Option<u32> },
    Xhtml,
}

impl DatatypeKind {
    /// The attribute kind values of this datatype take.
    pub fn attribute_kind(&self) -> AttributeKind {
        match self {
            DatatypeKind::Boolean => AttributeKind::Boolean,
            DatatypeKind::Date => AttributeKind::Date,
            DatatypeKind::Enumeration { .. } => AttributeKind::Enumeration,
            DatatypeKind::Integer { .. } => AttributeKind::Integer,
            DatatypeKind::Real { .. } => AttributeKind::Real,
            DatatypeKind::String { .. } => AttributeKind::String,
            DatatypeKind::Xhtml => AttributeKind::Xhtml,
        }
    }
}

/// A `DATATYPE-DEFINITION-*` element.
#[derive(Debug, Clone, PartialEq)]
pub struct DatatypeDefinition {
    pub identity: Identifiable,
    pub kind: DatatypeKind,
}

/// Which of the four spec type elements a [`SpecType`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecTypeKind {
    SpecObjectType,
    SpecificationType,
    SpecRelationType,
    RelationGroupType,
}

/// An `ATTRIBUTE-DEFINITION-*` inside a spec type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub identity: Identifiable,
    pub kind: AttributeKind,
    /// Identifier of the datatype definition
    pub datatype: String,
    pub is_editable: Option<bool>,
    /// Only meaningful for enumeration attributes
    pub multi_valued: Option<bool>,
}

/// A spec type with its attribute definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecType {
    pub identity: Identifiable,
    pub kind: SpecTypeKind,
    pub attributes: Vec<AttributeDefinition>,
}

impl SpecType {
    /// Attribute definition by identifier.
    pub fn attribute(&self, identifier: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.identity.identifier == identifier)
    }
}

/// A requirement: typed bag of attribute values.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecObject {
    pub identity: Identifiable,
    /// Identifier of the spec object type
    pub spec_type: String,
    pub values: Vec<AttributeValue>,
}

/// A typed link between two spec objects.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRelation {
    pub identity: Identifiable,
    pub spec_type: String,
    pub source: String,
    pub target: String,
    pub values: Vec<AttributeValue>,
}

/// A node of a specification's object tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHierarchy {
    pub identity: Identifiable,
    /// Identifier of the referenced spec object
    pub object: String,
    pub is_table_internal: Option<bool>,
    pub children: Vec<SpecHierarchy>,
}

/// A document-like view arranging spec objects in a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub identity: Identifiable,
    pub spec_type: String,
    pub values: Vec<AttributeValue>,
    pub children: Vec<SpecHierarchy>,
}

impl Specification {
    /// Identifiers of every referenced spec object, depth first.
    pub fn object_refs(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [SpecHierarchy], out: &mut Vec<&'a str>) {
            for node in nodes {
                out.push(&node.object);
                walk(&node.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.children, &mut out);
        out
    }
}

/// A set of relations between two specifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationGroup {
    pub identity: Identifiable,
    pub spec_type: String,
    pub source_specification: String,
    pub target_specification: String,
    pub spec_relations: Vec<String>,
}

/// One `REQ-IF-CONTENT` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReqIfContent {
    pub datatypes: Vec<DatatypeDefinition>,
    pub spec_types: Vec<SpecType>,
    pub spec_objects: Vec<SpecObject>,
    pub spec_relations: Vec<SpecRelation>,
    pub specifications: Vec<Specification>,
    pub spec_relation_groups: Vec<RelationGroup>,
}

impl ReqIfContent {
    pub fn is_empty(&self) -> bool {
        self.datatypes.is_empty()
            && self.spec_types.is_empty()
            && self.spec_objects.is_empty()
            && self.spec_relations.is_empty()
            && self.specifications.is_empty()
            && self.spec_relation_groups.is_empty()
    }

    pub fn datatype(&self, identifier: &str) -> Option<&DatatypeDefinition> {
        self.datatypes.iter().find(|d| d.identifier() == identifier)
    }

    pub fn spec_type(&self, identifier: &str) -> Option<&SpecType> {
        self.spec_types.iter().find(|t| t.identifier() == identifier)
    }

    pub fn spec_object(&self, identifier: &str) -> Option<&SpecObject> {
        self.spec_objects.iter().find(|o| o.identifier() == identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specification_object_refs_depth_first() {
        let leaf = |id: &str, object: &str, children| SpecHierarchy {
            identity: Identifiable::new(id),
            object: object.to_string(),
            is_table_internal: None,
            children,
        };
        let spec = Specification {
            identity: Identifiable::new("spec-1"),
            spec_type: "st".to_string(),
            values: Vec::new(),
            children: vec![
                leaf("h1", "o1", vec![leaf("h2", "o2", Vec::new())]),
                leaf("h3", "o3", Vec::new()),
            ],
        };
        assert_eq!(spec.object_refs(), ["o1", "o2", "o3"]);
    }

    #[test]
    fn test_content_lookup_by_identifier() {
        let content = ReqIfContent {
            spec_objects: vec![SpecObject {
                identity: Identifiable::new("req-1").with_long_name("First"),
                spec_type: "sot".to_string(),
                values: Vec::new(),
            }],
            ..Default::default()
        };
        assert!(!content.is_empty());
        assert_eq!(
            content.spec_object("req-1").and_then(|o| o.identity.long_name.as_deref()),
            Some("First")
        );
        assert!(content.spec_object("req-2").is_none());
    }
}
