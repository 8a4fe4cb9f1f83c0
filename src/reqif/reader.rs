//! Mapping from a parsed XML tree onto the ReqIF document model.
//!
//! Child elements are looked up by local name, so element order inside the
//! `xsd:all` groups of the ReqIF schema does not matter. Structure the model
//! needs (identifiers, type references, value definitions) must be present;
//! its absence is an [`Error::InvalidFormat`].

use crate::common::xml::{XmlDocument, XmlElement};
use crate::common::{Error, Result};
use crate::model::{
    AttributeDefinition, AttributeKind, AttributeValue, DatatypeDefinition, DatatypeKind,
    EnumValue, Identifiable, RelationGroup, ReqIfContent, ReqIfDocument, ReqIfHeader,
    SpecHierarchy, SpecObject, SpecRelation, SpecType, SpecTypeKind, Specification,
    ToolExtension, XhtmlContent,
};

/// Parse a ReqIF document from raw bytes.
pub fn parse_document(bytes: &[u8]) -> Result<ReqIfDocument> {
    let tree = XmlDocument::from_bytes(bytes)?;
    document_from_tree(&tree)
}

/// Map an already parsed XML tree onto a [`ReqIfDocument`].
pub fn document_from_tree(tree: &XmlDocument<'_>) -> Result<ReqIfDocument> {
    Mapper {
        source: tree.source(),
    }
    .document(tree.root())
}

struct Mapper<'s> {
    source: &'s str,
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidFormat(message.into())
}

fn parse_bool(value: &str, what: &str) -> Result<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(invalid(format!("{}: '{}' is not a boolean", what, other))),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{}: '{}' is not a valid number", what, value)))
}

fn optional<T>(
    element: &XmlElement,
    name: &str,
    parse: impl FnOnce(&str, &str) -> Result<T>,
) -> Result<Option<T>> {
    element
        .attribute(name)
        .map(|value| parse(value, name))
        .transpose()
}

impl<'s> Mapper<'s> {
    fn document(&self, root: &XmlElement) -> Result<ReqIfDocument> {
        if root.local_name != "REQ-IF" {
            return Err(invalid(format!(
                "Expected REQ-IF root element, found {}",
                root.local_name
            )));
        }

        let header = root
            .child("THE-HEADER")
            .and_then(|h| h.child("REQ-IF-HEADER"))
            .map(|h| self.header(h))
            .transpose()?;

        let core_content = match root.child("CORE-CONTENT") {
            Some(core) => core
                .children_named("REQ-IF-CONTENT")
                .map(|c| self.content(c))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let tool_extensions = root
            .child("TOOL-EXTENSIONS")
            .map(|t| {
                t.children_named("REQ-IF-TOOL-EXTENSION")
                    .map(|ext| ToolExtension::from_markup(ext.inner_xml(self.source)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ReqIfDocument {
            header,
            core_content,
            tool_extensions,
            attachments: Vec::new(),
            lang: root
                .attributes
                .iter()
                .find(|a| a.name == "xml:lang")
                .map(|a| a.value.clone()),
        })
    }

    fn text_of(&self, element: &XmlElement, name: &str) -> Option<String> {
        element.child(name).map(|c| c.text(self.source))
    }

    fn header(&self, element: &XmlElement) -> Result<ReqIfHeader> {
        let identifier = element
            .attribute("IDENTIFIER")
            .ok_or_else(|| invalid("REQ-IF-HEADER without IDENTIFIER"))?;

        Ok(ReqIfHeader {
            identifier: identifier.to_string(),
            comment: self.text_of(element, "COMMENT"),
            creation_time: self.text_of(element, "CREATION-TIME"),
            repository_id: self.text_of(element, "REPOSITORY-ID"),
            req_if_tool_id: self.text_of(element, "REQ-IF-TOOL-ID"),
            req_if_version: self.text_of(element, "REQ-IF-VERSION"),
            source_tool_id: self.text_of(element, "SOURCE-TOOL-ID"),
            title: self.text_of(element, "TITLE"),
        })
    }

    fn identity(&self, element: &XmlElement) -> Result<Identifiable> {
        let identifier = element.attribute("IDENTIFIER").ok_or_else(|| {
            invalid(format!(
                "{} at byte {} has no IDENTIFIER",
                element.local_name, element.span.start
            ))
        })?;

        Ok(Identifiable {
            identifier: identifier.to_string(),
            long_name: element.attribute("LONG-NAME").map(str::to_string),
            last_change: element.attribute("LAST-CHANGE").map(str::to_string),
            desc: element.attribute("DESC").map(str::to_string),
        })
    }

    /// Text of the single `*-REF` element inside `wrapper` (e.g. `TYPE`).
    fn reference(&self, owner: &XmlElement, wrapper: &str) -> Result<String> {
        self.optional_reference(owner, wrapper)?.ok_or_else(|| {
            invalid(format!(
                "{} at byte {} has no {} reference",
                owner.local_name, owner.span.start, wrapper
            ))
        })
    }

    fn optional_reference(&self, owner: &XmlElement, wrapper: &str) -> Result<Option<String>> {
        let Some(wrapper_element) = owner.child(wrapper) else {
            return Ok(None);
        };
        let reference = wrapper_element
            .children
            .iter()
            .find(|c| c.local_name.ends_with("-REF"))
            .ok_or_else(|| {
                invalid(format!(
                    "{} of {} does not contain a reference",
                    wrapper, owner.local_name
                ))
            })?;
        Ok(Some(reference.text(self.source)))
    }

    fn content(&self, element: &XmlElement) -> Result<ReqIfContent> {
        let mut content = ReqIfContent::default();

        if let Some(datatypes) = element.child("DATATYPES") {
            for datatype in &datatypes.children {
                content.datatypes.push(self.datatype(datatype)?);
            }
        }
        if let Some(spec_types) = element.child("SPEC-TYPES") {
            for spec_type in &spec_types.children {
                content.spec_types.push(self.spec_type(spec_type)?);
            }
        }
        if let Some(objects) = element.child("SPEC-OBJECTS") {
            for object in objects.children_named("SPEC-OBJECT") {
                content.spec_objects.push(SpecObject {
                    identity: self.identity(object)?,
                    spec_type: self.reference(object, "TYPE")?,
                    values: self.values(object)?,
                });
            }
        }
        if let Some(relations) = element.child("SPEC-RELATIONS") {
            for relation in relations.children_named("SPEC-RELATION") {
                content.spec_relations.push(SpecRelation {
                    identity: self.identity(relation)?,
                    spec_type: self.reference(relation, "TYPE")?,
                    source: self.reference(relation, "SOURCE")?,
                    target: self.reference(relation, "TARGET")?,
                    values: self.values(relation)?,
                });
            }
        }
        if let Some(specifications) = element.child("SPECIFICATIONS") {
            for specification in specifications.children_named("SPECIFICATION") {
                content.specifications.push(Specification {
                    identity: self.identity(specification)?,
                    spec_type: self.reference(specification, "TYPE")?,
                    values: self.values(specification)?,
                    children: self.hierarchy_children(specification)?,
                });
            }
        }
        if let Some(groups) = element.child("SPEC-RELATION-GROUPS") {
            for group in groups.children_named("RELATION-GROUP") {
                content.spec_relation_groups.push(self.relation_group(group)?);
            }
        }

        Ok(content)
    }

    fn datatype(&self, element: &XmlElement) -> Result<DatatypeDefinition> {
        let suffix = element
            .local_name
            .strip_prefix("DATATYPE-DEFINITION-")
            .and_then(AttributeKind::from_tag_suffix)
            .ok_or_else(|| invalid(format!("Unknown datatype element {}", element.local_name)))?;

        let kind = match suffix {
            AttributeKind::Boolean => DatatypeKind::Boolean,
            AttributeKind::Date => DatatypeKind::Date,
            AttributeKind::Xhtml => DatatypeKind::Xhtml,
            AttributeKind::Integer => DatatypeKind::Integer {
                min: optional(element, "MIN", parse_number)?,
                max: optional(element, "MAX", parse_number)?,
            },
            AttributeKind::Real => DatatypeKind::Real {
                min: optional(element, "MIN", parse_number)?,
                max: optional(element, "MAX", parse_number)?,
                accuracy: optional(element, "ACCURACY", parse_number)?,
            },
            AttributeKind::String => DatatypeKind::String {
                max_length: optional(element, "MAX-LENGTH", parse_number)?,
            },
            AttributeKind::Enumeration => {
                let mut values = Vec::new();
                if let Some(specified) = element.child("SPECIFIED-VALUES") {
                    for value in specified.children_named("ENUM-VALUE") {
                        values.push(self.enum_value(value)?);
                    }
                }
                DatatypeKind::Enumeration { values }
            },
        };

        Ok(DatatypeDefinition {
            identity: self.identity(element)?,
            kind,
        })
    }

    fn enum_value(&self, element: &XmlElement) -> Result<EnumValue> {
        let embedded = element
            .child("PROPERTIES")
            .and_then(|p| p.child("EMBEDDED-VALUE"));
        let key = match embedded.and_then(|e| e.attribute("KEY")) {
            Some(key) => parse_number(key, "KEY")?,
            None => 0,
        };

        Ok(EnumValue {
            identity: self.identity(element)?,
            key,
            other_content: embedded
                .and_then(|e| e.attribute("OTHER-CONTENT"))
                .map(str::to_string),
        })
    }

    fn spec_type(&self, element: &XmlElement) -> Result<SpecType> {
        let kind = match element.local_name.as_str() {
            "SPEC-OBJECT-TYPE" => SpecTypeKind::SpecObjectType,
            "SPECIFICATION-TYPE" => SpecTypeKind::SpecificationType,
            "SPEC-RELATION-TYPE" => SpecTypeKind::SpecRelationType,
            "RELATION-GROUP-TYPE" => SpecTypeKind::RelationGroupType,
            other => return Err(invalid(format!("Unknown spec type element {}", other))),
        };

        let mut attributes = Vec::new();
        if let Some(spec_attributes) = element.child("SPEC-ATTRIBUTES") {
            for definition in &spec_attributes.children {
                attributes.push(self.attribute_definition(definition)?);
            }
        }

        Ok(SpecType {
            identity: self.identity(element)?,
            kind,
            attributes,
        })
    }

    fn attribute_definition(&self, element: &XmlElement) -> Result<AttributeDefinition> {
        let kind = element
            .local_name
            .strip_prefix("ATTRIBUTE-DEFINITION-")
            .and_then(AttributeKind::from_tag_suffix)
            .ok_or_else(|| {
                invalid(format!(
                    "Unknown attribute definition element {}",
                    element.local_name
                ))
            })?;

        Ok(AttributeDefinition {
            identity: self.identity(element)?,
            kind,
            datatype: self.reference(element, "TYPE")?,
            is_editable: optional(element, "IS-EDITABLE", parse_bool)?,
            multi_valued: optional(element, "MULTI-VALUED", parse_bool)?,
        })
    }

    fn values(&self, owner: &XmlElement) -> Result<Vec<AttributeValue>> {
        match owner.child("VALUES") {
            Some(values) => values
                .children
                .iter()
                .map(|v| self.attribute_value(v))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn attribute_value(&self, element: &XmlElement) -> Result<AttributeValue> {
        let kind = element
            .local_name
            .strip_prefix("ATTRIBUTE-VALUE-")
            .and_then(AttributeKind::from_tag_suffix)
            .ok_or_else(|| {
                invalid(format!(
                    "Unknown attribute value element {} at byte {}",
                    element.local_name, element.span.start
                ))
            })?;
        let definition = self.reference(element, "DEFINITION")?;
        let the_value = || {
            element.attribute("THE-VALUE").ok_or_else(|| {
                invalid(format!(
                    "{} at byte {} has no THE-VALUE",
                    element.local_name, element.span.start
                ))
            })
        };

        Ok(match kind {
            AttributeKind::Boolean => AttributeValue::Boolean {
                definition,
                the_value: parse_bool(the_value()?, "THE-VALUE")?,
            },
            AttributeKind::Date => AttributeValue::Date {
                definition,
                the_value: the_value()?.to_string(),
            },
            AttributeKind::Integer => AttributeValue::Integer {
                definition,
                the_value: parse_number(the_value()?, "THE-VALUE")?,
            },
            AttributeKind::Real => AttributeValue::Real {
                definition,
                the_value: parse_number(the_value()?, "THE-VALUE")?,
            },
            AttributeKind::String => AttributeValue::String {
                definition,
                the_value: the_value()?.to_string(),
            },
            AttributeKind::Enumeration => AttributeValue::Enumeration {
                definition,
                values: element
                    .child("VALUES")
                    .map(|v| {
                        v.children_named("ENUM-VALUE-REF")
                            .map(|r| r.text(self.source))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            AttributeKind::Xhtml => AttributeValue::Xhtml {
                definition,
                the_value: element
                    .child("THE-VALUE")
                    .map(|v| XhtmlContent::new(v.inner_xml(self.source)))
                    .unwrap_or_default(),
                the_original_value: element
                    .child("THE-ORIGINAL-VALUE")
                    .map(|v| XhtmlContent::new(v.inner_xml(self.source))),
                is_simplified: optional(element, "IS-SIMPLIFIED", parse_bool)?.unwrap_or(false),
            },
        })
    }

    fn hierarchy_children(&self, owner: &XmlElement) -> Result<Vec<SpecHierarchy>> {
        let Some(children) = owner.child("CHILDREN") else {
            return Ok(Vec::new());
        };
        children
            .children_named("SPEC-HIERARCHY")
            .map(|node| {
                Ok(SpecHierarchy {
                    identity: self.identity(node)?,
                    object: self.reference(node, "OBJECT")?,
                    is_table_internal: optional(node, "IS-TABLE-INTERNAL", parse_bool)?,
                    children: self.hierarchy_children(node)?,
                })
            })
            .collect()
    }

    fn relation_group(&self, element: &XmlElement) -> Result<RelationGroup> {
        let spec_relations = element
            .child("SPEC-RELATIONS")
            .map(|r| {
                r.children_named("SPEC-RELATION-REF")
                    .map(|c| c.text(self.source))
                    .collect()
            })
            .unwrap_or_default();

        Ok(RelationGroup {
            identity: self.identity(element)?,
            spec_type: self.reference(element, "TYPE")?,
            source_specification: self.reference(element, "SOURCE-SPECIFICATION")?,
            target_specification: self.reference(element, "TARGET-SPECIFICATION")?,
            spec_relations,
        })
    }
}
