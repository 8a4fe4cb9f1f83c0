//! Serialization of a [`ReqIfDocument`] back to ReqIF XML.
//!
//! Rich text values and tool extensions are written exactly as they were
//! read. Attachments are not part of the XML; they live next to the document
//! (or inside the container) under the names the rich text references.

use crate::common::constants::{REQIF_NAMESPACE, XHTML_NAMESPACE};
use crate::common::xml::escape_xml;
use crate::model::{
    AttributeDefinition, AttributeValue, DatatypeDefinition, DatatypeKind, Identifiable,
    RelationGroup, ReqIfContent, ReqIfDocument, ReqIfHeader, SpecHierarchy, SpecObject,
    SpecRelation, SpecType, SpecTypeKind, Specification,
};
use std::fmt::Display;

/// Serialize a document to a ReqIF XML string.
pub fn to_xml(document: &ReqIfDocument) -> String {
    let mut w = XmlOut::default();
    w.raw("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let mut root_attrs = vec![
        ("xmlns", REQIF_NAMESPACE.to_string()),
        ("xmlns:xhtml", XHTML_NAMESPACE.to_string()),
    ];
    if let Some(lang) = &document.lang {
        root_attrs.push(("xml:lang", lang.clone()));
    }
    w.open("REQ-IF", &root_attrs);

    if let Some(header) = &document.header {
        w.open("THE-HEADER", &[]);
        write_header(&mut w, header);
        w.close("THE-HEADER");
    }

    if !document.core_content.is_empty() {
        w.open("CORE-CONTENT", &[]);
        for content in &document.core_content {
            write_content(&mut w, content);
        }
        w.close("CORE-CONTENT");
    }

    if !document.tool_extensions.is_empty() {
        w.open("TOOL-EXTENSIONS", &[]);
        for extension in &document.tool_extensions {
            w.verbatim("REQ-IF-TOOL-EXTENSION", extension.markup());
        }
        w.close("TOOL-EXTENSIONS");
    }

    w.close("REQ-IF");
    w.out
}

/// Indenting string builder.
#[derive(Default)]
struct XmlOut {
    out: String,
    depth: usize,
}

impl XmlOut {
    fn raw(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn start_tag(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape_xml(value));
            self.out.push('"');
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.start_tag(name, attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth -= 1;
        self.indent();
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.start_tag(name, attrs);
        self.out.push_str("/>\n");
    }

    fn text_element(&mut self, name: &str, text: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(name);
        self.out.push('>');
        self.out.push_str(&escape_xml(text));
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    fn verbatim(&mut self, name: &str, markup: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(name);
        self.out.push('>');
        self.out.push_str(markup);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    /// `<WRAPPER><REF-NAME>id</REF-NAME></WRAPPER>`
    fn reference(&mut self, wrapper: &str, ref_name: &str, identifier: &str) {
        self.open(wrapper, &[]);
        self.text_element(ref_name, identifier);
        self.close(wrapper);
    }
}

fn identity_attrs(identity: &Identifiable) -> Vec<(&'static str, String)> {
    let mut attrs = vec![("IDENTIFIER", identity.identifier.clone())];
    if let Some(long_name) = &identity.long_name {
        attrs.push(("LONG-NAME", long_name.clone()));
    }
    if let Some(last_change) = &identity.last_change {
        attrs.push(("LAST-CHANGE", last_change.clone()));
    }
    if let Some(desc) = &identity.desc {
        attrs.push(("DESC", desc.clone()));
    }
    attrs
}

fn push_opt<T: Display>(attrs: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<T>) {
    if let Some(value) = value {
        attrs.push((name, value.to_string()));
    }
}

fn write_header(w: &mut XmlOut, header: &ReqIfHeader) {
    w.open("REQ-IF-HEADER", &[("IDENTIFIER", header.identifier.clone())]);
    let fields = [
        ("COMMENT", &header.comment),
        ("CREATION-TIME", &header.creation_time),
        ("REPOSITORY-ID", &header.repository_id),
        ("REQ-IF-TOOL-ID", &header.req_if_tool_id),
        ("REQ-IF-VERSION", &header.req_if_version),
        ("SOURCE-TOOL-ID", &header.source_tool_id),
        ("TITLE", &header.title),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            w.text_element(name, value);
        }
    }
    w.close("REQ-IF-HEADER");
}

fn write_content(w: &mut XmlOut, content: &ReqIfContent) {
    w.open("REQ-IF-CONTENT", &[]);

    if !content.datatypes.is_empty() {
        w.open("DATATYPES", &[]);
        for datatype in &content.datatypes {
            write_datatype(w, datatype);
        }
        w.close("DATATYPES");
    }
    if !content.spec_types.is_empty() {
        w.open("SPEC-TYPES", &[]);
        for spec_type in &content.spec_types {
            write_spec_type(w, spec_type);
        }
        w.close("SPEC-TYPES");
    }
    if !content.spec_objects.is_empty() {
        w.open("SPEC-OBJECTS", &[]);
        for object in &content.spec_objects {
            write_spec_object(w, object);
        }
        w.close("SPEC-OBJECTS");
    }
    if !content.spec_relations.is_empty() {
        w.open("SPEC-RELATIONS", &[]);
        for relation in &content.spec_relations {
            write_spec_relation(w, relation);
        }
        w.close("SPEC-RELATIONS");
    }
    if !content.specifications.is_empty() {
        w.open("SPECIFICATIONS", &[]);
        for specification in &content.specifications {
            write_specification(w, specification);
        }
        w.close("SPECIFICATIONS");
    }
    if !content.spec_relation_groups.is_empty() {
        w.open("SPEC-RELATION-GROUPS", &[]);
        for group in &content.spec_relation_groups {
            write_relation_group(w, group);
        }
        w.close("SPEC-RELATION-GROUPS");
    }

    w.close("REQ-IF-CONTENT");
}

fn write_datatype(w: &mut XmlOut, datatype: &DatatypeDefinition) {
    let name = format!(
        "DATATYPE-DEFINITION-{}",
        datatype.kind.attribute_kind().tag_suffix()
    );
    let mut attrs = identity_attrs(&datatype.identity);

    match &datatype.kind {
        DatatypeKind::Boolean | DatatypeKind::Date | DatatypeKind::Xhtml => {
            w.empty(&name, &attrs);
        },
        DatatypeKind::Integer { min, max } => {
            push_opt(&mut attrs, "MAX", *max);
            push_opt(&mut attrs, "MIN", *min);
            w.empty(&name, &attrs);
        },
        DatatypeKind::Real { min, max, accuracy } => {
            push_opt(&mut attrs, "ACCURACY", *accuracy);
            push_opt(&mut attrs, "MAX", *max);
            push_opt(&mut attrs, "MIN", *min);
            w.empty(&name, &attrs);
        },
        DatatypeKind::String { max_length } => {
            push_opt(&mut attrs, "MAX-LENGTH", *max_length);
            w.empty(&name, &attrs);
        },
        DatatypeKind::Enumeration { values } => {
            w.open(&name, &attrs);
            w.open("SPECIFIED-VALUES", &[]);
            for value in values {
                w.open("ENUM-VALUE", &identity_attrs(&value.identity));
                w.open("PROPERTIES", &[]);
                let mut embedded = vec![("KEY", value.key.to_string())];
                embedded.push((
                    "OTHER-CONTENT",
                    value.other_content.clone().unwrap_or_default(),
                ));
                w.empty("EMBEDDED-VALUE", &embedded);
                w.close("PROPERTIES");
                w.close("ENUM-VALUE");
            }
            w.close("SPECIFIED-VALUES");
            w.close(&name);
        },
    }
}

fn spec_type_tag(kind: SpecTypeKind) -> &'static str {
    match kind {
        SpecTypeKind::SpecObjectType => "SPEC-OBJECT-TYPE",
        SpecTypeKind::SpecificationType => "SPECIFICATION-TYPE",
        SpecTypeKind::SpecRelationType => "SPEC-RELATION-TYPE",
        SpecTypeKind::RelationGroupType => "RELATION-GROUP-TYPE",
    }
}

fn write_spec_type(w: &mut XmlOut, spec_type: &SpecType) {
    let name = spec_type_tag(spec_type.kind);
    w.open(name, &identity_attrs(&spec_type.identity));
    if !spec_type.attributes.is_empty() {
        w.open("SPEC-ATTRIBUTES", &[]);
        for definition in &spec_type.attributes {
            write_attribute_definition(w, definition);
        }
        w.close("SPEC-ATTRIBUTES");
    }
    w.close(name);
}

fn write_attribute_definition(w: &mut XmlOut, definition: &AttributeDefinition) {
    let suffix = definition.kind.tag_suffix();
    let name = format!("ATTRIBUTE-DEFINITION-{}", suffix);
    let mut attrs = identity_attrs(&definition.identity);
    push_opt(&mut attrs, "IS-EDITABLE", definition.is_editable);
    push_opt(&mut attrs, "MULTI-VALUED", definition.multi_valued);

    w.open(&name, &attrs);
    w.reference(
        "TYPE",
        &format!("DATATYPE-DEFINITION-{}-REF", suffix),
        &definition.datatype,
    );
    w.close(&name);
}

fn write_values(w: &mut XmlOut, values: &[AttributeValue]) {
    if values.is_empty() {
        return;
    }
    w.open("VALUES", &[]);
    for value in values {
        write_attribute_value(w, value);
    }
    w.close("VALUES");
}

fn write_attribute_value(w: &mut XmlOut, value: &AttributeValue) {
    let suffix = value.kind().tag_suffix();
    let name = format!("ATTRIBUTE-VALUE-{}", suffix);
    let definition_ref = format!("ATTRIBUTE-DEFINITION-{}-REF", suffix);

    let the_value = match value {
        AttributeValue::Boolean { the_value, .. } => Some(the_value.to_string()),
        AttributeValue::Date { the_value, .. } | AttributeValue::String { the_value, .. } => {
            Some(the_value.clone())
        },
        AttributeValue::Integer { the_value, .. } => Some(the_value.to_string()),
        AttributeValue::Real { the_value, .. } => Some(the_value.to_string()),
        AttributeValue::Enumeration { .. } | AttributeValue::Xhtml { .. } => None,
    };

    let mut attrs = Vec::new();
    if let Some(the_value) = the_value {
        attrs.push(("THE-VALUE", the_value));
    }
    if let AttributeValue::Xhtml {
        is_simplified: true,
        ..
    } = value
    {
        attrs.push(("IS-SIMPLIFIED", "true".to_string()));
    }

    w.open(&name, &attrs);
    w.reference("DEFINITION", &definition_ref, value.definition());
    match value {
        AttributeValue::Enumeration { values, .. } => {
            w.open("VALUES", &[]);
            for identifier in values {
                w.text_element("ENUM-VALUE-REF", identifier);
            }
            w.close("VALUES");
        },
        AttributeValue::Xhtml {
            the_value,
            the_original_value,
            ..
        } => {
            w.verbatim("THE-VALUE", the_value.as_str());
            if let Some(original) = the_original_value {
                w.verbatim("THE-ORIGINAL-VALUE", original.as_str());
            }
        },
        _ => {},
    }
    w.close(&name);
}

fn write_spec_object(w: &mut XmlOut, object: &SpecObject) {
    w.open("SPEC-OBJECT", &identity_attrs(&object.identity));
    write_values(w, &object.values);
    w.reference("TYPE", "SPEC-OBJECT-TYPE-REF", &object.spec_type);
    w.close("SPEC-OBJECT");
}

fn write_spec_relation(w: &mut XmlOut, relation: &SpecRelation) {
    w.open("SPEC-RELATION", &identity_attrs(&relation.identity));
    write_values(w, &relation.values);
    w.reference("SOURCE", "SPEC-OBJECT-REF", &relation.source);
    w.reference("TARGET", "SPEC-OBJECT-REF", &relation.target);
    w.reference("TYPE", "SPEC-RELATION-TYPE-REF", &relation.spec_type);
    w.close("SPEC-RELATION");
}

fn write_hierarchy(w: &mut XmlOut, nodes: &[SpecHierarchy]) {
    if nodes.is_empty() {
        return;
    }
    w.open("CHILDREN", &[]);
    for node in nodes {
        let mut attrs = identity_attrs(&node.identity);
        push_opt(&mut attrs, "IS-TABLE-INTERNAL", node.is_table_internal);
        w.open("SPEC-HIERARCHY", &attrs);
        write_hierarchy(w, &node.children);
        w.reference("OBJECT", "SPEC-OBJECT-REF", &node.object);
        w.close("SPEC-HIERARCHY");
    }
    w.close("CHILDREN");
}

fn write_specification(w: &mut XmlOut, specification: &Specification) {
    w.open("SPECIFICATION", &identity_attrs(&specification.identity));
    write_values(w, &specification.values);
    write_hierarchy(w, &specification.children);
    w.reference("TYPE", "SPECIFICATION-TYPE-REF", &specification.spec_type);
    w.close("SPECIFICATION");
}

fn write_relation_group(w: &mut XmlOut, group: &RelationGroup) {
    w.open("RELATION-GROUP", &identity_attrs(&group.identity));
    w.reference(
        "SOURCE-SPECIFICATION",
        "SPECIFICATION-REF",
        &group.source_specification,
    );
    if !group.spec_relations.is_empty() {
        w.open("SPEC-RELATIONS", &[]);
        for relation in &group.spec_relations {
            w.text_element("SPEC-RELATION-REF", relation);
        }
        w.close("SPEC-RELATIONS");
    }
    w.reference(
        "TARGET-SPECIFICATION",
        "SPECIFICATION-REF",
        &group.target_specification,
    );
    w.reference("TYPE", "RELATION-GROUP-TYPE-REF", &group.spec_type);
    w.close("RELATION-GROUP");
}
