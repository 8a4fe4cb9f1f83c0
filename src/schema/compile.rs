//! Reading XSD resources into a [`Schema`].

use crate::common::xml::{XmlDocument, XmlElement};
use crate::common::{Error, Result};
use crate::schema::model::{
    AttributeDecl, Builtin, ComplexType, ElementDecl, Particle, ProcessContents, QName, Schema,
    SimpleType, SimpleTypeRef, Term, TypeRef, Wildcard, XSD_NAMESPACE,
};
use crate::schema::resolver::SchemaResolver;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

/// Load `root` and every resource it imports or includes, and compile them
/// into one schema set.
///
/// # Errors
///
/// * [`Error::MissingResource`] when the resolver cannot supply a resource.
/// * [`Error::InvalidFormat`] for unreadable schema text, constructs outside
///   the supported subset, or references to undefined types.
pub fn compile_schema(resolver: &dyn SchemaResolver, root: &str) -> Result<Schema> {
    let mut schema = Schema::new();
    let mut pending = VecDeque::from([root.to_string()]);
    let mut seen = HashSet::new();

    while let Some(name) = pending.pop_front() {
        if !seen.insert(name.clone()) {
            continue;
        }
        let text = resolver.resource(&name).ok_or_else(|| {
            Error::MissingResource(format!("Schema resource '{}' is not available", name))
        })?;
        trace!("Compiling schema resource {}", name);

        let document = XmlDocument::parse(&text)
            .map_err(|e| Error::InvalidFormat(format!("Schema resource '{}': {}", name, e)))?;
        let location_refs = SchemaCompiler::new(document.root())?.compile_into(&mut schema)?;
        pending.extend(location_refs);
        schema.resources.push(name);
    }

    check_references(&schema)?;
    debug!(
        "Compiled {} schema resources: {} elements, {} complex types, {} simple types",
        schema.resources.len(),
        schema.elements.len(),
        schema.complex_types.len(),
        schema.simple_types.len()
    );
    Ok(schema)
}

fn unsupported(what: &str, element: &XmlElement) -> Error {
    Error::InvalidFormat(format!(
        "Unsupported schema construct <{}> in {} (byte {})",
        element.local_name, what, element.span.start
    ))
}

fn is_xsd(element: &XmlElement, local_name: &str) -> bool {
    element.namespace.as_deref() == Some(XSD_NAMESPACE) && element.local_name == local_name
}

/// Compiles one `xsd:schema` document.
struct SchemaCompiler<'a> {
    root: &'a XmlElement,
    target_namespace: Option<String>,
    qualified_elements: bool,
}

impl<'a> SchemaCompiler<'a> {
    fn new(root: &'a XmlElement) -> Result<Self> {
        if !is_xsd(root, "schema") {
            return Err(Error::InvalidFormat(format!(
                "Expected xsd:schema root, found <{}>",
                root.local_name
            )));
        }
        Ok(Self {
            root,
            target_namespace: root
                .attribute("targetNamespace")
                .filter(|ns| !ns.is_empty())
                .map(str::to_string),
            qualified_elements: root.attribute("elementFormDefault") == Some("qualified"),
        })
    }

    /// Add this document's global components; returns the resources it points at.
    fn compile_into(&self, schema: &mut Schema) -> Result<Vec<String>> {
        let mut locations = Vec::new();

        for child in &self.root.children {
            match child.local_name.as_str() {
                "import" | "include" => {
                    if let Some(location) = child.attribute("schemaLocation") {
                        locations.push(location.to_string());
                    }
                },
                "element" => {
                    let decl = self.element_decl(child, true)?;
                    schema.elements.insert(decl.name.clone(), decl);
                },
                "complexType" => {
                    let name = self.global_name(child)?;
                    schema.complex_types.insert(name, self.complex_type(child)?);
                },
                "simpleType" => {
                    let name = self.global_name(child)?;
                    schema.simple_types.insert(name, self.simple_type(child)?);
                },
                "attributeGroup" => {
                    let name = self.global_name(child)?;
                    let attributes = child
                        .children
                        .iter()
                        .filter(|c| is_xsd(c, "attribute"))
                        .map(|c| self.attribute_decl(c))
                        .collect::<Result<Vec<_>>>()?;
                    schema.attribute_groups.insert(name, attributes);
                },
                "annotation" => {},
                _ => return Err(unsupported("schema", child)),
            }
        }

        Ok(locations)
    }

    fn global_name(&self, element: &XmlElement) -> Result<QName> {
        let name = element.attribute("name").ok_or_else(|| {
            Error::InvalidFormat(format!(
                "Global <{}> at byte {} has no name",
                element.local_name, element.span.start
            ))
        })?;
        Ok(QName::new(self.target_namespace.as_deref(), name))
    }

    /// Resolve a prefixed name written in an attribute value such as `type`.
    ///
    /// Prefixes are looked up on the element itself and then on the schema root.
    fn qname(&self, element: &XmlElement, value: &str) -> Result<QName> {
        let (prefix, local) = match value.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, value),
        };
        let namespace = element
            .declarations
            .iter()
            .chain(self.root.declarations.iter())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty());

        if prefix.is_some() && namespace.is_none() {
            return Err(Error::InvalidFormat(format!(
                "Undeclared prefix in schema reference '{}'",
                value
            )));
        }
        Ok(QName::new(namespace, local))
    }

    fn element_decl(&self, element: &XmlElement, global: bool) -> Result<ElementDecl> {
        let local = element.attribute("name").ok_or_else(|| {
            Error::InvalidFormat(format!(
                "Element declaration at byte {} has no name",
                element.span.start
            ))
        })?;
        let namespace = if global || self.qualified_elements {
            self.target_namespace.as_deref()
        } else {
            None
        };

        let inline_complex = element.children.iter().find(|c| is_xsd(c, "complexType"));
        let inline_simple = element.children.iter().find(|c| is_xsd(c, "simpleType"));
        let type_ref = match (element.attribute("type"), inline_complex, inline_simple) {
            (Some(type_name), _, _) => TypeRef::Named(self.qname(element, type_name)?),
            (None, Some(complex), _) => TypeRef::InlineComplex(Box::new(self.complex_type(complex)?)),
            (None, None, Some(simple)) => TypeRef::InlineSimple(self.simple_type(simple)?),
            (None, None, None) => TypeRef::AnyType,
        };

        Ok(ElementDecl {
            name: QName::new(namespace, local),
            type_ref,
        })
    }

    fn complex_type(&self, element: &XmlElement) -> Result<ComplexType> {
        let mut complex = ComplexType {
            mixed: element.attribute("mixed") == Some("true"),
            ..Default::default()
        };

        for child in &element.children {
            match child.local_name.as_str() {
                "sequence" | "choice" | "all" => {
                    complex.content = Some(self.particle(child)?);
                },
                "attribute" => complex.attributes.push(self.attribute_decl(child)?),
                "attributeGroup" => {
                    let reference = child
                        .attribute("ref")
                        .ok_or_else(|| unsupported("complexType", child))?;
                    complex.attribute_groups.push(self.qname(child, reference)?);
                },
                "anyAttribute" => complex.any_attribute = true,
                "annotation" => {},
                _ => return Err(unsupported("complexType", child)),
            }
        }

        Ok(complex)
    }

    fn occurs(&self, element: &XmlElement) -> Result<(u32, Option<u32>)> {
        let parse = |value: &str| {
            value.trim().parse::<u32>().map_err(|_| {
                Error::InvalidFormat(format!(
                    "Invalid occurrence bound '{}' at byte {}",
                    value, element.span.start
                ))
            })
        };
        let min = element.attribute("minOccurs").map(parse).transpose()?.unwrap_or(1);
        let max = match element.attribute("maxOccurs") {
            Some("unbounded") => None,
            Some(value) => Some(parse(value)?),
            None => Some(1),
        };
        Ok((min, max))
    }

    fn particle(&self, element: &XmlElement) -> Result<Particle> {
        let (min_occurs, max_occurs) = self.occurs(element)?;
        let term = match element.local_name.as_str() {
            "element" => match element.attribute("ref") {
                Some(reference) => Term::ElementRef(self.qname(element, reference)?),
                None => Term::Element(self.element_decl(element, false)?),
            },
            "sequence" => Term::Sequence(self.particles(element)?),
            "choice" => Term::Choice(self.particles(element)?),
            "all" => Term::All(self.particles(element)?),
            "any" => Term::Any {
                namespaces: self.wildcard(element.attribute("namespace")),
                process: match element.attribute("processContents") {
                    Some("lax") => ProcessContents::Lax,
                    Some("skip") => ProcessContents::Skip,
                    _ => ProcessContents::Strict,
                },
            },
            _ => return Err(unsupported("content model", element)),
        };

        Ok(Particle {
            min_occurs,
            max_occurs,
            term,
        })
    }

    fn particles(&self, group: &XmlElement) -> Result<Vec<Particle>> {
        group
            .children
            .iter()
            .filter(|c| !is_xsd(c, "annotation"))
            .map(|c| self.particle(c))
            .collect()
    }

    fn wildcard(&self, namespace: Option<&str>) -> Wildcard {
        match namespace.map(str::trim) {
            None | Some("##any") => Wildcard::Any,
            Some("##other") => Wildcard::Other(self.target_namespace.clone()),
            Some(list) => Wildcard::List(
                list.split_whitespace()
                    .map(|token| match token {
                        "##targetNamespace" => self.target_namespace.clone(),
                        "##local" => None,
                        uri => Some(uri.to_string()),
                    })
                    .collect(),
            ),
        }
    }

    fn attribute_decl(&self, element: &XmlElement) -> Result<AttributeDecl> {
        let name = element.attribute("name").ok_or_else(|| {
            Error::InvalidFormat(format!(
                "Attribute declaration at byte {} has no name",
                element.span.start
            ))
        })?;
        let type_ref = match element.attribute("type") {
            Some(type_name) => SimpleTypeRef::Named(self.qname(element, type_name)?),
            None => match element.children.iter().find(|c| is_xsd(c, "simpleType")) {
                Some(simple) => SimpleTypeRef::Inline(self.simple_type(simple)?),
                None => SimpleTypeRef::Inline(SimpleType::builtin(Builtin::AnySimpleType)),
            },
        };

        Ok(AttributeDecl {
            name: name.to_string(),
            type_ref,
            required: element.attribute("use") == Some("required"),
        })
    }

    /// Only `xsd:restriction` of a built-in base with enumeration facets.
    fn simple_type(&self, element: &XmlElement) -> Result<SimpleType> {
        let restriction = element
            .children
            .iter()
            .find(|c| is_xsd(c, "restriction"))
            .ok_or_else(|| unsupported("simpleType", element))?;
        let base_name = restriction
            .attribute("base")
            .ok_or_else(|| unsupported("restriction", restriction))?;
        let base_qname = self.qname(restriction, base_name)?;
        let base = (base_qname.namespace.as_deref() == Some(XSD_NAMESPACE))
            .then(|| Builtin::from_local_name(&base_qname.local))
            .flatten()
            .ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "Simple type base '{}' is not a supported built-in type",
                    base_name
                ))
            })?;

        let enumeration = restriction
            .children
            .iter()
            .filter(|c| is_xsd(c, "enumeration"))
            .filter_map(|c| c.attribute("value").map(str::to_string))
            .collect();

        Ok(SimpleType { base, enumeration })
    }
}

/// Every named type, group and element reference must resolve.
fn check_references(schema: &Schema) -> Result<()> {
    fn undefined(what: &str, name: &QName) -> Error {
        Error::InvalidFormat(format!("Schema references undefined {} {}", what, name))
    }

    fn check_simple(schema: &Schema, type_ref: &SimpleTypeRef) -> Result<()> {
        match type_ref {
            SimpleTypeRef::Named(name) if schema.simple_type(name).is_none() => {
                Err(undefined("simple type", name))
            },
            _ => Ok(()),
        }
    }

    fn check_complex(schema: &Schema, complex: &ComplexType) -> Result<()> {
        for attribute in &complex.attributes {
            check_simple(schema, &attribute.type_ref)?;
        }
        for group in &complex.attribute_groups {
            if !schema.attribute_groups.contains_key(group) {
                return Err(undefined("attribute group", group));
            }
        }
        match &complex.content {
            Some(particle) => check_particle(schema, particle),
            None => Ok(()),
        }
    }

    fn check_element(schema: &Schema, decl: &ElementDecl) -> Result<()> {
        match &decl.type_ref {
            TypeRef::Named(name) if schema.resolve_type(&decl.type_ref).is_none() => {
                Err(undefined("type", name))
            },
            TypeRef::InlineComplex(complex) => check_complex(schema, complex),
            _ => Ok(()),
        }
    }

    fn check_particle(schema: &Schema, particle: &Particle) -> Result<()> {
        match &particle.term {
            Term::Element(decl) => check_element(schema, decl),
            Term::ElementRef(name) if schema.element(name).is_none() => {
                Err(undefined("element", name))
            },
            Term::Sequence(items) | Term::Choice(items) | Term::All(items) => items
                .iter()
                .try_for_each(|item| check_particle(schema, item)),
            _ => Ok(()),
        }
    }

    for decl in schema.elements.values() {
        check_element(schema, decl)?;
    }
    for complex in schema.complex_types.values() {
        check_complex(schema, complex)?;
    }
    for attributes in schema.attribute_groups.values() {
        for attribute in attributes {
            check_simple(schema, &attribute.type_ref)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolver::BundledSchemas;
    use std::collections::HashMap;

    fn resources(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(name, text)| (name.to_string(), text.to_string()))
            .collect()
    }

    const MAIN: &str = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns="urn:main" xmlns:o="urn:other" targetNamespace="urn:main" elementFormDefault="qualified">
      <xsd:import namespace="urn:other" schemaLocation="other.xsd"/>
      <xsd:simpleType name="COLOR">
        <xsd:restriction base="xsd:string">
          <xsd:enumeration value="red"/>
          <xsd:enumeration value="green"/>
        </xsd:restriction>
      </xsd:simpleType>
      <xsd:attributeGroup name="common">
        <xsd:attribute name="ID" type="xsd:ID" use="required"/>
      </xsd:attributeGroup>
      <xsd:element name="ROOT">
        <xsd:complexType>
          <xsd:sequence>
            <xsd:element name="ITEM" minOccurs="0" maxOccurs="unbounded" type="ITEM-TYPE"/>
            <xsd:element ref="o:note"/>
          </xsd:sequence>
          <xsd:attributeGroup ref="common"/>
        </xsd:complexType>
      </xsd:element>
      <xsd:complexType name="ITEM-TYPE">
        <xsd:attribute name="COLOR" type="COLOR"/>
      </xsd:complexType>
    </xsd:schema>"#;

    const OTHER: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:other">
      <xs:element name="note" type="xs:string"/>
    </xs:schema>"#;

    #[test]
    fn test_compile_follows_imports() {
        let resolver = resources(&[("main.xsd", MAIN), ("other.xsd", OTHER)]);
        let schema = compile_schema(&resolver, "main.xsd").unwrap();

        assert_eq!(schema.resources, ["main.xsd", "other.xsd"]);
        let root = schema.element(&QName::new(Some("urn:main"), "ROOT")).unwrap();
        let TypeRef::InlineComplex(complex) = &root.type_ref else {
            panic!("ROOT should have an inline complex type");
        };
        assert_eq!(complex.attribute_groups.len(), 1);
        let Some(Particle {
            term: Term::Sequence(items),
            ..
        }) = &complex.content
        else {
            panic!("ROOT content should be a sequence");
        };
        assert_eq!(items[0].min_occurs, 0);
        assert_eq!(items[0].max_occurs, None);
        match &items[0].term {
            Term::Element(decl) => assert_eq!(decl.name, QName::new(Some("urn:main"), "ITEM")),
            other => panic!("Unexpected term {:?}", other),
        }
        assert_eq!(items[1].term, Term::ElementRef(QName::new(Some("urn:other"), "note")));

        let color = schema.simple_type(&QName::new(Some("urn:main"), "COLOR")).unwrap();
        assert_eq!(color.base, Builtin::String);
        assert_eq!(color.enumeration, ["red", "green"]);
    }

    #[test]
    fn test_missing_import_is_missing_resource() {
        let resolver = resources(&[("main.xsd", MAIN)]);
        assert!(matches!(
            compile_schema(&resolver, "main.xsd"),
            Err(Error::MissingResource(_))
        ));
        assert!(matches!(
            compile_schema(&resolver, "absent.xsd"),
            Err(Error::MissingResource(_))
        ));
    }

    #[test]
    fn test_undefined_type_is_rejected() {
        let text = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
            <xsd:element name="A" type="NOPE"/></xsd:schema>"#;
        let resolver = resources(&[("a.xsd", text)]);
        assert!(matches!(
            compile_schema(&resolver, "a.xsd"),
            Err(Error::InvalidFormat(msg)) if msg.contains("NOPE")
        ));
    }

    #[test]
    fn test_unsupported_construct_is_rejected() {
        let text = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
            <xsd:group name="g"/></xsd:schema>"#;
        let resolver = resources(&[("a.xsd", text)]);
        assert!(matches!(
            compile_schema(&resolver, "a.xsd"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_bundled_schemas_compile() {
        let schema = compile_schema(&BundledSchemas, crate::common::constants::ROOT_SCHEMA).unwrap();
        assert_eq!(schema.resources, ["reqif.xsd", "reqif-xhtml.xsd"]);
        assert!(
            schema
                .element(&QName::new(
                    Some(crate::common::constants::REQIF_NAMESPACE),
                    "REQ-IF"
                ))
                .is_some()
        );
        assert!(
            schema
                .element(&QName::new(
                    Some(crate::common::constants::XHTML_NAMESPACE),
                    "object"
                ))
                .is_some()
        );
    }
}
