//! Compiled form of an XML Schema set.
//!
//! Only the parts of XSD the ReqIF schemas use are represented: global and
//! local element declarations, named and anonymous complex types with
//! sequence/choice/all/any content, attribute declarations and attribute
//! groups, and simple types restricted by enumeration.

use std::collections::HashMap;

/// Namespace of the XML Schema vocabulary and its built-in types.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespace of `xsi:` instance attributes.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespace bound to the `xml:` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Expanded name: namespace URI plus local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Built-in simple types with a lexical check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    AnySimpleType,
    String,
    Token,
    AnyUri,
    Boolean,
    Integer,
    NonNegativeInteger,
    Double,
    DateTime,
    Id,
    IdRef,
    NcName,
}

impl Builtin {
    /// Local names of the built-ins in the XSD namespace.
    pub const NAMES: &'static [&'static str] = &[
        "anySimpleType",
        "string",
        "normalizedString",
        "token",
        "language",
        "NMTOKEN",
        "anyURI",
        "boolean",
        "integer",
        "int",
        "long",
        "short",
        "nonNegativeInteger",
        "unsignedInt",
        "unsignedLong",
        "positiveInteger",
        "double",
        "float",
        "decimal",
        "dateTime",
        "ID",
        "IDREF",
        "NCName",
        "Name",
    ];

    /// Map a local name in the XSD namespace to a built-in type.
    pub fn from_local_name(name: &str) -> Option<Self> {
        Some(match name {
            "anySimpleType" => Builtin::AnySimpleType,
            "string" | "normalizedString" => Builtin::String,
            "token" | "language" | "NMTOKEN" => Builtin::Token,
            "anyURI" => Builtin::AnyUri,
            "boolean" => Builtin::Boolean,
            "integer" | "int" | "long" | "short" => Builtin::Integer,
            "nonNegativeInteger" | "unsignedInt" | "unsignedLong" | "positiveInteger" => {
                Builtin::NonNegativeInteger
            },
            "double" | "float" | "decimal" => Builtin::Double,
            "dateTime" => Builtin::DateTime,
            "ID" => Builtin::Id,
            "IDREF" => Builtin::IdRef,
            "NCName" | "Name" => Builtin::NcName,
            _ => return None,
        })
    }
}

/// A named or anonymous simple type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleType {
    pub base: Builtin,
    /// Allowed literals; empty means unrestricted
    pub enumeration: Vec<String>,
}

impl SimpleType {
    pub fn builtin(base: Builtin) -> Self {
        Self {
            base,
            enumeration: Vec::new(),
        }
    }
}

/// How a declaration points at its simple type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleTypeRef {
    Named(QName),
    Inline(SimpleType),
}

/// How an element declaration points at its type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A named complex or simple type
    Named(QName),
    InlineComplex(Box<ComplexType>),
    InlineSimple(SimpleType),
    /// No type given: anything goes
    AnyType,
}

/// Element declaration, global or local.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub name: QName,
    pub type_ref: TypeRef,
}

/// Attribute declaration; attributes are always unqualified here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: String,
    pub type_ref: SimpleTypeRef,
    pub required: bool,
}

/// Namespace constraint of a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wildcard {
    Any,
    /// Any namespace other than the schema's target namespace
    Other(Option<String>),
    /// One of the listed namespaces (`None` is "no namespace")
    List(Vec<Option<String>>),
}

impl Wildcard {
    pub fn allows(&self, namespace: Option<&str>) -> bool {
        match self {
            Wildcard::Any => true,
            Wildcard::Other(target) => namespace.is_some() && namespace != target.as_deref(),
            Wildcard::List(allowed) => allowed.iter().any(|ns| ns.as_deref() == namespace),
        }
    }
}

/// What to do with elements matched by a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

/// A content model term.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Element(ElementDecl),
    /// `ref` to a global element
    ElementRef(QName),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    All(Vec<Particle>),
    Any {
        namespaces: Wildcard,
        process: ProcessContents,
    },
}

/// A term with occurrence bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub min_occurs: u32,
    /// `None` is `unbounded`
    pub max_occurs: Option<u32>,
    pub term: Term,
}

impl Particle {
    pub fn once(term: Term) -> Self {
        Self {
            min_occurs: 1,
            max_occurs: Some(1),
            term,
        }
    }

    pub fn allows_more(&self, count: u32) -> bool {
        self.max_occurs.is_none_or(|max| count < max)
    }
}

/// Compiled complex type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexType {
    pub mixed: bool,
    /// `None` for empty content
    pub content: Option<Particle>,
    pub attributes: Vec<AttributeDecl>,
    /// Attribute groups referenced by name, expanded on lookup
    pub attribute_groups: Vec<QName>,
    /// `xsd:anyAttribute` present
    pub any_attribute: bool,
}

/// The compiled schema set.
#[derive(Debug, Default)]
pub struct Schema {
    pub elements: HashMap<QName, ElementDecl>,
    pub complex_types: HashMap<QName, ComplexType>,
    pub simple_types: HashMap<QName, SimpleType>,
    pub attribute_groups: HashMap<QName, Vec<AttributeDecl>>,
    /// Logical names of every resource that went into the set
    pub resources: Vec<String>,
}

/// A type resolved for validation.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedType<'a> {
    Complex(&'a ComplexType),
    Simple(&'a SimpleType),
    Any,
}

impl Schema {
    /// An empty set that already knows the built-in simple types.
    pub fn new() -> Self {
        let mut schema = Schema::default();
        for &local in Builtin::NAMES {
            if let Some(builtin) = Builtin::from_local_name(local) {
                schema.simple_types.insert(
                    QName::new(Some(XSD_NAMESPACE), local),
                    SimpleType::builtin(builtin),
                );
            }
        }
        schema
    }

    /// Look up a global element declaration.
    pub fn element(&self, name: &QName) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    /// Resolve an element's type reference.
    pub fn resolve_type<'a>(&'a self, type_ref: &'a TypeRef) -> Option<ResolvedType<'a>> {
        match type_ref {
            TypeRef::Named(name) => self.named_type(name),
            TypeRef::InlineComplex(complex) => Some(ResolvedType::Complex(complex)),
            TypeRef::InlineSimple(simple) => Some(ResolvedType::Simple(simple)),
            TypeRef::AnyType => Some(ResolvedType::Any),
        }
    }

    fn named_type<'a>(&'a self, name: &QName) -> Option<ResolvedType<'a>> {
        if name.namespace.as_deref() == Some(XSD_NAMESPACE) && name.local == "anyType" {
            return Some(ResolvedType::Any);
        }
        if let Some(complex) = self.complex_types.get(name) {
            return Some(ResolvedType::Complex(complex));
        }
        self.simple_type(name).map(ResolvedType::Simple)
    }

    /// Look up a named simple type, built-ins included.
    pub fn simple_type(&self, name: &QName) -> Option<&SimpleType> {
        self.simple_types.get(name)
    }

    /// Resolve an attribute's simple type.
    pub fn resolve_simple<'a>(&'a self, type_ref: &'a SimpleTypeRef) -> Option<&'a SimpleType> {
        match type_ref {
            SimpleTypeRef::Named(name) => self.simple_type(name),
            SimpleTypeRef::Inline(simple) => Some(simple),
        }
    }

    /// Every attribute a complex type declares, groups expanded.
    pub fn attributes_of<'a>(
        &'a self,
        complex: &'a ComplexType,
    ) -> impl Iterator<Item = &'a AttributeDecl> + 'a {
        complex.attributes.iter().chain(
            complex
                .attribute_groups
                .iter()
                .filter_map(|group| self.attribute_groups.get(group))
                .flatten(),
        )
    }
}
