//! Checking a parsed document against a compiled [`Schema`].
//!
//! Validation never stops at the first problem. Every issue is handed to the
//! report callback and the walk continues with the next element.

use crate::common::xml::XmlElement;
use crate::schema::model::{
    Builtin, ComplexType, Particle, ProcessContents, QName, ResolvedType, Schema, SimpleType,
    Term, TypeRef, XML_NAMESPACE, XSI_NAMESPACE,
};
use crate::schema::{TextPosition, ValidationEvent, ValidationSeverity};
use std::collections::HashSet;

/// Walks one document and reports every schema violation.
pub struct Validator<'a, 'r> {
    schema: &'a Schema,
    source: &'a str,
    report: &'r mut dyn FnMut(&ValidationEvent),
    ids: HashSet<String>,
    id_refs: Vec<(String, usize)>,
    issues: usize,
}

impl<'a, 'r> Validator<'a, 'r> {
    pub fn new(
        schema: &'a Schema,
        source: &'a str,
        report: &'r mut dyn FnMut(&ValidationEvent),
    ) -> Self {
        Self {
            schema,
            source,
            report,
            ids: HashSet::new(),
            id_refs: Vec::new(),
            issues: 0,
        }
    }

    /// Validate the tree below `root`; returns the number of reported issues.
    pub fn validate(mut self, root: &XmlElement) -> usize {
        let schema = self.schema;
        match schema.element(&qname_of(root)) {
            Some(decl) => self.element(root, &decl.type_ref),
            None => self.error(
                root.span.start,
                format!("No declaration for root element <{}>", qname_of(root)),
            ),
        }

        for (reference, offset) in std::mem::take(&mut self.id_refs) {
            if !self.ids.contains(&reference) {
                self.issue(
                    ValidationSeverity::Warning,
                    offset,
                    format!("Reference '{}' does not match any IDENTIFIER", reference),
                );
            }
        }
        self.issues
    }

    fn issue(&mut self, severity: ValidationSeverity, offset: usize, message: String) {
        self.issues += 1;
        let event = ValidationEvent {
            severity,
            message,
            position: Some(TextPosition::from_offset(self.source, offset)),
        };
        (self.report)(&event);
    }

    fn error(&mut self, offset: usize, message: String) {
        self.issue(ValidationSeverity::Error, offset, message);
    }

    fn element(&mut self, element: &XmlElement, type_ref: &'a TypeRef) {
        match self.schema.resolve_type(type_ref) {
            Some(ResolvedType::Complex(complex)) => self.complex(element, complex),
            Some(ResolvedType::Simple(simple)) => self.simple_element(element, simple),
            Some(ResolvedType::Any) | None => {},
        }
    }

    fn simple_element(&mut self, element: &XmlElement, simple: &SimpleType) {
        if let Some(child) = element.children.first() {
            self.error(
                child.span.start,
                format!(
                    "Element <{}> is not allowed inside <{}>, which holds text only",
                    child.local_name, element.local_name
                ),
            );
            return;
        }
        let text = element.text(self.source);
        let what = format!("content of <{}>", element.local_name);
        self.value(element.span.start, simple, &text, &what);
    }

    fn complex(&mut self, element: &XmlElement, complex: &'a ComplexType) {
        self.attributes(element, complex);

        if element.has_text && !complex.mixed {
            self.error(
                element.span.start,
                format!("Character data is not allowed in <{}>", element.local_name),
            );
        }

        let Some(particle) = &complex.content else {
            if let Some(child) = element.children.first() {
                self.error(
                    child.span.start,
                    format!(
                        "Element <{}> is not allowed in <{}>, which must be empty",
                        child.local_name, element.local_name
                    ),
                );
            }
            return;
        };

        let mut matcher = Matcher {
            schema: self.schema,
            children: &element.children,
            bindings: Vec::new(),
        };
        let Some(end) = matcher.particle(particle, 0) else {
            self.error(
                element.span.start,
                format!(
                    "Content of <{}> does not match its declaration: required elements are missing",
                    element.local_name
                ),
            );
            return;
        };
        if let Some(extra) = element.children.get(end) {
            self.error(
                extra.span.start,
                format!(
                    "Unexpected element <{}> in <{}>",
                    extra.local_name, element.local_name
                ),
            );
        }

        for (index, binding) in matcher.bindings {
            let child = &element.children[index];
            match binding {
                Binding::Typed(type_ref) => self.element(child, type_ref),
                Binding::Lax => self.lax(child),
                Binding::Skip => {},
                Binding::Undeclared => self.error(
                    child.span.start,
                    format!("No declaration for element <{}>", qname_of(child)),
                ),
            }
        }
    }

    /// Validate declared descendants, ignore the rest.
    fn lax(&mut self, element: &XmlElement) {
        let schema = self.schema;
        match schema.element(&qname_of(element)) {
            Some(decl) => self.element(element, &decl.type_ref),
            None => {
                for child in &element.children {
                    self.lax(child);
                }
            },
        }
    }

    fn attributes(&mut self, element: &XmlElement, complex: &'a ComplexType) {
        let schema = self.schema;

        for attribute in &element.attributes {
            if matches!(
                attribute.namespace.as_deref(),
                Some(XML_NAMESPACE) | Some(XSI_NAMESPACE)
            ) {
                continue;
            }
            let decl = match attribute.namespace {
                None => schema
                    .attributes_of(complex)
                    .find(|d| d.name == attribute.local_name),
                Some(_) => None,
            };
            match decl {
                Some(decl) => {
                    if let Some(simple) = schema.resolve_simple(&decl.type_ref) {
                        let what = format!("attribute {} of <{}>", decl.name, element.local_name);
                        self.value(element.span.start, simple, &attribute.value, &what);
                    }
                },
                None if complex.any_attribute => {},
                None => self.error(
                    element.span.start,
                    format!(
                        "Attribute '{}' is not allowed on <{}>",
                        attribute.name, element.local_name
                    ),
                ),
            }
        }

        for decl in schema.attributes_of(complex).filter(|d| d.required) {
            if element.attribute(&decl.name).is_none() {
                self.error(
                    element.span.start,
                    format!(
                        "Required attribute '{}' is missing on <{}>",
                        decl.name, element.local_name
                    ),
                );
            }
        }
    }

    fn value(&mut self, offset: usize, simple: &SimpleType, value: &str, what: &str) {
        let checked = if simple.base == Builtin::String {
            value
        } else {
            value.trim()
        };

        if let Err(reason) = check_lexical(simple.base, checked) {
            self.error(offset, format!("Invalid {}: {}", what, reason));
            return;
        }
        if !simple.enumeration.is_empty() && !simple.enumeration.iter().any(|e| e == checked) {
            self.error(
                offset,
                format!(
                    "Invalid {}: '{}' is not one of {:?}",
                    what, checked, simple.enumeration
                ),
            );
            return;
        }

        match simple.base {
            Builtin::Id => {
                if !self.ids.insert(checked.to_string()) {
                    self.error(offset, format!("Duplicate IDENTIFIER '{}'", checked));
                }
            },
            Builtin::IdRef => self.id_refs.push((checked.to_string(), offset)),
            _ => {},
        }
    }
}

fn qname_of(element: &XmlElement) -> QName {
    QName::new(element.namespace.as_deref(), &element.local_name)
}

/// Lexical space check of a built-in type.
pub fn check_lexical(base: Builtin, value: &str) -> Result<(), String> {
    let valid = match base {
        Builtin::AnySimpleType | Builtin::String | Builtin::Token | Builtin::AnyUri => true,
        Builtin::Boolean => matches!(value, "true" | "false" | "1" | "0"),
        Builtin::Integer => value.parse::<i128>().is_ok(),
        Builtin::NonNegativeInteger => value.parse::<u128>().is_ok(),
        Builtin::Double => value.parse::<f64>().is_ok(),
        Builtin::DateTime => {
            chrono::DateTime::parse_from_rfc3339(value).is_ok()
                || chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        },
        Builtin::Id | Builtin::IdRef | Builtin::NcName => is_ncname(value),
    };

    if valid {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid {:?} value", value, base))
    }
}

fn is_ncname(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// How a matched child is validated afterwards.
#[derive(Debug, Clone, Copy)]
enum Binding<'a> {
    Typed(&'a TypeRef),
    Lax,
    Skip,
    /// Matched a strict wildcard but has no global declaration
    Undeclared,
}

/// Greedy content model matcher over one element's children.
struct Matcher<'a, 'c> {
    schema: &'a Schema,
    children: &'c [XmlElement],
    bindings: Vec<(usize, Binding<'a>)>,
}

impl<'a> Matcher<'a, '_> {
    /// Match `particle` starting at child `pos`; returns the position after it.
    fn particle(&mut self, particle: &'a Particle, pos: usize) -> Option<usize> {
        let mark = self.bindings.len();
        let mut at = pos;
        let mut count = 0;

        while particle.allows_more(count) {
            match self.term(&particle.term, at) {
                Some(next) if next > at => {
                    at = next;
                    count += 1;
                },
                // An empty match can repeat as often as needed
                Some(_) => {
                    count = count.max(particle.min_occurs);
                    break;
                },
                None => break,
            }
        }

        if count >= particle.min_occurs {
            Some(at)
        } else {
            self.bindings.truncate(mark);
            None
        }
    }

    fn term(&mut self, term: &'a Term, pos: usize) -> Option<usize> {
        match term {
            Term::Element(decl) => self.named(&decl.name, &decl.type_ref, pos),
            Term::ElementRef(name) => {
                let decl = self.schema.element(name)?;
                self.named(&decl.name, &decl.type_ref, pos)
            },
            Term::Any {
                namespaces,
                process,
            } => {
                let child = self.children.get(pos)?;
                if !namespaces.allows(child.namespace.as_deref()) {
                    return None;
                }
                let declared = self.schema.element(&qname_of(child));
                let binding = match (process, declared) {
                    (ProcessContents::Skip, _) => Binding::Skip,
                    (_, Some(decl)) => Binding::Typed(&decl.type_ref),
                    (ProcessContents::Lax, None) => Binding::Lax,
                    (ProcessContents::Strict, None) => Binding::Undeclared,
                };
                self.bindings.push((pos, binding));
                Some(pos + 1)
            },
            Term::Sequence(items) => {
                let mark = self.bindings.len();
                let mut at = pos;
                for item in items {
                    match self.particle(item, at) {
                        Some(next) => at = next,
                        None => {
                            self.bindings.truncate(mark);
                            return None;
                        },
                    }
                }
                Some(at)
            },
            Term::Choice(items) => {
                let mut empty_match = false;
                for item in items {
                    match self.particle(item, pos) {
                        Some(next) if next > pos => return Some(next),
                        Some(_) => empty_match = true,
                        None => {},
                    }
                }
                empty_match.then_some(pos)
            },
            Term::All(items) => {
                let mark = self.bindings.len();
                let mut counts = vec![0u32; items.len()];
                let mut at = pos;

                'children: while at < self.children.len() {
                    for (index, item) in items.iter().enumerate() {
                        if !item.allows_more(counts[index]) {
                            continue;
                        }
                        if let Some(next) = self.term(&item.term, at)
                            && next > at
                        {
                            counts[index] += 1;
                            at = next;
                            continue 'children;
                        }
                    }
                    break;
                }

                let complete = items
                    .iter()
                    .zip(&counts)
                    .all(|(item, &count)| count >= item.min_occurs);
                if complete {
                    Some(at)
                } else {
                    self.bindings.truncate(mark);
                    None
                }
            },
        }
    }

    fn named(&mut self, name: &QName, type_ref: &'a TypeRef, pos: usize) -> Option<usize> {
        let child = self.children.get(pos)?;
        let matches = child.local_name == name.local
            && child.namespace.as_deref() == name.namespace.as_deref();
        if matches {
            self.bindings.push((pos, Binding::Typed(type_ref)));
            Some(pos + 1)
        } else {
            None
        }
    }
}
