//! Where schema text comes from.

use phf::phf_map;
use std::borrow::Cow;
use std::collections::HashMap;

/// Serves schema resources by logical name (`reqif.xsd`, the `schemaLocation`
/// of an import).
pub trait SchemaResolver {
    /// Text of the resource, or `None` if this resolver does not have it.
    fn resource(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Schemas compiled into the binary.
static BUNDLED: phf::Map<&'static str, &'static str> = phf_map! {
    "reqif.xsd" => include_str!("xsd/reqif.xsd"),
    "reqif-xhtml.xsd" => include_str!("xsd/reqif-xhtml.xsd"),
};

/// The ReqIF schema set shipped with the crate. Never touches the network or
/// the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSchemas;

impl BundledSchemas {
    /// Logical names of every bundled resource.
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUNDLED.keys().copied()
    }
}

impl SchemaResolver for BundledSchemas {
    fn resource(&self, name: &str) -> Option<Cow<'_, str>> {
        BUNDLED.get(name).map(|text| Cow::Borrowed(*text))
    }
}

/// In-memory resources, mostly for custom schema sets.
impl SchemaResolver for HashMap<String, String> {
    fn resource(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|text| Cow::Borrowed(text.as_str()))
    }
}
