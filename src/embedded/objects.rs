//! Locating `<object>` references inside rich text markup.

use crate::common::constants::{OBJECT_ELEMENT, PREVIEW_MIME_TYPE};
use crate::common::xml::{XmlElement, XmlFragment};
use crate::common::{Error, Result};

/// One `<object>` element of a rich text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// The `type` attribute (a MIME type)
    pub mime_type: String,
    /// The `data` attribute, if present
    pub data: Option<String>,
}

impl ObjectRef {
    pub fn is_preview(&self) -> bool {
        self.mime_type == PREVIEW_MIME_TYPE
    }
}

/// The attachment and preview names an object group refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    /// `data` of the primary object
    pub file_name: String,
    /// `data` of the preview object
    pub image_name: String,
}

/// Every `object` element of `markup` in document order, namespace prefixes
/// ignored. The markup may have several top-level nodes.
///
/// # Errors
///
/// * [`Error::InvalidFormat`] if the markup is not well formed.
/// * [`Error::MalformedContent`] if an `object` element has no `type`.
pub fn find_objects(markup: &str) -> Result<Vec<ObjectRef>> {
    let fragment = XmlFragment::parse(markup)?;
    fragment
        .elements()
        .filter(|element| element.local_name == OBJECT_ELEMENT)
        .map(object_ref)
        .collect()
}

fn object_ref(element: &XmlElement) -> Result<ObjectRef> {
    let mime_type = unprefixed_attribute(element, "type").ok_or_else(|| {
        Error::MalformedContent("Embedded object has no 'type' attribute".to_string())
    })?;
    Ok(ObjectRef {
        mime_type: mime_type.to_string(),
        data: unprefixed_attribute(element, "data").map(str::to_string),
    })
}

/// `type` and `data` are plain attributes; `foo:type` does not count.
fn unprefixed_attribute<'e>(element: &'e XmlElement, name: &str) -> Option<&'e str> {
    element
        .attributes
        .iter()
        .find(|attr| attr.name == name)
        .map(|attr| attr.value.as_str())
}

/// Pick the primary attachment and the preview out of one value's objects.
///
/// The first `image/png` object is the preview; the first object of any other
/// type is the primary, falling back to the preview when there is none.
/// Returns `Ok(None)` for an empty slice.
///
/// # Errors
///
/// [`Error::MalformedContent`] when there is no preview or a chosen object
/// has no `data`.
pub fn classify_objects(objects: &[ObjectRef]) -> Result<Option<ObjectReference>> {
    if objects.is_empty() {
        return Ok(None);
    }

    let preview = objects.iter().find(|o| o.is_preview()).ok_or_else(|| {
        Error::MalformedContent(format!(
            "Embedded objects carry no '{}' preview",
            PREVIEW_MIME_TYPE
        ))
    })?;
    let primary = objects.iter().find(|o| !o.is_preview()).unwrap_or(preview);

    Ok(Some(ObjectReference {
        file_name: data_of(primary)?,
        image_name: data_of(preview)?,
    }))
}

fn data_of(object: &ObjectRef) -> Result<String> {
    object.data.clone().ok_or_else(|| {
        Error::MalformedContent(format!(
            "Embedded '{}' object has no 'data' attribute",
            object.mime_type
        ))
    })
}
