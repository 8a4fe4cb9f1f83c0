//! Turning `<object>` references into [`Attachment`]s.

use crate::common::{Error, Result};
use crate::embedded::objects::{ObjectReference, classify_objects, find_objects};
use crate::model::{Attachment, AttributeValue, ReqIfDocument};
use crate::package::AttachmentSource;
use log::{debug, trace};

/// Resolve every embedded object of the document's first content section.
///
/// Rich text values (`THE-VALUE` only) of each spec object are scanned in
/// order; each value with objects yields one [`Attachment`], appended in
/// discovery order. A name already present in `document.attachments` is not
/// appended again.
///
/// # Errors
///
/// * [`Error::MalformedContent`] for objects without `type`/`data` or a value
///   without a preview.
/// * [`Error::NotFound`] when `source` lacks a referenced file.
/// * [`Error::InvalidFormat`] when the preview does not decode as an image.
pub fn resolve_embedded_objects(
    document: &mut ReqIfDocument,
    source: &mut dyn AttachmentSource,
) -> Result<()> {
    let Some(content) = document.core_content.first() else {
        return Ok(());
    };

    let mut references = Vec::new();
    for object in &content.spec_objects {
        for value in &object.values {
            let AttributeValue::Xhtml { the_value, .. } = value else {
                continue;
            };
            if let Some(reference) = classify_objects(&find_objects(the_value.as_str())?)? {
                trace!(
                    "Spec object {} references '{}' (preview '{}')",
                    object.identity.identifier, reference.file_name, reference.image_name
                );
                references.push(reference);
            }
        }
    }

    for reference in references {
        if document.attachment(&reference.file_name).is_some() {
            trace!("Attachment '{}' already resolved", reference.file_name);
            continue;
        }
        let attachment = load_attachment(reference, source)?;
        debug!(
            "Resolved attachment '{}' ({} bytes, preview '{}' {}x{})",
            attachment.name,
            attachment.object_value.len(),
            attachment.image_name,
            attachment.preview_image.width(),
            attachment.preview_image.height()
        );
        document.attachments.push(attachment);
    }

    Ok(())
}

fn load_attachment(
    reference: ObjectReference,
    source: &mut dyn AttachmentSource,
) -> Result<Attachment> {
    let object_value = source.lookup(&reference.file_name)?;
    let preview_image = if reference.image_name == reference.file_name {
        decode_preview(&reference.image_name, &object_value)?
    } else {
        decode_preview(&reference.image_name, &source.lookup(&reference.image_name)?)?
    };

    Ok(Attachment {
        name: reference.file_name,
        image_name: reference.image_name,
        object_value,
        preview_image,
    })
}

fn decode_preview(name: &str, bytes: &[u8]) -> Result<image::DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| {
        Error::InvalidFormat(format!("Preview image '{}' cannot be decoded: {}", name, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identifiable, ReqIfContent, SpecObject, XhtmlContent};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn rich(markup: &str) -> AttributeValue {
        AttributeValue::Xhtml {
            definition: "def-text".to_string(),
            the_value: XhtmlContent::from(markup),
            the_original_value: None,
            is_simplified: false,
        }
    }

    fn document(values: Vec<Vec<AttributeValue>>) -> ReqIfDocument {
        let spec_objects = values
            .into_iter()
            .enumerate()
            .map(|(i, values)| SpecObject {
                identity: Identifiable::new(format!("obj-{}", i)),
                spec_type: "sot".to_string(),
                values,
            })
            .collect();
        ReqIfDocument {
            core_content: vec![ReqIfContent {
                spec_objects,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn source(files: &[(&str, Vec<u8>)]) -> HashMap<String, Vec<u8>> {
        files
            .iter()
            .map(|(name, bytes)| (name.to_string(), bytes.clone()))
            .collect()
    }

    #[test]
    fn test_png_only_object() {
        let mut doc = document(vec![vec![rich(
            r#"<xhtml:div><xhtml:object data="pic.png" type="image/png"/></xhtml:div>"#,
        )]]);
        let bytes = png(3, 2);
        let mut files = source(&[("pic.png", bytes.clone())]);

        resolve_embedded_objects(&mut doc, &mut files).unwrap();
        assert_eq!(doc.attachments.len(), 1);
        let attachment = &doc.attachments[0];
        assert_eq!(attachment.name, "pic.png");
        assert_eq!(attachment.image_name, "pic.png");
        assert_eq!(attachment.object_value, bytes);
        assert_eq!(attachment.preview_image.width(), 3);
        assert!(!attachment.has_distinct_preview());
    }

    #[test]
    fn test_document_with_preview() {
        let mut doc = document(vec![vec![rich(
            r#"<xhtml:object data="doc.pdf" type="application/pdf"><xhtml:object data="pic.png" type="image/png"/></xhtml:object>"#,
        )]]);
        let mut files = source(&[("doc.pdf", b"%PDF-1.4".to_vec()), ("pic.png", png(1, 1))]);

        resolve_embedded_objects(&mut doc, &mut files).unwrap();
        let attachment = &doc.attachments[0];
        assert_eq!(attachment.name, "doc.pdf");
        assert_eq!(attachment.image_name, "pic.png");
        assert_eq!(attachment.object_value, b"%PDF-1.4");
        assert!(attachment.has_distinct_preview());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let mut doc = document(vec![vec![rich(
            r#"<xhtml:object data="doc.pdf" type="application/pdf"/><xhtml:object data="pic.png" type="image/png"/>"#,
        )]]);
        let mut files = source(&[("pic.png", png(1, 1))]);

        assert!(matches!(
            resolve_embedded_objects(&mut doc, &mut files),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_undecodable_preview_is_invalid_format() {
        let mut doc = document(vec![vec![rich(r#"<xhtml:object data="pic.png" type="image/png"/>"#)]]);
        let mut files = source(&[("pic.png", b"not an image".to_vec())]);

        assert!(matches!(
            resolve_embedded_objects(&mut doc, &mut files),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_discovery_order_and_duplicates() {
        let a = r#"<xhtml:object data="a.png" type="image/png"/>"#;
        let b = r#"<xhtml:object data="b.png" type="image/png"/>"#;
        let mut doc = document(vec![
            vec![
                AttributeValue::String {
                    definition: "def-name".to_string(),
                    the_value: a.to_string(),
                },
                rich(b),
            ],
            vec![rich(a), rich(b)],
        ]);
        let mut files = source(&[("a.png", png(1, 1)), ("b.png", png(2, 2))]);

        resolve_embedded_objects(&mut doc, &mut files).unwrap();
        let names: Vec<&str> = doc.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["b.png", "a.png"]);
    }

    #[test]
    fn test_only_first_content_section_is_scanned() {
        let mut doc = document(Vec::new());
        doc.core_content.push(ReqIfContent {
            spec_objects: vec![SpecObject {
                identity: Identifiable::new("late"),
                spec_type: "sot".to_string(),
                values: vec![rich(r#"<xhtml:object data="x.png" type="image/png"/>"#)],
            }],
            ..Default::default()
        });
        let mut files = source(&[]);

        resolve_embedded_objects(&mut doc, &mut files).unwrap();
        assert!(doc.attachments.is_empty());
    }

    #[test]
    fn test_no_content_is_a_no_op() {
        let mut doc = ReqIfDocument::default();
        let mut files = source(&[]);
        resolve_embedded_objects(&mut doc, &mut files).unwrap();
        assert!(doc.attachments.is_empty());
    }
}
