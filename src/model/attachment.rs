//! Attachments resolved from embedded objects in rich text.

use image::DynamicImage;

/// A binary attachment referenced by an `<object>` element in rich text.
///
/// `name` is the attachment's logical name (the `data` attribute of the
/// primary object); `image_name` names the preview, which is the same file
/// when the object carries no separate preview.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub image_name: String,
    /// Raw bytes of the attachment itself
    pub object_value: Vec<u8>,
    /// The decoded preview image
    pub preview_image: DynamicImage,
}

impl Attachment {
    /// Whether the preview is a separate file from the attachment.
    pub fn has_distinct_preview(&self) -> bool {
        self.name != self.image_name
    }
}
