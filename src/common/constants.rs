//! Fixed names and signatures used across the loader.

/// Suffix identifying a document entry inside a container (compared case-insensitively).
pub const DOCUMENT_SUFFIX: &str = ".reqif";

/// Length of the signature sniffed at the start of a file.
pub const ZIP_SIGNATURE_LEN: usize = 4;

/// Signatures a ZIP archive can start with: a local file header, the
/// end-of-central-directory record of an empty archive, or a spanning marker.
pub const ZIP_SIGNATURES: [&[u8; ZIP_SIGNATURE_LEN]; 3] = [
    b"PK\x03\x04",
    b"PK\x05\x06",
    b"PK\x07\x08",
];

/// Local name of the XHTML element that embeds an attachment.
pub const OBJECT_ELEMENT: &str = "object";

/// MIME type marking an embedded object as a preview image.
pub const PREVIEW_MIME_TYPE: &str = "image/png";

/// ReqIF 1.0 target namespace.
pub const REQIF_NAMESPACE: &str = "http://www.omg.org/spec/ReqIF/20110401/reqif.xsd";

/// XHTML namespace used inside rich text values.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Logical name of the root schema in the bundled schema set.
pub const ROOT_SCHEMA: &str = "reqif.xsd";
