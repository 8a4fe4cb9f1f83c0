//! Integration tests for loading ReqIF packages from disk.

mod common;

use common::{Object, png, reqif_document, write_container};
use reqif_loader::{
    Error, LoadOptions, ValidationEvent, ValidationSeverity, load, load_with, load_with_options,
    parse_document,
};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

const PNG_ONLY: &str = r#"See <xhtml:object data="pic.png" type="image/png">pic</xhtml:object>"#;
const PDF_WITH_PREVIEW: &str = r#"<xhtml:object data="doc.pdf" type="application/pdf"><xhtml:object data="pic.png" type="image/png">pic</xhtml:object></xhtml:object>"#;

#[test]
fn test_single_document_container_matches_plain_parse() {
    let dir = TempDir::new().unwrap();
    let xml = reqif_document("h-1", &[Object::new("o-1", "First", "plain text")]);
    let path = dir.path().join("single.reqifz");
    write_container(&path, &[("single.reqif", xml.as_bytes())]);

    let loaded = load(&path).unwrap();
    let parsed = parse_document(xml.as_bytes()).unwrap();

    assert_eq!(loaded, parsed);
    assert!(loaded.attachments.is_empty());
}

#[test]
fn test_container_documents_merge_first_definition_wins() {
    let dir = TempDir::new().unwrap();
    let first = reqif_document(
        "h-1",
        &[
            Object::new("a", "A", "a"),
            Object::new("shared", "from first", "x"),
        ],
    );
    let second = reqif_document(
        "h-2",
        &[
            Object::new("shared", "from second", "y"),
            Object::new("c", "C", "c"),
        ],
    );
    let path = dir.path().join("merged.reqifz");
    write_container(
        &path,
        &[("one.reqif", first.as_bytes()), ("two.REQIF", second.as_bytes())],
    );

    let document = load(&path).unwrap();

    assert_eq!(document.header.as_ref().unwrap().identifier, "h-1");
    assert_eq!(document.core_content.len(), 1);
    let content = document.content().unwrap();
    let ids: Vec<_> = content
        .spec_objects
        .iter()
        .map(|o| o.identity.identifier.as_str())
        .collect();
    assert_eq!(ids, ["a", "shared", "c"]);
    assert_eq!(content.datatypes.len(), 1);
    assert_eq!(content.spec_types.len(), 1);
    assert_eq!(
        document.spec_object("shared").unwrap().identity.long_name.as_deref(),
        Some("from first")
    );
    assert_eq!(document.tool_extensions.len(), 2);
}

#[test]
fn test_png_object_resolves_to_attachment() {
    let dir = TempDir::new().unwrap();
    let xml = reqif_document("h-1", &[Object::new("o-1", "Picture", PNG_ONLY)]);
    let path = dir.path().join("pic.reqifz");
    let image = png(4, 3);
    write_container(
        &path,
        &[("doc.reqif", xml.as_bytes()), ("pic.png", &image)],
    );

    let document = load(&path).unwrap();

    assert_eq!(document.attachments.len(), 1);
    let attachment = document.attachment("pic.png").unwrap();
    assert_eq!(attachment.image_name, "pic.png");
    assert_eq!(attachment.object_value, image);
    assert!(!attachment.has_distinct_preview());
    assert_eq!(attachment.preview_image.width(), 4);
    assert_eq!(attachment.preview_image.height(), 3);
}

#[test]
fn test_object_with_separate_preview() {
    let dir = TempDir::new().unwrap();
    let xml = reqif_document("h-1", &[Object::new("o-1", "Report", PDF_WITH_PREVIEW)]);
    let path = dir.path().join("pdf.reqifz");
    let pdf = b"%PDF-1.4 not really".to_vec();
    write_container(
        &path,
        &[
            ("doc.reqif", xml.as_bytes()),
            ("doc.pdf", &pdf),
            ("pic.png", &png(2, 2)),
        ],
    );

    let document = load(&path).unwrap();

    let attachment = document.attachment("doc.pdf").unwrap();
    assert_eq!(attachment.image_name, "pic.png");
    assert_eq!(attachment.object_value, pdf);
    assert!(attachment.has_distinct_preview());
    assert_eq!(attachment.preview_image.width(), 2);
}

#[test]
fn test_missing_attachment_is_not_found() {
    let dir = TempDir::new().unwrap();
    let xml = reqif_document("h-1", &[Object::new("o-1", "Report", PDF_WITH_PREVIEW)]);
    let path = dir.path().join("missing.reqifz");
    write_container(
        &path,
        &[("doc.reqif", xml.as_bytes()), ("pic.png", &png(2, 2))],
    );

    assert!(matches!(load(&path), Err(Error::NotFound(_))));
}

#[test]
fn test_plain_file_reads_sibling_attachments_like_a_container() {
    let dir = TempDir::new().unwrap();
    let xml = reqif_document("h-1", &[Object::new("o-1", "Report", PDF_WITH_PREVIEW)]);
    let pdf = b"%PDF-1.4".to_vec();
    let image = png(5, 1);

    let plain = dir.path().join("doc.reqif");
    fs::write(&plain, &xml).unwrap();
    fs::write(dir.path().join("doc.pdf"), &pdf).unwrap();
    fs::write(dir.path().join("pic.png"), &image).unwrap();

    let container = dir.path().join("doc.reqifz");
    write_container(
        &container,
        &[
            ("doc.reqif", xml.as_bytes()),
            ("doc.pdf", &pdf),
            ("pic.png", &image),
        ],
    );

    let from_plain = load(&plain).unwrap();
    let from_container = load(&container).unwrap();

    assert_eq!(from_plain.attachments.len(), 1);
    assert_eq!(from_plain, from_container);
}

#[test]
fn test_container_without_documents_is_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.reqifz");
    write_container(&path, &[("readme.txt", b"nothing here"), ("pic.png", &png(1, 1))]);

    assert!(matches!(load(&path), Err(Error::NotFound(_))));
}

#[test]
fn test_empty_archive_is_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.reqifz");
    write_container(&path, &[]);

    assert!(matches!(load(&path), Err(Error::NotFound(_))));
}

#[test]
fn test_byte_order_mark_keeps_rich_text_and_extensions_intact() {
    let dir = TempDir::new().unwrap();
    let xml = reqif_document("h-1", &[Object::new("o-1", "Picture", PNG_ONLY)]);
    let with_bom = [b"\xEF\xBB\xBF".as_slice(), xml.as_bytes()].concat();
    let image = png(3, 3);

    let plain = dir.path().join("doc.reqif");
    fs::write(&plain, &with_bom).unwrap();
    fs::write(dir.path().join("pic.png"), &image).unwrap();
    let container = dir.path().join("doc.reqifz");
    write_container(&container, &[("doc.reqif", &with_bom), ("pic.png", &image)]);

    let expected = parse_document(xml.as_bytes()).unwrap();
    for path in [plain, container] {
        let document = load(&path).unwrap();
        assert_eq!(document.core_content, expected.core_content);
        assert_eq!(document.tool_extensions, expected.tool_extensions);
        assert_eq!(document.attachment("pic.png").unwrap().object_value, image);
    }
}

#[test]
fn test_invalid_arguments() {
    assert!(matches!(load(""), Err(Error::ArgumentInvalid(_))));

    let mut callback = |_: &ValidationEvent| {};
    assert!(matches!(
        load_with("any.reqif", false, Some(&mut callback)),
        Err(Error::ArgumentInvalid(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.reqifz");

    assert!(matches!(load(&path), Err(Error::Io(_))));
    assert!(matches!(load_with(&path, true, None), Err(Error::Io(_))));
}

#[test]
fn test_validation_of_valid_document_reports_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("valid.reqif");
    fs::write(&path, reqif_document("h-1", &[Object::new("o-1", "Pic", PNG_ONLY)])).unwrap();

    let mut events = Vec::new();
    let mut callback = |event: &ValidationEvent| events.push(event.clone());
    let document = load_with(&path, true, Some(&mut callback)).unwrap();

    assert_eq!(events, Vec::new());
    assert_eq!(document.content().unwrap().spec_objects.len(), 1);
    // Validating loads do not resolve attachments.
    assert!(document.attachments.is_empty());
}

#[test]
fn test_validation_issues_reach_the_handler() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.reqif");
    let xml = reqif_document("h-1", &[Object::new("o-1", "Pic", PNG_ONLY)])
        .replace(r#" type="image/png""#, "")
        .replace(r#"LAST-CHANGE="2017-03-13T10:15:09Z" LONG-NAME"#, "LONG-NAME");
    fs::write(&path, xml).unwrap();

    let mut events = Vec::new();
    let options = LoadOptions::new()
        .with_validation(true)
        .with_validation_handler(|event: &ValidationEvent| events.push(event.clone()));
    let document = load_with_options(&path, options).unwrap();

    assert_eq!(document.header.unwrap().identifier, "h-1");
    assert!(events.len() >= 2);
    assert!(events.iter().all(|e| e.severity == ValidationSeverity::Error));
    assert!(events.iter().any(|e| e.message.contains("'type'")));
    assert!(events.iter().any(|e| e.message.contains("'LAST-CHANGE'")));
}

#[test]
fn test_validation_without_handler_still_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unreported.reqif");
    let xml = reqif_document("h-1", &[Object::new("o-1", "Pic", PNG_ONLY)])
        .replace(r#" type="image/png""#, "");
    fs::write(&path, xml).unwrap();

    let document = load_with(&path, true, None).unwrap();
    assert_eq!(document.content().unwrap().spec_objects.len(), 1);
}

#[test]
fn test_malformed_xml_is_invalid_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("malformed.reqif");
    fs::write(&path, "<REQ-IF><THE-HEADER></REQ-IF>").unwrap();

    assert!(matches!(load(&path), Err(Error::InvalidFormat(_))));

    let mut events = Vec::new();
    let mut callback = |event: &ValidationEvent| events.push(event.clone());
    assert!(matches!(
        load_with(&path, true, Some(&mut callback)),
        Err(Error::InvalidFormat(_))
    ));
    assert!(events.is_empty());
}

#[test]
fn test_custom_schema_resolver_missing_resource() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.reqif");
    fs::write(&path, reqif_document("h-1", &[])).unwrap();

    let schemas: HashMap<String, String> = HashMap::new();
    let options = LoadOptions::new()
        .with_validation(true)
        .with_schema_resolver(schemas);

    assert!(matches!(
        load_with_options(&path, options),
        Err(Error::MissingResource(_))
    ));
}

#[test]
fn test_tool_extensions_survive_round_trip() {
    let xml = reqif_document("h-1", &[Object::new("o-1", "First", "text")]);
    let document = parse_document(xml.as_bytes()).unwrap();
    let markup = document.tool_extensions[0].markup().to_string();
    assert!(markup.contains(r#"<vendor:item k="1"/>"#));

    let reread = parse_document(document.to_xml().as_bytes()).unwrap();

    assert_eq!(reread.tool_extensions[0].markup(), markup);
    assert_eq!(reread, document);
}
