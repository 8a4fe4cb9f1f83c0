//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const STAMP: &str = "2017-03-13T10:15:09Z";

/// A spec object in a generated document: identifier, long name and the
/// markup inside its `xhtml:div` value.
pub struct Object<'a> {
    pub identifier: &'a str,
    pub long_name: &'a str,
    pub markup: &'a str,
}

impl<'a> Object<'a> {
    pub fn new(identifier: &'a str, long_name: &'a str, markup: &'a str) -> Self {
        Self {
            identifier,
            long_name,
            markup,
        }
    }
}

/// A schema-valid ReqIF document with one XHTML attribute per object.
pub fn reqif_document(header_id: &str, objects: &[Object<'_>]) -> String {
    let mut spec_objects = String::new();
    for object in objects {
        spec_objects.push_str(&format!(
            r#"        <SPEC-OBJECT IDENTIFIER="{id}" LAST-CHANGE="{STAMP}" LONG-NAME="{name}">
          <VALUES>
            <ATTRIBUTE-VALUE-XHTML>
              <THE-VALUE><xhtml:div>{markup}</xhtml:div></THE-VALUE>
              <DEFINITION><ATTRIBUTE-DEFINITION-XHTML-REF>ad-x</ATTRIBUTE-DEFINITION-XHTML-REF></DEFINITION>
            </ATTRIBUTE-VALUE-XHTML>
          </VALUES>
          <TYPE><SPEC-OBJECT-TYPE-REF>sot</SPEC-OBJECT-TYPE-REF></TYPE>
        </SPEC-OBJECT>
"#,
            id = object.identifier,
            name = object.long_name,
            markup = object.markup,
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<REQ-IF xmlns="http://www.omg.org/spec/ReqIF/20110401/reqif.xsd" xmlns:xhtml="http://www.w3.org/1999/xhtml">
  <THE-HEADER>
    <REQ-IF-HEADER IDENTIFIER="{header_id}">
      <CREATION-TIME>2017-03-13T10:15:09.017+01:00</CREATION-TIME>
      <REQ-IF-TOOL-ID>tool</REQ-IF-TOOL-ID>
      <REQ-IF-VERSION>1.0</REQ-IF-VERSION>
      <SOURCE-TOOL-ID>source</SOURCE-TOOL-ID>
      <TITLE>{header_id}</TITLE>
    </REQ-IF-HEADER>
  </THE-HEADER>
  <CORE-CONTENT>
    <REQ-IF-CONTENT>
      <DATATYPES>
        <DATATYPE-DEFINITION-XHTML IDENTIFIER="dt-x" LAST-CHANGE="{STAMP}"/>
      </DATATYPES>
      <SPEC-TYPES>
        <SPEC-OBJECT-TYPE IDENTIFIER="sot" LAST-CHANGE="{STAMP}">
          <SPEC-ATTRIBUTES>
            <ATTRIBUTE-DEFINITION-XHTML IDENTIFIER="ad-x" LAST-CHANGE="{STAMP}">
              <TYPE><DATATYPE-DEFINITION-XHTML-REF>dt-x</DATATYPE-DEFINITION-XHTML-REF></TYPE>
            </ATTRIBUTE-DEFINITION-XHTML>
          </SPEC-ATTRIBUTES>
        </SPEC-OBJECT-TYPE>
      </SPEC-TYPES>
      <SPEC-OBJECTS>
{spec_objects}      </SPEC-OBJECTS>
    </REQ-IF-CONTENT>
  </CORE-CONTENT>
  <TOOL-EXTENSIONS>
    <REQ-IF-TOOL-EXTENSION><vendor:cfg xmlns:vendor="urn:vendor"><vendor:item k="1"/></vendor:cfg></REQ-IF-TOOL-EXTENSION>
  </TOOL-EXTENSIONS>
</REQ-IF>"#
    )
}

/// PNG bytes of a solid image.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

/// Write a ZIP container with the given entries, in order.
pub fn write_container(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create container");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, bytes) in entries {
        zip.start_file(*name, options).expect("start entry");
        zip.write_all(bytes).expect("write entry");
    }
    zip.finish().expect("finish container");
}
