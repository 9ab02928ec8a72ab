//! Serialized SVG output.

use std::sync::Arc;

use folio_core::geometry::Rectangle;
use folio_core::model::MemoryResources;
use folio_core::output::SvgWriter;
use folio_core::{ConvertOptions, Document, Page, convert_page};

fn convert(content: &[u8]) -> Document {
    let page = Page::from_bytes(
        Rectangle::new(0.0, 0.0, 100.0, 100.0),
        content,
        Arc::new(MemoryResources::new()),
    );
    convert_page(&page, &ConvertOptions::default()).unwrap()
}

fn root_markup(doc: &Document) -> String {
    let mut writer = SvgWriter::new(Vec::new());
    writer.write_node(&doc.root, 0).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
fn test_empty_page() {
    insta::assert_snapshot!(
        root_markup(&convert(b"")),
        @r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><defs/><g id="content"/></svg>"#
    );
}

#[test]
fn test_black_rect_omits_default_fill() {
    insta::assert_snapshot!(
        root_markup(&convert(b"0 0 10 10 re f")),
        @r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><defs/><g id="content"><rect x="0" y="90" width="10" height="10"/></g></svg>"#
    );
}

#[test]
fn test_colored_stroke() {
    insta::assert_snapshot!(
        root_markup(&convert(b"0 0 1 rg 1 0 0 RG 2 w 10 10 m 50 10 l S")),
        @r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><defs/><g id="content"><path d="M10 90H50" fill="none" stroke="#f00" stroke-width="2" stroke-miterlimit="10"/></g></svg>"##
    );
}

#[test]
fn test_document_has_xml_declaration() {
    let svg = convert(b"0 0 10 10 re f").to_svg();
    assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg "));
    assert!(svg.ends_with("</svg>"));
}

#[test]
fn test_pretty_output_indents_elements() {
    let doc = convert(b"0 0 10 10 re f");
    let mut writer = SvgWriter::new(Vec::new()).pretty(true);
    writer.write_document(&doc).unwrap();
    let svg = String::from_utf8(writer.into_inner()).unwrap();
    assert!(svg.contains("\n  <defs/>\n  <g id=\"content\">\n    <rect "));
}
