//! End-to-end conversion of content streams.

use std::sync::Arc;

use folio_core::geometry::{Matrix, Rectangle};
use folio_core::model::{FallbackFont, Form, MemoryResources, XObject};
use folio_core::parser::parse_content;
use folio_core::{Annotation, ConvertOptions, Document, Node, Page, convert_page};

fn resources() -> MemoryResources {
    MemoryResources::new().with_font("F1", Arc::new(FallbackFont::new("serif", 500.0)))
}

fn convert_full(content: &[u8], resources: MemoryResources, options: &ConvertOptions) -> Document {
    let page = Page::from_bytes(
        Rectangle::new(0.0, 0.0, 300.0, 300.0),
        content,
        Arc::new(resources),
    );
    convert_page(&page, options).unwrap()
}

fn convert_with(content: &[u8], resources: MemoryResources) -> Document {
    convert_full(content, resources, &ConvertOptions::default())
}

fn convert(content: &[u8]) -> Document {
    convert_with(content, resources())
}

fn content(doc: &Document) -> &Node {
    doc.content().expect("content group")
}

fn clip_paths(doc: &Document) -> Vec<&Node> {
    doc.defs().expect("defs").descendants_with_tag("clipPath")
}

/// CSS declarations of a text class, from the stylesheet in defs.
fn class_rule(doc: &Document, class: &str) -> String {
    let sheet = doc.defs().expect("defs").descendants_with_tag("style")[0]
        .text
        .clone()
        .unwrap_or_default();
    let prefix = format!(".{}{{", class);
    sheet
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .and_then(|rule| rule.strip_suffix('}'))
        .expect("class rule")
        .to_string()
}

#[test]
fn test_single_rect_fill() {
    let doc = convert(b"100 100 100 100 re f");
    let root = content(&doc);
    assert_eq!(root.children.len(), 1);
    let rect = &root.children[0];
    assert_eq!(rect.tag, "rect");
    assert_eq!(rect.get_attr("x"), Some("100"));
    assert_eq!(rect.get_attr("y"), Some("100"));
    assert_eq!(rect.get_attr("width"), Some("100"));
    assert!(!rect.has_attr("fill"));
    assert!(clip_paths(&doc).is_empty());
}

#[test]
fn test_nested_rect_clips_merge_without_wrapper() {
    let doc = convert(b"10 10 280 280 re W n 20 20 260 260 re W n 30 30 10 10 re f");
    let root = content(&doc);
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].tag, "rect");
    assert!(clip_paths(&doc).is_empty());
}

#[test]
fn test_fill_clipped_by_rect_is_cut() {
    let doc = convert(b"0 0 100 100 re W n 50 50 100 100 re f");
    let rect = &content(&doc).children[0];
    assert_eq!(rect.tag, "rect");
    assert_eq!(rect.get_attr("width"), Some("50"));
    assert_eq!(rect.get_attr("y"), Some("200"));
    assert!(clip_paths(&doc).is_empty());
}

#[test]
fn test_nested_clips_under_translations() {
    let doc = convert(
        b"q 1 0 0 1 50 50 cm 0 0 100 100 re W n \
          q 1 0 0 1 50 50 cm 0 0 100 100 re W n \
          0 0 200 200 re f Q Q",
    );
    let root = content(&doc);
    assert_eq!(root.children.len(), 1);
    let rect = &root.children[0];
    assert_eq!(rect.tag, "rect");
    assert_eq!(rect.get_attr("x"), Some("100"));
    assert_eq!(rect.get_attr("y"), Some("150"));
    assert_eq!(rect.get_attr("width"), Some("50"));
    assert_eq!(rect.get_attr("height"), Some("50"));
    assert!(clip_paths(&doc).is_empty());
}

#[test]
fn test_path_clip_wraps_consecutive_content() {
    let doc = convert(b"0 0 m 200 0 l 100 200 l h W n 0 0 50 50 re f 60 0 50 50 re f");
    let root = content(&doc);
    assert_eq!(root.children.len(), 1);
    let group = &root.children[0];
    assert_eq!(group.tag, "g");
    assert_eq!(group.children.len(), 2);
    let clips = clip_paths(&doc);
    assert_eq!(clips.len(), 1);
    let url = format!("url(#{})", clips[0].get_attr("id").unwrap());
    assert_eq!(group.get_attr("clip-path"), Some(url.as_str()));
}

#[test]
fn test_restore_ends_clip_group() {
    let doc = convert(b"q 0 0 m 200 0 l 100 200 l h W n 0 0 50 50 re f Q 0 0 10 10 re f");
    let root = content(&doc);
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].tag, "g");
    assert_eq!(root.children[1].tag, "rect");
}

#[test]
fn test_malformed_operator_skipped() {
    let doc = convert(b"0 0 m /x l 100 100 l S");
    let paths = content(&doc).descendants_with_tag("path");
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].get_attr("d"), Some("M0 300L100 200"));
}

#[test]
fn test_text_object() {
    let doc = convert(b"BT /F1 12 Tf 10 20 Td (Hi) Tj ET");
    let texts = content(&doc).descendants_with_tag("text");
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].text.as_deref(), Some("Hi"));
    assert_eq!(texts[0].get_attr("x"), Some("10"));
    assert_eq!(texts[0].get_attr("y"), Some("280"));
}

#[test]
fn test_horizontal_scaling_sets_text_length() {
    let doc = convert(b"BT /F1 10 Tf 50 Tz 10 20 Td (abc) Tj ET");
    let texts = content(&doc).descendants_with_tag("text");
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].text.as_deref(), Some("abc"));
    // Three glyphs of half an em at size 10, squeezed to 50%.
    assert_eq!(texts[0].get_attr("textLength"), Some("7.5"));
    assert_eq!(texts[0].get_attr("lengthAdjust"), Some("spacingAndGlyphs"));
}

#[test]
fn test_invisible_text_is_transparent() {
    let stream = b"BT /F1 10 Tf 3 Tr 10 20 Td (hidden) Tj ET";
    let doc = convert(stream);
    let texts = content(&doc).descendants_with_tag("text");
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].text.as_deref(), Some("hidden"));
    let class = texts[0].get_attr("class").expect("text class");
    let rule = class_rule(&doc, class);
    assert!(rule.ends_with("fill:#000;fill-opacity:0"), "{}", rule);

    let options = ConvertOptions {
        include_hidden_text: false,
        ..Default::default()
    };
    let doc = convert_full(stream, resources(), &options);
    assert!(content(&doc).descendants_with_tag("text").is_empty());
}

#[test]
fn test_nesting_limit_skips_branch_only() {
    // Each form draws a rect and calls the next one, deeper than the limit.
    let mut res = resources();
    for i in 0..40 {
        let stream = format!("{} 0 1 1 re f /Fm{} Do", i * 2, i + 1);
        let form = Form {
            id: format!("Fm{}", i).into(),
            content: parse_content(stream.as_bytes()).into(),
            matrix: Matrix::IDENTITY,
            bbox: None,
            resources: None,
            group: None,
        };
        res = res.with_xobject(&format!("Fm{}", i), XObject::Form(Arc::new(form)));
    }
    let options = ConvertOptions::default();
    let doc = convert_full(b"/Fm0 Do 200 0 10 10 re f", res, &options);
    let rects = content(&doc).descendants_with_tag("rect");
    assert_eq!(rects.len(), options.max_nesting_depth + 1);
    // The page continues after the skipped branch.
    assert_eq!(rects.last().unwrap().get_attr("x"), Some("200"));
}

#[test]
fn test_form_xobject_inherits_ctm() {
    let form = Form {
        id: "Fm1".into(),
        content: parse_content(b"0 0 10 10 re f").into(),
        matrix: Matrix::translation(5.0, 5.0),
        bbox: None,
        resources: None,
        group: None,
    };
    let resources = resources().with_xobject("Fm1", XObject::Form(Arc::new(form)));
    let doc = convert_with(b"2 0 0 2 0 0 cm /Fm1 Do", resources);
    let rect = &content(&doc).children[0];
    assert_eq!(rect.get_attr("x"), Some("10"));
    assert_eq!(rect.get_attr("y"), Some("270"));
    assert_eq!(rect.get_attr("width"), Some("20"));
}

#[test]
fn test_annotation_fitted_to_rect() {
    let appearance = Form {
        id: "AP".into(),
        content: parse_content(b"0 0 10 10 re f").into(),
        matrix: Matrix::IDENTITY,
        bbox: Some(Rectangle::new(0.0, 0.0, 10.0, 10.0)),
        resources: None,
        group: None,
    };
    let annot = Annotation {
        rect: Rectangle::new(50.0, 50.0, 70.0, 70.0),
        appearance: Arc::new(appearance),
        hidden: false,
    };
    let page = Page::from_bytes(
        Rectangle::new(0.0, 0.0, 300.0, 300.0),
        b"",
        Arc::new(resources()),
    )
    .with_annotations(vec![annot]);
    let doc = convert_page(&page, &ConvertOptions::default()).unwrap();
    let rects = content(&doc).descendants_with_tag("rect");
    assert_eq!(rects.len(), 1);
    assert_eq!(rects[0].get_attr("x"), Some("50"));
    assert_eq!(rects[0].get_attr("y"), Some("230"));
    assert_eq!(rects[0].get_attr("width"), Some("20"));
}

#[test]
fn test_identical_runs_grouped_by_optimizer() {
    let doc = convert(b"1 0 0 rg 0 0 10 10 re f 20 0 10 10 re f 40 0 10 10 re f");
    let root = content(&doc);
    // The content group itself receives the shared fill.
    assert_eq!(root.get_attr("fill"), Some("#f00"));
    assert_eq!(root.children.len(), 3);
    assert!(root.children.iter().all(|c| !c.has_attr("fill")));
}
