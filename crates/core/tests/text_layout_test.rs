//! Paragraph building from positioned glyph runs.

use std::sync::Arc;

use folio_core::ConvertOptions;
use folio_core::geometry::Matrix;
use folio_core::layout::{TextBuilder, TextStyle};
use folio_core::model::{Rgb, TextRenderMode};

fn style(size: f64) -> Arc<TextStyle> {
    Arc::new(TextStyle {
        font_family: "serif".into(),
        bold: false,
        italic: false,
        font_size: size,
        fill: Some((Rgb::BLACK, 1.0)),
        fill_ref: None,
        stroke: None,
        letter_spacing: 0.0,
        scaling: 100.0,
        render_mode: TextRenderMode::Fill,
    })
}

fn builder() -> TextBuilder {
    TextBuilder::new(&ConvertOptions::default())
}

#[test]
fn test_small_gap_continues_paragraph() {
    let mut b = builder();
    let s = style(10.0);
    b.position(&Matrix::translation(100.0, 200.0));
    b.add_text("ab", 10.0, s.clone());
    // Run ended at 110; the next one starts 5 units later.
    b.position(&Matrix::translation(115.0, 200.0));
    b.add_text("cd", 10.0, s);

    let paragraphs = b.take();
    assert_eq!(paragraphs.len(), 1);
    let p = &paragraphs[0];
    assert_eq!((p.x, p.y), (100.0, 200.0));
    assert_eq!(p.spans.len(), 1);
    assert_eq!(p.spans[0].text, "abcd");
    assert_eq!(p.spans[0].leading_spaces, vec![0.0, 0.0, 5.0, 0.0]);
    assert_eq!(p.spans[0].extent(), 25.0);
}

#[test]
fn test_large_gap_starts_new_paragraph() {
    let mut b = builder();
    let s = style(10.0);
    b.position(&Matrix::translation(100.0, 200.0));
    b.add_text("ab", 10.0, s.clone());
    b.position(&Matrix::translation(250.0, 200.0));
    b.add_text("cd", 10.0, s);

    let paragraphs = b.take();
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[1].x, 250.0);
}

#[test]
fn test_baseline_change_starts_new_paragraph() {
    let mut b = builder();
    let s = style(10.0);
    b.position(&Matrix::translation(100.0, 200.0));
    b.add_text("ab", 10.0, s.clone());
    b.position(&Matrix::translation(110.0, 188.0));
    b.add_text("cd", 10.0, s);
    assert_eq!(b.paragraphs().len(), 2);
}

#[test]
fn test_scale_change_starts_new_paragraph() {
    let mut b = builder();
    b.position(&Matrix::translation(100.0, 200.0));
    b.add_text("ab", 10.0, style(10.0));
    let scale = b.position(&Matrix::new(2.0, 0.0, 0.0, 2.0, 220.0, 400.0));
    assert_eq!(scale, 2.0);
    b.add_text("cd", 10.0, style(10.0));

    let paragraphs = b.take();
    assert_eq!(paragraphs.len(), 2);
    assert_eq!((paragraphs[1].x, paragraphs[1].y), (220.0, 400.0));
    assert!(paragraphs[1].transform.is_identity());
}

#[test]
fn test_kerning_noise_dropped() {
    let mut b = builder();
    let s = style(10.0);
    b.position(&Matrix::translation(0.0, 0.0));
    b.add_text("a", 5.0, s.clone());
    b.position(&Matrix::translation(5.05, 0.0));
    b.add_text("b", 5.0, s);
    let paragraphs = b.take();
    assert_eq!(paragraphs[0].spans[0].leading_spaces, vec![0.0, 0.0]);
}

#[test]
fn test_style_change_opens_span() {
    let mut b = builder();
    b.position(&Matrix::translation(0.0, 0.0));
    b.add_text("a", 5.0, style(10.0));
    b.add_text("b", 6.0, style(12.0));
    let paragraphs = b.take();
    assert_eq!(paragraphs.len(), 1);
    assert_eq!(paragraphs[0].spans.len(), 2);
    assert!(b.is_empty());
}
