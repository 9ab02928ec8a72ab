//! Graphics state stack behavior under random save/restore sequences.

use std::sync::Arc;

use folio_core::PageInterpreter;
use folio_core::geometry::Matrix;
use folio_core::model::MemoryResources;
use folio_core::ConvertOptions;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Save,
    Restore,
    Width(f64),
    Translate(f64, f64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Save),
        Just(Op::Restore),
        (0.0..20.0f64).prop_map(Op::Width),
        (-50.0..50.0f64, -50.0..50.0f64).prop_map(|(x, y)| Op::Translate(x, y)),
    ]
}

fn interpreter() -> PageInterpreter {
    PageInterpreter::new(
        Matrix::IDENTITY,
        100.0,
        100.0,
        Arc::new(MemoryResources::new()),
        ConvertOptions::default(),
    )
}

proptest! {
    #[test]
    fn save_restore_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        let mut p = interpreter();
        // Model: (line width, ctm) plus the saved stack.
        let mut current = (1.0, Matrix::IDENTITY);
        let mut stack = Vec::new();
        for op in &ops {
            match *op {
                Op::Save => {
                    p.do_q();
                    stack.push(current);
                }
                Op::Restore => {
                    p.do_Q();
                    if let Some(saved) = stack.pop() {
                        current = saved;
                    }
                }
                Op::Width(w) => {
                    p.do_w(w);
                    current.0 = w;
                }
                Op::Translate(x, y) => {
                    p.do_cm(1.0, 0.0, 0.0, 1.0, x, y);
                    current.1 = Matrix::translation(x, y).multiply(&current.1);
                }
            }
            prop_assert_eq!(p.stack_depth(), stack.len());
        }
        prop_assert_eq!(p.gstate().line_width, current.0);
        prop_assert!(p.gstate().ctm.approx_eq(&current.1, 1e-9));
    }
}

#[test]
fn test_unbalanced_restore_is_ignored() {
    let mut p = interpreter();
    p.do_w(3.0);
    p.do_Q();
    assert_eq!(p.gstate().line_width, 3.0);
    assert_eq!(p.stack_depth(), 0);
}

#[test]
fn test_restore_brings_back_clip() {
    let mut p = interpreter();
    p.do_q();
    p.do_re(0.0, 0.0, 10.0, 10.0);
    p.do_W();
    p.do_n();
    assert!(p.gstate().clip.is_some());
    p.do_Q();
    assert!(p.gstate().clip.is_none());
}
