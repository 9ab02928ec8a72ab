//! Matrix algebra and rectangle recognition properties.

use folio_core::geometry::{Matrix, Path, Rectangle};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    -1000.0..1000.0f64
}

fn invertible() -> impl Strategy<Value = Matrix> {
    (0.1..10.0f64, 0.0..std::f64::consts::TAU, coord(), coord(), any::<bool>()).prop_map(
        |(s, angle, e, f, mirror)| {
            let (sin, cos) = angle.sin_cos();
            let d = if mirror { -cos } else { cos };
            Matrix::new(s * cos, s * sin, -s * sin, s * d, e, f)
        },
    )
}

proptest! {
    #[test]
    fn rectangle_corner_order_is_irrelevant(
        x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord()
    ) {
        let a = Rectangle::new(x1, y1, x2, y2);
        prop_assert_eq!(a, Rectangle::new(x2, y2, x1, y1));
        prop_assert_eq!(a, Rectangle::new(x1, y2, x2, y1));
        prop_assert!(a.width() >= 0.0 && a.height() >= 0.0);
    }

    #[test]
    fn rectangle_recognized_from_any_start_corner(
        x in coord(), y in coord(), w in 1.0..500.0f64, h in 1.0..500.0f64,
        start in 0usize..4, reverse in any::<bool>(), close in any::<bool>()
    ) {
        let mut corners = vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        if reverse {
            corners.reverse();
        }
        corners.rotate_left(start);
        let mut path = Path::new();
        path.move_to(corners[0].0, corners[0].1);
        for &(cx, cy) in &corners[1..] {
            path.line_to(cx, cy);
        }
        if close {
            path.close();
        }
        prop_assert_eq!(Rectangle::from_path(&path), Some(Rectangle::from_xywh(x, y, w, h)));
    }

    #[test]
    fn invert_round_trip(m in invertible(), px in coord(), py in coord()) {
        let inv = m.invert().unwrap();
        let (x, y) = m.transform_point(px, py);
        let (bx, by) = inv.transform_point(x, y);
        prop_assert!((bx - px).abs() < 1e-6 && (by - py).abs() < 1e-6);
    }

    #[test]
    fn decompose_scale_translate_round_trip(m in invertible()) {
        let (scale, tx, ty, rest) = m.decompose_scale_translate();
        let rebuilt = Matrix::scaling(scale, scale)
            .multiply(&Matrix::translation(tx, ty))
            .multiply(&rest);
        prop_assert!(rebuilt.approx_eq(&m, 1e-9), "{:?} != {:?}", rebuilt, m);
        prop_assert!(rest.e == 0.0 && rest.f == 0.0);
    }
}

#[test]
fn test_skewed_quad_is_not_a_rectangle() {
    let mut path = Path::new();
    path.move_to(0.0, 0.0);
    path.line_to(10.0, 0.0);
    path.line_to(12.0, 10.0);
    path.line_to(0.0, 10.0);
    path.close();
    assert_eq!(Rectangle::from_path(&path), None);
}

#[test]
fn test_singular_matrix_not_invertible() {
    assert!(Matrix::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0).invert().is_err());
}
