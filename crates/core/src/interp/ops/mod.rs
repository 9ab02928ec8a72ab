//! Content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack and transforms (q, Q, cm, w, J, j, M, d,
//!   ri, i, gs)
//! - `color` - Color space and values (G, g, RG, rg, K, k, CS, cs, SC, SCN,
//!   sc, scn)
//! - `path` - Path construction and painting (m, l, c, v, y, h, re, S, s, f,
//!   F, f\*, B, B\*, b, b\*, n, W, W\*)
//! - `text` - Text state and rendering (BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts,
//!   Td, TD, Tm, T\*, Tj, TJ, ', ", d0, d1)
//! - `xobject` - XObjects, inline images and marked content (Do, EI, BMC,
//!   BDC, EMC, MP, DP, BX, EX)
//! - `pattern` - Shadings and pattern paints (sh)
//!
//! [`operator_table`] binds every operator name to its handler and operand
//! shape. Handlers take typed arguments; the closures below only unpack the
//! coerced [`crate::interp::dispatch::Args`]. Operators that can fail (they
//! run nested content or resolve resources that may error) are registered
//! with `register`, the rest with `register_action`.

mod color;
mod graphics_state;
mod path;
mod pattern;
mod text;
mod xobject;

use crate::interp::dispatch::{OperatorTable, Param};
use crate::interp::interpreter::PageInterpreter;

use Param::{Any, Array, Dict, Integer, Name, Number, Rest, RestNumbers, Str};

const NONE: &[Param] = &[];
const N1: &[Param] = &[Number];
const N2: &[Param] = &[Number, Number];
const N3: &[Param] = &[Number, Number, Number];
const N4: &[Param] = &[Number, Number, Number, Number];
const N6: &[Param] = &[Number, Number, Number, Number, Number, Number];

type Table = OperatorTable<PageInterpreter>;

/// Builds the operator table.
pub(crate) fn operator_table() -> Table {
    let mut t = Table::new();
    register_graphics_state(&mut t);
    register_path(&mut t);
    register_color(&mut t);
    register_text(&mut t);
    register_xobject(&mut t);
    t
}

fn register_graphics_state(t: &mut Table) {
    t.register_action("q", |p, _| p.do_q(), NONE);
    t.register_action("Q", |p, _| p.do_Q(), NONE);
    t.register_action(
        "cm",
        |p, a| p.do_cm(a.num(0), a.num(1), a.num(2), a.num(3), a.num(4), a.num(5)),
        N6,
    );
    t.register_action("w", |p, a| p.do_w(a.num(0)), N1);
    t.register_action("J", |p, a| p.do_J(a.int(0)), &[Integer]);
    t.register_action("j", |p, a| p.do_j(a.int(0)), &[Integer]);
    t.register_action("M", |p, a| p.do_M(a.num(0)), N1);
    t.register_action("d", |p, a| p.do_d(a.array(0), a.num(1)), &[Array, Number]);
    t.register_action("ri", |p, a| p.do_ri(a.name(0)), &[Name]);
    t.register_action("i", |p, a| p.do_i(a.num(0)), N1);
    t.register("gs", |p, a| p.do_gs(a.name(0)), &[Name]);
}

fn register_path(t: &mut Table) {
    t.register_action("m", |p, a| p.do_m(a.num(0), a.num(1)), N2);
    t.register_action("l", |p, a| p.do_l(a.num(0), a.num(1)), N2);
    t.register_action(
        "c",
        |p, a| p.do_c(a.num(0), a.num(1), a.num(2), a.num(3), a.num(4), a.num(5)),
        N6,
    );
    t.register_action(
        "v",
        |p, a| p.do_v(a.num(0), a.num(1), a.num(2), a.num(3)),
        N4,
    );
    t.register_action(
        "y",
        |p, a| p.do_y(a.num(0), a.num(1), a.num(2), a.num(3)),
        N4,
    );
    t.register_action("h", |p, _| p.do_h(), NONE);
    t.register_action(
        "re",
        |p, a| p.do_re(a.num(0), a.num(1), a.num(2), a.num(3)),
        N4,
    );
    t.register_action("S", |p, _| p.do_S(), NONE);
    t.register_action("s", |p, _| p.do_s(), NONE);
    t.register_action("f", |p, _| p.do_f(), NONE);
    t.register_action("F", |p, _| p.do_F(), NONE);
    t.register_action("f*", |p, _| p.do_f_star(), NONE);
    t.register_action("B", |p, _| p.do_B(), NONE);
    t.register_action("B*", |p, _| p.do_B_star(), NONE);
    t.register_action("b", |p, _| p.do_b(), NONE);
    t.register_action("b*", |p, _| p.do_b_star(), NONE);
    t.register_action("n", |p, _| p.do_n(), NONE);
    t.register_action("W", |p, _| p.do_W(), NONE);
    t.register_action("W*", |p, _| p.do_W_star(), NONE);
}

fn register_color(t: &mut Table) {
    t.register_action("CS", |p, a| p.do_CS(a.name(0)), &[Name]);
    t.register_action("cs", |p, a| p.do_cs(a.name(0)), &[Name]);
    t.register_action("SC", |p, a| p.do_SC(&a.numbers(0)), &[RestNumbers]);
    t.register_action("sc", |p, a| p.do_sc(&a.numbers(0)), &[RestNumbers]);
    // Colored pattern, plain components, uncolored pattern components + name.
    t.register_action("SCN", |p, a| p.do_SCN_pattern(a.name(0), &[]), &[Name]);
    t.register_action("SCN", |p, a| p.do_SC(&a.numbers(0)), &[RestNumbers]);
    t.register_action("SCN", |p, a| p.do_SCN_rest(a.array(0)), &[Rest]);
    t.register_action("scn", |p, a| p.do_scn_pattern(a.name(0), &[]), &[Name]);
    t.register_action("scn", |p, a| p.do_sc(&a.numbers(0)), &[RestNumbers]);
    t.register_action("scn", |p, a| p.do_scn_rest(a.array(0)), &[Rest]);
    t.register_action("G", |p, a| p.do_G(a.num(0)), N1);
    t.register_action("g", |p, a| p.do_g(a.num(0)), N1);
    t.register_action("RG", |p, a| p.do_RG(a.num(0), a.num(1), a.num(2)), N3);
    t.register_action("rg", |p, a| p.do_rg(a.num(0), a.num(1), a.num(2)), N3);
    t.register_action(
        "K",
        |p, a| p.do_K(a.num(0), a.num(1), a.num(2), a.num(3)),
        N4,
    );
    t.register_action(
        "k",
        |p, a| p.do_k(a.num(0), a.num(1), a.num(2), a.num(3)),
        N4,
    );
}

fn register_text(t: &mut Table) {
    t.register_action("BT", |p, _| p.do_BT(), NONE);
    t.register_action("ET", |p, _| p.do_ET(), NONE);
    t.register_action("Tc", |p, a| p.do_Tc(a.num(0)), N1);
    t.register_action("Tw", |p, a| p.do_Tw(a.num(0)), N1);
    t.register_action("Tz", |p, a| p.do_Tz(a.num(0)), N1);
    t.register_action("TL", |p, a| p.do_TL(a.num(0)), N1);
    t.register_action("Tf", |p, a| p.do_Tf(a.name(0), a.num(1)), &[Name, Number]);
    t.register_action("Tr", |p, a| p.do_Tr(a.int(0)), &[Integer]);
    t.register_action("Ts", |p, a| p.do_Ts(a.num(0)), N1);
    t.register_action("Td", |p, a| p.do_Td(a.num(0), a.num(1)), N2);
    t.register_action("TD", |p, a| p.do_TD(a.num(0), a.num(1)), N2);
    t.register_action(
        "Tm",
        |p, a| p.do_Tm(a.num(0), a.num(1), a.num(2), a.num(3), a.num(4), a.num(5)),
        N6,
    );
    t.register_action("T*", |p, _| p.do_T_star(), NONE);
    t.register("Tj", |p, a| p.do_Tj(a.bytes(0)), &[Str]);
    t.register("TJ", |p, a| p.do_TJ(a.array(0)), &[Array]);
    t.register("'", |p, a| p.do_quote(a.bytes(0)), &[Str]);
    t.register(
        "\"",
        |p, a| p.do_doublequote(a.num(0), a.num(1), a.bytes(2)),
        &[Number, Number, Str],
    );
    t.register_action("d0", |p, a| p.do_d0(a.num(0), a.num(1)), N2);
    t.register_action("d1", |p, _| p.do_d1(), N6);
}

fn register_xobject(t: &mut Table) {
    t.register("Do", |p, a| p.do_Do(a.name(0)), &[Name]);
    t.register_action("sh", |p, a| p.do_sh(a.name(0)), &[Name]);
    t.register_action("EI", |p, a| p.do_EI(a.operand(0), a.bytes(1)), &[Dict, Str]);
    t.register_action("BMC", |p, a| p.do_BMC(a.name(0)), &[Name]);
    t.register_action(
        "BDC",
        |p, a| p.do_BDC(a.name(0), a.operand(1)),
        &[Name, Any],
    );
    t.register_action("EMC", |p, _| p.do_EMC(), NONE);
    t.register_action("MP", |p, a| p.do_MP(a.name(0)), &[Name]);
    t.register_action("DP", |p, a| p.do_DP(a.name(0), a.operand(1)), &[Name, Any]);
    t.register_action("BX", |p, _| p.do_BX(), NONE);
    t.register_action("EX", |p, _| p.do_EX(), NONE);
}
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_all_operators() {
        let table = operator_table();
        let names = [
            "q", "Q", "cm", "w", "J", "j", "M", "d", "ri", "i", "gs", "m", "l", "c", "v", "y",
            "h", "re", "S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "n", "W", "W*", "CS", "cs",
            "SC", "SCN", "sc", "scn", "G", "g", "RG", "rg", "K", "k", "BT", "ET", "Tc", "Tw",
            "Tz", "TL", "Tf", "Tr", "Ts", "Td", "TD", "Tm", "T*", "Tj", "TJ", "'", "\"", "Do",
            "sh", "EI", "BMC", "BDC", "EMC", "MP", "DP", "d0", "d1", "BX", "EX",
        ];
        for name in names {
            assert!(table.contains(name), "missing operator {name}");
        }
        assert_eq!(table.len(), names.len());
    }
}
