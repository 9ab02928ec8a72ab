//! Operator dispatcher.
//!
//! An [`OperatorTable`] maps operator names to candidate handlers, each with a
//! declared parameter shape. Dispatch coerces the raw operands to the first
//! candidate shape that accepts them; when none does, the operator is skipped.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::Result;
use crate::model::objects::Operand;

/// Declared type of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Integer or real, as f64
    Number,
    /// Integer; reals are rounded
    Integer,
    /// String; numbers and names are stringified
    Str,
    /// Name; strings are accepted as names
    Name,
    /// Array; a single number is promoted to a one-element array
    Array,
    Dict,
    /// Any single operand
    Any,
    /// All remaining operands, which must be numbers (zero or more)
    RestNumbers,
    /// All remaining operands, any type (zero or more)
    Rest,
}

impl Param {
    const fn is_rest(self) -> bool {
        matches!(self, Self::Rest | Self::RestNumbers)
    }
}

/// A coerced argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Number(f64),
    Integer(i64),
    Str(Vec<u8>),
    Name(SmolStr),
    Array(Vec<Operand>),
    Dict(Operand),
    Any(Operand),
    Rest(Vec<Operand>),
}

/// Coerced arguments handed to a handler.
///
/// Accessors return neutral values on a type mismatch, which cannot happen
/// for arguments produced from the handler's own shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(pub SmallVec<[Arg; 6]>);

impl Args {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn num(&self, i: usize) -> f64 {
        match self.0.get(i) {
            Some(Arg::Number(n)) => *n,
            Some(Arg::Integer(n)) => *n as f64,
            _ => 0.0,
        }
    }

    pub fn int(&self, i: usize) -> i64 {
        match self.0.get(i) {
            Some(Arg::Integer(n)) => *n,
            Some(Arg::Number(n)) => n.round() as i64,
            _ => 0,
        }
    }

    pub fn bytes(&self, i: usize) -> &[u8] {
        match self.0.get(i) {
            Some(Arg::Str(s)) => s,
            _ => &[],
        }
    }

    pub fn name(&self, i: usize) -> &str {
        match self.0.get(i) {
            Some(Arg::Name(s)) => s,
            _ => "",
        }
    }

    pub fn array(&self, i: usize) -> &[Operand] {
        match self.0.get(i) {
            Some(Arg::Array(a)) | Some(Arg::Rest(a)) => a,
            _ => &[],
        }
    }

    pub fn operand(&self, i: usize) -> Option<&Operand> {
        match self.0.get(i) {
            Some(Arg::Any(o)) | Some(Arg::Dict(o)) => Some(o),
            _ => None,
        }
    }

    /// Numbers collected by a `RestNumbers` parameter.
    pub fn numbers(&self, i: usize) -> Vec<f64> {
        self.array(i).iter().filter_map(Operand::as_number).collect()
    }
}

/// Handler invoked with coerced arguments.
pub type Handler<T> = fn(&mut T, &Args) -> Result<()>;

/// Handler that cannot fail.
pub type Action<T> = fn(&mut T, &Args);

enum Call<T> {
    Handler(Handler<T>),
    Action(Action<T>),
}

struct Candidate<T> {
    params: &'static [Param],
    call: Call<T>,
}

impl<T> Candidate<T> {
    fn fixed_len(&self) -> usize {
        self.params.iter().filter(|p| !p.is_rest()).count()
    }

    fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.is_rest())
    }
}

/// Multi-map from operator name to candidate handlers.
pub struct OperatorTable<T> {
    ops: FxHashMap<&'static str, Vec<Candidate<T>>>,
}

impl<T> Default for OperatorTable<T> {
    fn default() -> Self {
        Self {
            ops: FxHashMap::default(),
        }
    }
}

impl<T> OperatorTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Candidates for one name are kept ordered with
    /// fixed shapes before variadic ones, longest operand list first.
    pub fn register(&mut self, name: &'static str, handler: Handler<T>, params: &'static [Param]) {
        self.insert(name, Call::Handler(handler), params);
    }

    /// Registers a handler that cannot fail.
    pub fn register_action(
        &mut self,
        name: &'static str,
        action: Action<T>,
        params: &'static [Param],
    ) {
        self.insert(name, Call::Action(action), params);
    }

    fn insert(&mut self, name: &'static str, call: Call<T>, params: &'static [Param]) {
        let list = self.ops.entry(name).or_default();
        list.push(Candidate { params, call });
        list.sort_by_key(|c| (c.is_variadic(), std::cmp::Reverse(c.fixed_len())));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Invokes the first candidate whose shape accepts `operands`.
    ///
    /// Returns `Ok(false)` when the name is unknown or no candidate accepts
    /// the operands; handler errors are propagated.
    pub fn dispatch(&self, target: &mut T, name: &str, operands: &[Operand]) -> Result<bool> {
        let Some(candidates) = self.ops.get(name) else {
            return Ok(false);
        };
        for candidate in candidates {
            if let Some(args) = coerce_all(candidate.params, operands) {
                match candidate.call {
                    Call::Handler(handler) => handler(target, &args)?,
                    Call::Action(action) => action(target, &args),
                }
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Coerces operands to a parameter shape, or `None` on mismatch.
pub fn coerce_all(params: &[Param], operands: &[Operand]) -> Option<Args> {
    let fixed = params.iter().take_while(|p| !p.is_rest()).count();
    let rest = params.get(fixed).copied();
    match rest {
        None if operands.len() != fixed => return None,
        Some(_) if operands.len() < fixed => return None,
        _ => {}
    }

    let mut args = Args::default();
    for (param, operand) in params[..fixed].iter().zip(operands) {
        args.0.push(coerce(*param, operand)?);
    }
    if let Some(rest) = rest {
        let tail = &operands[fixed..];
        if rest == Param::RestNumbers && !tail.iter().all(Operand::is_number) {
            return None;
        }
        args.0.push(Arg::Rest(tail.to_vec()));
    }
    Some(args)
}

/// Coerces a single operand.
pub fn coerce(param: Param, operand: &Operand) -> Option<Arg> {
    match (param, operand) {
        (Param::Number, Operand::Integer(n)) => Some(Arg::Number(*n as f64)),
        (Param::Number, Operand::Real(n)) => Some(Arg::Number(*n)),
        (Param::Integer, Operand::Integer(n)) => Some(Arg::Integer(*n)),
        (Param::Integer, Operand::Real(n)) if n.is_finite() => Some(Arg::Integer(n.round() as i64)),
        (Param::Str, Operand::Str(s)) => Some(Arg::Str(s.clone())),
        (Param::Str, Operand::Integer(n)) => Some(Arg::Str(n.to_string().into_bytes())),
        (Param::Str, Operand::Real(n)) => Some(Arg::Str(n.to_string().into_bytes())),
        (Param::Str, Operand::Name(n)) => Some(Arg::Str(n.as_bytes().to_vec())),
        (Param::Name, Operand::Name(n)) => Some(Arg::Name(n.clone())),
        (Param::Name, Operand::Str(s)) => Some(Arg::Name(SmolStr::new(String::from_utf8_lossy(s)))),
        (Param::Array, Operand::Array(a)) => Some(Arg::Array(a.clone())),
        (Param::Array, n @ (Operand::Integer(_) | Operand::Real(_))) => {
            Some(Arg::Array(vec![n.clone()]))
        }
        (Param::Dict, d @ Operand::Dict(_)) => Some(Arg::Dict(d.clone())),
        (Param::Any, o) => Some(Arg::Any(o.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    fn two_numbers(r: &mut Recorder, args: &Args) -> Result<()> {
        r.calls.push(format!("xy {} {}", args.num(0), args.num(1)));
        Ok(())
    }

    fn named(r: &mut Recorder, args: &Args) -> Result<()> {
        r.calls.push(format!("name {}", args.name(0)));
        Ok(())
    }

    fn components(r: &mut Recorder, args: &Args) -> Result<()> {
        r.calls.push(format!("components {:?}", args.numbers(0)));
        Ok(())
    }

    fn rejected(_: &mut Recorder, _: &Args) -> Result<()> {
        Err(crate::error::FolioError::Cancelled)
    }

    fn table() -> OperatorTable<Recorder> {
        let mut t = OperatorTable::new();
        t.register("m", two_numbers, &[Param::Number, Param::Number]);
        t.register("scn", components, &[Param::RestNumbers]);
        t.register("scn", named, &[Param::Name]);
        t.register_action("h", |r, _| r.calls.push("close".into()), &[]);
        t.register("Q", rejected, &[]);
        t
    }

    #[test]
    fn test_actions_and_handler_errors() {
        let mut r = Recorder::default();
        let t = table();
        assert!(t.dispatch(&mut r, "h", &[]).unwrap());
        assert_eq!(r.calls, vec!["close"]);
        assert!(t.dispatch(&mut r, "Q", &[]).is_err());
    }

    #[test]
    fn test_integer_widening() {
        let mut r = Recorder::default();
        let ok = table()
            .dispatch(&mut r, "m", &[Operand::Integer(1), Operand::Real(2.5)])
            .unwrap();
        assert!(ok);
        assert_eq!(r.calls, vec!["xy 1 2.5"]);
    }

    #[test]
    fn test_arity_mismatch_skips() {
        let mut r = Recorder::default();
        let t = table();
        assert!(!t.dispatch(&mut r, "m", &[Operand::Integer(1)]).unwrap());
        assert!(
            !t.dispatch(&mut r, "m", &[Operand::Integer(1), "x".into()])
                .unwrap()
        );
        assert!(!t.dispatch(&mut r, "zz", &[]).unwrap());
        assert!(r.calls.is_empty());
    }

    #[test]
    fn test_overload_selection() {
        let mut r = Recorder::default();
        let t = table();
        t.dispatch(&mut r, "scn", &["P0".into()]).unwrap();
        t.dispatch(&mut r, "scn", &[Operand::Real(0.5), Operand::Integer(1)])
            .unwrap();
        assert_eq!(r.calls, vec!["name P0", "components [0.5, 1.0]"]);
    }

    #[test]
    fn test_coercions() {
        assert_eq!(
            coerce(Param::Integer, &Operand::Real(2.6)),
            Some(Arg::Integer(3))
        );
        assert_eq!(
            coerce(Param::Str, &Operand::Integer(12)),
            Some(Arg::Str(b"12".to_vec()))
        );
        assert_eq!(
            coerce(Param::Array, &Operand::Integer(3)),
            Some(Arg::Array(vec![Operand::Integer(3)]))
        );
        assert_eq!(coerce(Param::Number, &Operand::Null), None);
    }
}
