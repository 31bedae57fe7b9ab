//! Render-time expression trees.
//!
//! Filter expressions are built as trees and serialized once, in ffmpeg's
//! expression syntax. The same tree can be evaluated in-process, which is
//! how the compiler is checked against the live preview.
//!
//! Numbers are printed with at most six decimals and no trailing zeros, so
//! serialization depends only on the tree.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Variables supplied by the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Var {
    /// Timestamp of the frame being rendered, in seconds.
    Time,
    /// Zoom factor chosen for the current frame (`zoom` in zoompan).
    Zoom,
    /// Input frame width in pixels.
    InputWidth,
    /// Input frame height in pixels.
    InputHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
        }
    }
}

/// Built-in functions, with ffmpeg semantics (`lt`/`gte` yield 0 or 1,
/// `if` takes its second argument when the first is non-zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    If,
    Lt,
    Gte,
    Pow,
}

impl Func {
    fn name(self) -> &'static str {
        match self {
            Func::If => "if",
            Func::Lt => "lt",
            Func::Gte => "gte",
            Func::Pow => "pow",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(Var),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Func,
        args: Vec<Expr>,
    },
}

/// Variable bindings for in-process evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalEnv {
    pub time: f64,
    pub zoom: f64,
    pub input_width: f64,
    pub input_height: f64,
}

impl EvalEnv {
    /// Bind only the time; zoom and input size are 1.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            zoom: 1.0,
            input_width: 1.0,
            input_height: 1.0,
        }
    }
}

/// Variable names used when serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub time: &'static str,
    pub zoom: &'static str,
    pub input_width: &'static str,
    pub input_height: &'static str,
}

impl Dialect {
    /// Generic filters (`crop`, `overlay`, ...), where time is `t`.
    pub const FILTER: Dialect = Dialect {
        time: "t",
        zoom: "zoom",
        input_width: "iw",
        input_height: "ih",
    };

    /// The `zoompan` filter, where the input timestamp is `it`.
    pub const ZOOMPAN: Dialect = Dialect {
        time: "it",
        zoom: "zoom",
        input_width: "iw",
        input_height: "ih",
    };

    fn var(&self, var: Var) -> &'static str {
        match var {
            Var::Time => self.time,
            Var::Zoom => self.zoom,
            Var::InputWidth => self.input_width,
            Var::InputHeight => self.input_height,
        }
    }
}

impl Expr {
    pub fn num(value: f64) -> Self {
        Expr::Num(value)
    }

    pub fn time() -> Self {
        Expr::Var(Var::Time)
    }

    pub fn var(var: Var) -> Self {
        Expr::Var(var)
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(func: Func, args: Vec<Expr>) -> Self {
        Expr::Call { func, args }
    }

    pub fn if_else(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::call(Func::If, vec![cond, then, otherwise])
    }

    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        Self::call(Func::Lt, vec![lhs, rhs])
    }

    pub fn gte(lhs: Expr, rhs: Expr) -> Self {
        Self::call(Func::Gte, vec![lhs, rhs])
    }

    pub fn pow(base: Expr, exponent: Expr) -> Self {
        Self::call(Func::Pow, vec![base, exponent])
    }

    /// `t - origin`, or plain `t` when `origin` is zero.
    pub fn time_since(origin: f64) -> Self {
        if origin == 0.0 {
            Self::time()
        } else {
            Self::time() - Self::num(origin)
        }
    }

    /// Evaluate the tree with the given variable bindings.
    pub fn eval(&self, env: &EvalEnv) -> f64 {
        match self {
            Expr::Num(value) => *value,
            Expr::Var(Var::Time) => env.time,
            Expr::Var(Var::Zoom) => env.zoom,
            Expr::Var(Var::InputWidth) => env.input_width,
            Expr::Var(Var::InputHeight) => env.input_height,
            Expr::Binary { op, lhs, rhs } => {
                let (a, b) = (lhs.eval(env), rhs.eval(env));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                }
            }
            Expr::Call { func, args } => {
                let arg = |i: usize| args.get(i).map_or(f64::NAN, |a| a.eval(env));
                match func {
                    Func::If => {
                        if arg(0) != 0.0 {
                            arg(1)
                        } else {
                            arg(2)
                        }
                    }
                    Func::Lt => bool_to_num(arg(0) < arg(1)),
                    Func::Gte => bool_to_num(arg(0) >= arg(1)),
                    Func::Pow => arg(0).powf(arg(1)),
                }
            }
        }
    }

    /// Evaluate with only the time bound.
    pub fn eval_at(&self, time: f64) -> f64 {
        self.eval(&EvalEnv::at(time))
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Num(_) | Expr::Var(_) => 1,
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.node_count() + rhs.node_count(),
            Expr::Call { args, .. } => 1 + args.iter().map(Expr::node_count).sum::<usize>(),
        }
    }

    /// Serialize in ffmpeg expression syntax.
    pub fn render(&self, dialect: &Dialect) -> String {
        let mut out = String::new();
        self.write_to(&mut out, dialect);
        out
    }

    fn write_to(&self, out: &mut String, dialect: &Dialect) {
        match self {
            Expr::Num(value) => out.push_str(&format_number(*value)),
            Expr::Var(var) => out.push_str(dialect.var(*var)),
            Expr::Binary { op, lhs, rhs } => {
                write_operand(out, lhs, *op, false, dialect);
                out.push(op.symbol());
                write_operand(out, rhs, *op, true, dialect);
            }
            Expr::Call { func, args } => {
                out.push_str(func.name());
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    arg.write_to(out, dialect);
                }
                out.push(')');
            }
        }
    }
}

fn write_operand(out: &mut String, child: &Expr, parent: BinOp, is_rhs: bool, dialect: &Dialect) {
    if needs_parens(child, parent, is_rhs) {
        out.push('(');
        child.write_to(out, dialect);
        out.push(')');
    } else {
        child.write_to(out, dialect);
    }
}

fn needs_parens(child: &Expr, parent: BinOp, is_rhs: bool) -> bool {
    match child {
        Expr::Num(value) => format_number(*value).starts_with('-'),
        Expr::Binary { op, .. } => {
            let (child_prec, parent_prec) = (op.precedence(), parent.precedence());
            if child_prec != parent_prec {
                return child_prec < parent_prec;
            }
            // Same precedence: only chains of + or * read unambiguously on the right.
            is_rhs && !(*op == parent && matches!(parent, BinOp::Add | BinOp::Mul))
        }
        Expr::Var(_) | Expr::Call { .. } => false,
    }
}

fn bool_to_num(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Print a number in plain decimal notation, with the shortest digits that
/// parse back to the same `f64`.
///
/// The rendered expression must evaluate exactly like the tree: a literal
/// that is nonzero in the tree is never printed as `0`, and gate times land
/// on the same instants the preview uses.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    // `Display` for f64 never switches to exponent notation, which ffmpeg
    // would not accept inside a filter argument.
    value.to_string()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&Dialect::FILTER))
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Div, self, rhs)
    }
}
