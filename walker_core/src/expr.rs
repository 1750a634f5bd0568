//! Single-variable numeric expressions for motion functions.
//!
//! Expressions are compiled once into a small syntax tree and evaluated with
//! `f64` arithmetic. Only numeric literals, the time variable `t`, a handful
//! of constants and a fixed set of math functions can be named; anything else
//! is rejected at compile time, so evaluation can never reach other code.
//!
//! Operator precedence follows the usual scientific-calculator convention
//! used by the walk-file authors: `**` binds tightest and is right
//! associative (`-2**2 == -4`, `2**3**2 == 512`), then unary sign, then
//! `* / // %`, then `+ -`. `//` is floor division and `%` takes the sign of
//! the divisor. Division by zero follows IEEE 754 (infinities or NaN).

use std::fmt;
use std::str::FromStr;

use crate::error::ExprError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Acos,
    Asin,
    Atan,
    Atan2,
    Ceil,
    Cos,
    Cosh,
    Degrees,
    Exp,
    Fabs,
    Factorial,
    Floor,
    Fmod,
    Hypot,
    Log,
    Log10,
    Log2,
    Pow,
    Radians,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
    Trunc,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "acos" => Self::Acos,
            "asin" => Self::Asin,
            "atan" => Self::Atan,
            "atan2" => Self::Atan2,
            "ceil" => Self::Ceil,
            "cos" => Self::Cos,
            "cosh" => Self::Cosh,
            "degrees" => Self::Degrees,
            "exp" => Self::Exp,
            "fabs" => Self::Fabs,
            "factorial" => Self::Factorial,
            "floor" => Self::Floor,
            "fmod" => Self::Fmod,
            "hypot" => Self::Hypot,
            "log" => Self::Log,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "pow" => Self::Pow,
            "radians" => Self::Radians,
            "sin" => Self::Sin,
            "sinh" => Self::Sinh,
            "sqrt" => Self::Sqrt,
            "tan" => Self::Tan,
            "tanh" => Self::Tanh,
            "trunc" => Self::Trunc,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Acos => "acos",
            Self::Asin => "asin",
            Self::Atan => "atan",
            Self::Atan2 => "atan2",
            Self::Ceil => "ceil",
            Self::Cos => "cos",
            Self::Cosh => "cosh",
            Self::Degrees => "degrees",
            Self::Exp => "exp",
            Self::Fabs => "fabs",
            Self::Factorial => "factorial",
            Self::Floor => "floor",
            Self::Fmod => "fmod",
            Self::Hypot => "hypot",
            Self::Log => "log",
            Self::Log10 => "log10",
            Self::Log2 => "log2",
            Self::Pow => "pow",
            Self::Radians => "radians",
            Self::Sin => "sin",
            Self::Sinh => "sinh",
            Self::Sqrt => "sqrt",
            Self::Tan => "tan",
            Self::Tanh => "tanh",
            Self::Trunc => "trunc",
        }
    }

    /// Accepted argument counts as (min, max, human form).
    fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::Atan2 | Self::Fmod | Self::Hypot | Self::Pow => (2, 2, "2"),
            Self::Log => (1, 2, "1 or 2"),
            _ => (1, 1, "1"),
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Self::Acos, [x]) => x.acos(),
            (Self::Asin, [x]) => x.asin(),
            (Self::Atan, [x]) => x.atan(),
            (Self::Atan2, [y, x]) => y.atan2(*x),
            (Self::Ceil, [x]) => x.ceil(),
            (Self::Cos, [x]) => x.cos(),
            (Self::Cosh, [x]) => x.cosh(),
            (Self::Degrees, [x]) => x.to_degrees(),
            (Self::Exp, [x]) => x.exp(),
            (Self::Fabs, [x]) => x.abs(),
            (Self::Factorial, [x]) => factorial(*x),
            (Self::Floor, [x]) => x.floor(),
            (Self::Fmod, [x, y]) => x % y,
            (Self::Hypot, [x, y]) => x.hypot(*y),
            (Self::Log, [x]) => x.ln(),
            (Self::Log, [x, base]) => x.ln() / base.ln(),
            (Self::Log10, [x]) => x.log10(),
            (Self::Log2, [x]) => x.log2(),
            (Self::Pow, [x, y]) => x.powf(*y),
            (Self::Radians, [x]) => x.to_radians(),
            (Self::Sin, [x]) => x.sin(),
            (Self::Sinh, [x]) => x.sinh(),
            (Self::Sqrt, [x]) => x.sqrt(),
            (Self::Tan, [x]) => x.tan(),
            (Self::Tanh, [x]) => x.tanh(),
            (Self::Trunc, [x]) => x.trunc(),
            // Arity is checked at compile time.
            _ => f64::NAN,
        }
    }
}

fn factorial(x: f64) -> f64 {
    if !(x.is_finite() && x >= 0.0 && x.fract() == 0.0) {
        return f64::NAN;
    }
    if x > 170.0 {
        return f64::INFINITY;
    }
    (2..=x as u32).fold(1.0, |acc, k| acc * f64::from(k))
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Num(f64),
    Var,
    Neg(Box<Node>),
    Bin(BinOp, Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

impl Node {
    fn eval(&self, t: f64) -> f64 {
        match self {
            Node::Num(v) => *v,
            Node::Var => t,
            Node::Neg(inner) => -inner.eval(t),
            Node::Bin(op, l, r) => {
                let a = l.eval(t);
                let b = r.eval(t);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::FloorDiv => (a / b).floor(),
                    BinOp::Mod => a - b * (a / b).floor(),
                    BinOp::Pow => a.powf(b),
                }
            }
            Node::Call(func, args) => {
                let mut vals = [0.0f64; 2];
                for (slot, arg) in vals.iter_mut().zip(args) {
                    *slot = arg.eval(t);
                }
                func.apply(&vals[..args.len().min(2)])
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Name(String),
    Op(BinOp),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(v) => write!(f, "'{v}'"),
            Token::Name(n) => write!(f, "'{n}'"),
            Token::Op(op) => {
                let s = match op {
                    BinOp::Add => "+",
                    BinOp::Sub => "-",
                    BinOp::Mul => "*",
                    BinOp::Div => "/",
                    BinOp::FloorDiv => "//",
                    BinOp::Mod => "%",
                    BinOp::Pow => "**",
                };
                write!(f, "'{s}'")
            }
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' => i += 1,
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // Exponent part: e, E followed by optional sign and digits.
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        while j < bytes.len() && bytes[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text = &src[start..i];
                let v = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(text.to_string()))?;
                out.push(Token::Num(v));
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                out.push(Token::Name(src[start..i].to_string()));
            }
            b'+' => {
                out.push(Token::Op(BinOp::Add));
                i += 1;
            }
            b'-' => {
                out.push(Token::Op(BinOp::Sub));
                i += 1;
            }
            b'*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    out.push(Token::Op(BinOp::Pow));
                    i += 2;
                } else {
                    out.push(Token::Op(BinOp::Mul));
                    i += 1;
                }
            }
            b'/' => {
                if bytes.get(i + 1) == Some(&b'/') {
                    out.push(Token::Op(BinOp::FloorDiv));
                    i += 2;
                } else {
                    out.push(Token::Op(BinOp::Div));
                    i += 1;
                }
            }
            b'%' => {
                out.push(Token::Op(BinOp::Mod));
                i += 1;
            }
            b'(' => {
                out.push(Token::LParen);
                i += 1;
            }
            b')' => {
                out.push(Token::RParen);
                i += 1;
            }
            b',' => {
                out.push(Token::Comma);
                i += 1;
            }
            _ => {
                let ch = src[i..].chars().next().unwrap_or('?');
                return Err(ExprError::UnexpectedChar { ch, at: i });
            }
        }
    }
    Ok(out)
}

/// Deepest nesting of parentheses, calls and unary signs.
const MAX_DEPTH: usize = 256;
/// Longest accepted expression; bounds the depth of operator chains.
const MAX_TOKENS: usize = 4096;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat_op(&mut self, ops: &[BinOp]) -> Option<BinOp> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, want: &Token) -> Result<(), ExprError> {
        match self.next() {
            Some(ref tok) if tok == want => Ok(()),
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn additive(&mut self) -> Result<Node, ExprError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&[BinOp::Add, BinOp::Sub]) {
            let rhs = self.term()?;
            lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Node, ExprError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&[BinOp::Mul, BinOp::Div, BinOp::FloorDiv, BinOp::Mod]) {
            let rhs = self.unary()?;
            lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node, ExprError> {
        match self.eat_op(&[BinOp::Add, BinOp::Sub]) {
            Some(BinOp::Sub) => Ok(Node::Neg(Box::new(self.nested(Self::unary)?))),
            Some(_) => self.nested(Self::unary),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<Node, ExprError> {
        let base = self.primary()?;
        if self.eat_op(&[BinOp::Pow]).is_some() {
            // Right associative; the exponent may carry its own sign.
            let exp = self.nested(Self::unary)?;
            return Ok(Node::Bin(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node, ExprError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Node::Num(v)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::additive)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(raw)) => {
                let name = raw.strip_prefix("math.").unwrap_or(&raw);
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let func =
                        Func::lookup(name).ok_or_else(|| ExprError::UnknownName(raw.clone()))?;
                    let args = self.nested(Self::call_args)?;
                    let (min, max, expected) = func.arity();
                    if args.len() < min || args.len() > max {
                        return Err(ExprError::Arity {
                            name: func.name(),
                            expected,
                            got: args.len(),
                        });
                    }
                    return Ok(Node::Call(func, args));
                }
                match name {
                    "t" => Ok(Node::Var),
                    "pi" => Ok(Node::Num(std::f64::consts::PI)),
                    "e" => Ok(Node::Num(std::f64::consts::E)),
                    "tau" => Ok(Node::Num(std::f64::consts::TAU)),
                    "inf" => Ok(Node::Num(f64::INFINITY)),
                    "nan" => Ok(Node::Num(f64::NAN)),
                    _ => Err(ExprError::UnknownName(raw)),
                }
            }
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Node>, ExprError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.additive()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(tok) => return Err(ExprError::UnexpectedToken(tok.to_string())),
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
    }
}

/// A compiled motion-function expression over the variable `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    source: String,
    root: Node,
}

impl Expr {
    /// Compile an expression, rejecting any name outside the allow-list.
    pub fn compile(src: &str) -> Result<Self, ExprError> {
        let source = src.trim();
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        if tokens.len() > MAX_TOKENS {
            return Err(ExprError::TooLong(MAX_TOKENS));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.additive()?;
        if let Some(tok) = parser.next() {
            return Err(ExprError::UnexpectedToken(tok.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Evaluate at time `t` (milliseconds since the function's anchor).
    #[inline]
    pub fn eval(&self, t: f64) -> f64 {
        self.root.eval(t)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Expr {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
