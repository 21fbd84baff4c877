//! Ordered tree of typed nodes produced by the parser

use serde::Serialize;
use std::fmt;

/// A statement inside a block (or at the top level)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// `name { ... }` or `name(args) { ... }`
    Block {
        name: String,
        args: Vec<Expr>,
        body: Vec<Node>,
        line: usize,
    },
    /// `key = value`
    Assign { key: String, value: Expr, line: usize },
    /// `name(args)` with an optional trailing comment on the same line
    Call {
        name: String,
        args: Vec<Expr>,
        annotation: Option<String>,
        line: usize,
    },
    /// A comment that is not attached to a call
    Comment { text: String, line: usize },
    /// Kotlin statement kept verbatim, e.g. `import ...`, `val x = ...` or `if (...) { }`
    Script { text: String, line: usize },
}

impl Node {
    pub fn line(&self) -> usize {
        match self {
            Node::Block { line, .. }
            | Node::Assign { line, .. }
            | Node::Call { line, .. }
            | Node::Comment { line, .. }
            | Node::Script { line, .. } => *line,
        }
    }
}

/// A value expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "expr", content = "value", rename_all = "snake_case")]
pub enum Expr {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Dotted reference such as `flutter.minSdkVersion`
    Path(Vec<String>),
    /// Call such as `platform("...")` or `signingConfigs.getByName("debug")`
    Call { callee: Vec<String>, args: Vec<Expr> },
    /// Expression outside the modelled subset, kept as source text
    Raw(String),
}

impl Expr {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Single-argument call to `callee`, returning that argument
    pub fn call_arg(&self, callee: &[&str]) -> Option<&Expr> {
        match self {
            Expr::Call { callee: c, args } if args.len() == 1 && c.iter().eq(callee.iter()) => {
                args.first()
            }
            _ => None,
        }
    }

    /// Kind of expression, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Str(_) => "a string",
            Expr::Int(_) => "an integer",
            Expr::Bool(_) => "a boolean",
            Expr::Path(_) => "a reference",
            Expr::Call { .. } => "a call",
            Expr::Raw(_) => "an expression",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Path(p) => write!(f, "{}", p.join(".")),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee.join("."))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Raw(text) => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_call() {
        let expr = Expr::Call {
            callee: vec!["signingConfigs".into(), "getByName".into()],
            args: vec![Expr::Str("debug".into())],
        };
        assert_eq!(expr.to_string(), "signingConfigs.getByName(\"debug\")");
    }

    #[test]
    fn test_call_arg() {
        let expr = Expr::Call {
            callee: vec!["platform".into()],
            args: vec![Expr::Str("a:b:1".into())],
        };
        assert_eq!(expr.call_arg(&["platform"]), Some(&Expr::Str("a:b:1".into())));
        assert_eq!(expr.call_arg(&["project"]), None);
    }
}
