//! Block-structured parser producing an ordered [`Node`] tree
//!
//! Grammar (informal):
//!
//! ```text
//! body      := { comment | statement }
//! statement := path "=" value
//!            | path "{" body "}"
//!            | path "(" args ")" [ "{" body "}" ]
//!            | path value                (Groovy style, same line)
//!            | keyword tokens...         (kept verbatim as a script node)
//! value     := expr | tokens...          (rest of the line, brackets balanced)
//! expr      := string | int | "true" | "false" | path [ "(" args ")" ]
//! path      := ident { "." ident }
//! ```
//!
//! Kotlin statements such as `import`, `val` or `if` and values outside
//! `expr` are not interpreted. They run to the end of their line, or
//! further while a bracket stays open.

use crate::ast::{Expr, Node};
use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};
use std::collections::HashMap;

/// Leading words of statements kept as [`Node::Script`]
const SCRIPT_KEYWORDS: &[&str] = &[
    "import", "package", "val", "var", "fun", "if", "else", "for", "while", "when", "try",
    "return", "throw",
];

/// Parse descriptor text into a node tree
pub fn parse_nodes(text: &str) -> Result<Vec<Node>, ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        blocks: Vec::new(),
    };
    parser.parse_body(None)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Names of the enclosing blocks, innermost last
    blocks: Vec<String>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_comments(&mut self) {
        while self.peek().is_some_and(|t| t.kind.is_comment()) {
            self.pos += 1;
        }
    }

    fn block_path(&self) -> String {
        if self.blocks.is_empty() {
            "<root>".to_string()
        } else {
            self.blocks.join(".")
        }
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map_or(1, |t| t.line)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                line: token.line,
                block: self.block_path(),
                expected: expected.to_string(),
                found: token.kind.describe(),
            },
            None => ParseError::UnexpectedToken {
                line: self.last_line(),
                block: self.block_path(),
                expected: expected.to_string(),
                found: "end of input".to_string(),
            },
        }
    }

    /// Parse statements until the matching `}` (when `open_line` is set) or end of input
    fn parse_body(&mut self, open_line: Option<usize>) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        let mut assigned: HashMap<String, usize> = HashMap::new();

        loop {
            let Some(token) = self.peek() else {
                return match open_line {
                    Some(line) => Err(ParseError::UnclosedBlock {
                        line,
                        block: self.block_path(),
                    }),
                    None => Ok(nodes),
                };
            };

            match &token.kind {
                TokenKind::RBrace => {
                    if open_line.is_none() {
                        return Err(ParseError::UnmatchedClose { line: token.line });
                    }
                    self.pos += 1;
                    return Ok(nodes);
                }
                TokenKind::LineComment(text) | TokenKind::BlockComment(text) => {
                    self.pos += 1;
                    nodes.push(Node::Comment {
                        text: text.clone(),
                        line: token.line,
                    });
                }
                TokenKind::Ident(_) => {
                    let node = self.parse_statement()?;
                    if let Node::Assign { key, line, .. } = &node {
                        if let Some(&first) = assigned.get(key) {
                            return Err(ParseError::DuplicateKey {
                                line: *line,
                                block: self.block_path(),
                                key: key.clone(),
                                first,
                            });
                        }
                        assigned.insert(key.clone(), *line);
                    }
                    nodes.push(node);
                }
                _ => return Err(self.unexpected("a statement")),
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        let line = self.peek().map_or(1, |t| t.line);
        if let Some(TokenKind::Ident(word)) = self.peek().map(|t| &t.kind) {
            if SCRIPT_KEYWORDS.contains(&word.as_str()) {
                let tokens = self.capture("a statement")?;
                return Ok(Node::Script {
                    text: script_header(tokens),
                    line,
                });
            }
        }

        let path = self.parse_path()?;
        let name = path.join(".");

        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Equals) => {
                self.pos += 1;
                let value = self.parse_value()?;
                Ok(Node::Assign {
                    key: name,
                    value,
                    line,
                })
            }
            Some(TokenKind::LBrace) => {
                self.pos += 1;
                let body = self.parse_block_body(&name, line)?;
                Ok(Node::Block {
                    name,
                    args: Vec::new(),
                    body,
                    line,
                })
            }
            Some(TokenKind::LParen) => {
                let args = self.parse_args()?;
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBrace)) {
                    self.pos += 1;
                    let body = self.parse_block_body(&name, line)?;
                    return Ok(Node::Block {
                        name,
                        args,
                        body,
                        line,
                    });
                }
                let annotation = self.trailing_comment(line);
                Ok(Node::Call {
                    name,
                    args,
                    annotation,
                    line,
                })
            }
            Some(TokenKind::Str(_) | TokenKind::Int(_) | TokenKind::Ident(_))
                if self.peek().is_some_and(|t| t.line == line) =>
            {
                let arg = self.parse_value()?;
                let annotation = self.trailing_comment(line);
                Ok(Node::Call {
                    name,
                    args: vec![arg],
                    annotation,
                    line,
                })
            }
            _ => Err(self.unexpected("`=`, `{` or `(`")),
        }
    }

    /// An expression, or the rest of the line as [`Expr::Raw`] when it goes beyond one
    fn parse_value(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        match self.parse_expr() {
            Ok(expr) if !self.continues_line() => Ok(expr),
            _ => {
                self.pos = start;
                let tokens = self.capture("a value")?;
                Ok(Expr::Raw(source_text(tokens)))
            }
        }
    }

    /// Whether the next token belongs to the statement on the current line
    fn continues_line(&self) -> bool {
        let Some(next) = self.peek() else {
            return false;
        };
        let Some(prev) = self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) else {
            return false;
        };
        next.line == prev.line
            && !next.kind.is_comment()
            && !matches!(next.kind, TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket)
    }

    /// Tokens to the end of the line, extended across lines while a bracket is open
    fn capture(&mut self, expected: &str) -> Result<&'a [Token], ParseError> {
        let start = self.pos;
        let mut open: Vec<usize> = Vec::new();
        while let Some(token) = self.peek() {
            if open.is_empty() && self.pos > start {
                let prev = &self.tokens[self.pos - 1];
                if token.line != prev.line || token.kind.is_comment() {
                    break;
                }
            }
            match token.kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => open.push(token.line),
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    if open.pop().is_none() {
                        break;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        if let Some(&line) = open.first() {
            return Err(ParseError::UnclosedBlock {
                line,
                block: self.block_path(),
            });
        }
        if self.pos == start {
            return Err(self.unexpected(expected));
        }
        let tokens = self.tokens;
        Ok(&tokens[start..self.pos])
    }

    fn parse_block_body(&mut self, name: &str, line: usize) -> Result<Vec<Node>, ParseError> {
        self.blocks.push(name.to_string());
        let body = self.parse_body(Some(line));
        self.blocks.pop();
        body
    }

    /// A line comment on the same line as the statement just parsed
    fn trailing_comment(&mut self, line: usize) -> Option<String> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::LineComment(text),
                line: comment_line,
            }) if *comment_line == line => {
                self.pos += 1;
                Some(text.clone())
            }
            _ => None,
        }
    }

    fn parse_path(&mut self) -> Result<Vec<String>, ParseError> {
        let mut path = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Ident(name)) => {
                    path.push(name.clone());
                    self.pos += 1;
                }
                _ => return Err(self.unexpected("an identifier")),
            }
            if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Dot)) {
                self.pos += 1;
            } else {
                return Ok(path);
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        // Opening parenthesis
        self.advance();
        let mut args = Vec::new();
        loop {
            self.skip_comments();
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    return Ok(args);
                }
                None => return Err(self.unexpected("`)`")),
                _ => {}
            }
            args.push(self.parse_expr()?);
            self.skip_comments();
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                Some(TokenKind::RParen) => {}
                _ => return Err(self.unexpected("`,` or `)`")),
            }
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.skip_comments();
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Str(s.clone()))
            }
            Some(TokenKind::Int(n)) => {
                self.pos += 1;
                Ok(Expr::Int(*n))
            }
            Some(TokenKind::Ident(_)) => {
                let path = self.parse_path()?;
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
                    let args = self.parse_args()?;
                    return Ok(Expr::Call { callee: path, args });
                }
                match path.as_slice() {
                    [single] if single == "true" => Ok(Expr::Bool(true)),
                    [single] if single == "false" => Ok(Expr::Bool(false)),
                    _ => Ok(Expr::Path(path)),
                }
            }
            _ => Err(self.unexpected("a value")),
        }
    }
}

/// Tokens joined back into readable source
fn source_text(tokens: &[Token]) -> String {
    let mut text = String::new();
    let mut prev: Option<&TokenKind> = None;
    for token in tokens {
        if let Some(prev) = prev {
            let tight = match (prev, &token.kind) {
                (TokenKind::Ident(word), TokenKind::LParen) => !SCRIPT_KEYWORDS.contains(&word.as_str()),
                (_, TokenKind::Op(op)) => op == "?" || op == "!!",
                (TokenKind::Dot | TokenKind::LParen | TokenKind::LBracket, _) => true,
                (
                    _,
                    TokenKind::Dot
                    | TokenKind::Comma
                    | TokenKind::RParen
                    | TokenKind::LBracket
                    | TokenKind::RBracket,
                ) => true,
                _ => false,
            };
            if !tight {
                text.push(' ');
            }
        }
        text.push_str(&token.kind.source());
        prev = Some(&token.kind);
    }
    text
}

/// Source of a script statement up to its first top-level `{`
fn script_header(tokens: &[Token]) -> String {
    let mut depth = 0usize;
    let end = tokens
        .iter()
        .position(|token| match token.kind {
            TokenKind::LBrace if depth == 0 => true,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                depth += 1;
                false
            }
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => false,
        })
        .unwrap_or(tokens.len());
    source_text(&tokens[..end])
}
