//! Tokenizer for the Kotlin/Groovy Gradle DSL subset
//!
//! Comments are kept as tokens: commented-out plugin lines and trailing
//! dependency annotations carry meaning for the descriptor.

use crate::error::ParseError;

/// Token kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Equals,
    /// Operator run such as `?:`, `!!` or `+`; only kept inside script statements
    Op(String),
    /// `// ...` with the slashes stripped
    LineComment(String),
    /// `/* ... */` with the delimiters stripped
    BlockComment(String),
}

impl TokenKind {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{}`", name),
            Self::Str(s) => format!("string \"{}\"", s),
            Self::Int(n) => format!("integer {}", n),
            Self::LBrace => "`{`".to_string(),
            Self::RBrace => "`}`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::LBracket => "`[`".to_string(),
            Self::RBracket => "`]`".to_string(),
            Self::Dot => "`.`".to_string(),
            Self::Comma => "`,`".to_string(),
            Self::Equals => "`=`".to_string(),
            Self::Op(op) => format!("`{}`", op),
            Self::LineComment(_) | Self::BlockComment(_) => "comment".to_string(),
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }

    /// Source spelling, used to echo script statements back
    pub fn source(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Str(s) => format!("{:?}", s),
            Self::Int(n) => n.to_string(),
            Self::LBrace => "{".to_string(),
            Self::RBrace => "}".to_string(),
            Self::LParen => "(".to_string(),
            Self::RParen => ")".to_string(),
            Self::LBracket => "[".to_string(),
            Self::RBracket => "]".to_string(),
            Self::Dot => ".".to_string(),
            Self::Comma => ",".to_string(),
            Self::Equals => "=".to_string(),
            Self::Op(op) => op.clone(),
            Self::LineComment(text) => format!("// {}", text),
            Self::BlockComment(text) => format!("/* {} */", text),
        }
    }
}

/// A token with the 1-based line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Split descriptor text into tokens
pub fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(&ch) = chars.peek() {
        let start = line;
        let kind = match ch {
            '\n' => {
                line += 1;
                chars.next();
                continue;
            }
            c if c.is_whitespace() || c == ';' => {
                chars.next();
                continue;
            }
            '{' => single(&mut chars, TokenKind::LBrace),
            '}' => single(&mut chars, TokenKind::RBrace),
            '(' => single(&mut chars, TokenKind::LParen),
            ')' => single(&mut chars, TokenKind::RParen),
            '[' => single(&mut chars, TokenKind::LBracket),
            ']' => single(&mut chars, TokenKind::RBracket),
            '.' => single(&mut chars, TokenKind::Dot),
            ',' => single(&mut chars, TokenKind::Comma),
            '=' => single(&mut chars, TokenKind::Equals),
            '/' => {
                chars.next();
                match chars.peek() {
                    Some('/') => {
                        chars.next();
                        let mut body = String::new();
                        while let Some(&c) = chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            body.push(c);
                            chars.next();
                        }
                        TokenKind::LineComment(body.trim().to_string())
                    }
                    Some('*') => {
                        chars.next();
                        let mut body = String::new();
                        let mut closed = false;
                        while let Some(c) = chars.next() {
                            if c == '*' && chars.peek() == Some(&'/') {
                                chars.next();
                                closed = true;
                                break;
                            }
                            if c == '\n' {
                                line += 1;
                            }
                            body.push(c);
                        }
                        if !closed {
                            return Err(ParseError::UnterminatedComment { line: start });
                        }
                        TokenKind::BlockComment(body.trim().to_string())
                    }
                    _ => TokenKind::Op("/".to_string()),
                }
            }
            c if is_operator(c) => {
                let mut op = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_operator(c) {
                        break;
                    }
                    op.push(c);
                    chars.next();
                }
                TokenKind::Op(op)
            }
            '"' | '\'' => {
                let quote = ch;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        None | Some('\n') => {
                            return Err(ParseError::UnterminatedString { line: start });
                        }
                        Some(c) if c == quote => break,
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some('r') => value.push('\r'),
                            Some('b') => value.push('\u{8}'),
                            Some('u') => value.push(unicode_escape(&mut chars, start)?),
                            Some(other @ ('\\' | '"' | '\'' | '$')) => value.push(other),
                            Some(other) if other != '\n' => {
                                return Err(ParseError::InvalidEscape {
                                    line: start,
                                    escape: format!("\\{}", other),
                                });
                            }
                            _ => return Err(ParseError::UnterminatedString { line: start }),
                        },
                        Some(c) => value.push(c),
                    }
                }
                TokenKind::Str(value)
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '_' {
                        if c != '_' {
                            digits.push(c);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Kotlin long suffix
                if matches!(chars.peek(), Some('L')) {
                    chars.next();
                }
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| ParseError::IntegerOverflow { line, text: digits.clone() })?;
                TokenKind::Int(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(ident)
            }
            '`' => {
                // Kotlin backtick identifiers, e.g. `kotlin-android`
                chars.next();
                let mut ident = String::new();
                loop {
                    match chars.next() {
                        Some('`') => break,
                        Some('\n') | None => {
                            return Err(ParseError::UnexpectedChar { line: start, ch: '`' });
                        }
                        Some(c) => ident.push(c),
                    }
                }
                TokenKind::Ident(ident)
            }
            other => return Err(ParseError::UnexpectedChar { line, ch: other }),
        };
        tokens.push(Token { kind, line: start });
    }

    Ok(tokens)
}

type Chars<'t> = std::iter::Peekable<std::str::Chars<'t>>;

fn single(chars: &mut Chars<'_>, kind: TokenKind) -> TokenKind {
    chars.next();
    kind
}

fn is_operator(c: char) -> bool {
    matches!(c, '?' | ':' | '!' | '<' | '>' | '+' | '-' | '*' | '&' | '|' | '%' | '@')
}

/// The four hex digits after `\u`
fn unicode_escape(chars: &mut Chars<'_>, line: usize) -> Result<char, ParseError> {
    let digits: String = chars.by_ref().take(4).collect();
    let invalid = || ParseError::InvalidEscape {
        line,
        escape: format!("\\u{}", digits),
    };
    if digits.len() != 4 {
        return Err(invalid());
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_assignment_tokens() {
        assert_eq!(
            kinds("minSdk = flutter.minSdkVersion"),
            vec![
                TokenKind::Ident("minSdk".into()),
                TokenKind::Equals,
                TokenKind::Ident("flutter".into()),
                TokenKind::Dot,
                TokenKind::Ident("minSdkVersion".into()),
            ]
        );
    }

    #[test]
    fn test_comments_are_kept() {
        let tokens = tokenize("// id(\"a\")\n/* multi\nline */ x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LineComment("id(\"a\")".into()));
        assert_eq!(tokens[1].kind, TokenKind::BlockComment("multi\nline".into()));
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\\c\$d""#),
            vec![TokenKind::Str("a\"b\\c$d".into())]
        );
    }

    #[test]
    fn test_integer_with_separators() {
        assert_eq!(kinds("2_100_000_000L"), vec![TokenKind::Int(2_100_000_000)]);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("a\n\nb\n").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("x = \"abc\ny").unwrap_err(),
            ParseError::UnterminatedString { line: 1 }
        );
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(
            tokenize("a\n/* never closed").unwrap_err(),
            ParseError::UnterminatedComment { line: 2 }
        );
    }

    #[test]
    fn test_unicode_and_control_escapes() {
        assert_eq!(
            kinds(r#""\u0041b\r\t""#),
            vec![TokenKind::Str("Ab\r\t".into())]
        );
    }

    #[test]
    fn test_invalid_escapes() {
        assert_eq!(
            tokenize(r#""\u00G1""#).unwrap_err(),
            ParseError::InvalidEscape { line: 1, escape: "\\u00G1".into() }
        );
        assert_eq!(
            tokenize(r#""\q""#).unwrap_err(),
            ParseError::InvalidEscape { line: 1, escape: "\\q".into() }
        );
    }

    #[test]
    fn test_operators_and_brackets() {
        assert_eq!(
            kinds(r#"p["k"]?.let"#),
            vec![
                TokenKind::Ident("p".into()),
                TokenKind::LBracket,
                TokenKind::Str("k".into()),
                TokenKind::RBracket,
                TokenKind::Op("?".into()),
                TokenKind::Dot,
                TokenKind::Ident("let".into()),
            ]
        );
        assert_eq!(kinds("a ?: b")[1], TokenKind::Op("?:".into()));
    }

    #[test]
    fn test_unexpected_char() {
        assert_eq!(
            tokenize("a # b").unwrap_err(),
            ParseError::UnexpectedChar { line: 1, ch: '#' }
        );
    }

    #[test]
    fn test_backtick_identifier() {
        assert_eq!(kinds("`kotlin-android`"), vec![TokenKind::Ident("kotlin-android".into())]);
    }
}
