//! XPath tokenizer.

use crate::error::{Result, XPathError};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    DotDot,
    At,
    Comma,
    ColonColon,
    Slash,
    DoubleSlash,
    Pipe,
    Plus,
    Minus,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    /// `*` as a name test
    Star,
    /// `*` as multiplication
    Multiply,
    And,
    Or,
    Mod,
    Div,
    Literal(String),
    Number(f64),
    /// `local`, `prefix:local` or `prefix:*`
    Name {
        prefix: Option<String>,
        local: String,
    },
    Variable(String),
}

impl Token {
    /// Whether a following `*` or NCName must be read as an operator.
    ///
    /// Applies when a token precedes and it is not `@ :: ( [ ,` or an operator.
    fn makes_operator_context(&self) -> bool {
        !matches!(
            self,
            Token::At
                | Token::ColonColon
                | Token::LParen
                | Token::LBracket
                | Token::Comma
                | Token::And
                | Token::Or
                | Token::Mod
                | Token::Div
                | Token::Multiply
                | Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge
        )
    }
}

/// A token and the byte offset it starts at.
pub type Spanned = (Token, usize);

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.' || (!c.is_ascii() && !c.is_whitespace())
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut tokens: Vec<Spanned> = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let operator_context = tokens
            .last()
            .is_some_and(|(t, _)| t.makes_operator_context());

        let token = match c {
            '(' => bump(Token::LParen, &mut chars),
            ')' => bump(Token::RParen, &mut chars),
            '[' => bump(Token::LBracket, &mut chars),
            ']' => bump(Token::RBracket, &mut chars),
            '@' => bump(Token::At, &mut chars),
            ',' => bump(Token::Comma, &mut chars),
            '|' => bump(Token::Pipe, &mut chars),
            '+' => bump(Token::Plus, &mut chars),
            '-' => bump(Token::Minus, &mut chars),
            '=' => bump(Token::Eq, &mut chars),
            '*' if operator_context => bump(Token::Multiply, &mut chars),
            '*' => bump(Token::Star, &mut chars),
            '/' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '/').is_some() {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '!' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '=').is_none() {
                    return Err(XPathError::syntax("expected '=' after '!'", pos));
                }
                Token::NotEq
            }
            '<' | '>' => {
                chars.next();
                let or_equal = chars.next_if(|&(_, c)| c == '=').is_some();
                match (c, or_equal) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::Le,
                    (_, false) => Token::Gt,
                    (_, true) => Token::Ge,
                }
            }
            ':' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == ':').is_none() {
                    return Err(XPathError::syntax("unexpected ':'", pos));
                }
                Token::ColonColon
            }
            '"' | '\'' => {
                chars.next();
                let start = pos + 1;
                let mut end = None;
                for (i, ch) in chars.by_ref() {
                    if ch == c {
                        end = Some(i);
                        break;
                    }
                }
                let end = end.ok_or_else(|| XPathError::syntax("unterminated string literal", pos))?;
                Token::Literal(input[start..end].to_string())
            }
            '.' | '0'..='9' => {
                let is_number = c.is_ascii_digit()
                    || input[pos + 1..].starts_with(|d: char| d.is_ascii_digit());
                if is_number {
                    let mut end = pos;
                    let mut seen_dot = false;
                    while let Some(&(i, d)) = chars.peek() {
                        if d.is_ascii_digit() || (d == '.' && !seen_dot) {
                            seen_dot |= d == '.';
                            end = i + d.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let value = input[pos..end]
                        .parse::<f64>()
                        .map_err(|_| XPathError::syntax("invalid number", pos))?;
                    Token::Number(value)
                } else {
                    chars.next();
                    if chars.next_if(|&(_, c)| c == '.').is_some() {
                        Token::DotDot
                    } else {
                        Token::Dot
                    }
                }
            }
            '$' => {
                chars.next();
                let name = read_ncname(input, &mut chars)
                    .ok_or_else(|| XPathError::syntax("expected variable name after '$'", pos))?;
                Token::Variable(name.to_string())
            }
            c if is_name_start(c) => {
                let Some(first) = read_ncname(input, &mut chars) else {
                    return Err(XPathError::syntax("invalid name", pos));
                };
                if operator_context {
                    match first {
                        "and" => Token::And,
                        "or" => Token::Or,
                        "mod" => Token::Mod,
                        "div" => Token::Div,
                        _ => {
                            return Err(XPathError::syntax(
                                format!("expected an operator, found '{}'", first),
                                pos,
                            ));
                        }
                    }
                } else {
                    read_qname_rest(input, first, &mut chars)
                }
            }
            other => {
                return Err(XPathError::syntax(format!("unexpected character '{}'", other), pos));
            }
        };
        tokens.push((token, pos));
    }

    Ok(tokens)
}

fn bump(token: Token, chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> Token {
    chars.next();
    token
}

fn read_ncname<'a>(
    input: &'a str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'a>>,
) -> Option<&'a str> {
    let &(start, first) = chars.peek()?;
    if !is_name_start(first) {
        return None;
    }
    let mut end = start;
    while let Some(&(i, c)) = chars.peek() {
        if (i == start && is_name_start(c)) || (i > start && is_name_char(c)) {
            end = i + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    Some(&input[start..end])
}

/// After an NCName, read `:local` or `:*` unless the colon starts `::`.
fn read_qname_rest<'a>(
    input: &'a str,
    first: &'a str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'a>>,
) -> Token {
    let plain = || Token::Name {
        prefix: None,
        local: first.to_string(),
    };
    let Some(&(colon, ':')) = chars.peek() else {
        return plain();
    };
    let rest = &input[colon + 1..];
    if rest.starts_with('*') {
        chars.next();
        chars.next();
        return Token::Name {
            prefix: Some(first.to_string()),
            local: "*".to_string(),
        };
    }
    if !rest.starts_with(is_name_start) {
        return plain();
    }
    chars.next();
    match read_ncname(input, chars) {
        Some(local) => Token::Name {
            prefix: Some(first.to_string()),
            local: local.to_string(),
        },
        None => plain(),
    }
}
