//! Parses directive bodies. A directive is either a bare identifier or a call
//! of a named macro:
//!
//! ```text
//! directive := ident | ident '(' [ arg (',' arg)* [','] ] ')'
//! arg       := value | ident '=' value
//! value     := literal | ident
//! literal   := string | integer | float | True | False | true | false
//! ```
//!
//! Strings are single- or double-quoted and understand the escapes `\\`,
//! `\"`, `\'`, `\n` and `\t`. Positional arguments must come before keyword
//! arguments. An identifier in argument position (other than the boolean
//! names) is a [`Argument::Reference`] to a binding. Nothing is evaluated
//! here; resolving names is up to [`crate::expand`].

use crate::value::Value;
use std::fmt;

/// A parsed directive body.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive<'a> {
    /// A bare identifier such as `blog_title`.
    Identifier(&'a str),

    /// A macro invocation such as `youtube("abc123", width=400)`.
    Call(Call<'a>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Call<'a> {
    pub name: &'a str,
    pub positional: Vec<Argument<'a>>,
    pub keywords: Vec<(&'a str, Argument<'a>)>,
}

/// A call argument as written.
#[derive(Clone, Debug, PartialEq)]
pub enum Argument<'a> {
    Literal(Value),

    /// The name of a binding whose value is passed, such as `date` in
    /// `date_format(date, "%Y")`.
    Reference(&'a str),
}

/// Parses a (trimmed) directive body. Returns `Ok(None)` if the body isn't
/// directive syntax at all, i.e. it neither is an identifier nor starts with
/// `ident(`; such spans are left alone by the expander. Once an opening
/// parenthesis follows the name, the body is committed to being a call and any
/// problem is an error.
pub fn parse(body: &str) -> Result<Option<Directive<'_>>> {
    let mut cursor = Cursor::new(body.trim());
    let name = match cursor.ident() {
        Some(name) => name,
        None => return Ok(None),
    };
    cursor.skip_whitespace();
    if cursor.at_end() {
        return Ok(Some(Directive::Identifier(name)));
    }
    if !cursor.eat('(') {
        return Ok(None);
    }

    let (positional, keywords) = cursor.arguments()?;
    cursor.skip_whitespace();
    if !cursor.at_end() {
        return Err(cursor.error(ErrorKind::TrailingInput));
    }
    Ok(Some(Directive::Call(Call {
        name,
        positional,
        keywords,
    })))
}

type ArgumentList<'a> = (Vec<Argument<'a>>, Vec<(&'a str, Argument<'a>)>);

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Cursor<'a> {
        Cursor { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            offset: self.pos,
            kind,
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.pos += 1;
        }
        Some(&self.src[start..self.pos])
    }

    // Parses everything after the opening parenthesis up to and including the
    // closing one.
    fn arguments(&mut self) -> Result<ArgumentList<'a>> {
        let mut positional = Vec::new();
        let mut keywords = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat(')') {
                break;
            }

            let start = self.pos;
            match self.ident() {
                Some(ident) => {
                    self.skip_whitespace();
                    if self.eat('=') {
                        self.skip_whitespace();
                        keywords.push((ident, self.argument()?));
                    } else {
                        let value = named(ident);
                        if !keywords.is_empty() {
                            return Err(Error {
                                offset: start,
                                kind: ErrorKind::PositionalAfterKeyword,
                            });
                        }
                        positional.push(value);
                    }
                }
                None => {
                    let value = self.argument()?;
                    if !keywords.is_empty() {
                        return Err(Error {
                            offset: start,
                            kind: ErrorKind::PositionalAfterKeyword,
                        });
                    }
                    positional.push(value);
                }
            }

            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                break;
            }
            let found = self.peek();
            return Err(self.error(ErrorKind::ExpectedSeparator(found)));
        }
        Ok((positional, keywords))
    }

    fn argument(&mut self) -> Result<Argument<'a>> {
        match self.peek() {
            Some(quote @ '"') | Some(quote @ '\'') => {
                self.pos += 1;
                self.string(quote).map(Argument::Literal)
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                self.number().map(Argument::Literal)
            }
            Some(_) => match self.ident() {
                Some(ident) => Ok(named(ident)),
                None => {
                    let found = self.peek();
                    Err(self.error(ErrorKind::ExpectedLiteral(found)))
                }
            },
            None => Err(self.error(ErrorKind::ExpectedLiteral(None))),
        }
    }

    fn string(&mut self, quote: char) -> Result<Value> {
        let start = self.pos - 1;
        let mut s = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(Error {
                        offset: start,
                        kind: ErrorKind::UnterminatedString,
                    })
                }
                Some(c) if c == quote => return Ok(Value::Str(s)),
                Some('\\') => match self.bump() {
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some('\'') => s.push('\''),
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(other) => return Err(self.error(ErrorKind::UnknownEscape(other))),
                    None => {
                        return Err(Error {
                            offset: start,
                            kind: ErrorKind::UnterminatedString,
                        })
                    }
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some('-') || self.peek() == Some('+') {
            self.pos += 1;
        }
        let mut float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' if !float => float = true,
                _ => break,
            }
            self.pos += 1;
        }

        let text = &self.src[start..self.pos];
        let invalid = || Error {
            offset: start,
            kind: ErrorKind::InvalidNumber(text.to_owned()),
        };
        if float {
            text.parse::<f64>().map(Value::Float).map_err(|_| invalid())
        } else {
            text.parse::<i64>().map(Value::Int).map_err(|_| invalid())
        }
    }
}

// An identifier in argument position: a boolean literal or a reference.
fn named(ident: &str) -> Argument<'_> {
    match ident {
        "True" | "true" => Argument::Literal(Value::Bool(true)),
        "False" | "false" => Argument::Literal(Value::Bool(false)),
        _ => Argument::Reference(ident),
    }
}

/// The result of a fallible parse.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a directive that looks like a call but can't be parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    /// Byte offset into the trimmed directive body.
    pub offset: usize,
    pub kind: ErrorKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// A string literal runs off the end of the directive.
    UnterminatedString,

    /// A backslash escape other than `\\`, `\"`, `\'`, `\n` or `\t`.
    UnknownEscape(char),

    /// A numeric literal that doesn't parse (or overflows).
    InvalidNumber(String),

    /// Neither a literal nor an identifier where an argument was expected.
    ExpectedLiteral(Option<char>),

    /// Something other than `,` or `)` after an argument.
    ExpectedSeparator(Option<char>),

    /// A positional argument after a keyword argument.
    PositionalAfterKeyword,

    /// Text after the closing parenthesis.
    TrailingInput,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn found(c: &Option<char>) -> String {
            match c {
                Some(c) => format!("`{}`", c),
                None => String::from("end of directive"),
            }
        }

        match self {
            ErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ErrorKind::UnknownEscape(c) => write!(f, "unknown escape `\\{}`", c),
            ErrorKind::InvalidNumber(text) => write!(f, "invalid number `{}`", text),
            ErrorKind::ExpectedLiteral(c) => {
                write!(f, "expected a literal or a name, found {}", found(c))
            }
            ErrorKind::ExpectedSeparator(c) => {
                write!(f, "expected `,` or `)`, found {}", found(c))
            }
            ErrorKind::PositionalAfterKeyword => {
                write!(f, "positional argument follows keyword argument")
            }
            ErrorKind::TrailingInput => write!(f, "unexpected text after the closing `)`"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (at offset {})", self.kind, self.offset)
    }
}

impl std::error::Error for Error {}
