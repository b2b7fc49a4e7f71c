//! Checks on the body of a scanned string literal: f-string replacement
//! fields and the ASCII-only rule for bytes.

use std::iter::Peekable;
use std::str::Chars;

use super::error::LexErrorKind;

/// Format specs may hold replacement fields, which may hold one more level.
const MAX_FSTRING_NESTING: usize = 2;

/// Prefix and body of a string token's source text.
struct StringParts<'a> {
    prefix: &'a str,
    body: &'a str,
}

impl<'a> StringParts<'a> {
    fn split(lexeme: &'a str) -> Option<Self> {
        let quote_at = lexeme.find(['\'', '"'])?;
        let (prefix, quoted) = lexeme.split_at(quote_at);
        let quote = quoted.chars().next()?;
        let triple: String = std::iter::repeat(quote).take(3).collect();
        let delimiter = if quoted.len() >= 6 && quoted.starts_with(&triple) {
            3
        } else {
            1
        };
        let body = quoted.get(delimiter..quoted.len().saturating_sub(delimiter))?;
        Some(Self { prefix, body })
    }

    fn has_prefix(&self, letter: char) -> bool {
        self.prefix.chars().any(|c| c.eq_ignore_ascii_case(&letter))
    }
}

/// Whether a string token is a bytes literal (`b'...'`, `Rb"..."`).
pub fn is_bytes_literal(lexeme: &str) -> bool {
    StringParts::split(lexeme).is_some_and(|parts| parts.has_prefix('b'))
}

/// Validate a complete string token.
pub(super) fn check_string_literal(lexeme: &str) -> Result<(), LexErrorKind> {
    let Some(parts) = StringParts::split(lexeme) else {
        return Ok(());
    };
    if parts.has_prefix('b') && !parts.body.is_ascii() {
        return Err(LexErrorKind::NonAsciiBytes);
    }
    if parts.has_prefix('f') {
        check_fstring(parts.body, parts.has_prefix('r'))?;
    }
    Ok(())
}

fn check_fstring(body: &str, raw: bool) -> Result<(), LexErrorKind> {
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if !raw => skip_escape(&mut chars),
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' => replacement_field(&mut chars, 0)?,
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
            }
            '}' => return Err(LexErrorKind::FStringSingleBrace),
            _ => {}
        }
    }
    Ok(())
}

/// `\N{NAME}` carries braces that are not replacement fields.
fn skip_escape(chars: &mut Peekable<Chars<'_>>) {
    match chars.peek() {
        Some('N') => {
            chars.next();
            if chars.peek() == Some(&'{') {
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
            }
        }
        Some('{' | '}') | None => {}
        Some(_) => {
            chars.next();
        }
    }
}

/// Everything after the opening `{` of a field, up to and including its `}`.
fn replacement_field(chars: &mut Peekable<Chars<'_>>, nesting: usize) -> Result<(), LexErrorKind> {
    if nesting >= MAX_FSTRING_NESTING {
        return Err(LexErrorKind::FStringTooDeep);
    }

    let mut expression = String::new();
    let mut depth = 0usize;
    let terminator = loop {
        let Some(c) = chars.next() else {
            return Err(LexErrorKind::FStringExpectingBrace);
        };
        match c {
            '\'' | '"' => {
                expression.push(c);
                skip_quoted(chars, c)?;
            }
            '(' | '[' | '{' => {
                depth += 1;
                expression.push(c);
            }
            ')' | ']' if depth > 0 => {
                depth -= 1;
                expression.push(c);
            }
            '}' if depth > 0 => {
                depth -= 1;
                expression.push(c);
            }
            '!' if depth == 0 && chars.peek() != Some(&'=') => break '!',
            ':' if depth == 0 => break ':',
            '}' => break '}',
            _ => expression.push(c),
        }
    };

    let expression = expression.trim_end();
    let expression = expression.strip_suffix('=').unwrap_or(expression);
    if expression.trim().is_empty() {
        return Err(LexErrorKind::FStringEmptyExpression);
    }

    let terminator = if terminator == '!' {
        match chars.next() {
            Some('s' | 'r' | 'a') => {}
            Some(ch) if ch != ':' && ch != '}' => {
                return Err(LexErrorKind::FStringConversion { ch })
            }
            _ => return Err(LexErrorKind::FStringMissingConversion),
        }
        match chars.next() {
            Some(next @ (':' | '}')) => next,
            _ => return Err(LexErrorKind::FStringExpectingBrace),
        }
    } else {
        terminator
    };

    if terminator == ':' {
        format_spec(chars, nesting)?;
    }
    Ok(())
}

/// A format spec, up to and including the `}` that closes its field.
fn format_spec(chars: &mut Peekable<Chars<'_>>, nesting: usize) -> Result<(), LexErrorKind> {
    while let Some(c) = chars.next() {
        match c {
            '{' => replacement_field(chars, nesting + 1)?,
            '}' => return Ok(()),
            _ => {}
        }
    }
    Err(LexErrorKind::FStringExpectingBrace)
}

fn skip_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Result<(), LexErrorKind> {
    for c in chars.by_ref() {
        if c == quote {
            return Ok(());
        }
    }
    Err(LexErrorKind::FStringExpectingBrace)
}
