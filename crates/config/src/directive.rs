//! Small directive parsers shared by every block type.
//!
//! Each helper is called after the property name has been consumed and reads
//! `= <value>` followed by an optional `;`.

use crate::{
    Error, MacroTable, Scanner, Token,
    grammar::{Expect, Rule, parse_sequence},
};

/// Fail with `message` unless the next token is the character `c`.
pub fn expect_char(scanner: &mut Scanner<'_>, c: char, message: &str) -> Result<(), Error> {
    if scanner.peek()?.is_char(c) {
        Ok(())
    } else {
        Err(scanner.error(message))
    }
}

/// `name = true|false` (case-insensitive).
pub fn assign_boolean(scanner: &mut Scanner<'_>, name: &str) -> Result<bool, Error> {
    expect_char(scanner, '=', &format!("Missing '=' in {} = <boolean>", name))?;
    scanner.next_token()?;

    let result = match scanner.peek()?.word() {
        Some(w) if w.eq_ignore_ascii_case("true") => Some(true),
        Some(w) if w.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    };
    let Some(result) = result else {
        return Err(scanner.error(format!("Missing value in {} = <boolean>", name)));
    };
    scanner.next_token()?;
    scanner.optional_semicolon()?;
    Ok(result)
}

/// `name = "text"`.
pub fn assign_string(scanner: &mut Scanner<'_>, name: &str) -> Result<String, Error> {
    expect_char(scanner, '=', &format!("Missing '=' in {} = <string>", name))?;
    scanner.next_token()?;

    let text = match scanner.peek()? {
        Token::String(text) => Some(text.clone()),
        _ => None,
    };
    let Some(text) = text else {
        return Err(scanner.error(format!("Missing <string> in {} = <string>", name)));
    };
    scanner.next_token()?;
    scanner.optional_semicolon()?;
    Ok(text)
}

/// `name = <number>`.
pub fn assign_number(scanner: &mut Scanner<'_>, name: &str) -> Result<f64, Error> {
    expect_char(scanner, '=', &format!("Missing '=' in {} = <number>", name))?;
    scanner.next_token()?;

    let number = match scanner.peek()? {
        Token::Float(v) => Some(*v),
        _ => None,
    };
    let Some(v) = number else {
        return Err(scanner.error(format!("Missing <number> in {} = <number>", name)));
    };
    scanner.next_token()?;
    scanner.optional_semicolon()?;
    Ok(v)
}

/// `name = WORD` where `WORD` is resolved through `keys` (ASCII case-insensitive).
///
/// An unknown word is a fatal error carrying `message`.
pub fn assign_tokens<T: Copy>(
    scanner: &mut Scanner<'_>,
    name: &str,
    keys: &[(&str, T)],
    message: &str,
) -> Result<T, Error> {
    expect_char(scanner, '=', &format!("Missing '=' after '{}'", name))?;
    scanner.next_token()?;

    let resolved = scanner.peek()?.word().and_then(|w| lookup_key(keys, w));
    let Some(value) = resolved else {
        return Err(scanner.error(message));
    };
    scanner.next_token()?;
    scanner.optional_semicolon()?;
    Ok(value)
}

/// Resolve `word` in a keyword table.
pub fn lookup_key<T: Copy>(keys: &[(&str, T)], word: &str) -> Option<T> {
    keys.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(word))
        .map(|(_, v)| *v)
}

/// True at the end of a `{ ... }` section.
///
/// A `}` (and a `;` after it) is consumed. End of input also ends a section but
/// is left in place for the caller.
pub fn is_section_end(scanner: &mut Scanner<'_>) -> Result<bool, Error> {
    let next = scanner.peek()?;
    if *next == Token::Eof {
        return Ok(true);
    }
    if !next.is_char('}') {
        return Ok(false);
    }
    scanner.next_token()?;
    scanner.optional_semicolon()?;
    Ok(true)
}

/// Body of `define NAME = value;`, after the `define` keyword.
pub fn parse_define(scanner: &mut Scanner<'_>, macros: &mut MacroTable) -> Result<(), Error> {
    let mut ident = None;
    let mut value = None;
    parse_sequence(
        scanner,
        macros,
        &mut [
            Rule::required(
                Expect::Identifier(Some(&mut ident)),
                "missing identifier after 'define'",
            ),
            Rule::required(Expect::Char('=', None), "missing '=' after 'define'"),
            Rule::required(Expect::Value(&mut value), "missing value in 'define'"),
            Rule::optional(Expect::Char(';', None)),
        ],
    )?;

    match (ident, value) {
        (Some(ident), Some(value)) => {
            macros.define(ident, value);
            Ok(())
        }
        _ => Err(scanner.error("missing value in 'define'")),
    }
}
