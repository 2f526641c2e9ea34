//! Value expressions: the text after `=` in an assignment or `define`.
//!
//! A value is read as a run of tokens that are glued back together into one
//! string. Macros are substituted as identifiers are read, string literals are
//! re-quoted, numbers are printed in a locale-independent form and any other
//! punctuation is copied through. The resulting text is what the expression
//! evaluator later parses at runtime.
//!
//! The run stops at a keyword, `}`, `;`, `[`, end of input, a top-level `,` or
//! `)`, or at an identifier that does not follow an operator character. The last
//! rule is what separates `value = a + b` from a following `tooltip = ...` when
//! the directive name happens to be an identifier.

use tracing::trace;

use crate::{Error, MacroTable, Scanner, Token};

/// Characters after which an identifier is read as part of the current value.
const OPERATORS: &str = ",(+-*/%=<>!|&";

/// Append `s` to `dest` as a double-quoted literal, escaping `"` and `\`.
pub fn quote_into(dest: &mut String, s: &str) {
    dest.reserve(s.len() + 2);
    dest.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            dest.push('\\');
        }
        dest.push(c);
    }
    dest.push('"');
}

/// Render a number in its shortest round-trippable decimal form. Exponents are
/// always written out positionally, so `1e21` becomes `1000000000000000000000`.
pub fn format_number(v: f64) -> String {
    format!("{}", v)
}

/// Read a value expression starting at the current token.
///
/// When `label` is given and the value opens with a string followed by `,`, the
/// string is stored in `label` and does not become part of the value.
pub fn parse_value(
    scanner: &mut Scanner<'_>,
    macros: &MacroTable,
    label: Option<&mut Option<String>>,
) -> Result<String, Error> {
    let mut value = String::new();

    if let Some(label) = label
        && matches!(scanner.peek()?, Token::String(_))
        && let Token::String(first) = scanner.next_token()?
    {
        if scanner.eat_char(',')? {
            *label = Some(first);
        } else {
            quote_into(&mut value, &first);
        }
    }

    let mut prev = Token::Char('+');
    let mut depth = 0usize;
    while continues(scanner.peek()?, &prev, depth) {
        let token = scanner.next_token()?;
        match &token {
            Token::String(s) => quote_into(&mut value, s),
            Token::Identifier(id) => value.push_str(macros.substitute(id)),
            Token::Float(v) => value.push_str(&format_number(*v)),
            Token::Char(c) => {
                value.push(*c);
                match c {
                    '(' => depth += 1,
                    ')' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            Token::Keyword(_) | Token::Eof => {}
        }
        prev = token;
    }
    scanner.optional_semicolon()?;
    trace!(value = %value, "value expression");
    Ok(value)
}

/// Read `= value` for the property `name`.
pub fn assign_value(
    scanner: &mut Scanner<'_>,
    macros: &MacroTable,
    name: &str,
    label: Option<&mut Option<String>>,
) -> Result<String, Error> {
    if !scanner.eat_char('=')? {
        return Err(scanner.error(format!("expecting {} = expression", name)));
    }
    parse_value(scanner, macros, label)
}

/// Whether `next` extends the value being read.
fn continues(next: &Token, prev: &Token, depth: usize) -> bool {
    match next {
        Token::Eof | Token::Keyword(_) => false,
        Token::Char('}' | ';' | '[') => false,
        Token::Char(',' | ')') => depth > 0,
        Token::Identifier(_) => matches!(prev, Token::Char(c) if OPERATORS.contains(*c)),
        Token::String(_) | Token::Float(_) | Token::Char(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of<'a>(src: &'a str, macros: &MacroTable) -> (String, Scanner<'a>) {
        let mut s = Scanner::for_config(src, None);
        let v = parse_value(&mut s, macros, None).expect("value");
        (v, s)
    }

    #[test]
    fn concatenates_tokens_without_whitespace() {
        let m = MacroTable::new();
        let (v, _) = value_of(r#"pad( time("%H:%M") , 8 ) + "x""#, &m);
        assert_eq!(v, r#"pad(time("%H:%M"),8)+"x""#);
    }

    #[test]
    fn strings_are_requoted_with_escapes() {
        let m = MacroTable::new();
        let (v, _) = value_of(r#""say \"hi\" \\ bye""#, &m);
        assert_eq!(v, r#""say \"hi\" \\ bye""#);
    }

    #[test]
    fn macros_substitute_identifiers() {
        let mut m = MacroTable::new();
        m.define("Fmt", "\"%H\"");
        let (v, _) = value_of("time(Fmt)", &m);
        assert_eq!(v, "time(\"%H\")");
    }

    #[test]
    fn sole_macro_round_trips() {
        let mut m = MacroTable::new();
        m.define("Greeting", "\"hello\"+name");
        let (v, _) = value_of("Greeting", &m);
        assert_eq!(v, "\"hello\"+name");
    }

    #[test]
    fn stops_at_identifier_after_operand() {
        let m = MacroTable::new();
        let (v, mut s) = value_of("a + b\nnext = 1", &m);
        assert_eq!(v, "a+b");
        assert_eq!(s.peek().unwrap(), &Token::Identifier("next".into()));
    }

    #[test]
    fn stops_at_keywords_and_terminators() {
        let m = MacroTable::new();
        let (v, mut s) = value_of("1 + 2 tooltip = 3", &m);
        assert_eq!(v, "1+2");
        assert!(s.peek().unwrap().is_keyword());

        let (v, mut s) = value_of("x }", &m);
        assert_eq!(v, "x");
        assert!(s.peek().unwrap().is_char('}'));

        let (v, mut s) = value_of("x [", &m);
        assert_eq!(v, "x");
        assert!(s.peek().unwrap().is_char('['));
    }

    #[test]
    fn commas_only_inside_parentheses() {
        let m = MacroTable::new();
        let (v, mut s) = value_of("min(1, 2), 3", &m);
        assert_eq!(v, "min(1,2)");
        assert!(s.peek().unwrap().is_char(','));

        let (v, mut s) = value_of("a) + b", &m);
        assert_eq!(v, "a");
        assert!(s.peek().unwrap().is_char(')'));
    }

    #[test]
    fn trailing_semicolon_is_consumed() {
        let m = MacroTable::new();
        let (v, mut s) = value_of("2 * 3; rest", &m);
        assert_eq!(v, "2*3");
        assert_eq!(s.peek().unwrap(), &Token::Identifier("rest".into()));
    }

    #[test]
    fn numbers_render_round_trippable() {
        let m = MacroTable::new();
        let (v, _) = value_of("1.50 + 2 + 0.1", &m);
        assert_eq!(v, "1.5+2+0.1");
        let (v, _) = value_of("1e21 + 2.5e-7", &m);
        assert_eq!(v, "1000000000000000000000+0.00000025");
    }

    #[test]
    fn label_split_requires_comma() {
        let m = MacroTable::new();
        let mut s = Scanner::for_config(r#""cpu", val("3")"#, None);
        let mut label = None;
        let v = parse_value(&mut s, &m, Some(&mut label)).unwrap();
        assert_eq!(label.as_deref(), Some("cpu"));
        assert_eq!(v, r#"val("3")"#);

        let mut s = Scanner::for_config(r#""cpu", ;"#, None);
        let mut label = None;
        let v = parse_value(&mut s, &m, Some(&mut label)).unwrap();
        assert_eq!(label.as_deref(), Some("cpu"));
        assert_eq!(v, "");

        let mut s = Scanner::for_config(r#""cpu" + "%""#, None);
        let mut label = None;
        let v = parse_value(&mut s, &m, Some(&mut label)).unwrap();
        assert_eq!(label, None);
        assert_eq!(v, r#""cpu"+"%""#);
    }

    #[test]
    fn leading_string_without_label_request_is_literal() {
        let m = MacroTable::new();
        let (v, mut s) = value_of(r#""cpu", 3"#, &m);
        assert_eq!(v, r#""cpu""#);
        assert!(s.peek().unwrap().is_char(','));
    }

    #[test]
    fn assign_value_requires_equals() {
        let m = MacroTable::new();
        let mut s = Scanner::for_config("value 3", None);
        s.next_token().unwrap();
        let err = assign_value(&mut s, &m, "value", None).unwrap_err();
        assert_eq!(err.message(), "expecting value = expression");

        let mut s = Scanner::for_config("= 3 + 4;", None);
        assert_eq!(assign_value(&mut s, &m, "value", None).unwrap(), "3+4");
    }
}
