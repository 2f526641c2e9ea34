//! Table-driven directive grammar.
//!
//! A directive is described by an ordered list of [`Rule`]s. Each rule names the
//! token it expects, whether the token is required, and where the matched
//! payload goes. [`parse_sequence`] walks the list against a [`Scanner`].
//!
//! ```text
//! loc ( x , y [ , w [ , h ] ] )
//! ```
//!
//! is expressed as required `(`, int, `,`, int, then `Optional(',')`,
//! `Continuation(int)`, `Optional(',')`, `Continuation(int)` and required `)`.
//! A continuation only runs when the rule just before it matched, so a missing
//! optional comma quietly skips the number that would follow it.

use std::fmt;

use crate::{Error, Keyword, MacroTable, Scanner, Token, value::parse_value};

/// How a rule reacts when its token is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Absence is a fatal parse error.
    Required,
    /// Absence is fine; the rule is marked as not matched.
    Optional,
    /// Only attempted when the previous rule matched; never an error.
    Continuation,
}

/// Free-form matcher invoked in place of a token comparison.
///
/// It reads whatever it needs from the scanner and returns `Ok(false)` to
/// signal that the rule's error should be raised.
pub type Converter<'d> = dyn FnMut(&mut Scanner<'_>, &MacroTable) -> Result<bool, Error> + 'd;

/// The token a rule expects, together with the destination for its payload.
pub enum Expect<'d> {
    /// A punctuation character; the flag is set when it matched.
    Char(char, Option<&'d mut bool>),
    /// A directive keyword; the flag is set when it matched.
    Keyword(Keyword, Option<&'d mut bool>),
    /// An identifier, copied out as text.
    Identifier(Option<&'d mut Option<String>>),
    /// A quoted string, copied out as text.
    String(Option<&'d mut Option<String>>),
    /// A number.
    Float(Option<&'d mut f64>),
    /// A number truncated toward zero.
    Int(Option<&'d mut i32>),
    /// A value expression read with macro substitution. Always matches; an
    /// empty expression leaves the destination as `None`.
    Value(&'d mut Option<String>),
    /// Any single token, copied out verbatim.
    Any(Option<&'d mut Token>),
    /// A custom matcher. Always matches.
    Custom(&'d mut Converter<'d>),
}

impl fmt::Debug for Expect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c, _) => write!(f, "Char({:?})", c),
            Self::Keyword(kw, _) => write!(f, "Keyword({})", kw),
            Self::Identifier(_) => f.write_str("Identifier"),
            Self::String(_) => f.write_str("String"),
            Self::Float(_) => f.write_str("Float"),
            Self::Int(_) => f.write_str("Int"),
            Self::Value(_) => f.write_str("Value"),
            Self::Any(_) => f.write_str("Any"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl Expect<'_> {
    /// Put the destination into its neutral state before the sequence runs.
    fn reset(&mut self) {
        match self {
            Self::Char(_, Some(flag)) | Self::Keyword(_, Some(flag)) => **flag = false,
            Self::Identifier(Some(dest)) | Self::String(Some(dest)) => **dest = None,
            Self::Value(dest) => **dest = None,
            _ => {}
        }
    }

    /// Whether the pending token satisfies this expectation.
    fn matches(&self, next: &Token) -> bool {
        match (self, next) {
            (Self::Value(_) | Self::Any(_) | Self::Custom(_), _) => true,
            (Self::Char(c, _), Token::Char(t)) => c == t,
            (Self::Keyword(kw, _), Token::Keyword(t)) => kw == t,
            (Self::Identifier(_), Token::Identifier(_))
            | (Self::String(_), Token::String(_))
            | (Self::Float(_) | Self::Int(_), Token::Float(_)) => true,
            _ => false,
        }
    }
}

/// One step of a directive grammar.
#[derive(Debug)]
pub struct Rule<'d> {
    /// What happens when the token is absent.
    pub requirement: Requirement,
    /// Expected token and destination.
    pub expect: Expect<'d>,
    /// Message for the fatal error raised on a missing required token.
    pub message: &'d str,
}

impl<'d> Rule<'d> {
    /// A rule whose absence aborts parsing with `message`.
    pub fn required(expect: Expect<'d>, message: &'d str) -> Self {
        Self {
            requirement: Requirement::Required,
            expect,
            message,
        }
    }

    /// A rule that may be absent.
    pub fn optional(expect: Expect<'d>) -> Self {
        Self {
            requirement: Requirement::Optional,
            expect,
            message: "",
        }
    }

    /// A rule attempted only when the previous one matched.
    pub fn continuation(expect: Expect<'d>) -> Self {
        Self {
            requirement: Requirement::Continuation,
            expect,
            message: "",
        }
    }
}

/// Run `rules` against `scanner`, writing matched payloads to their destinations.
///
/// Returns the first required-rule failure as a parse error carrying that rule's
/// message; nothing after the failing rule is consumed.
pub fn parse_sequence(
    scanner: &mut Scanner<'_>,
    macros: &MacroTable,
    rules: &mut [Rule<'_>],
) -> Result<(), Error> {
    for rule in rules.iter_mut() {
        rule.expect.reset();
    }

    let mut matched = true;
    for rule in rules.iter_mut() {
        if rule.requirement == Requirement::Continuation && !matched {
            continue;
        }
        if !rule.expect.matches(scanner.peek()?) {
            match rule.requirement {
                Requirement::Required => return Err(scanner.error(rule.message)),
                Requirement::Optional | Requirement::Continuation => matched = false,
            }
            continue;
        }
        matched = true;
        apply(scanner, macros, rule)?;
    }
    Ok(())
}

/// Consume the matched token(s) for `rule` and store the payload.
fn apply(scanner: &mut Scanner<'_>, macros: &MacroTable, rule: &mut Rule<'_>) -> Result<(), Error> {
    match &mut rule.expect {
        Expect::Value(dest) => {
            let value = parse_value(scanner, macros, None)?;
            **dest = (!value.is_empty()).then_some(value);
        }
        Expect::Custom(convert) => {
            if !(*convert)(scanner, macros)? && !rule.message.is_empty() {
                return Err(scanner.error(rule.message));
            }
        }
        expect => {
            let token = scanner.next_token()?;
            store(expect, token);
        }
    }
    Ok(())
}

/// Copy a consumed token's payload into the rule destination.
fn store(expect: &mut Expect<'_>, token: Token) {
    match (expect, token) {
        (Expect::Char(_, Some(flag)) | Expect::Keyword(_, Some(flag)), _) => **flag = true,
        (Expect::Identifier(Some(dest)), Token::Identifier(s))
        | (Expect::String(Some(dest)), Token::String(s)) => **dest = Some(s),
        (Expect::Float(Some(dest)), Token::Float(v)) => **dest = v,
        (Expect::Int(Some(dest)), Token::Float(v)) => **dest = v as i32,
        (Expect::Any(Some(dest)), token) => **dest = token,
        _ => {}
    }
}
