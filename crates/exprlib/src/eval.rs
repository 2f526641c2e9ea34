//! Evaluation of stored expression strings.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | STRING | '(' expr ')' | NAME ['(' [expr (',' expr)*] ')']
//! ```
//!
//! `+` concatenates when either side is a string. The other operators work on
//! numbers, reading strings through their numeric prefix. Division or
//! remainder by zero yields 0. A bare `NAME` is a call with no arguments.
//!
//! Calls that fail validation degrade to the function's neutral value; an
//! unknown function is returned as an error.

use std::collections::HashMap;

use config::{Scanner, Token};
use tracing::{trace, warn};

use crate::{CallContext, Error, FunctionRegistry, Value};

/// Entries a [`CallCache`] holds before it starts over.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Deepest nesting of unary minus, parentheses and call arguments.
pub const MAX_NESTING: usize = 128;

/// Memo of results from deterministic functions, keyed by name and arguments.
///
/// The cache is bounded: inserting into a full cache drops every entry first,
/// so arguments that change on each update cannot grow it without limit.
#[derive(Debug, Clone)]
pub struct CallCache {
    /// Cached results.
    entries: HashMap<String, Value>,
    /// Lookups answered from the cache.
    hits: usize,
    /// Most entries kept at once.
    capacity: usize,
}

impl Default for CallCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl CallCache {
    /// An empty cache with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty cache holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            capacity: capacity.max(1),
        }
    }

    /// Most entries kept at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache so far.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Drop all cached results.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }

    /// Store a result, starting over when the cache is full.
    fn insert(&mut self, key: String, value: Value) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            trace!(entries = self.entries.len(), "call cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(key, value);
    }

    /// Key for a call.
    fn key(name: &str, args: &[Option<Value>]) -> String {
        format!("{}{:?}", name, args)
    }
}

/// Evaluates expression strings against a [`FunctionRegistry`].
#[derive(Debug)]
pub struct Evaluator<'r> {
    /// Functions available to expressions.
    registry: &'r FunctionRegistry,
    /// Memo for deterministic calls, when enabled.
    cache: Option<CallCache>,
}

impl<'r> Evaluator<'r> {
    /// Evaluator without caching.
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    /// Enable memoization of deterministic calls.
    pub fn with_cache(self) -> Self {
        self.with_call_cache(CallCache::new())
    }

    /// Enable memoization using `cache`.
    pub fn with_call_cache(mut self, cache: CallCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The call cache, when enabled.
    pub fn cache(&self) -> Option<&CallCache> {
        self.cache.as_ref()
    }

    /// Evaluate `expr`.
    pub fn evaluate(&mut self, expr: &str, ctx: &CallContext<'_>) -> Result<Value, Error> {
        let mut run = Run {
            expr,
            scanner: Scanner::new(expr),
            registry: self.registry,
            cache: self.cache.as_mut(),
            ctx,
            depth: 0,
        };
        let value = run.expr()?;
        let trailing = run.next()?;
        if trailing != Token::Eof {
            return Err(run.syntax(format!("unexpected {}", trailing)));
        }
        trace!(expr, result = %value, "evaluated");
        Ok(value)
    }

    /// Evaluate `expr` and render the result as display text.
    pub fn render(&mut self, expr: &str, ctx: &CallContext<'_>) -> Result<String, Error> {
        self.evaluate(expr, ctx).map(|v| v.render())
    }
}

/// State of one evaluation.
struct Run<'s, 'e> {
    /// Source text, for error messages.
    expr: &'s str,
    /// Token source.
    scanner: Scanner<'s>,
    /// Functions available to the expression.
    registry: &'e FunctionRegistry,
    /// Deterministic call memo.
    cache: Option<&'e mut CallCache>,
    /// Ambient call state.
    ctx: &'e CallContext<'e>,
    /// Current nesting of recursive productions.
    depth: usize,
}

impl Run<'_, '_> {
    /// Syntax error for this expression.
    fn syntax(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            expr: self.expr.to_string(),
            message: message.into(),
        }
    }

    /// Next token, with scanner errors mapped to syntax errors.
    fn next(&mut self) -> Result<Token, Error> {
        match self.scanner.next_token() {
            Ok(t) => Ok(t),
            Err(e) => Err(self.syntax(e.message())),
        }
    }

    /// Consume the next token when it is the character `c`.
    fn eat(&mut self, c: char) -> Result<bool, Error> {
        match self.scanner.eat_char(c) {
            Ok(b) => Ok(b),
            Err(e) => Err(self.syntax(e.message())),
        }
    }

    /// Run a recursive production one level deeper, failing past
    /// [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.depth >= MAX_NESTING {
            return Err(self.syntax(format!("nesting deeper than {} levels", MAX_NESTING)));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Peek for one of `ops`.
    fn peek_op(&mut self, ops: &[char]) -> Result<Option<char>, Error> {
        let peeked = self.scanner.peek().map(|token| match token {
            Token::Char(c) if ops.contains(c) => Some(*c),
            _ => None,
        });
        peeked.map_err(|e| self.syntax(e.message()))
    }

    /// `term (('+' | '-') term)*`
    fn expr(&mut self) -> Result<Value, Error> {
        let mut acc = self.term()?;
        while let Some(op) = self.peek_op(&['+', '-'])? {
            self.next()?;
            let rhs = self.term()?;
            acc = match op {
                '+' => add(acc, rhs),
                _ => Value::Num(acc.as_number() - rhs.as_number()),
            };
        }
        Ok(acc)
    }

    /// `unary (('*' | '/' | '%') unary)*`
    fn term(&mut self) -> Result<Value, Error> {
        let mut acc = self.unary()?;
        while let Some(op) = self.peek_op(&['*', '/', '%'])? {
            self.next()?;
            let rhs = self.unary()?.as_number();
            let lhs = acc.as_number();
            acc = Value::Num(match op {
                '*' => lhs * rhs,
                _ if rhs == 0.0 => 0.0,
                '/' => lhs / rhs,
                _ => lhs % rhs,
            });
        }
        Ok(acc)
    }

    /// `'-' unary | primary`
    fn unary(&mut self) -> Result<Value, Error> {
        if self.eat('-')? {
            let v = self.nested(Self::unary)?;
            return Ok(Value::Num(-v.as_number()));
        }
        self.primary()
    }

    /// Literal, parenthesized expression or call.
    fn primary(&mut self) -> Result<Value, Error> {
        match self.next()? {
            Token::Float(v) => Ok(Value::Num(v)),
            Token::String(s) => Ok(Value::Str(s)),
            Token::Char('(') => {
                let v = self.nested(Self::expr)?;
                if !self.eat(')')? {
                    return Err(self.syntax("missing ')'"));
                }
                Ok(v)
            }
            Token::Identifier(name) => {
                let args = if self.eat('(')? {
                    self.nested(Self::arguments)?
                } else {
                    Vec::new()
                };
                self.call(&name, args)
            }
            Token::Eof => Err(self.syntax("unexpected end of expression")),
            other => Err(self.syntax(format!("unexpected {}", other))),
        }
    }

    /// Argument list after `(`, through the closing `)`.
    fn arguments(&mut self) -> Result<Vec<Option<Value>>, Error> {
        let mut args = Vec::new();
        if self.eat(')')? {
            return Ok(args);
        }
        loop {
            args.push(Some(self.expr()?));
            if self.eat(',')? {
                continue;
            }
            if self.eat(')')? {
                return Ok(args);
            }
            return Err(self.syntax("expected ',' or ')' in argument list"));
        }
    }

    /// Dispatch a call, consulting the cache for deterministic functions.
    fn call(&mut self, name: &str, args: Vec<Option<Value>>) -> Result<Value, Error> {
        let Some(entry) = self.registry.get(name) else {
            return Err(Error::UnknownFunction {
                name: name.to_string(),
            });
        };
        let flags = entry.flags();

        let key = flags.deterministic.then(|| CallCache::key(name, &args));
        if let (Some(cache), Some(key)) = (self.cache.as_deref_mut(), key.as_ref())
            && let Some(hit) = cache.entries.get(key)
        {
            cache.hits += 1;
            return Ok(hit.clone());
        }

        let value = match self.registry.call(name, &args, self.ctx) {
            Ok(v) => v,
            Err(e @ Error::UnknownFunction { .. }) => return Err(e),
            Err(e) => {
                warn!(function = name, error = %e, "call failed, using neutral value");
                Value::neutral(flags.numeric)
            }
        };
        if let (Some(cache), Some(key)) = (self.cache.as_deref_mut(), key) {
            cache.insert(key, value.clone());
        }
        Ok(value)
    }
}

/// `+`: numeric sum, or concatenation when either side is a string.
fn add(lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => Value::Num(a + b),
        (lhs, rhs) => Value::Str(lhs.render() + &rhs.render()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::Host;

    struct NoHost;

    impl Host for NoHost {
        fn active_window(&self) -> Option<String> {
            Some("editor".into())
        }

        fn resolve_file(&self, _name: &str) -> Option<PathBuf> {
            None
        }
    }

    fn eval(expr: &str) -> Result<Value, Error> {
        let registry = FunctionRegistry::with_builtins();
        Evaluator::new(&registry).evaluate(expr, &CallContext::new(&NoHost))
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::Num(7.0));
        assert_eq!(eval("(1 + 2) * 3").unwrap(), Value::Num(9.0));
        assert_eq!(eval("-4 + 10 % 4").unwrap(), Value::Num(-2.0));
        assert_eq!(eval("7 / 0").unwrap(), Value::Num(0.0));
        assert_eq!(eval("7 % 0").unwrap(), Value::Num(0.0));
        assert_eq!(eval("\"10\" * 2").unwrap(), Value::Num(20.0));
    }

    #[test]
    fn plus_concatenates_strings() {
        assert_eq!(eval(r#""a" + "b""#).unwrap(), Value::from("ab"));
        assert_eq!(eval(r#""n=" + 1.5"#).unwrap(), Value::from("n=1.5"));
        assert_eq!(eval(r#"upper("x") + 2"#).unwrap(), Value::from("X2"));
    }

    #[test]
    fn calls_reach_builtins() {
        assert_eq!(eval(r#"mid("hello", 1, 3)"#).unwrap(), Value::from("ell"));
        assert_eq!(eval("min(3, 7)").unwrap(), Value::Num(3.0));
        assert_eq!(eval("max(3, 7)").unwrap(), Value::Num(7.0));
        assert_eq!(eval(r#"str(val("2.5") * 2, 1)"#).unwrap(), Value::from("5.0"));
        assert_eq!(eval("ActiveWin").unwrap(), Value::from("editor"));
        assert_eq!(eval("ActiveWin()").unwrap(), Value::from("editor"));
    }

    #[test]
    fn failed_calls_degrade_to_neutral() {
        assert_eq!(eval("min(3)").unwrap(), Value::Num(0.0));
        assert_eq!(eval("max()").unwrap(), Value::Num(0.0));
        assert_eq!(eval(r#"mid("hello", "1", 3)"#).unwrap(), Value::from(""));
        assert_eq!(eval(r#"upper("a", "ignored")"#).unwrap(), Value::from("A"));
    }

    #[test]
    fn unknown_function_is_an_error() {
        assert_eq!(
            eval("nosuch(1)").unwrap_err(),
            Error::UnknownFunction {
                name: "nosuch".into()
            }
        );
        assert!(matches!(
            eval("1 + Mid(\"a\", 0, 0)").unwrap_err(),
            Error::UnknownFunction { .. }
        ));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(eval("1 +").unwrap_err(), Error::Syntax { .. }));
        assert!(matches!(eval("(1").unwrap_err(), Error::Syntax { .. }));
        assert!(matches!(eval("1 2").unwrap_err(), Error::Syntax { .. }));
        assert!(matches!(eval("min(1 2)").unwrap_err(), Error::Syntax { .. }));
        assert!(matches!(eval("\"open").unwrap_err(), Error::Syntax { .. }));
    }

    #[test]
    fn nesting_is_bounded() {
        assert_eq!(eval("--3").unwrap(), Value::Num(3.0));
        let within = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(eval(&within).unwrap(), Value::Num(1.0));

        for deep in [
            format!("{}1", "-".repeat(200_000)),
            format!("{}1", "(".repeat(200_000)),
            format!("{}1", "upper(".repeat(200_000)),
        ] {
            match eval(&deep).unwrap_err() {
                Error::Syntax { message, .. } => {
                    assert_eq!(message, format!("nesting deeper than {MAX_NESTING} levels"));
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn cache_memoizes_deterministic_calls() {
        let registry = FunctionRegistry::with_builtins();
        let ctx = CallContext::new(&NoHost);
        let mut ev = Evaluator::new(&registry).with_cache();

        ev.evaluate(r#"upper("a") + upper("a")"#, &ctx).unwrap();
        let cache = ev.cache().unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);

        // Context-dependent functions are never cached.
        ev.evaluate("ActiveWin()", &ctx).unwrap();
        assert_eq!(ev.cache().unwrap().len(), 1);
    }

    #[test]
    fn cache_stays_bounded_with_changing_arguments() {
        let registry = FunctionRegistry::with_builtins();
        let ctx = CallContext::new(&NoHost);
        let mut ev = Evaluator::new(&registry).with_call_cache(CallCache::with_capacity(8));

        for tick in 0..100 {
            let expr = format!("pad(str({tick}), 3)");
            assert_eq!(ev.render(&expr, &ctx).unwrap(), format!("{tick:>3}"));
            assert!(ev.cache().unwrap().len() <= 8);
        }

        // A repeated call is still served from the cache.
        let hits = ev.cache().unwrap().hits();
        ev.render("pad(str(99), 3)", &ctx).unwrap();
        assert_eq!(ev.cache().unwrap().hits(), hits + 2);
    }
}
