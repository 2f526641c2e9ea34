//! Function registry and argument-validating dispatch.

use std::{collections::HashMap, sync::OnceLock};

use tracing::{debug, trace, warn};

use crate::{
    CallContext, Error, Value,
    builtins::HANDLERS,
    signature::{Flags, Signature},
    value::parse_leading_number,
};

/// Implementation of a function. Receives one slot per declared parameter.
pub type ExprFn = fn(&Params<'_>, &CallContext<'_>) -> Value;

/// Static description of a function, as listed in a handler table.
#[derive(Debug, Clone, Copy)]
pub struct Handler {
    /// Name used in expressions.
    pub name: &'static str,
    /// Parameter codes, see [`Signature::parse`].
    pub parameters: &'static str,
    /// Function properties.
    pub flags: Flags,
    /// Implementation.
    pub function: ExprFn,
}

/// Validated arguments, one slot per declared parameter.
///
/// Absent optional parameters are `None`. Required slots are always filled
/// when the call goes through [`FunctionRegistry::call`].
#[derive(Debug, Clone, Default)]
pub struct Params<'a> {
    /// Argument slots in declaration order.
    slots: Vec<Option<&'a Value>>,
}

impl<'a> Params<'a> {
    /// Wrap pre-validated slots.
    pub fn new(slots: Vec<Option<&'a Value>>) -> Self {
        Self { slots }
    }

    /// String in slot `i`; `None` when absent or not a string.
    pub fn str(&self, i: usize) -> Option<&'a str> {
        self.slots.get(i).copied().flatten().and_then(Value::as_str)
    }

    /// Number in slot `i`; `None` when absent or not a number.
    pub fn num(&self, i: usize) -> Option<f64> {
        match self.slots.get(i).copied().flatten() {
            Some(Value::Num(v)) => Some(*v),
            _ => None,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the function takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A registered function.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Name used in expressions.
    name: String,
    /// Parsed parameter list.
    signature: Signature,
    /// Function properties.
    flags: Flags,
    /// Implementation.
    function: ExprFn,
}

impl Entry {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter list.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Function properties.
    pub fn flags(&self) -> Flags {
        self.flags
    }
}

/// Name to function mapping.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    /// Entries keyed by exact name.
    entries: HashMap<String, Entry>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in library.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_table(HANDLERS, "builtins");
        registry
    }

    /// Register one handler. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, handler: &Handler) -> Result<(), Error> {
        let signature =
            Signature::parse(handler.parameters).map_err(|reason| Error::InvalidSignature {
                name: handler.name.to_string(),
                signature: handler.parameters.to_string(),
                reason,
            })?;
        let entry = Entry {
            name: handler.name.to_string(),
            signature,
            flags: handler.flags,
            function: handler.function,
        };
        if self.entries.insert(handler.name.to_string(), entry).is_some() {
            debug!(function = handler.name, "function replaced");
        }
        Ok(())
    }

    /// Register every handler in `table`, skipping malformed entries with a
    /// warning. Returns the number registered.
    pub fn register_table(&mut self, table: &[Handler], source: &str) -> usize {
        let mut count = 0;
        for handler in table {
            match self.register(handler) {
                Ok(()) => count += 1,
                Err(e) => warn!(source, error = %e, "skipping function"),
            }
        }
        debug!(source, count, "registered functions");
        count
    }

    /// Look up a function by exact name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// True when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate `args` against the signature of `name` and run it.
    ///
    /// `args[i]` is `None` when the caller did not supply argument `i`. Extra
    /// arguments beyond the signature are ignored. A result whose kind does
    /// not match the function's numeric flag is converted to the declared kind.
    pub fn call(
        &self,
        name: &str,
        args: &[Option<Value>],
        ctx: &CallContext<'_>,
    ) -> Result<Value, Error> {
        let entry = self.get(name).ok_or_else(|| Error::UnknownFunction {
            name: name.to_string(),
        })?;

        let mut slots = Vec::with_capacity(entry.signature.len());
        for (i, kind) in entry.signature.params().iter().enumerate() {
            match args.get(i).and_then(Option::as_ref) {
                None if kind.is_required() => {
                    return Err(Error::MissingArgument {
                        function: entry.name.clone(),
                        position: i + 1,
                        expected: *kind,
                    });
                }
                None => slots.push(None),
                Some(value) if kind.accepts(value) => slots.push(Some(value)),
                Some(_) => {
                    return Err(Error::ArgumentType {
                        function: entry.name.clone(),
                        position: i + 1,
                        expected: *kind,
                    });
                }
            }
        }
        if args.len() > entry.signature.len() {
            trace!(
                function = name,
                extra = args.len() - entry.signature.len(),
                "ignoring extra arguments"
            );
        }

        let result = (entry.function)(&Params::new(slots), ctx);
        trace!(function = name, result = %result, "call");
        Ok(match (entry.flags.numeric, result) {
            (true, Value::Str(s)) => {
                warn!(function = name, "string result from numeric function");
                Value::Num(parse_leading_number(&s))
            }
            (false, Value::Num(v)) => {
                warn!(function = name, "numeric result from string function");
                Value::Str(Value::Num(v).render())
            }
            (_, v) => v,
        })
    }
}

/// Process-wide registry.
static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// The shared registry, populated with the built-ins on first use unless
/// [`install`] ran earlier.
pub fn registry() -> &'static FunctionRegistry {
    REGISTRY.get_or_init(FunctionRegistry::with_builtins)
}

/// Install `registry` as the shared registry. Fails, returning it, when the
/// shared registry is already initialized.
pub fn install(registry: FunctionRegistry) -> Result<(), FunctionRegistry> {
    REGISTRY.set(registry)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{Host, signature::ParamKind};

    struct NoHost;

    impl Host for NoHost {
        fn resolve_file(&self, _name: &str) -> Option<PathBuf> {
            None
        }
    }

    fn describe(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
        Value::Str(format!("{:?}/{:?}/{:?}", p.str(0), p.num(1), p.num(2)))
    }

    fn sloppy(_p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
        Value::from("7")
    }

    const TABLE: &[Handler] = &[
        Handler {
            name: "describe",
            parameters: "SNn",
            flags: Flags::DETERMINISTIC,
            function: describe,
        },
        Handler {
            name: "sloppy",
            parameters: "",
            flags: Flags::NUMERIC,
            function: sloppy,
        },
        Handler {
            name: "broken",
            parameters: "nN",
            flags: Flags::NONE,
            function: sloppy,
        },
    ];

    fn table_registry() -> FunctionRegistry {
        let mut r = FunctionRegistry::new();
        assert_eq!(r.register_table(TABLE, "test"), 2);
        r
    }

    #[test]
    fn call_fills_optional_slots() {
        let r = table_registry();
        let ctx = CallContext::new(&NoHost);
        let args = [Some(Value::from("a")), Some(Value::Num(2.0))];
        assert_eq!(
            r.call("describe", &args, &ctx).unwrap(),
            Value::from("Some(\"a\")/Some(2.0)/None")
        );

        let extra = [
            Some(Value::from("a")),
            Some(Value::Num(2.0)),
            Some(Value::Num(3.0)),
            Some(Value::from("ignored")),
        ];
        assert_eq!(
            r.call("describe", &extra, &ctx).unwrap(),
            Value::from("Some(\"a\")/Some(2.0)/Some(3.0)")
        );
    }

    #[test]
    fn call_reports_argument_errors() {
        let r = table_registry();
        let ctx = CallContext::new(&NoHost);

        let err = r.call("describe", &[Some(Value::from("a"))], &ctx).unwrap_err();
        assert_eq!(
            err,
            Error::MissingArgument {
                function: "describe".into(),
                position: 2,
                expected: ParamKind::Number,
            }
        );

        let err = r
            .call("describe", &[Some(Value::Num(1.0)), Some(Value::Num(2.0))], &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::ArgumentType { position: 1, .. }));

        let err = r.call("nope", &[], &ctx).unwrap_err();
        assert_eq!(err, Error::UnknownFunction { name: "nope".into() });
    }

    #[test]
    fn result_kind_follows_flags() {
        let r = table_registry();
        let ctx = CallContext::new(&NoHost);
        assert_eq!(r.call("sloppy", &[], &ctx).unwrap(), Value::Num(7.0));
    }

    #[test]
    fn invalid_signature_is_rejected() {
        let mut r = FunctionRegistry::new();
        let err = r.register(&TABLE[2]).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature { .. }));
        assert!(!r.contains("broken"));
    }

    #[test]
    fn later_registration_wins() {
        let mut r = table_registry();
        r.register(&Handler {
            name: "describe",
            parameters: "",
            flags: Flags::NONE,
            function: sloppy,
        })
        .unwrap();
        assert!(r.get("describe").unwrap().signature().is_empty());
        assert_eq!(r.names(), vec!["describe", "sloppy"]);
    }

    #[test]
    fn shared_registry_has_builtins() {
        assert!(registry().contains("mid"));
        assert!(registry().contains("ActiveWin"));
        assert!(!registry().contains("activewin"));
    }
}
