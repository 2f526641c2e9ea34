//! Parameter signatures and function flags.
//!
//! A signature is written as a string of single-letter codes, one per
//! parameter: `S` required string, `N` required number, `s` optional string,
//! `n` optional number. Required parameters come first.

use std::fmt;

use crate::Value;

/// Kind of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `S`
    String,
    /// `N`
    Number,
    /// `s`
    OptString,
    /// `n`
    OptNumber,
}

impl ParamKind {
    /// Decode a signature letter.
    pub fn from_code(c: char) -> Option<Self> {
        Some(match c {
            'S' => Self::String,
            'N' => Self::Number,
            's' => Self::OptString,
            'n' => Self::OptNumber,
            _ => return None,
        })
    }

    /// Signature letter for this kind.
    pub fn code(self) -> char {
        match self {
            Self::String => 'S',
            Self::Number => 'N',
            Self::OptString => 's',
            Self::OptNumber => 'n',
        }
    }

    /// True for `S` and `N`.
    pub fn is_required(self) -> bool {
        matches!(self, Self::String | Self::Number)
    }

    /// True for `N` and `n`.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::OptNumber)
    }

    /// Whether `value` has the kind this parameter takes.
    pub fn accepts(self, value: &Value) -> bool {
        self.is_numeric() == value.is_numeric()
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Number => "number",
            Self::OptString => "optional string",
            Self::OptNumber => "optional number",
        })
    }
}

/// Ordered parameter list of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Parameters in call order.
    params: Vec<ParamKind>,
}

impl Signature {
    /// Parse a code string such as `"SNn"`.
    ///
    /// Fails on unknown letters and on a required parameter following an
    /// optional one.
    pub fn parse(codes: &str) -> Result<Self, String> {
        let mut params = Vec::with_capacity(codes.len());
        let mut seen_optional = false;
        for c in codes.chars() {
            let Some(kind) = ParamKind::from_code(c) else {
                return Err(format!("unknown parameter code '{}'", c));
            };
            if kind.is_required() && seen_optional {
                return Err(format!("required parameter '{}' after an optional one", c));
            }
            seen_optional |= !kind.is_required();
            params.push(kind);
        }
        Ok(Self { params })
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True for a function taking no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of leading required parameters.
    pub fn required(&self) -> usize {
        self.params.iter().filter(|p| p.is_required()).count()
    }

    /// Parameters in order.
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.params {
            write!(f, "{}", p.code())?;
        }
        Ok(())
    }
}

/// Properties of a function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Same arguments always give the same result.
    pub deterministic: bool,
    /// The function returns a number rather than a string.
    pub numeric: bool,
}

impl Flags {
    /// String-valued, depends on ambient state.
    pub const NONE: Self = Self {
        deterministic: false,
        numeric: false,
    };
    /// String-valued and pure.
    pub const DETERMINISTIC: Self = Self {
        deterministic: true,
        numeric: false,
    };
    /// Number-valued, depends on ambient state.
    pub const NUMERIC: Self = Self {
        deterministic: false,
        numeric: true,
    };
    /// Number-valued and pure.
    pub const DETERMINISTIC_NUMERIC: Self = Self {
        deterministic: true,
        numeric: true,
    };
}
