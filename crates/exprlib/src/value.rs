//! Runtime values produced by expressions and function calls.

use std::fmt;

/// A string or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text result.
    Str(String),
    /// Numeric result.
    Num(f64),
}

impl Value {
    /// Neutral result for a failed call: `0` for numeric functions, `""` otherwise.
    pub fn neutral(numeric: bool) -> Self {
        if numeric {
            Self::Num(0.0)
        } else {
            Self::Str(String::new())
        }
    }

    /// True for [`Value::Num`].
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Num(_))
    }

    /// Numeric view: numbers as-is, strings through [`parse_leading_number`].
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Num(v) => *v,
            Self::Str(s) => parse_leading_number(s),
        }
    }

    /// Display text: strings as-is, numbers in shortest round-trip form.
    pub fn render(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Num(v) => format!("{}", v),
        }
    }

    /// String payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Num(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Num(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

/// Parse the numeric prefix of `s` the way C `strtod` does in the "C" locale.
///
/// Leading whitespace is skipped; an optional sign, decimal digits with an
/// optional fraction and exponent, or a `0x` hexadecimal integer are accepted.
/// Anything after the prefix is ignored. Returns `0.0` when there is no prefix.
pub fn parse_leading_number(s: &str) -> f64 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let negative = bytes.first() == Some(&b'-');

    if bytes.get(i) == Some(&b'0')
        && matches!(bytes.get(i + 1), Some(b'x' | b'X'))
        && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
    {
        let start = i + 2;
        let mut end = start;
        while bytes.get(end).is_some_and(u8::is_ascii_hexdigit) {
            end += 1;
        }
        let v = u64::from_str_radix(&t[start..end], 16).map_or(0.0, |v| v as f64);
        return if negative { -v } else { v };
    }

    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;
    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            i = j;
        }
    }
    t[..i].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_number_prefix() {
        assert_eq!(parse_leading_number("42"), 42.0);
        assert_eq!(parse_leading_number("  -3.5kg"), -3.5);
        assert_eq!(parse_leading_number("1e3x"), 1000.0);
        assert_eq!(parse_leading_number("2e"), 2.0);
        assert_eq!(parse_leading_number(".25"), 0.25);
        assert_eq!(parse_leading_number("7."), 7.0);
        assert_eq!(parse_leading_number("0x1F"), 31.0);
        assert_eq!(parse_leading_number("abc"), 0.0);
        assert_eq!(parse_leading_number("-"), 0.0);
        assert_eq!(parse_leading_number("."), 0.0);
        assert_eq!(parse_leading_number(""), 0.0);
    }

    #[test]
    fn render_and_neutral() {
        assert_eq!(Value::Num(3.0).render(), "3");
        assert_eq!(Value::Num(0.5).render(), "0.5");
        assert_eq!(Value::from("x").render(), "x");
        assert_eq!(Value::neutral(true), Value::Num(0.0));
        assert_eq!(Value::neutral(false), Value::Str(String::new()));
        assert_eq!(Value::from("12 apples").as_number(), 12.0);
    }
}
