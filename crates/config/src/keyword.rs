//! Directive keywords recognised by the configuration scanner.

use std::fmt;

use serde::Serialize;

/// A reserved directive word.
///
/// Keywords are lexed as their own token kind rather than as identifiers, which
/// is what lets a value expression stop at the start of the next directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    /// `define NAME = value`
    Define,
    /// Top-level layout block.
    Layout,
    /// Text label widget block.
    Label,
    /// Clickable button widget block.
    Button,
    /// Progress/scale widget block.
    Scale,
    /// Image widget block.
    Image,
    /// Grid container block.
    Grid,
    /// `value = expr`
    Value,
    /// `tooltip = expr`
    Tooltip,
    /// `style = "name"`
    Style,
    /// `id = "name"`
    Id,
    /// `interval = ms`
    Interval,
    /// `disable = bool`
    Disable,
    /// `align = left|right|center|fill`
    Align,
    /// `loc(x, y[, w[, h]])`
    Loc,
}

/// Lookup table used by the scanner. Matching is ASCII case-insensitive.
const KEYWORDS: &[(&str, Keyword)] = &[
    ("define", Keyword::Define),
    ("layout", Keyword::Layout),
    ("label", Keyword::Label),
    ("button", Keyword::Button),
    ("scale", Keyword::Scale),
    ("image", Keyword::Image),
    ("grid", Keyword::Grid),
    ("value", Keyword::Value),
    ("tooltip", Keyword::Tooltip),
    ("style", Keyword::Style),
    ("id", Keyword::Id),
    ("interval", Keyword::Interval),
    ("disable", Keyword::Disable),
    ("align", Keyword::Align),
    ("loc", Keyword::Loc),
];

impl Keyword {
    /// Resolve an identifier to a keyword, ignoring ASCII case.
    pub fn lookup(ident: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(ident))
            .map(|(_, kw)| *kw)
    }

    /// Canonical lower-case spelling.
    pub fn name(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }

    /// True for keywords that open a widget block.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Layout | Self::Label | Self::Button | Self::Scale | Self::Image | Self::Grid
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
