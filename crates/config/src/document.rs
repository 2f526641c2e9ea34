//! Block tree produced from a configuration file.
//!
//! ```text
//! define Sep = " | "
//!
//! layout "top" {
//!   label "clock" {
//!     value = time("%H:%M") + Sep
//!     interval = 1000
//!     loc(0, 0)
//!   }
//! }
//! ```
//!
//! `value` and `tooltip` are kept as unevaluated expression strings with macros
//! already substituted. Every other property is typed at parse time.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::{
    Error, Keyword, MacroTable, Scanner, Token,
    directive::{
        assign_boolean, assign_number, assign_string, assign_tokens, is_section_end, parse_define,
    },
    grammar::{Expect, Rule, parse_sequence},
    value::assign_value,
};

/// Deepest block nesting accepted in a document.
pub const MAX_BLOCK_DEPTH: usize = 64;

/// Widget block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Top-level container.
    Layout,
    /// Text label.
    Label,
    /// Clickable button.
    Button,
    /// Progress bar.
    Scale,
    /// Icon or picture.
    Image,
    /// Grid container.
    Grid,
}

impl BlockKind {
    /// Block kind opened by `kw`, if any.
    pub fn from_keyword(kw: Keyword) -> Option<Self> {
        Some(match kw {
            Keyword::Layout => Self::Layout,
            Keyword::Label => Self::Label,
            Keyword::Button => Self::Button,
            Keyword::Scale => Self::Scale,
            Keyword::Image => Self::Image,
            Keyword::Grid => Self::Grid,
            _ => return None,
        })
    }

    /// The keyword that opens this block.
    pub fn keyword(self) -> Keyword {
        match self {
            Self::Layout => Keyword::Layout,
            Self::Label => Keyword::Label,
            Self::Button => Keyword::Button,
            Self::Scale => Keyword::Scale,
            Self::Image => Keyword::Image,
            Self::Grid => Keyword::Grid,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword().name())
    }
}

/// Horizontal alignment of a widget inside its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Flush left.
    Left,
    /// Flush right.
    Right,
    /// Centered.
    Center,
    /// Stretched to the cell width.
    Fill,
}

/// Words accepted by `align = ...`.
const ALIGN_KEYS: &[(&str, Align)] = &[
    ("left", Align::Left),
    ("right", Align::Right),
    ("center", Align::Center),
    ("fill", Align::Fill),
];

/// Grid placement from `loc(x, y[, w[, h]])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Loc {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Column span.
    pub w: i32,
    /// Row span.
    pub h: i32,
}

/// One widget block and its properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Block type.
    pub kind: BlockKind,
    /// Optional name given after the keyword: `label "clock" { ... }`.
    pub name: Option<String>,
    /// Widget id used by `widgetid()`.
    pub id: Option<String>,
    /// Unevaluated value expression.
    pub value: Option<String>,
    /// Label split off a `value = "label", expr` assignment.
    pub value_label: Option<String>,
    /// Unevaluated tooltip expression.
    pub tooltip: Option<String>,
    /// Style class name.
    pub style: Option<String>,
    /// Refresh interval in milliseconds.
    pub interval: Option<f64>,
    /// Whether the block is disabled.
    pub disable: bool,
    /// Alignment within the parent.
    pub align: Option<Align>,
    /// Grid placement.
    pub loc: Option<Loc>,
    /// Nested blocks in declaration order.
    pub children: Vec<Block>,
}

impl Block {
    /// An empty block of `kind`.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            name: None,
            id: None,
            value: None,
            value_label: None,
            tooltip: None,
            style: None,
            interval: None,
            disable: false,
            align: None,
            loc: None,
            children: Vec::new(),
        }
    }

    /// Name shown in diagnostics: the block name, its id, or its kind.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| self.kind.to_string())
    }

    /// This block followed by all of its descendants, depth first.
    pub fn walk(&self) -> Vec<&Self> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// Parse top-level items until end of input.
pub fn parse_document(
    scanner: &mut Scanner<'_>,
    macros: &mut MacroTable,
) -> Result<Vec<Block>, Error> {
    let mut blocks = Vec::new();
    loop {
        match scanner.next_token()? {
            Token::Eof => break,
            Token::Keyword(Keyword::Define) => parse_define(scanner, macros)?,
            Token::Keyword(kw) if kw.is_block() => {
                if let Some(kind) = BlockKind::from_keyword(kw) {
                    blocks.push(parse_block(scanner, macros, kind, 1)?);
                }
            }
            Token::Char(';') => {}
            other => {
                return Err(scanner.error(format!("unexpected {} at top level", other)));
            }
        }
    }
    Ok(blocks)
}

/// Body of a block after its keyword: `["name"] { stmt* }`. `depth` counts
/// the enclosing blocks including this one.
fn parse_block(
    scanner: &mut Scanner<'_>,
    macros: &mut MacroTable,
    kind: BlockKind,
    depth: usize,
) -> Result<Block, Error> {
    if depth > MAX_BLOCK_DEPTH {
        return Err(scanner.error(format!(
            "blocks nested deeper than {} levels",
            MAX_BLOCK_DEPTH
        )));
    }
    let mut block = Block::new(kind);
    let missing_brace = format!("missing '{{' after '{}'", kind);
    parse_sequence(
        scanner,
        macros,
        &mut [
            Rule::optional(Expect::String(Some(&mut block.name))),
            Rule::required(Expect::Char('{', None), &missing_brace),
        ],
    )?;
    debug!(kind = %kind, name = ?block.name, "block");

    while !is_section_end(scanner)? {
        let token = scanner.next_token()?;
        match token {
            Token::Keyword(Keyword::Define) => parse_define(scanner, macros)?,
            Token::Keyword(kw) if kw.is_block() => {
                if let Some(child) = BlockKind::from_keyword(kw) {
                    block.children.push(parse_block(scanner, macros, child, depth + 1)?);
                }
            }
            Token::Keyword(Keyword::Value) => {
                let mut label = None;
                let value = assign_value(scanner, macros, "value", Some(&mut label))?;
                block.value = (!value.is_empty()).then_some(value);
                block.value_label = label;
            }
            Token::Keyword(Keyword::Tooltip) => {
                let value = assign_value(scanner, macros, "tooltip", None)?;
                block.tooltip = (!value.is_empty()).then_some(value);
            }
            Token::Keyword(Keyword::Style) => {
                block.style = Some(assign_string(scanner, "style")?);
            }
            Token::Keyword(Keyword::Id) => block.id = Some(assign_string(scanner, "id")?),
            Token::Keyword(Keyword::Interval) => {
                block.interval = Some(assign_number(scanner, "interval")?);
            }
            Token::Keyword(Keyword::Disable) => {
                block.disable = assign_boolean(scanner, "disable")?;
            }
            Token::Keyword(Keyword::Align) => {
                block.align = Some(assign_tokens(
                    scanner,
                    "align",
                    ALIGN_KEYS,
                    "invalid value in align = left|right|center|fill",
                )?);
            }
            Token::Keyword(Keyword::Loc) => block.loc = Some(parse_loc(scanner, macros)?),
            Token::Char(';') => {}
            other => {
                return Err(scanner.error(format!("unexpected {} in {} block", other, kind)));
            }
        }
    }
    Ok(block)
}

/// `(x, y[, w[, h]])` after the `loc` keyword. Spans default to 1.
fn parse_loc(scanner: &mut Scanner<'_>, macros: &MacroTable) -> Result<Loc, Error> {
    let mut loc = Loc {
        x: 0,
        y: 0,
        w: 1,
        h: 1,
    };
    parse_sequence(
        scanner,
        macros,
        &mut [
            Rule::required(Expect::Char('(', None), "missing '(' in loc(x,y[,w,h])"),
            Rule::required(Expect::Int(Some(&mut loc.x)), "missing x in loc(x,y[,w,h])"),
            Rule::required(Expect::Char(',', None), "missing ',' in loc(x,y[,w,h])"),
            Rule::required(Expect::Int(Some(&mut loc.y)), "missing y in loc(x,y[,w,h])"),
            Rule::optional(Expect::Char(',', None)),
            Rule::continuation(Expect::Int(Some(&mut loc.w))),
            Rule::optional(Expect::Char(',', None)),
            Rule::continuation(Expect::Int(Some(&mut loc.h))),
            Rule::required(Expect::Char(')', None), "missing ')' in loc(x,y[,w,h])"),
            Rule::optional(Expect::Char(';', None)),
        ],
    )?;
    Ok(loc)
}
