//! Configuration language for ribbon status bars.
//!
//! This crate turns configuration text into a [`Document`]:
//! - [`scanner`]: tokenizer with one-token lookahead
//! - [`grammar`]: table-driven directive rules ([`grammar::parse_sequence`])
//! - [`value`]: value expressions with macro substitution
//! - [`directive`]: typed assignments, section ends and `define`
//! - [`document`]: the block grammar built from the pieces above

use std::path::{Path, PathBuf};

pub mod directive;
pub mod document;
mod error;
pub mod grammar;
mod keyword;
mod loader;
mod macros;
pub mod scanner;
pub mod value;

#[cfg(test)]
mod test_document;

pub use document::{Align, Block, BlockKind, Loc, MAX_BLOCK_DEPTH};
pub use error::Error;
pub use keyword::Keyword;
pub use loader::{Document, load_from_path, load_from_str, load_with_macros};
pub use macros::MacroTable;
pub use scanner::{Scanner, Token};

/// Name of the per-user configuration directory.
pub const APP_DIR: &str = "ribbon";

/// Directory holding user configuration (`$XDG_CONFIG_HOME/ribbon`).
pub fn config_home() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Determine the preferred user config path (`$XDG_CONFIG_HOME/ribbon/config`).
pub fn default_config_path() -> PathBuf {
    config_home().unwrap_or_default().join("config")
}

/// Resolve the effective config path using the default policy.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `$XDG_CONFIG_HOME/ribbon/config` when it exists.
/// 3) Else return a clear "no config found" error.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let preferred = default_config_path();
    if preferred.exists() {
        return Ok(preferred);
    }

    Err(Error::Read {
        path: Some(preferred),
        message: "No config found. Create $XDG_CONFIG_HOME/ribbon/config or pass --config"
            .to_string(),
    })
}
