//! Parse and load user configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::info;

use crate::{Block, Error, MacroTable, Scanner, document::parse_document};

/// A fully parsed configuration file.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Top-level blocks in declaration order.
    pub blocks: Vec<Block>,
    /// Macros defined while parsing. Read-only once loading finishes.
    pub macros: MacroTable,
    /// Directory of the source file, used to resolve relative file reads.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

impl Document {
    /// Every block in the document, depth first.
    pub fn all_blocks(&self) -> Vec<&Block> {
        self.blocks.iter().flat_map(Block::walk).collect()
    }
}

/// Load a configuration file from `path`.
pub fn load_from_path(path: &Path) -> Result<Document, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    load_from_str(&source, Some(path))
}

/// Load a configuration from an in-memory `source`, starting from no macros.
pub fn load_from_str(source: &str, path: Option<&Path>) -> Result<Document, Error> {
    load_with_macros(source, path, MacroTable::new())
}

/// Load a configuration on top of an existing macro table.
///
/// Macros defined by `source` are added to (and may replace entries of) `macros`.
pub fn load_with_macros(
    source: &str,
    path: Option<&Path>,
    mut macros: MacroTable,
) -> Result<Document, Error> {
    let mut scanner = Scanner::for_config(source, path);
    let blocks = parse_document(&mut scanner, &mut macros)?;
    info!(
        path = ?path,
        blocks = blocks.len(),
        macros = macros.len(),
        "config loaded"
    );
    Ok(Document {
        blocks,
        macros,
        config_dir: path.and_then(Path::parent).map(Path::to_path_buf),
    })
}
