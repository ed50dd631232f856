use crate::commands::{
    CommandContext, DEFAULT_EQUATION_SEED, DEFAULT_LINK_PLACEHOLDER, DEFAULT_TABLE_COLUMNS,
    DEFAULT_TABLE_ROWS,
};
use crate::urls::looks_like_url;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Editor settings, persisted as camelCase JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Rows of a new table, header row included
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,

    #[serde(default = "default_table_columns")]
    pub table_columns: usize,

    /// Text seeded into a new equation
    #[serde(default = "default_equation_seed")]
    pub equation_seed: String,

    /// Label of a link inserted at a collapsed caret
    #[serde(default = "default_link_placeholder")]
    pub link_placeholder: String,

    /// Undo history depth (0 = unlimited)
    #[serde(default = "default_undo_levels")]
    pub undo_levels: usize,
}

fn default_table_rows() -> usize {
    DEFAULT_TABLE_ROWS
}

fn default_table_columns() -> usize {
    DEFAULT_TABLE_COLUMNS
}

fn default_equation_seed() -> String {
    DEFAULT_EQUATION_SEED.to_string()
}

fn default_link_placeholder() -> String {
    DEFAULT_LINK_PLACEHOLDER.to_string()
}

fn default_undo_levels() -> usize {
    100
}

impl EditorConfig {
    /// Load from a JSON file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, crate::EditorError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Command context using the default URL predicate
    pub fn command_context(&self) -> CommandContext {
        CommandContext {
            looks_like_url,
            equation_seed: self.equation_seed.clone(),
            link_placeholder: self.link_placeholder.clone(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            table_rows: default_table_rows(),
            table_columns: default_table_columns(),
            equation_seed: default_equation_seed(),
            link_placeholder: default_link_placeholder(),
            undo_levels: default_undo_levels(),
        }
    }
}

impl From<&EditorConfig> for CommandContext {
    fn from(config: &EditorConfig) -> Self {
        config.command_context()
    }
}
