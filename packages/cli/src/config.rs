use atbd_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "atbd.config.json";

/// ATBD CLI configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Settings handed to every editor session
    #[serde(default)]
    pub editor: EditorConfig,

    /// Field names that may not be saved blank
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required_fields.iter().any(|name| name == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "editor": { "tableRows": 4, "linkPlaceholder": "source" },
            "requiredFields": ["introduction", "scientific_theory"]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.editor.table_rows, 4);
        assert_eq!(config.editor.table_columns, 2);
        assert_eq!(config.editor.link_placeholder, "source");
        assert!(config.is_required("scientific_theory"));
        assert!(!config.is_required("references"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor, EditorConfig::default());
        assert!(config.required_fields.is_empty());
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();

        assert!(config.required_fields.is_empty());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "requiredFields": ["introduction"] }"#,
        )
        .unwrap();

        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config.required_fields, vec!["introduction"]);
    }
}
