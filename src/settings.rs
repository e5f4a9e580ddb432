use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::combine::executor::DEFAULT_FAN_OUT_WARN_FACTOR;
use crate::data::filter::DEFAULT_CATEGORICAL_MAX_DISTINCT;

/// Tunables for the shell. Every field is optional in the JSON file.
///
/// ```json
/// { "categorical_max_distinct": 20, "preview_rows": 20 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Columns with fewer distinct values than this get a pick-list filter.
    pub categorical_max_distinct: usize,
    /// Rows shown when previewing a table.
    pub preview_rows: usize,
    /// Warn when a join step outgrows its larger input by this factor; 0
    /// never warns.
    pub fan_out_warn_factor: usize,
    /// Columns kept per table when a combine names none. `None` keeps all.
    pub default_projection_width: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            categorical_max_distinct: DEFAULT_CATEGORICAL_MAX_DISTINCT,
            preview_rows: 20,
            fan_out_warn_factor: DEFAULT_FAN_OUT_WARN_FACTOR,
            default_projection_width: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    /// Settings from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetmix.json");
        std::fs::write(&path, r#"{ "preview_rows": 5, "default_projection_width": 5 }"#).unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.preview_rows, 5);
        assert_eq!(s.default_projection_width, Some(5));
        assert_eq!(s.categorical_max_distinct, 20);
    }

    #[test]
    fn test_missing_path_means_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
        assert!(Settings::load(Path::new("/definitely/not/here.json")).is_err());
    }
}
