use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::io::reader::ReadRequest;

/// Settings shared by the command-line tools.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Dataset to read; the first dataset of the root group when unset.
    pub dataset: Option<String>,
    /// Dimension to slice, or negative for the whole dataset.
    pub slice_dim: i64,
    pub slice_index: i64,
    /// Reverse the dimension order after reading.
    pub transpose: bool,
    /// Add to an existing output container instead of recreating it.
    pub append: bool,
    pub export: TextExportConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            slice_dim: -1,
            slice_index: 0,
            transpose: false,
            append: false,
            export: TextExportConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn read_request(&self) -> ReadRequest {
        ReadRequest {
            dataset: self.dataset.clone(),
            slice_dim: self.slice_dim,
            slice_index: self.slice_index,
        }
    }
}

/// Layout of delimited-text output.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TextExportConfig {
    pub delimiter: char,
    pub header: bool,
    /// Digits after the decimal point; shortest exact form when unset.
    pub precision: Option<usize>,
}

impl Default for TextExportConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            header: false,
            precision: None,
        }
    }
}

/// Load a configuration from a JSON file. Missing fields take their defaults.
pub fn load_store_config<P: AsRef<Path>>(path: P) -> Result<StoreConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: StoreConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_read_the_whole_first_dataset() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.read_request(), ReadRequest::default());
        assert!(!cfg.transpose);
        assert_eq!(cfg.export.delimiter, '\t');
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: StoreConfig =
            serde_json::from_str(r#"{"dataset": "eps", "slice_dim": 2, "export": {"delimiter": ","}}"#)
                .unwrap();
        assert_eq!(cfg.dataset.as_deref(), Some("eps"));
        assert_eq!(cfg.slice_dim, 2);
        assert_eq!(cfg.slice_index, 0);
        assert_eq!(cfg.export.delimiter, ',');
        assert!(!cfg.export.header);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_store_config("/nonexistent/ndstore.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
