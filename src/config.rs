//! Run parameters shared by the enrichment, consensus and hierarchy modules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DecoPathError, Result};

/// Total number of HGNC gene symbols, the reference universe for ORA.
pub const GENE_UNIVERSE: u64 = 42345;

/// Sentinel id of the hierarchy root.
pub const HIERARCHY_ROOT: &str = "SuperPathway";

pub const SIGNIFICANCE_VALUE: f64 = 0.05;

pub const DEFAULT_MIN_ORA: usize = 10;
pub const DEFAULT_MAX_ORA: usize = 1000;
pub const DEFAULT_MIN_GSEA: usize = 10;
pub const DEFAULT_MAX_GSEA: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// q-value cut-off used by the consensus checks and the hierarchy colouring
    pub significance_value: f64,
    pub ora_min_size: usize,
    pub ora_max_size: usize,
    pub gsea_min_size: usize,
    pub gsea_max_size: usize,
    pub gene_universe: u64,
    pub hierarchy_root: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            significance_value: SIGNIFICANCE_VALUE,
            ora_min_size: DEFAULT_MIN_ORA,
            ora_max_size: DEFAULT_MAX_ORA,
            gsea_min_size: DEFAULT_MIN_GSEA,
            gsea_max_size: DEFAULT_MAX_GSEA,
            gene_universe: GENE_UNIVERSE,
            hierarchy_root: HIERARCHY_ROOT.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig =
            serde_json::from_str(json).map_err(|err| DecoPathError::InvalidConfig {
                reason: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|err| DecoPathError::InvalidConfig {
                reason: format!("failed to read {}: {}", path.display(), err),
            })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        crate::error::check_threshold(self.significance_value)?;

        for (min_size, max_size) in [
            (self.ora_min_size, self.ora_max_size),
            (self.gsea_min_size, self.gsea_max_size),
        ] {
            if min_size >= max_size {
                return Err(DecoPathError::InvalidSizeBounds { min_size, max_size });
            }
        }

        if self.gene_universe == 0 {
            return Err(DecoPathError::InvalidConfig {
                reason: "gene_universe must be positive".to_string(),
            });
        }

        if self.hierarchy_root.is_empty() {
            return Err(DecoPathError::InvalidConfig {
                reason: "hierarchy_root must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gene_universe, 42345);
        assert_eq!(config.hierarchy_root, "SuperPathway");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalysisConfig::from_json_str(r#"{"significance_value": 0.01}"#).unwrap();
        assert_eq!(config.significance_value, 0.01);
        assert_eq!(config.ora_max_size, DEFAULT_MAX_ORA);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = AnalysisConfig::from_json_str(r#"{"significance_value": 1.5}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err =
            AnalysisConfig::from_json_str(r#"{"ora_min_size": 50, "ora_max_size": 10}"#).unwrap_err();
        assert!(matches!(err, DecoPathError::InvalidSizeBounds { .. }));

        let err = AnalysisConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, DecoPathError::InvalidConfig { .. }));
    }
}
