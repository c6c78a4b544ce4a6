//! Result rows of a Gene Set Enrichment Analysis run.
//!
//! The permutation procedure itself runs outside this crate; only its per-gene-set output is
//! consumed here.

use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GseaRecord {
    #[serde(alias = "Term", alias = "Identifier")]
    pub pathway_id: String,
    /// Normalized enrichment score; its sign gives the direction of regulation
    #[serde(alias = "score")]
    pub nes: f64,
    #[serde(default)]
    pub es: Option<f64>,
    #[serde(alias = "pval")]
    pub p_value: f64,
    #[serde(alias = "fdr")]
    pub q_value: f64,
    #[serde(default)]
    pub geneset_size: Option<usize>,
}

impl GseaRecord {
    pub fn new(pathway_id: impl Into<String>, nes: f64, q_value: f64) -> Self {
        GseaRecord {
            pathway_id: pathway_id.into(),
            nes,
            es: None,
            p_value: q_value,
            q_value,
            geneset_size: None,
        }
    }
}

impl EnrichmentRecord for GseaRecord {
    fn pathway_id(&self) -> &str {
        &self.pathway_id
    }

    fn score(&self) -> Option<f64> {
        Some(self.nes)
    }

    fn q_value(&self) -> f64 {
        self.q_value
    }

    fn geneset_size(&self) -> Option<usize> {
        self.geneset_size
    }
}
