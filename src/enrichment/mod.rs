//! Gene set enrichment analysis methods.
//!
//! This module provides the enrichment side of a DecoPath run: parsing and filtering gene-set
//! dictionaries, running Over-Representation Analysis, and the shape of the per-database
//! result rows that the consensus engine and hierarchy annotator consume.
//!
//! ## Available Methods
//!
//! - **ORA** (`ora`): Over-Representation Analysis using a one-sided Fisher's exact test
//! - **GSEA** (`gsea`): result rows only; the ranking/permutation procedure is external
//!
//! ## Quick Example
//!
//! ```rust
//! use decopath_consensus::enrichment::{genesets::parse_gmt, ora::run_ora_with_universe};
//!
//! let gmt = "p1\tdesc\tA\tB\tD\np2\tdesc\tA\tC\tE\n";
//! let gene_sets = parse_gmt(gmt.as_bytes()).unwrap();
//! let query = ["A", "B", "C"].iter().map(|g| g.to_string()).collect();
//! let records = run_ora_with_universe(&gene_sets, &query, 0, 10, 1000).unwrap();
//! assert_eq!(records.len(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod genesets;
pub mod gsea;
pub mod ora;

pub use genesets::GeneSets;
pub use gsea::GseaRecord;
pub use ora::{OraRecord, run_ora, run_ora_with_config};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentMethod {
    Ora,
    Gsea,
}

impl FromStr for EnrichmentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ora" => Ok(EnrichmentMethod::Ora),
            "gsea" | "prerank" => Ok(EnrichmentMethod::Gsea),
            other => Err(format!("unknown enrichment method {}", other)),
        }
    }
}

impl fmt::Display for EnrichmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentMethod::Ora => f.write_str("ora"),
            EnrichmentMethod::Gsea => f.write_str("gsea"),
        }
    }
}

/// One database's enrichment call for one pathway.
///
/// The database is not stored; it is inferred from the identifier prefix.
pub trait EnrichmentRecord {
    fn pathway_id(&self) -> &str;

    /// Signed effect size, `None` for methods that only produce p-values.
    fn score(&self) -> Option<f64>;

    fn q_value(&self) -> f64;

    fn geneset_size(&self) -> Option<usize> {
        None
    }
}
