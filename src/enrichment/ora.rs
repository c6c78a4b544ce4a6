//! Over-Representation Analysis: one-sided Fisher's exact test per gene set, followed by a
//! Benjamini-Hochberg correction over the whole batch.

use std::collections::BTreeSet;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{AnalysisConfig, GENE_UNIVERSE};
use crate::enrichment::EnrichmentRecord;
use crate::enrichment::genesets::{GeneSets, filter_gene_sets};
use crate::error::{DecoPathError, Result};
use crate::testing::inference::discrete::{contingency_table, fisher_exact_test};
use crate::testing::{Alternative, TestResult, correction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OraRecord {
    pub pathway_id: String,
    #[serde(alias = "pval")]
    pub p_value: f64,
    #[serde(alias = "fdr")]
    pub q_value: f64,
}

impl EnrichmentRecord for OraRecord {
    fn pathway_id(&self) -> &str {
        &self.pathway_id
    }

    fn score(&self) -> Option<f64> {
        None
    }

    fn q_value(&self) -> f64 {
        self.q_value
    }
}

/// Run ORA against the reference universe of HGNC symbols.
///
/// Gene sets are kept when `min_size < size <= max_size`; if none survive the run fails
/// with [`DecoPathError::NoGeneSetsPassedFilter`].
pub fn run_ora(
    gene_sets: &GeneSets,
    query_genes: &BTreeSet<String>,
    min_size: usize,
    max_size: usize,
) -> Result<Vec<OraRecord>> {
    run_ora_with_universe(gene_sets, query_genes, min_size, max_size, GENE_UNIVERSE)
}

/// Run ORA with the size bounds and gene universe of `config`.
pub fn run_ora_with_config(
    gene_sets: &GeneSets,
    query_genes: &BTreeSet<String>,
    config: &AnalysisConfig,
) -> Result<Vec<OraRecord>> {
    run_ora_with_universe(
        gene_sets,
        query_genes,
        config.ora_min_size,
        config.ora_max_size,
        config.gene_universe,
    )
}

pub fn run_ora_with_universe(
    gene_sets: &GeneSets,
    query_genes: &BTreeSet<String>,
    min_size: usize,
    max_size: usize,
    universe: u64,
) -> Result<Vec<OraRecord>> {
    let filtered = filter_gene_sets(gene_sets, min_size, max_size)?;
    let records = perform_hypergeometric_test(query_genes, &filtered, universe)?;

    info!(tested = records.len(), "over-representation analysis finished");
    Ok(records)
}

/// 2x2 table for one pathway:
///
/// ```text
/// | query ∩ pathway | query - pathway                 |
/// | pathway - query | universe - |pathway ∪ query|    |
/// ```
pub fn prepare_contingency_table(
    pathway_id: &str,
    query_genes: &BTreeSet<String>,
    pathway_genes: &BTreeSet<String>,
    universe: u64,
) -> Result<Array2<u64>> {
    let overlap = query_genes.intersection(pathway_genes).count() as u64;
    let query_only = query_genes.len() as u64 - overlap;
    let pathway_only = pathway_genes.len() as u64 - overlap;
    let union = overlap + query_only + pathway_only;

    let rest = universe
        .checked_sub(union)
        .ok_or_else(|| DecoPathError::UniverseTooSmall {
            pathway_id: pathway_id.to_string(),
            universe,
            required: union,
        })?;

    Ok(contingency_table(overlap, query_only, pathway_only, rest))
}

/// Test every gene set for over-representation of the query genes.
///
/// The per-pathway tests run in parallel; the FDR correction is applied once, across the
/// complete batch of p-values. Output follows the gene-set order.
pub fn perform_hypergeometric_test(
    query_genes: &BTreeSet<String>,
    gene_sets: &GeneSets,
    universe: u64,
) -> Result<Vec<OraRecord>> {
    if gene_sets.is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<(&String, &BTreeSet<String>)> = gene_sets.iter().collect();

    let tests = entries
        .into_par_iter()
        .map(|(pathway_id, pathway_genes)| -> Result<(String, TestResult<f64>)> {
            let table =
                prepare_contingency_table(pathway_id, query_genes, pathway_genes, universe)?;
            let result = fisher_exact_test(table.view(), Alternative::Greater)?;
            Ok((pathway_id.clone(), result))
        })
        .collect::<Result<Vec<_>>>()?;

    let p_values: Vec<f64> = tests.iter().map(|(_, r)| r.p_value).collect();
    let q_values = correction::benjamini_hochberg_correction(&p_values)?;

    debug!(
        significant = q_values
            .iter()
            .filter(|&&q| q < crate::config::SIGNIFICANCE_VALUE)
            .count(),
        "gene sets below the default significance value"
    );

    Ok(tests
        .into_iter()
        .zip(q_values)
        .map(|((pathway_id, result), q_value)| OraRecord {
            pathway_id,
            p_value: result.p_value,
            q_value,
        })
        .collect())
}
