//! Gene-set dictionaries: GMT parsing, size filtering and canonical (super-pathway) sets.

use std::collections::BTreeSet;
use std::io::BufRead;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{DecoPathError, Result};
use crate::mapping::ontology::CanonicalAssignment;

/// Pathway identifier to gene symbols, in file order.
pub type GeneSets = IndexMap<String, BTreeSet<String>>;

/// Parse GMT lines (`id<TAB>description<TAB>gene<TAB>gene...`) into a gene-set dictionary.
///
/// Blank lines are skipped. A later line with an already-seen identifier replaces the earlier
/// one. Empty gene fields are ignored and repeated genes collapse, so sizes count distinct
/// symbols.
pub fn parse_gmt<R: BufRead>(reader: R) -> Result<GeneSets> {
    let mut gene_sets = GeneSets::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| DecoPathError::GmtRead {
            line: line_no + 1,
            source,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let (Some(pathway_id), Some(_description)) = (fields.next(), fields.next()) else {
            return Err(DecoPathError::MalformedGmt {
                line: line_no + 1,
                reason: "expected an identifier and a description".to_string(),
            });
        };

        let genes = fields
            .map(str::trim)
            .filter(|gene| !gene.is_empty())
            .map(str::to_string)
            .collect();
        gene_sets.insert(pathway_id.to_string(), genes);
    }

    Ok(gene_sets)
}

/// Keep the gene sets whose size lies in `(min_size, max_size]`.
///
/// Fails with [`DecoPathError::NoGeneSetsPassedFilter`] when nothing survives.
pub fn filter_gene_sets(gene_sets: &GeneSets, min_size: usize, max_size: usize) -> Result<GeneSets> {
    let filtered: GeneSets = gene_sets
        .iter()
        .filter(|(_, genes)| min_size < genes.len() && genes.len() <= max_size)
        .map(|(id, genes)| (id.clone(), genes.clone()))
        .collect();

    let removed = gene_sets.len() - filtered.len();
    info!(
        removed,
        min_size, max_size, "gene sets were removed by the size filter"
    );

    if filtered.is_empty() {
        warn!(min_size, max_size, "no gene sets passed the filtering condition");
        return Err(DecoPathError::NoGeneSetsPassedFilter { min_size, max_size });
    }

    Ok(filtered)
}

/// Gene sets eligible for GSEA under the size bounds of `config`.
pub fn gsea_gene_sets(gene_sets: &GeneSets, config: &AnalysisConfig) -> Result<GeneSets> {
    filter_gene_sets(gene_sets, config.gsea_min_size, config.gsea_max_size)
}

pub fn gene_set_sizes(gene_sets: &GeneSets) -> IndexMap<String, usize> {
    gene_sets
        .iter()
        .map(|(id, genes)| (id.clone(), genes.len()))
        .collect()
}

/// Gene sets of canonical pathways: the union of the gene sets of every pathway assigned to
/// the canonical id. Members without a gene set contribute nothing.
pub fn canonical_gene_sets(
    assignments: &IndexMap<String, CanonicalAssignment>,
    gene_sets: &GeneSets,
) -> GeneSets {
    let mut canonical = GeneSets::new();

    for (pathway_id, assignment) in assignments {
        match gene_sets.get(pathway_id) {
            Some(genes) => canonical
                .entry(assignment.decopath_id.clone())
                .or_default()
                .extend(genes.iter().cloned()),
            None => debug!(%pathway_id, "no gene set for canonical member"),
        }
    }

    canonical
}
