//! Gene-set overlaps between a pathway and its equivalents, laid out for Venn diagrams.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::enrichment::GeneSets;
use crate::mapping::{Database, EquivalenceStore};

/// A single set (one index in `sets`) or the intersection of two sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VennSet {
    pub sets: Vec<usize>,
    pub size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathway_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersection: Option<String>,
    pub gene_set: Vec<String>,
}

/// Gene sets of `identifier` (a primary or a canonical id) and of its equivalent pathways in
/// `databases`, followed by every pairwise intersection.
///
/// Sets come in gene-set dictionary order. Canonical pathways never appear as sets of their
/// own. An identifier without mapping records yields no sets.
pub fn gene_set_overlaps(
    identifier: &str,
    store: &EquivalenceStore,
    gene_sets: &GeneSets,
    databases: &[Database],
) -> Vec<VennSet> {
    let members = if Database::from_identifier(identifier).is_decopath() {
        store.canonical_members(identifier).collect::<Vec<_>>()
    } else {
        store.find(identifier).collect()
    };
    if members.is_empty() {
        debug!(%identifier, "no equivalent pathways to overlap");
        return Vec::new();
    }

    let mut equivalent: IndexSet<&str> = IndexSet::new();
    let mut names: HashMap<&str, &str> = HashMap::new();
    for member in &members {
        if member.pathway_id == identifier {
            equivalent.insert(&member.pathway_id);
        }
        names.insert(&member.pathway_id, &member.pathway_name);

        for other in store.equivalents(&member.key()) {
            if !databases.contains(&other.database) {
                continue;
            }
            equivalent.insert(&other.pathway_id);
            names.insert(&other.pathway_id, &other.pathway_name);
        }
    }

    let selected: Vec<(&String, _)> = gene_sets
        .iter()
        .filter(|(pathway_id, _)| {
            equivalent.contains(pathway_id.as_str())
                && !Database::from_identifier(pathway_id).is_decopath()
        })
        .collect();

    let mut venn: Vec<VennSet> = selected
        .iter()
        .enumerate()
        .map(|(index, (pathway_id, genes))| {
            let database = Database::from_identifier(pathway_id);
            let name = names.get(pathway_id.as_str()).copied().unwrap_or_default();
            VennSet {
                sets: vec![index],
                size: genes.len(),
                pathway_id: Some(pathway_id.to_string()),
                label: Some(format!("{} ({})", name, database.display_name())),
                intersection: None,
                gene_set: genes.iter().cloned().collect(),
            }
        })
        .collect();

    for (i, (first_id, first_genes)) in selected.iter().enumerate() {
        for (j, (second_id, second_genes)) in selected.iter().enumerate().skip(i + 1) {
            let shared: Vec<String> = first_genes.intersection(second_genes).cloned().collect();
            venn.push(VennSet {
                sets: vec![i, j],
                size: shared.len(),
                pathway_id: None,
                label: None,
                intersection: Some(format!("{first_id} ∩ {second_id}")),
                gene_set: shared,
            });
        }
    }

    venn
}
