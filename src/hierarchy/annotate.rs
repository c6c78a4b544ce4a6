//! Attach one run's enrichment results to the hierarchy and colour its nodes.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::enrichment::{EnrichmentMethod, EnrichmentRecord};
use crate::error::{DecoPathError, Result};
use crate::hierarchy::color::{
    Colormap, NOT_SIGNIFICANT_GRAY, Normalize, ORA_GRAY, ORA_NORM_MAX, ORA_NORM_MIN,
    UNMAPPED_GRAY,
};
use crate::hierarchy::{Hierarchy, HierarchyNode, NodeAnnotation, TreeNode};
use crate::mapping::Database;
use crate::mapping::ontology::strip_prefix;

/// One result row as seen by the annotator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayScore {
    pub database: Database,
    pub pathway_id: String,
    pub score: Option<f64>,
    pub q_value: f64,
    pub geneset_size: Option<usize>,
}

/// Turn a result table into annotator input. Sizes missing from the records are taken from
/// `geneset_sizes`, keyed by pathway id.
pub fn pathway_scores<R: EnrichmentRecord>(
    records: &[R],
    geneset_sizes: &IndexMap<String, usize>,
) -> Vec<PathwayScore> {
    records
        .iter()
        .map(|record| {
            let pathway_id = strip_prefix(record.pathway_id());
            PathwayScore {
                database: Database::from_identifier(&pathway_id),
                geneset_size: record
                    .geneset_size()
                    .or_else(|| geneset_sizes.get(&pathway_id).copied()),
                score: record.score(),
                q_value: record.q_value(),
                pathway_id,
            }
        })
        .collect()
}

/// Values collected for one mapped node.
struct Mapped {
    direction: Option<f64>,
    fdr: f64,
    geneset_size: Option<usize>,
}

/// Annotate the subtree below `root` with `results`.
///
/// GSEA nodes get their score as `direction` plus an `fdr` attribute, coloured on the
/// diverging scale spanning the observed scores. ORA nodes get their q-value as `direction`,
/// coloured on reversed reds over a fixed q-value window. The hierarchy itself is untouched;
/// the returned tree is a fresh copy. A later result for the same node replaces an earlier one.
pub fn map_results_to_hierarchy(
    hierarchy: &Hierarchy,
    root: &str,
    results: &[PathwayScore],
    method: EnrichmentMethod,
    significance_value: f64,
) -> Result<TreeNode> {
    crate::error::check_threshold(significance_value)?;
    if !hierarchy.contains(root) {
        return Err(DecoPathError::UnknownRoot(root.to_string()));
    }

    let mut mapped: HashMap<&str, Mapped> = HashMap::new();
    for result in results {
        if !hierarchy.contains(&result.pathway_id) {
            debug!(pathway_id = %result.pathway_id, database = %result.database, "result not in hierarchy");
            continue;
        }

        let direction = match method {
            EnrichmentMethod::Gsea => result.score,
            EnrichmentMethod::Ora => Some(result.q_value),
        };
        mapped.insert(
            &result.pathway_id,
            Mapped {
                direction,
                fdr: result.q_value,
                geneset_size: result.geneset_size,
            },
        );
    }

    if mapped.is_empty() {
        warn!(results = results.len(), "no result maps onto the hierarchy");
        return Err(DecoPathError::NoHierarchyMatch);
    }
    if mapped.values().all(|m| m.direction.is_none()) {
        warn!(mapped = mapped.len(), "mapped results carry no scores");
        return Err(DecoPathError::MissingScores {
            mapped: mapped.len(),
        });
    }

    let painter = Painter::new(method, &mapped, significance_value);
    let tree = hierarchy
        .tree_from(root, &|node: &HierarchyNode| painter.annotate(mapped.get(node.id.as_str())))
        .ok_or_else(|| DecoPathError::UnknownRoot(root.to_string()))?;

    info!(
        %method,
        mapped = mapped.len(),
        nodes = tree.len(),
        "annotated hierarchy"
    );
    Ok(tree)
}

struct Painter {
    method: EnrichmentMethod,
    cmap: Colormap,
    norm: Normalize,
    significance_value: f64,
}

impl Painter {
    fn new(method: EnrichmentMethod, mapped: &HashMap<&str, Mapped>, significance_value: f64) -> Self {
        match method {
            EnrichmentMethod::Gsea => {
                let scores = mapped.values().filter_map(|m| m.direction);
                let (vmin, vmax) = scores.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                    (lo.min(s), hi.max(s))
                });
                Painter {
                    method,
                    cmap: Colormap::diverging(),
                    norm: Normalize::new(vmin, vmax),
                    significance_value,
                }
            }
            EnrichmentMethod::Ora => Painter {
                method,
                cmap: Colormap::reds().reversed(),
                norm: Normalize::new(ORA_NORM_MIN, ORA_NORM_MAX),
                significance_value,
            },
        }
    }

    fn annotate(&self, mapped: Option<&Mapped>) -> NodeAnnotation {
        let Some(mapped) = mapped else {
            let color = match self.method {
                EnrichmentMethod::Gsea => UNMAPPED_GRAY,
                EnrichmentMethod::Ora => ORA_GRAY,
            };
            return NodeAnnotation {
                color: Some(color.to_string()),
                ..NodeAnnotation::default()
            };
        };

        let color = match (self.method, mapped.direction) {
            (EnrichmentMethod::Gsea, Some(score)) if mapped.fdr < self.significance_value => {
                self.cmap.sample(self.norm.apply(score)).to_hex()
            }
            (EnrichmentMethod::Gsea, _) => NOT_SIGNIFICANT_GRAY.to_string(),
            (EnrichmentMethod::Ora, Some(q)) if q < self.significance_value => {
                self.cmap.sample(self.norm.apply(q)).to_hex()
            }
            (EnrichmentMethod::Ora, _) => ORA_GRAY.to_string(),
        };

        NodeAnnotation {
            geneset_size: mapped.geneset_size,
            direction: mapped.direction,
            fdr: match self.method {
                EnrichmentMethod::Gsea => Some(mapped.fdr),
                EnrichmentMethod::Ora => None,
            },
            color: Some(color),
        }
    }
}
