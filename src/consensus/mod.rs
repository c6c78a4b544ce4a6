//! Cross-database consensus of enrichment results.
//!
//! Each pathway of a result table is folded together with its equivalent pathways from the
//! other selected databases into one fixed-width row, and the row is classified by whether
//! the databases agree on significance (and, for GSEA, on the direction of regulation).
//!
//! - **[`gsea`]**: consensus over signed scores and q-values
//! - **[`ora`]**: consensus over q-values only
//! - **[`overlap`]**: gene-set overlaps of equivalent pathways, for Venn rendering

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::enrichment::{EnrichmentMethod, EnrichmentRecord};
use crate::error::{Result, check_threshold};
use crate::mapping::ontology::strip_prefix;
use crate::mapping::{Database, EquivalenceStore, PathwayKey, column_order};

pub mod gsea;
pub mod ora;
pub mod overlap;

pub use gsea::generate_consensus_table_gsea;
pub use ora::generate_consensus_table_ora;
pub use overlap::{VennSet, gene_set_overlaps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "no-mappings")]
    NoMapping,
    Concordant,
    Discordant,
}

/// Classify a list of values against `threshold`.
///
/// Fewer than `min_mappings` values is [`Verdict::NoMapping`]. Values that are all above,
/// all below, or all equal to the threshold agree.
pub fn check_consensus(values: &[f64], threshold: f64, min_mappings: usize) -> Verdict {
    if values.len() < min_mappings {
        Verdict::NoMapping
    } else if values.iter().all(|&v| v > threshold)
        || values.iter().all(|&v| v < threshold)
        || values.iter().all(|&v| v == threshold)
    {
        Verdict::Concordant
    } else {
        Verdict::Discordant
    }
}

/// One populated cell of a consensus row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotValue {
    pub identifier: String,
    pub score: Option<f64>,
    pub q_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRow {
    /// Canonical name when DecoPath is selected and the pathway is grouped, else its own name
    pub pathway: String,
    pub verdict: Verdict,
    pub decopath_verdict: Verdict,
    /// One slot per column of the table; `None` when that database has no result
    pub slots: Vec<Option<SlotValue>>,
}

impl ConsensusRow {
    /// Populated slots outside the DecoPath column.
    pub fn populated(&self, columns: &[Database]) -> usize {
        self.slots
            .iter()
            .zip(columns)
            .filter(|(slot, database)| slot.is_some() && !database.is_decopath())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusTable {
    pub method: EnrichmentMethod,
    pub columns: Vec<Database>,
    pub rows: Vec<ConsensusRow>,
    /// Pathway names per verdict, over every processed group including dropped rows
    pub summary: IndexMap<Verdict, Vec<String>>,
}

impl ConsensusTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn identifiers(&self) -> Vec<Vec<Option<&str>>> {
        self.rows
            .iter()
            .map(|row| {
                row.slots
                    .iter()
                    .map(|slot| slot.as_ref().map(|s| s.identifier.as_str()))
                    .collect()
            })
            .collect()
    }

    pub fn q_values(&self) -> Vec<Vec<Option<f64>>> {
        self.rows
            .iter()
            .map(|row| row.slots.iter().map(|slot| slot.as_ref().map(|s| s.q_value)).collect())
            .collect()
    }

    pub fn scores(&self) -> Vec<Vec<Option<f64>>> {
        self.rows
            .iter()
            .map(|row| row.slots.iter().map(|slot| slot.as_ref().and_then(|s| s.score)).collect())
            .collect()
    }

    pub fn verdicts(&self) -> Vec<Verdict> {
        self.rows.iter().map(|row| row.verdict).collect()
    }

    pub fn decopath_verdicts(&self) -> Vec<Verdict> {
        self.rows.iter().map(|row| row.decopath_verdict).collect()
    }

    /// Flattened export header: `pathway`, `consensus`, then `{db}_id`, `{db}_nes` (GSEA only)
    /// and `{db}_qval` per column.
    pub fn column_labels(&self) -> Vec<String> {
        let mut labels = vec!["pathway".to_string(), "consensus".to_string()];
        for database in &self.columns {
            labels.push(format!("{}_id", database.key()));
            if self.method == EnrichmentMethod::Gsea {
                labels.push(format!("{}_nes", database.key()));
            }
            labels.push(format!("{}_qval", database.key()));
        }
        labels
    }

    /// Rows as flat records keyed by [`column_labels`](Self::column_labels). Missing values
    /// are `null`.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                record.insert("pathway".to_string(), Value::from(row.pathway.clone()));
                record.insert(
                    "consensus".to_string(),
                    serde_json::to_value(row.verdict).unwrap_or(Value::Null),
                );
                for (database, slot) in self.columns.iter().zip(&row.slots) {
                    let key = database.key();
                    record.insert(
                        format!("{key}_id"),
                        slot.as_ref().map_or(Value::Null, |s| Value::from(s.identifier.clone())),
                    );
                    if self.method == EnrichmentMethod::Gsea {
                        record.insert(
                            format!("{key}_nes"),
                            slot.as_ref().and_then(|s| s.score).map_or(Value::Null, Value::from),
                        );
                    }
                    record.insert(
                        format!("{key}_qval"),
                        slot.as_ref().map_or(Value::Null, |s| Value::from(s.q_value)),
                    );
                }
                record
            })
            .collect()
    }
}

/// Values gathered for one pathway group before classification.
#[derive(Debug, Clone, Default)]
pub(crate) struct Group {
    pub scores: Vec<f64>,
    pub fdr_list: Vec<f64>,
    /// `(score, q_value)` of the canonical pathway, when it has its own result
    pub decopath: Option<(Option<f64>, f64)>,
}

/// Database of a result id. Ids without a known prefix belong to a user-submitted database,
/// so the store decides which one, preferring a selected column.
fn resolve_database(
    store: &EquivalenceStore,
    pathway_id: &str,
    column_of: &HashMap<&Database, usize>,
) -> Database {
    let inferred = Database::from_identifier(pathway_id);
    if !matches!(inferred, Database::Custom(_)) {
        return inferred;
    }

    let candidates: Vec<&Database> = store
        .find(pathway_id)
        .map(|pathway| &pathway.database)
        .filter(|database| matches!(database, Database::Custom(_)))
        .collect();
    candidates
        .iter()
        .find(|database| column_of.contains_key(**database))
        .or(candidates.first())
        .map(|database| (*database).clone())
        .unwrap_or(inferred)
}

/// Walk the result table and build the consensus rows; `classify` turns a group into its
/// primary and DecoPath verdicts.
pub(crate) fn build_table<R, F>(
    records: &[R],
    store: &EquivalenceStore,
    databases: &[Database],
    significance_value: f64,
    method: EnrichmentMethod,
    classify: F,
) -> Result<ConsensusTable>
where
    R: EnrichmentRecord,
    F: Fn(&Group, f64) -> (Verdict, Verdict),
{
    check_threshold(significance_value)?;

    let columns = column_order(databases);
    let column_of: HashMap<&Database, usize> =
        columns.iter().enumerate().map(|(i, db)| (db, i)).collect();
    let decopath_selected = columns.iter().any(Database::is_decopath);

    let mut sorted: Vec<(String, Database, &R)> = Vec::with_capacity(records.len());
    for record in records {
        let pathway_id = strip_prefix(record.pathway_id());
        let database = resolve_database(store, &pathway_id, &column_of);
        if !column_of.contains_key(&database) {
            debug!(%pathway_id, %database, "result outside the selected databases");
            continue;
        }
        sorted.push((pathway_id, database, record));
    }
    sorted.sort_by(|a, b| a.1.cmp(&b.1));

    let mut table: HashMap<&str, (&Database, &R)> = HashMap::new();
    for (pathway_id, database, record) in &sorted {
        table.entry(pathway_id.as_str()).or_insert((database, *record));
    }

    let slot = |identifier: &str, record: &R| SlotValue {
        identifier: identifier.to_string(),
        score: record.score(),
        q_value: record.q_value(),
    };

    let mut skip_ids: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();
    let mut summary: IndexMap<Verdict, Vec<String>> = IndexMap::new();

    for (pathway_id, database, record) in &sorted {
        if skip_ids.contains(pathway_id) || database.is_decopath() {
            continue;
        }

        let key = PathwayKey::new(pathway_id.clone(), database.clone());
        let Some(pathway) = store.get(&key) else {
            debug!(%pathway_id, "pathway has no mapping record");
            continue;
        };
        skip_ids.insert(pathway_id.clone());

        let mut slots: Vec<Option<SlotValue>> = vec![None; columns.len()];
        let mut group = Group::default();

        let name = match (&pathway.decopath_id, &pathway.decopath_name) {
            (Some(_), Some(decopath_name)) if decopath_selected => decopath_name.clone(),
            _ => pathway.pathway_name.clone(),
        };

        let decopath_id = pathway.decopath_id.as_deref().filter(|_| decopath_selected);
        if let Some(decopath_id) = decopath_id {
            if let (Some((_, dc_record)), Some(&column)) =
                (table.get(decopath_id), column_of.get(&Database::DecoPath))
            {
                slots[column] = Some(slot(decopath_id, *dc_record));
                group.decopath = Some((dc_record.score(), dc_record.q_value()));
            }
        }

        slots[column_of[database]] = Some(slot(pathway_id, *record));
        group.scores.extend(record.score());
        group.fdr_list.push(record.q_value());

        for sibling in store.equivalents(&key) {
            skip_ids.insert(sibling.pathway_id.clone());

            if !databases.contains(&sibling.database) {
                continue;
            }
            if decopath_id == Some(sibling.pathway_id.as_str()) {
                continue;
            }
            let Some(&(sibling_database, sibling_record)) = table.get(sibling.pathway_id.as_str())
            else {
                continue;
            };

            slots[column_of[sibling_database]] = Some(slot(&sibling.pathway_id, sibling_record));
            group.scores.extend(sibling_record.score());
            group.fdr_list.push(sibling_record.q_value());
        }

        let (verdict, decopath_verdict) = classify(&group, significance_value);
        summary.entry(verdict).or_default().push(name.clone());

        let row = ConsensusRow {
            pathway: name,
            verdict,
            decopath_verdict,
            slots,
        };
        if row.populated(&columns) < 2 {
            debug!(pathway = %row.pathway, "fewer than two databases report this pathway");
            continue;
        }
        rows.push(row);
    }

    info!(
        %method,
        rows = rows.len(),
        columns = columns.len(),
        "built consensus table"
    );

    Ok(ConsensusTable {
        method,
        columns,
        rows,
        summary,
    })
}
