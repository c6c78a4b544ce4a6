//! The equivalence store: pathway records and the symmetric equivalent-pathway relation.
//!
//! Records are keyed by `(pathway_id, database)` and stored once; the relation is an
//! adjacency list over record indices. Every insertion writes both directions, so
//! `b ∈ equivalents(a)` if and only if `a ∈ equivalents(b)`. After loading the store is only
//! read, and can be shared between threads behind an `Arc`.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DecoPathError, Result};
use crate::mapping::database::Database;
use crate::mapping::ontology::{
    OntologyEdge, OntologyRow, canonical_assignments, parse_edges, strip_prefix,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathwayKey {
    pub pathway_id: String,
    pub database: Database,
}

impl PathwayKey {
    pub fn new(pathway_id: impl Into<String>, database: Database) -> Self {
        PathwayKey {
            pathway_id: pathway_id.into(),
            database,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    pub pathway_id: String,
    pub pathway_name: String,
    pub database: Database,
    /// Canonical cross-database id, `None` when the pathway is not grouped
    pub decopath_id: Option<String>,
    pub decopath_name: Option<String>,
}

impl Pathway {
    pub fn new(pathway_id: impl Into<String>, pathway_name: impl Into<String>, database: Database) -> Self {
        Pathway {
            pathway_id: pathway_id.into(),
            pathway_name: pathway_name.into(),
            database,
            decopath_id: None,
            decopath_name: None,
        }
    }

    pub fn with_canonical(mut self, decopath_id: impl Into<String>, decopath_name: impl Into<String>) -> Self {
        self.decopath_id = Some(decopath_id.into());
        self.decopath_name = Some(decopath_name.into());
        self
    }

    pub fn key(&self) -> PathwayKey {
        PathwayKey::new(self.pathway_id.clone(), self.database.clone())
    }

    /// Name to show for the pathway's consensus group.
    pub fn display_name(&self) -> &str {
        self.decopath_name.as_deref().unwrap_or(&self.pathway_name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EquivalenceStore {
    pathways: Vec<Pathway>,
    index: HashMap<PathwayKey, usize>,
    by_id: HashMap<String, Vec<usize>>,
    by_canonical: IndexMap<String, Vec<usize>>,
    adjacency: Vec<IndexSet<usize>>,
}

impl EquivalenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    /// Number of undirected equivalence edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(IndexSet::len).sum::<usize>() / 2
    }

    pub fn pathways(&self) -> impl Iterator<Item = &Pathway> {
        self.pathways.iter()
    }

    pub fn get(&self, key: &PathwayKey) -> Option<&Pathway> {
        self.index.get(key).map(|&idx| &self.pathways[idx])
    }

    /// All records carrying `pathway_id`, whatever their database.
    pub fn find(&self, pathway_id: &str) -> impl Iterator<Item = &Pathway> {
        self.by_id
            .get(pathway_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.pathways[idx])
    }

    /// Records grouped under the canonical id.
    pub fn canonical_members(&self, decopath_id: &str) -> impl Iterator<Item = &Pathway> {
        self.by_canonical
            .get(decopath_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.pathways[idx])
    }

    /// Records for a primary id, or, when no record has that id, the members of the canonical
    /// group it names.
    pub fn lookup(&self, identifier: &str) -> Vec<&Pathway> {
        let direct: Vec<&Pathway> = self.find(identifier).collect();
        if direct.is_empty() {
            self.canonical_members(identifier).collect()
        } else {
            direct
        }
    }

    /// Canonical `(id, name)` for a primary or canonical identifier.
    pub fn canonical(&self, identifier: &str) -> Option<(&str, &str)> {
        self.lookup(identifier).into_iter().find_map(|pathway| {
            match (&pathway.decopath_id, &pathway.decopath_name) {
                (Some(id), Some(name)) => Some((id.as_str(), name.as_str())),
                _ => None,
            }
        })
    }

    /// Every directly equivalent record, ordered by database.
    pub fn equivalents(&self, key: &PathwayKey) -> Vec<&Pathway> {
        let Some(&idx) = self.index.get(key) else {
            return Vec::new();
        };

        let mut equivalents: Vec<&Pathway> = self.adjacency[idx]
            .iter()
            .map(|&other| &self.pathways[other])
            .collect();
        equivalents.sort_by(|a, b| a.database.cmp(&b.database));
        equivalents
    }

    /// Directly equivalent records restricted to `databases`, ordered by database.
    pub fn siblings(&self, key: &PathwayKey, databases: &[Database]) -> Vec<&Pathway> {
        self.equivalents(key)
            .into_iter()
            .filter(|pathway| databases.contains(&pathway.database))
            .collect()
    }

    /// Equivalent records in `databases` for a primary or canonical identifier, without
    /// duplicates, in first-seen order.
    pub fn equivalent_pathways(&self, identifier: &str, databases: &[Database]) -> Vec<&Pathway> {
        let mut seen: IndexSet<PathwayKey> = IndexSet::new();
        let mut equivalents = Vec::new();

        for pathway in self.lookup(identifier) {
            for other in self.siblings(&pathway.key(), databases) {
                if seen.insert(other.key()) {
                    equivalents.push(other);
                }
            }
        }

        equivalents
    }

    /// Insert the record unless its key is already present.
    ///
    /// An existing record without a canonical id adopts the incoming one; two different
    /// canonical ids for the same key are rejected.
    pub fn get_or_create(&mut self, pathway: Pathway) -> Result<PathwayKey> {
        self.check_compatible(&pathway)?;
        let idx = self.insert_or_merge(pathway);
        Ok(self.pathways[idx].key())
    }

    /// Record `a ↔ b`. Both directions are written, and re-adding an existing edge is a no-op.
    pub fn add_equivalence(&mut self, a: Pathway, b: Pathway) -> Result<()> {
        self.check_compatible(&a)?;
        self.check_compatible(&b)?;

        let a_idx = self.insert_or_merge(a);
        let b_idx = self.insert_or_merge(b);
        if a_idx == b_idx {
            return Ok(());
        }

        self.adjacency[a_idx].insert(b_idx);
        self.adjacency[b_idx].insert(a_idx);
        Ok(())
    }

    /// Load the standard equivalence mappings from ontology rows.
    ///
    /// Only `EquivalentTo` rows create edges. Both ends take the canonical id of the source
    /// pathway, found through its `PartOf` row; equivalences whose source has no canonical
    /// parent are not loaded. Returns the number of equivalence rows loaded.
    pub fn load_mappings(&mut self, rows: &[OntologyRow]) -> Result<usize> {
        let edges = parse_edges(rows)?;
        let assignments = canonical_assignments(&edges);
        let mut loaded = 0;

        for edge in &edges {
            let OntologyEdge::EquivalentTo { source, target } = edge else {
                continue;
            };

            let source_id = strip_prefix(&source.id);
            let Some(canonical) = assignments.get(&source_id) else {
                debug!(%source_id, "equivalence without canonical parent, not loaded");
                continue;
            };

            let source = Pathway::new(source_id, source.name.clone(), source.database())
                .with_canonical(canonical.decopath_id.clone(), canonical.decopath_name.clone());
            let target = Pathway::new(strip_prefix(&target.id), target.name.clone(), target.database())
                .with_canonical(canonical.decopath_id.clone(), canonical.decopath_name.clone());

            self.add_equivalence(source, target)?;
            loaded += 1;
        }

        info!(
            loaded,
            pathways = self.len(),
            edges = self.edge_count(),
            "loaded equivalence mappings"
        );
        Ok(loaded)
    }

    /// Load user-submitted mappings. Every row is read as an equivalence pair, whatever its
    /// mapping type, and no canonical ids are assigned.
    pub fn load_custom_mappings(&mut self, rows: &[OntologyRow]) -> Result<usize> {
        for row in rows {
            let source = row.source();
            let target = row.target();
            self.add_equivalence(
                Pathway::new(strip_prefix(&source.id), source.name.clone(), source.database()),
                Pathway::new(strip_prefix(&target.id), target.name.clone(), target.database()),
            )?;
        }

        info!(loaded = rows.len(), "loaded custom mappings");
        Ok(rows.len())
    }

    /// Check that every edge has its reverse.
    pub fn verify_symmetry(&self) -> Result<()> {
        for (idx, neighbours) in self.adjacency.iter().enumerate() {
            for &other in neighbours {
                if !self.adjacency[other].contains(&idx) {
                    return Err(DecoPathError::AsymmetricEquivalence {
                        source_id: self.pathways[idx].pathway_id.clone(),
                        source_count: neighbours.len(),
                        target_id: self.pathways[other].pathway_id.clone(),
                        target_count: self.adjacency[other].len(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_compatible(&self, pathway: &Pathway) -> Result<()> {
        let Some(existing) = self.get(&pathway.key()) else {
            return Ok(());
        };

        match (&existing.decopath_id, &pathway.decopath_id) {
            (Some(existing_id), Some(incoming)) if existing_id != incoming => {
                Err(DecoPathError::ConflictingCanonicalId {
                    pathway_id: pathway.pathway_id.clone(),
                    database: pathway.database.to_string(),
                    existing: existing_id.clone(),
                    conflicting: incoming.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn insert_or_merge(&mut self, pathway: Pathway) -> usize {
        let key = pathway.key();

        if let Some(&idx) = self.index.get(&key) {
            let existing = &mut self.pathways[idx];
            if existing.decopath_id.is_none() {
                if let Some(decopath_id) = pathway.decopath_id {
                    existing.decopath_id = Some(decopath_id.clone());
                    existing.decopath_name = pathway.decopath_name;
                    self.by_canonical.entry(decopath_id).or_default().push(idx);
                }
            }
            return idx;
        }

        let idx = self.pathways.len();
        self.by_id.entry(pathway.pathway_id.clone()).or_default().push(idx);
        if let Some(decopath_id) = &pathway.decopath_id {
            self.by_canonical.entry(decopath_id.clone()).or_default().push(idx);
        }
        self.index.insert(key, idx);
        self.pathways.push(pathway);
        self.adjacency.push(IndexSet::new());
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ontology::{EQUIVALENT_TO, IS_PART_OF};

    fn glycolysis_rows() -> Vec<OntologyRow> {
        vec![
            OntologyRow::new(
                ("KEGG", "path:hsa00010", "Glycolysis / Gluconeogenesis"),
                EQUIVALENT_TO,
                ("Reactome", "R-HSA-70171", "Glycolysis"),
            ),
            OntologyRow::new(
                ("KEGG", "path:hsa00010", "Glycolysis / Gluconeogenesis"),
                EQUIVALENT_TO,
                ("WikiPathways", "WP534", "Glycolysis and gluconeogenesis"),
            ),
            OntologyRow::new(
                ("Reactome", "R-HSA-70171", "Glycolysis"),
                EQUIVALENT_TO,
                ("WikiPathways", "WP534", "Glycolysis and gluconeogenesis"),
            ),
            OntologyRow::new(
                ("KEGG", "path:hsa00010", "Glycolysis / Gluconeogenesis"),
                IS_PART_OF,
                ("DecoPath", "DC10", "Glycolysis"),
            ),
            OntologyRow::new(
                ("Reactome", "R-HSA-70171", "Glycolysis"),
                IS_PART_OF,
                ("DecoPath", "DC10", "Glycolysis"),
            ),
        ]
    }

    #[test]
    fn test_load_mappings_builds_clique() {
        let mut store = EquivalenceStore::new();
        let loaded = store.load_mappings(&glycolysis_rows()).unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.edge_count(), 3);
        store.verify_symmetry().unwrap();

        let kegg = PathwayKey::new("hsa00010", Database::Kegg);
        let equivalents: Vec<_> = store
            .equivalents(&kegg)
            .into_iter()
            .map(|p| p.pathway_id.as_str())
            .collect();
        assert_eq!(equivalents, vec!["R-HSA-70171", "WP534"]);

        for pathway in store.pathways() {
            assert_eq!(pathway.decopath_id.as_deref(), Some("DC10"));
        }
    }

    #[test]
    fn test_reloading_is_idempotent() {
        let mut store = EquivalenceStore::new();
        store.load_mappings(&glycolysis_rows()).unwrap();
        store.load_mappings(&glycolysis_rows()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.edge_count(), 3);
    }

    #[test]
    fn test_siblings_filtered_by_database() {
        let mut store = EquivalenceStore::new();
        store.load_mappings(&glycolysis_rows()).unwrap();

        let key = PathwayKey::new("WP534", Database::WikiPathways);
        let siblings = store.siblings(&key, &[Database::Kegg, Database::WikiPathways]);
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].pathway_id, "hsa00010");

        let unknown = PathwayKey::new("WP1", Database::WikiPathways);
        assert!(store.siblings(&unknown, &[Database::Kegg]).is_empty());
    }

    #[test]
    fn test_canonical_lookup_by_primary_or_canonical_id() {
        let mut store = EquivalenceStore::new();
        store.load_mappings(&glycolysis_rows()).unwrap();

        assert_eq!(store.canonical("R-HSA-70171"), Some(("DC10", "Glycolysis")));
        assert_eq!(store.canonical("DC10"), Some(("DC10", "Glycolysis")));
        assert_eq!(store.lookup("DC10").len(), 3);
        assert_eq!(store.canonical("WP1"), None);

        let by_canonical = store.equivalent_pathways("DC10", &[Database::Kegg, Database::Reactome]);
        let ids: Vec<_> = by_canonical.iter().map(|p| p.pathway_id.as_str()).collect();
        assert_eq!(ids, vec!["R-HSA-70171", "hsa00010"]);
        assert_eq!(store.equivalent_pathways("WP534", &[Database::Kegg]).len(), 1);
    }

    #[test]
    fn test_conflicting_canonical_id_is_rejected() {
        let mut store = EquivalenceStore::new();
        store
            .add_equivalence(
                Pathway::new("hsa1", "X", Database::Kegg).with_canonical("DC1", "X"),
                Pathway::new("WP1", "X", Database::WikiPathways).with_canonical("DC1", "X"),
            )
            .unwrap();

        let err = store
            .add_equivalence(
                Pathway::new("hsa1", "X", Database::Kegg).with_canonical("DC2", "Y"),
                Pathway::new("R-HSA-1", "X", Database::Reactome).with_canonical("DC2", "Y"),
            )
            .unwrap_err();
        assert!(matches!(err, DecoPathError::ConflictingCanonicalId { .. }));
        // nothing was written by the rejected insertion
        assert!(store.get(&PathwayKey::new("R-HSA-1", Database::Reactome)).is_none());
    }

    #[test]
    fn test_missing_canonical_is_adopted() {
        let mut store = EquivalenceStore::new();
        store.get_or_create(Pathway::new("hsa1", "X", Database::Kegg)).unwrap();
        store
            .get_or_create(Pathway::new("hsa1", "X", Database::Kegg).with_canonical("DC1", "Super X"))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.canonical("hsa1"), Some(("DC1", "Super X")));
        assert_eq!(store.canonical_members("DC1").count(), 1);
    }

    #[test]
    fn test_custom_mappings_have_no_canonical_id() {
        let mut store = EquivalenceStore::new();
        let rows = vec![OntologyRow::new(
            ("my_db", "custom_1", "Custom one"),
            "",
            ("KEGG", "path:hsa00010", "Glycolysis"),
        )];
        store.load_custom_mappings(&rows).unwrap();

        let key = PathwayKey::new("custom_1", Database::Custom("my_db".to_string()));
        let equivalents = store.equivalents(&key);
        assert_eq!(equivalents[0].pathway_id, "hsa00010");
        assert_eq!(store.canonical("custom_1"), None);
        store.verify_symmetry().unwrap();
    }
}
