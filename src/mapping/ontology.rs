//! Ontology mapping rows and their typed edge form.
//!
//! Rows come from the DecoPath ontology sheets and the ComPath mapping tables. The free-text
//! mapping type is resolved once, here, into an [`OntologyEdge`]; downstream code never looks
//! at the raw tag again.

use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DecoPathError, Result};
use crate::mapping::database::Database;

/// Identifier prefix KEGG puts on its pathway ids.
pub const KEGG_PREFIX: &str = "path:";

pub const IS_PART_OF: &str = "BFO:0000050";
pub const EQUIVALENT_TO: &str = "skos:exactMatch";
pub const SUPER_PATHWAY: &str = "SuperPathway";

pub fn strip_prefix(pathway_id: &str) -> String {
    pathway_id.replace(KEGG_PREFIX, "")
}

/// One raw mapping row, as found in the ontology tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyRow {
    #[serde(rename = "Source Resource")]
    pub source_resource: String,
    #[serde(rename = "Source ID")]
    pub source_id: String,
    #[serde(rename = "Source Name")]
    pub source_name: String,
    #[serde(rename = "Mapping Type", default)]
    pub mapping_type: Option<String>,
    #[serde(rename = "Target Resource")]
    pub target_resource: String,
    #[serde(rename = "Target ID")]
    pub target_id: String,
    #[serde(rename = "Target Name")]
    pub target_name: String,
}

impl OntologyRow {
    pub fn new(
        source: (&str, &str, &str),
        mapping_type: &str,
        target: (&str, &str, &str),
    ) -> Self {
        OntologyRow {
            source_resource: source.0.to_string(),
            source_id: source.1.to_string(),
            source_name: source.2.to_string(),
            mapping_type: Some(mapping_type.to_string()),
            target_resource: target.0.to_string(),
            target_id: target.1.to_string(),
            target_name: target.2.to_string(),
        }
    }

    pub fn source(&self) -> PathwayRef {
        PathwayRef {
            resource: self.source_resource.clone(),
            id: self.source_id.clone(),
            name: self.source_name.clone(),
        }
    }

    pub fn target(&self) -> PathwayRef {
        PathwayRef {
            resource: self.target_resource.clone(),
            id: self.target_id.clone(),
            name: self.target_name.clone(),
        }
    }

    /// Resolve the row into a typed edge. Rows without a mapping type yield `None`.
    pub fn edge(&self) -> Result<Option<OntologyEdge>> {
        let Some(tag) = self
            .mapping_type
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
        else {
            return Ok(None);
        };

        let mapping = tag.parse::<MappingType>().map_err(|_| DecoPathError::UnknownMappingType {
            mapping: tag.to_string(),
            source_id: self.source_id.clone(),
            target_id: self.target_id.clone(),
        })?;

        let (source, target) = (self.source(), self.target());
        Ok(Some(match mapping {
            MappingType::SuperPathway => OntologyEdge::SuperPathway { source, target },
            MappingType::PartOf => OntologyEdge::PartOf { source, target },
            MappingType::EquivalentTo => OntologyEdge::EquivalentTo { source, target },
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingType {
    SuperPathway,
    PartOf,
    EquivalentTo,
}

impl FromStr for MappingType {
    type Err = String;

    fn from_str(tag: &str) -> std::result::Result<Self, Self::Err> {
        match tag {
            SUPER_PATHWAY => Ok(MappingType::SuperPathway),
            IS_PART_OF | "is-part-of" => Ok(MappingType::PartOf),
            EQUIVALENT_TO | "equivalent-to" => Ok(MappingType::EquivalentTo),
            other => Err(other.to_string()),
        }
    }
}

/// A pathway as referenced from a mapping row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathwayRef {
    pub resource: String,
    pub id: String,
    pub name: String,
}

impl PathwayRef {
    pub fn database(&self) -> Database {
        Database::parse(&self.resource)
    }

    /// `(resource, id)`, the identity used by the equivalence dictionary.
    pub fn key(&self) -> (String, String) {
        (self.resource.clone(), self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OntologyEdge {
    /// `target` is a top-level super pathway.
    SuperPathway { source: PathwayRef, target: PathwayRef },
    /// `source` is part of the canonical pathway `target`.
    PartOf { source: PathwayRef, target: PathwayRef },
    EquivalentTo { source: PathwayRef, target: PathwayRef },
}

impl OntologyEdge {
    pub fn source(&self) -> &PathwayRef {
        match self {
            OntologyEdge::SuperPathway { source, .. }
            | OntologyEdge::PartOf { source, .. }
            | OntologyEdge::EquivalentTo { source, .. } => source,
        }
    }

    pub fn target(&self) -> &PathwayRef {
        match self {
            OntologyEdge::SuperPathway { target, .. }
            | OntologyEdge::PartOf { target, .. }
            | OntologyEdge::EquivalentTo { target, .. } => target,
        }
    }
}

/// Resolve every row, skipping rows without a mapping type. An unknown tag aborts.
pub fn parse_edges(rows: &[OntologyRow]) -> Result<Vec<OntologyEdge>> {
    let mut edges = Vec::with_capacity(rows.len());
    for row in rows {
        match row.edge()? {
            Some(edge) => edges.push(edge),
            None => debug!(source_id = %row.source_id, "skipping row without mapping type"),
        }
    }
    Ok(edges)
}

/// `(resource, id)` to its equivalent `(resource, id)` pairs, both directions.
pub type EquivalenceMap = IndexMap<(String, String), Vec<(String, String)>>;

/// Build the symmetric equivalence dictionary from the `EquivalentTo` edges.
///
/// Both ends of each equivalence must end up with the same number of mappings; a mismatch
/// means a clique in the mapping tables is incomplete.
pub fn equivalence_map(edges: &[OntologyEdge]) -> Result<EquivalenceMap> {
    let mut equivalent = EquivalenceMap::new();

    let pairs: Vec<(&PathwayRef, &PathwayRef)> = edges
        .iter()
        .filter_map(|edge| match edge {
            OntologyEdge::EquivalentTo { source, target } => Some((source, target)),
            _ => None,
        })
        .collect();

    for (source, target) in &pairs {
        equivalent.entry(source.key()).or_default().push(target.key());
        equivalent.entry(target.key()).or_default().push(source.key());
    }

    for (source, target) in &pairs {
        let source_count = equivalent.get(&source.key()).map_or(0, Vec::len);
        let target_count = equivalent.get(&target.key()).map_or(0, Vec::len);
        if source_count != target_count {
            return Err(DecoPathError::AsymmetricEquivalence {
                source_id: source.id.clone(),
                source_count,
                target_id: target.id.clone(),
                target_count,
            });
        }
    }

    Ok(equivalent)
}

/// Canonical id and name a pathway is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAssignment {
    pub decopath_id: String,
    pub decopath_name: String,
}

/// Pathways appearing in an equivalence edge, keyed by their prefix-stripped id.
fn equivalent_pathway_ids(edges: &[OntologyEdge]) -> HashSet<String> {
    edges
        .iter()
        .filter(|edge| matches!(edge, OntologyEdge::EquivalentTo { .. }))
        .flat_map(|edge| [strip_prefix(&edge.source().id), strip_prefix(&edge.target().id)])
        .collect()
}

/// Canonical ids for pathways that take part in an equivalence: the target of the pathway's
/// `PartOf` edge. Ids are prefix-stripped. A later `PartOf` edge for the same pathway wins.
pub fn canonical_assignments(edges: &[OntologyEdge]) -> IndexMap<String, CanonicalAssignment> {
    let equivalent = equivalent_pathway_ids(edges);

    edges
        .iter()
        .filter_map(|edge| match edge {
            OntologyEdge::PartOf { source, target } => Some((source, target)),
            _ => None,
        })
        .map(|(source, target)| (strip_prefix(&source.id), target))
        .filter(|(source_id, _)| equivalent.contains(source_id))
        .map(|(source_id, target)| {
            (
                source_id,
                CanonicalAssignment {
                    decopath_id: strip_prefix(&target.id),
                    decopath_name: target.name.clone(),
                },
            )
        })
        .collect()
}

/// Source databases and source ids grouped under each canonical id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalResources {
    pub databases: BTreeSet<Database>,
    pub pathway_ids: BTreeSet<String>,
}

pub fn canonical_resources(edges: &[OntologyEdge]) -> IndexMap<String, CanonicalResources> {
    let equivalent = equivalent_pathway_ids(edges);
    let mut resources: IndexMap<String, CanonicalResources> = IndexMap::new();

    for edge in edges {
        if let OntologyEdge::PartOf { source, target } = edge {
            let source_id = strip_prefix(&source.id);
            if equivalent.contains(&source_id) {
                let entry = resources.entry(strip_prefix(&target.id)).or_default();
                entry.databases.insert(source.database());
                entry.pathway_ids.insert(source_id);
            }
        }
    }

    resources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<OntologyRow> {
        vec![
            OntologyRow::new(
                ("KEGG", "path:hsa00010", "Glycolysis"),
                EQUIVALENT_TO,
                ("Reactome", "R-HSA-70171", "Glycolysis"),
            ),
            OntologyRow::new(
                ("KEGG", "path:hsa00010", "Glycolysis"),
                IS_PART_OF,
                ("DecoPath", "DC1", "Glycolysis (super)"),
            ),
            OntologyRow::new(
                ("Reactome", "R-HSA-70171", "Glycolysis"),
                "is-part-of",
                ("DecoPath", "DC1", "Glycolysis (super)"),
            ),
            OntologyRow::new(
                ("WikiPathways", "WP1", "Lonely"),
                IS_PART_OF,
                ("DecoPath", "DC2", "Other"),
            ),
        ]
    }

    #[test]
    fn test_mapping_type_tags() {
        assert_eq!("SuperPathway".parse::<MappingType>(), Ok(MappingType::SuperPathway));
        assert_eq!("BFO:0000050".parse::<MappingType>(), Ok(MappingType::PartOf));
        assert_eq!("equivalent-to".parse::<MappingType>(), Ok(MappingType::EquivalentTo));
        assert!("broader".parse::<MappingType>().is_err());
    }

    #[test]
    fn test_missing_mapping_type_is_skipped() {
        let mut row = rows().remove(0);
        row.mapping_type = None;
        assert_eq!(row.edge().unwrap(), None);
        row.mapping_type = Some("  ".to_string());
        assert_eq!(parse_edges(&[row]).unwrap(), vec![]);
    }

    #[test]
    fn test_unknown_mapping_type_is_fatal() {
        let mut row = rows().remove(0);
        row.mapping_type = Some("skos:broadMatch".to_string());
        let err = parse_edges(&[row]).unwrap_err();
        assert!(matches!(err, DecoPathError::UnknownMappingType { ref mapping, .. } if mapping == "skos:broadMatch"));
    }

    #[test]
    fn test_equivalence_map_is_symmetric() {
        let edges = parse_edges(&rows()).unwrap();
        let map = equivalence_map(&edges).unwrap();
        let kegg = ("KEGG".to_string(), "path:hsa00010".to_string());
        let reactome = ("Reactome".to_string(), "R-HSA-70171".to_string());
        assert_eq!(map[&kegg], vec![reactome.clone()]);
        assert_eq!(map[&reactome], vec![kegg]);
    }

    #[test]
    fn test_equivalence_map_detects_incomplete_clique() {
        let mut rows = rows();
        rows.push(OntologyRow::new(
            ("KEGG", "path:hsa00010", "Glycolysis"),
            EQUIVALENT_TO,
            ("WikiPathways", "WP534", "Glycolysis"),
        ));
        let edges = parse_edges(&rows).unwrap();
        let err = equivalence_map(&edges).unwrap_err();
        assert!(matches!(err, DecoPathError::AsymmetricEquivalence { .. }));
    }

    #[test]
    fn test_canonical_assignments_only_cover_equivalent_pathways() {
        let edges = parse_edges(&rows()).unwrap();
        let assignments = canonical_assignments(&edges);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments["hsa00010"].decopath_id, "DC1");
        assert_eq!(assignments["R-HSA-70171"].decopath_name, "Glycolysis (super)");
        assert!(!assignments.contains_key("WP1"));
    }

    #[test]
    fn test_canonical_resources() {
        let edges = parse_edges(&rows()).unwrap();
        let resources = canonical_resources(&edges);
        let dc1 = &resources["DC1"];
        assert_eq!(
            dc1.databases.iter().cloned().collect::<Vec<_>>(),
            vec![Database::Kegg, Database::Reactome]
        );
        assert!(dc1.pathway_ids.contains("hsa00010"));
        assert!(!resources.contains_key("DC2"));
    }

    #[test]
    fn test_rows_deserialize_from_column_headers() {
        let json = r#"{
            "Source Resource": "KEGG", "Source ID": "hsa1", "Source Name": "X",
            "Mapping Type": "SuperPathway",
            "Target Resource": "DecoPath", "Target ID": "DC1", "Target Name": "Super X"
        }"#;
        let row: OntologyRow = serde_json::from_str(json).unwrap();
        assert!(matches!(row.edge().unwrap(), Some(OntologyEdge::SuperPathway { .. })));
    }
}
