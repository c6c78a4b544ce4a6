//! The super-pathway hierarchy.
//!
//! Built once from the ontology rows: a root sentinel, the canonical super pathways below it,
//! and their constituent pathways below those. Result annotation (see [`annotate`]) works on
//! a serialized copy, so the built hierarchy never changes after construction.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HIERARCHY_ROOT;
use crate::error::{DecoPathError, Result};
use crate::mapping::ontology::{
    EquivalenceMap, KEGG_PREFIX, OntologyEdge, OntologyRow, PathwayRef, equivalence_map,
    parse_edges,
};

pub mod annotate;
pub mod color;

pub use annotate::{PathwayScore, map_results_to_hierarchy, pathway_scores};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: String,
    pub database: String,
    pub name: String,
}

/// Per-request values attached to a node when rendering annotated trees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geneset_size: Option<usize>,
    /// Score for GSEA, q-value for ORA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fdr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Nested node/children form of the hierarchy, ready for tree or circle-packing rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub annotation: NodeAnnotation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Depth-first search for a node id.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct Hierarchy {
    graph: DiGraph<HierarchyNode, ()>,
    index: HashMap<String, NodeIndex>,
    root: String,
}

/// Everything produced by [`Hierarchy::build`].
#[derive(Debug, Clone)]
pub struct HierarchyBuild {
    pub tree: TreeNode,
    pub hierarchy: Hierarchy,
    pub equivalence: EquivalenceMap,
    pub root: String,
}

impl Hierarchy {
    /// Build the hierarchy rooted at the default sentinel.
    pub fn build(rows: &[OntologyRow]) -> Result<HierarchyBuild> {
        Self::build_with_root(rows, HIERARCHY_ROOT)
    }

    /// Build the hierarchy from ontology rows.
    ///
    /// `SuperPathway` edges hang their target below the root (and their source below the
    /// target when the two differ); `PartOf` edges hang the source below its canonical
    /// parent. Equivalence edges only feed the equivalence dictionary. Duplicate `PartOf`
    /// sources, unknown mapping types and cycles abort the build.
    pub fn build_with_root(rows: &[OntologyRow], root: &str) -> Result<HierarchyBuild> {
        let edges = parse_edges(rows)?;
        let equivalence = equivalence_map(&edges)?;
        check_duplicates(&edges)?;

        let mut hierarchy = Hierarchy {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: root.to_string(),
        };
        hierarchy.node_index(root);

        let mut id_to_database: HashMap<String, String> = HashMap::new();
        let mut id_to_name: HashMap<String, String> = HashMap::new();
        let mut remember = |pathway: &PathwayRef| {
            id_to_database.insert(pathway.id.clone(), pathway.resource.clone());
            id_to_name.insert(pathway.id.clone(), pathway.name.clone());
        };

        for edge in &edges {
            match edge {
                OntologyEdge::EquivalentTo { .. } => continue,
                OntologyEdge::SuperPathway { source, target } => {
                    remember(target);
                    remember(source);
                    hierarchy.add_edge(root, &target.id);
                    if source.id != target.id {
                        hierarchy.add_edge(&target.id, &source.id);
                    }
                }
                OntologyEdge::PartOf { source, target } => {
                    remember(target);
                    remember(source);
                    hierarchy.add_edge(&target.id, &source.id);
                }
            }
        }

        if is_cyclic_directed(&hierarchy.graph) {
            let node = tarjan_scc(&hierarchy.graph)
                .into_iter()
                .find(|component| {
                    component.len() > 1
                        || hierarchy.graph.contains_edge(component[0], component[0])
                })
                .map(|component| hierarchy.graph[component[0]].id.clone())
                .unwrap_or_default();
            return Err(DecoPathError::CyclicHierarchy { node });
        }

        hierarchy.label(&id_to_database, &id_to_name);
        hierarchy.strip_prefixes()?;

        let unreachable = hierarchy.node_count() - hierarchy.reachable_from_root();
        if unreachable > 0 {
            warn!(unreachable, "hierarchy nodes are not reachable from the root");
        }

        info!(
            nodes = hierarchy.node_count(),
            edges = hierarchy.edge_count(),
            "built pathway hierarchy"
        );

        let tree = hierarchy.tree();
        let root = hierarchy.root.clone();
        Ok(HierarchyBuild {
            tree,
            hierarchy,
            equivalence,
            root,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&HierarchyNode> {
        self.index.get(id).map(|&ix| &self.graph[ix])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.graph.node_weights()
    }

    /// Children in insertion order.
    pub fn children(&self, id: &str) -> Vec<&HierarchyNode> {
        self.index
            .get(id)
            .map(|&ix| {
                self.child_indices(ix)
                    .into_iter()
                    .map(|child| &self.graph[child])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parents(&self, id: &str) -> Vec<&HierarchyNode> {
        self.index
            .get(id)
            .map(|&ix| {
                self.graph
                    .neighbors_directed(ix, Direction::Incoming)
                    .map(|parent| &self.graph[parent])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Unannotated tree rooted at the sentinel.
    pub fn tree(&self) -> TreeNode {
        self.tree_from(&self.root, &|_| NodeAnnotation::default())
            .unwrap_or_else(|| TreeNode {
                id: self.root.clone(),
                database: String::new(),
                name: String::new(),
                annotation: NodeAnnotation::default(),
                children: Vec::new(),
            })
    }

    /// Serialize the subtree below `root`, attaching an annotation to every node.
    pub(crate) fn tree_from<F>(&self, root: &str, annotate: &F) -> Option<TreeNode>
    where
        F: Fn(&HierarchyNode) -> NodeAnnotation,
    {
        let &ix = self.index.get(root)?;
        Some(self.subtree(ix, annotate))
    }

    fn subtree<F>(&self, ix: NodeIndex, annotate: &F) -> TreeNode
    where
        F: Fn(&HierarchyNode) -> NodeAnnotation,
    {
        let node = &self.graph[ix];
        TreeNode {
            id: node.id.clone(),
            database: node.database.clone(),
            name: node.name.clone(),
            annotation: annotate(node),
            children: self
                .child_indices(ix)
                .into_iter()
                .map(|child| self.subtree(child, annotate))
                .collect(),
        }
    }

    fn child_indices(&self, ix: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(ix, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.sort_by_key(|(edge_id, _)| edge_id.index());
        edges.into_iter().map(|(_, target)| target).collect()
    }

    fn reachable_from_root(&self) -> usize {
        let Some(&root) = self.index.get(&self.root) else {
            return 0;
        };
        let mut dfs = petgraph::visit::Dfs::new(&self.graph, root);
        let mut count = 0;
        while dfs.next(&self.graph).is_some() {
            count += 1;
        }
        count
    }

    fn node_index(&mut self, id: &str) -> NodeIndex {
        if let Some(&ix) = self.index.get(id) {
            return ix;
        }
        let ix = self.graph.add_node(HierarchyNode {
            id: id.to_string(),
            database: String::new(),
            name: String::new(),
        });
        self.index.insert(id.to_string(), ix);
        ix
    }

    fn add_edge(&mut self, parent: &str, child: &str) {
        let parent = self.node_index(parent);
        let child = self.node_index(child);
        self.graph.update_edge(parent, child, ());
    }

    fn label(&mut self, id_to_database: &HashMap<String, String>, id_to_name: &HashMap<String, String>) {
        for node in self.graph.node_weights_mut() {
            node.database = id_to_database.get(&node.id).cloned().unwrap_or_default();
            node.name = id_to_name.get(&node.id).cloned().unwrap_or_default();
        }
    }

    /// Drop database-specific prefixes (KEGG `path:`) from node ids.
    fn strip_prefixes(&mut self) -> Result<()> {
        let renames: Vec<(String, String)> = self
            .index
            .keys()
            .filter(|id| id.contains(KEGG_PREFIX))
            .map(|id| (id.clone(), id.replace(KEGG_PREFIX, "")))
            .collect();

        let renamed: HashSet<&str> = renames.iter().map(|(from, _)| from.as_str()).collect();
        for (from, to) in &renames {
            if self.index.contains_key(to) && !renamed.contains(to.as_str()) {
                return Err(DecoPathError::NodeRenameCollision {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        for (from, to) in renames {
            if let Some(ix) = self.index.remove(&from) {
                self.graph[ix].id = to.clone();
                self.index.insert(to, ix);
            }
        }
        if self.root.contains(KEGG_PREFIX) {
            self.root = self.root.replace(KEGG_PREFIX, "");
        }

        Ok(())
    }
}

/// Every `PartOf` source may appear only once.
fn check_duplicates(edges: &[OntologyEdge]) -> Result<()> {
    let mut parent_of: HashMap<&str, &str> = HashMap::new();

    for edge in edges {
        if let OntologyEdge::PartOf { source, target } = edge {
            if let Some(first_parent) = parent_of.insert(&source.id, &target.id) {
                return Err(DecoPathError::DuplicateHierarchy {
                    source_id: source.id.clone(),
                    first_parent: first_parent.to_string(),
                    second_parent: target.id.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ontology::{EQUIVALENT_TO, IS_PART_OF, SUPER_PATHWAY};

    fn rows() -> Vec<OntologyRow> {
        vec![
            OntologyRow::new(("KEGG", "hsa1", "X"), SUPER_PATHWAY, ("DecoPath", "DC1", "Super X")),
            OntologyRow::new(("KEGG", "hsa2", "Y"), IS_PART_OF, ("DecoPath", "DC1", "Super X")),
        ]
    }

    #[test]
    fn test_super_pathway_and_part_of() {
        let build = Hierarchy::build(&rows()).unwrap();
        assert_eq!(build.root, "SuperPathway");
        assert_eq!(build.tree.id, "SuperPathway");
        assert_eq!(build.tree.children.len(), 1);

        let dc1 = &build.tree.children[0];
        assert_eq!(dc1.id, "DC1");
        assert_eq!(dc1.name, "Super X");
        assert_eq!(dc1.database, "DecoPath");
        let children: Vec<_> = dc1.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(children, vec!["hsa1", "hsa2"]);
        assert_eq!(build.tree.len(), 4);
        assert_eq!(build.hierarchy.edge_count(), 3);
    }

    #[test]
    fn test_duplicate_part_of_is_rejected() {
        let mut rows = rows();
        rows.push(OntologyRow::new(("KEGG", "hsa2", "Y"), IS_PART_OF, ("DecoPath", "DC2", "Z")));
        let err = Hierarchy::build(&rows).unwrap_err();
        assert!(matches!(err, DecoPathError::DuplicateHierarchy { ref source_id, .. } if source_id == "hsa2"));
    }

    #[test]
    fn test_unknown_mapping_type_is_rejected() {
        let mut rows = rows();
        rows.push(OntologyRow::new(("KEGG", "hsa3", "Y"), "narrower", ("DecoPath", "DC1", "Super X")));
        assert!(matches!(
            Hierarchy::build(&rows).unwrap_err(),
            DecoPathError::UnknownMappingType { .. }
        ));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let rows = vec![
            OntologyRow::new(("DecoPath", "DC2", "B"), IS_PART_OF, ("DecoPath", "DC1", "A")),
            OntologyRow::new(("DecoPath", "DC1", "A"), IS_PART_OF, ("DecoPath", "DC2", "B")),
        ];
        assert!(matches!(
            Hierarchy::build(&rows).unwrap_err(),
            DecoPathError::CyclicHierarchy { .. }
        ));
    }

    #[test]
    fn test_kegg_prefix_is_stripped() {
        let rows = vec![
            OntologyRow::new(("DecoPath", "DC1", "A"), SUPER_PATHWAY, ("DecoPath", "DC1", "A")),
            OntologyRow::new(("KEGG", "path:hsa00010", "Glycolysis"), IS_PART_OF, ("DecoPath", "DC1", "A")),
        ];
        let build = Hierarchy::build(&rows).unwrap();
        assert!(build.hierarchy.contains("hsa00010"));
        assert!(!build.hierarchy.contains("path:hsa00010"));
        let node = build.tree.find("hsa00010").unwrap();
        assert_eq!(node.name, "Glycolysis");
        assert_eq!(node.database, "KEGG");
        assert_eq!(build.hierarchy.parents("hsa00010")[0].id, "DC1");
    }

    #[test]
    fn test_equivalences_do_not_enter_the_tree() {
        let mut rows = rows();
        rows.push(OntologyRow::new(("KEGG", "hsa2", "Y"), EQUIVALENT_TO, ("Reactome", "R-HSA-2", "Y")));
        let build = Hierarchy::build(&rows).unwrap();
        assert!(!build.hierarchy.contains("R-HSA-2"));
        assert_eq!(build.equivalence.len(), 2);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let first = Hierarchy::build(&rows()).unwrap();
        let second = Hierarchy::build(&rows()).unwrap();
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn test_tree_serializes_nested() {
        let build = Hierarchy::build(&rows()).unwrap();
        let json = serde_json::to_value(&build.tree).unwrap();
        assert_eq!(json["children"][0]["id"], "DC1");
        assert_eq!(json["children"][0]["children"][1]["name"], "Y");
        assert!(json["children"][0]["children"][1].get("children").is_none());
    }
}
