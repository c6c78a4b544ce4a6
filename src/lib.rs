//! # decopath-consensus
//!
//! Reconciliation of pathway enrichment results across pathway databases.
//!
//! Equivalent pathways from KEGG, Reactome, WikiPathways, PathBank (and user-submitted
//! databases) are grouped under canonical DecoPath ids. This crate computes enrichment for the
//! per-database gene sets, decides whether the databases agree on each canonical group, and
//! lays the results out over the DecoPath super-pathway hierarchy.
//!
//! ## Core Features
//!
//! - **Over-Representation Analysis**: one-sided Fisher's exact test per gene set with a
//!   Benjamini-Hochberg correction over the batch
//! - **Equivalence Store**: symmetric cross-database equivalence relation with canonical ids
//! - **Consensus tables**: Concordant/Discordant/no-mappings verdicts per canonical group for
//!   GSEA and ORA results
//! - **Hierarchy**: super-pathway tree built from the ontology, annotated and coloured per run
//!
//! ## Quick Start
//!
//! ```rust
//! use decopath_consensus::consensus::{Verdict, generate_consensus_table_gsea};
//! use decopath_consensus::enrichment::GseaRecord;
//! use decopath_consensus::mapping::{Database, EquivalenceStore, Pathway};
//!
//! let mut store = EquivalenceStore::new();
//! store
//!     .add_equivalence(
//!         Pathway::new("hsa1", "X", Database::Kegg).with_canonical("DC1", "Super X"),
//!         Pathway::new("WP1", "X", Database::WikiPathways).with_canonical("DC1", "Super X"),
//!     )
//!     .unwrap();
//!
//! let results = vec![GseaRecord::new("hsa1", 1.8, 0.01), GseaRecord::new("WP1", -2.1, 0.02)];
//! let table = generate_consensus_table_gsea(
//!     &results,
//!     &store,
//!     &[Database::Kegg, Database::WikiPathways],
//!     0.05,
//! )
//! .unwrap();
//! assert_eq!(table.verdicts(), vec![Verdict::Discordant]);
//! ```
//!
//! ## Module Organization
//!
//! - **[`testing`]**: Statistical tests and multiple testing correction
//! - **[`enrichment`]**: Gene sets, ORA and enrichment result records
//! - **[`mapping`]**: Databases, ontology rows and the equivalence store
//! - **[`consensus`]**: Cross-database consensus tables
//! - **[`hierarchy`]**: Super-pathway hierarchy and result annotation
//! - **[`config`]**: Analysis defaults
//! - **[`error`]**: Error taxonomy

pub mod config;
pub mod consensus;
pub mod enrichment;
pub mod error;
pub mod hierarchy;
pub mod mapping;
pub mod testing;

pub use config::AnalysisConfig;
pub use error::{DecoPathError, ErrorKind, Result};
