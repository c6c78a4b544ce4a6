//! Error taxonomy for the reconciliation engine.
//!
//! Every failure raised by this crate is fatal for the run that triggered it. Recoverable
//! lookup gaps (a pathway missing from a result table) are never errors; they surface as
//! `None` slots in the consensus output.

/// Coarse classification of a [`DecoPathError`], used by callers to decide how to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inconsistent mapping or ontology data. Loading must abort.
    DataIntegrity,
    /// Nothing left to compute on (no gene sets, no mapped hierarchy nodes).
    EmptyResult,
    /// Arguments outside their valid domain.
    InvalidInput,
}

#[derive(Debug, thiserror::Error)]
pub enum DecoPathError {
    #[error("duplicate hierarchy: '{source_id}' is part of both '{first_parent}' and '{second_parent}'")]
    DuplicateHierarchy {
        source_id: String,
        first_parent: String,
        second_parent: String,
    },

    #[error("invalid mapping type '{mapping}' for '{source_id}' -> '{target_id}'")]
    UnknownMappingType {
        mapping: String,
        source_id: String,
        target_id: String,
    },

    #[error("pathway '{pathway_id}' ({database}) has canonical id '{existing}', refusing '{conflicting}'")]
    ConflictingCanonicalId {
        pathway_id: String,
        database: String,
        existing: String,
        conflicting: String,
    },

    #[error("{source_id} has {source_count} mappings but {target_id} has {target_count} mappings")]
    AsymmetricEquivalence {
        source_id: String,
        source_count: usize,
        target_id: String,
        target_count: usize,
    },

    #[error("hierarchy contains a cycle through '{node}'")]
    CyclicHierarchy { node: String },

    #[error("renaming hierarchy node '{from}' to '{to}' collides with an existing node")]
    NodeRenameCollision { from: String, to: String },

    #[error("no gene sets passed the filter min_size={min_size}, max_size={max_size}")]
    NoGeneSetsPassedFilter { min_size: usize, max_size: usize },

    #[error("could not map any result to a pathway in the hierarchy")]
    NoHierarchyMatch,

    #[error("none of the {mapped} results mapped to the hierarchy carries a score")]
    MissingScores { mapped: usize },

    #[error("significance threshold must lie in (0, 1), got {0}")]
    InvalidThreshold(f64),

    #[error("gene set size bounds must satisfy min < max, got min={min_size}, max={max_size}")]
    InvalidSizeBounds { min_size: usize, max_size: usize },

    #[error("gene universe of {universe} is smaller than the {required} genes in '{pathway_id}' and the query")]
    UniverseTooSmall {
        pathway_id: String,
        universe: u64,
        required: u64,
    },

    #[error("failed to read GMT line {line}")]
    GmtRead {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed GMT line {line}: {reason}")]
    MalformedGmt { line: usize, reason: String },

    #[error("root '{0}' is not a node of the hierarchy")]
    UnknownRoot(String),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Statistics(#[from] anyhow::Error),
}

impl DecoPathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecoPathError::DuplicateHierarchy { .. }
            | DecoPathError::UnknownMappingType { .. }
            | DecoPathError::ConflictingCanonicalId { .. }
            | DecoPathError::AsymmetricEquivalence { .. }
            | DecoPathError::CyclicHierarchy { .. }
            | DecoPathError::NodeRenameCollision { .. } => ErrorKind::DataIntegrity,
            DecoPathError::NoGeneSetsPassedFilter { .. }
            | DecoPathError::NoHierarchyMatch
            | DecoPathError::MissingScores { .. } => ErrorKind::EmptyResult,
            DecoPathError::InvalidThreshold(_)
            | DecoPathError::InvalidSizeBounds { .. }
            | DecoPathError::UniverseTooSmall { .. }
            | DecoPathError::UnknownRoot(_)
            | DecoPathError::InvalidConfig { .. }
            | DecoPathError::GmtRead { .. }
            | DecoPathError::MalformedGmt { .. }
            | DecoPathError::Statistics(_) => ErrorKind::InvalidInput,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecoPathError>;

/// Rejects significance thresholds outside the open unit interval.
pub(crate) fn check_threshold(significance_value: f64) -> Result<()> {
    if significance_value > 0.0 && significance_value < 1.0 {
        Ok(())
    } else {
        Err(DecoPathError::InvalidThreshold(significance_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = DecoPathError::NoHierarchyMatch;
        assert_eq!(err.kind(), ErrorKind::EmptyResult);

        let err = DecoPathError::CyclicHierarchy { node: "DC1".into() };
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);

        let err = DecoPathError::from(anyhow::anyhow!("Empty p-value array"));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "Empty p-value array");
    }

    #[test]
    fn test_check_threshold() {
        assert!(check_threshold(0.05).is_ok());
        assert!(check_threshold(0.0).is_err());
        assert!(check_threshold(1.0).is_err());
        assert!(check_threshold(f64::NAN).is_err());
    }
}
