use crate::consensus::{ConsensusTable, Group, Verdict, build_table, check_consensus};
use crate::enrichment::{EnrichmentMethod, EnrichmentRecord};
use crate::error::Result;
use crate::mapping::{Database, EquivalenceStore};

/// Consensus table for GSEA results.
///
/// A group is concordant when every q-value falls on one side of `significance_value` and
/// every score has one sign. The DecoPath verdict compares the canonical pathway's own result
/// with the group; there, a q-value equal to the threshold never agrees.
pub fn generate_consensus_table_gsea<R: EnrichmentRecord>(
    records: &[R],
    store: &EquivalenceStore,
    databases: &[Database],
    significance_value: f64,
) -> Result<ConsensusTable> {
    build_table(
        records,
        store,
        databases,
        significance_value,
        EnrichmentMethod::Gsea,
        classify,
    )
}

fn classify(group: &Group, significance_value: f64) -> (Verdict, Verdict) {
    let sig_consensus = check_consensus(&group.fdr_list, significance_value, 2);
    let score_consensus = check_consensus(&group.scores, 0.0, 2);

    let verdict = match (sig_consensus, score_consensus) {
        (Verdict::NoMapping, _) => Verdict::NoMapping,
        (Verdict::Concordant, Verdict::Concordant) => Verdict::Concordant,
        _ => Verdict::Discordant,
    };

    (verdict, decopath_verdict(group, significance_value))
}

fn decopath_verdict(group: &Group, significance_value: f64) -> Verdict {
    let Some((Some(dc_score), dc_fdr)) = group.decopath else {
        return Verdict::NoMapping;
    };
    if check_consensus(&group.fdr_list, significance_value, 1) == Verdict::NoMapping {
        return Verdict::NoMapping;
    }

    let t = significance_value;
    let same_side = (dc_fdr < t && group.fdr_list.iter().all(|&q| q < t))
        || (dc_fdr > t && group.fdr_list.iter().all(|&q| q > t));
    let same_sign = (dc_score > 0.0 && group.scores.iter().all(|&s| s > 0.0))
        || (dc_score < 0.0 && group.scores.iter().all(|&s| s < 0.0));

    if same_side && same_sign {
        Verdict::Concordant
    } else {
        Verdict::Discordant
    }
}
