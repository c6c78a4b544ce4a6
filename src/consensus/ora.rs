use crate::consensus::{ConsensusTable, Group, Verdict, build_table, check_consensus};
use crate::enrichment::{EnrichmentMethod, EnrichmentRecord};
use crate::error::Result;
use crate::mapping::{Database, EquivalenceStore};

/// Consensus table for ORA results. Only the side of the threshold each q-value falls on is
/// compared; ORA carries no direction.
pub fn generate_consensus_table_ora<R: EnrichmentRecord>(
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
        EnrichmentMethod::Ora,
        classify,
    )
}

fn classify(group: &Group, significance_value: f64) -> (Verdict, Verdict) {
    let verdict = check_consensus(&group.fdr_list, significance_value, 2);

    let Some((_, dc_fdr)) = group.decopath else {
        return (verdict, Verdict::NoMapping);
    };
    if check_consensus(&group.fdr_list, significance_value, 1) == Verdict::NoMapping {
        return (verdict, Verdict::NoMapping);
    }

    let t = significance_value;
    let decopath_verdict = if (dc_fdr < t && group.fdr_list.iter().all(|&q| q < t))
        || (dc_fdr > t && group.fdr_list.iter().all(|&q| q > t))
    {
        Verdict::Concordant
    } else {
        Verdict::Discordant
    };

    (verdict, decopath_verdict)
}
