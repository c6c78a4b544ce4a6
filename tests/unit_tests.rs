use decopath_consensus::consensus::{Verdict, generate_consensus_table_gsea, generate_consensus_table_ora};
use decopath_consensus::enrichment::{GseaRecord, OraRecord};
use decopath_consensus::mapping::{Database, EquivalenceStore, Pathway, PathwayKey};
use decopath_consensus::testing::correction::benjamini_hochberg_correction;
use proptest::prelude::*;

fn grouped_store() -> EquivalenceStore {
    let mut store = EquivalenceStore::new();
    let members = [
        Pathway::new("hsa1", "X", Database::Kegg).with_canonical("DC1", "Super X"),
        Pathway::new("R-HSA-1", "X", Database::Reactome).with_canonical("DC1", "Super X"),
        Pathway::new("WP1", "X", Database::WikiPathways).with_canonical("DC1", "Super X"),
    ];
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            store.add_equivalence(a.clone(), b.clone()).unwrap();
        }
    }
    store
}

fn selected() -> Vec<Database> {
    vec![Database::Kegg, Database::Reactome, Database::WikiPathways]
}

#[cfg(test)]
mod correction_properties {
    use super::*;

    proptest! {
        #[test]
        fn bh_is_monotone_and_never_below_p(p_values in prop::collection::vec(1e-12f64..=1.0, 1..60)) {
            let q_values = benjamini_hochberg_correction(&p_values).unwrap();

            let mut order: Vec<usize> = (0..p_values.len()).collect();
            order.sort_by(|&a, &b| p_values[a].partial_cmp(&p_values[b]).unwrap());

            for pair in order.windows(2) {
                prop_assert!(q_values[pair[0]] <= q_values[pair[1]] + 1e-12);
            }
            for (p, q) in p_values.iter().zip(&q_values) {
                prop_assert!(*q >= *p - 1e-12);
                prop_assert!(*q <= 1.0);
            }
        }
    }
}

#[cfg(test)]
mod store_properties {
    use super::*;

    const IDS: [(&str, Database); 6] = [
        ("hsa1", Database::Kegg),
        ("hsa2", Database::Kegg),
        ("R-HSA-1", Database::Reactome),
        ("R-HSA-2", Database::Reactome),
        ("WP1", Database::WikiPathways),
        ("PW1", Database::PathBank),
    ];

    fn pathway(i: usize) -> Pathway {
        let (id, database) = &IDS[i];
        Pathway::new(*id, *id, database.clone())
    }

    proptest! {
        #[test]
        fn equivalence_is_symmetric(edges in prop::collection::vec((0usize..6, 0usize..6), 0..30)) {
            let mut store = EquivalenceStore::new();
            for &(a, b) in &edges {
                store.add_equivalence(pathway(a), pathway(b)).unwrap();
            }
            store.verify_symmetry().unwrap();

            for &(a, b) in edges.iter().filter(|(a, b)| a != b) {
                let key_a = pathway(a).key();
                let key_b = pathway(b).key();
                prop_assert!(store.equivalents(&key_a).iter().any(|p| p.key() == key_b));
                prop_assert!(store.equivalents(&key_b).iter().any(|p| p.key() == key_a));
            }
        }
    }

    #[test]
    fn self_equivalence_adds_no_edge() {
        let mut store = EquivalenceStore::new();
        store.add_equivalence(pathway(0), pathway(0)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.edge_count(), 0);
        assert!(store.equivalents(&PathwayKey::new("hsa1", Database::Kegg)).is_empty());
    }
}

#[cfg(test)]
mod consensus_properties {
    use super::*;

    fn ora_records(q_values: &[Option<f64>]) -> Vec<OraRecord> {
        ["hsa1", "R-HSA-1", "WP1"]
            .iter()
            .zip(q_values)
            .filter_map(|(id, q)| {
                q.map(|q_value| OraRecord {
                    pathway_id: id.to_string(),
                    p_value: q_value,
                    q_value,
                })
            })
            .collect()
    }

    proptest! {
        #[test]
        fn emitted_rows_have_two_databases(
            q_values in prop::collection::vec(prop::option::of(0.0001f64..1.0), 3)
        ) {
            let records = ora_records(&q_values);
            let table = generate_consensus_table_ora(&records, &grouped_store(), &selected(), 0.05).unwrap();

            let present = q_values.iter().filter(|q| q.is_some()).count();
            prop_assert_eq!(table.len(), usize::from(present >= 2));
            for row in &table.rows {
                prop_assert!(row.populated(&table.columns) >= 2);
                prop_assert_ne!(row.verdict, Verdict::NoMapping);
            }
        }

        #[test]
        fn flipping_one_sign_breaks_concordance(
            scores in prop::collection::vec(0.1f64..3.0, 3),
            q_values in prop::collection::vec(0.0001f64..0.049, 3),
            negative in any::<bool>(),
            flipped in 0usize..3,
        ) {
            let sign = if negative { -1.0 } else { 1.0 };
            let ids = ["hsa1", "R-HSA-1", "WP1"];
            let mut records: Vec<GseaRecord> = ids
                .iter()
                .zip(scores.iter().zip(&q_values))
                .map(|(id, (score, q))| GseaRecord::new(*id, sign * score, *q))
                .collect();

            let table = generate_consensus_table_gsea(&records, &grouped_store(), &selected(), 0.05).unwrap();
            prop_assert_eq!(table.verdicts(), vec![Verdict::Concordant]);
            for row_scores in table.scores() {
                let scores: Vec<f64> = row_scores.into_iter().flatten().collect();
                prop_assert!(scores.iter().all(|s| s.signum() == sign));
            }

            records[flipped].nes = -records[flipped].nes;
            let table = generate_consensus_table_gsea(&records, &grouped_store(), &selected(), 0.05).unwrap();
            prop_assert_eq!(table.verdicts(), vec![Verdict::Discordant]);
        }
    }
}
