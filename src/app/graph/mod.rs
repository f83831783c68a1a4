mod build;
mod style;
mod interaction;
mod view;

pub(in crate::app) use build::build_render_graph;

#[cfg(test)]
pub(in crate::app) mod fixtures {
    use crate::analysis::{
        AccountRecord, FraudResult, FraudRing, GraphDataset, RingPattern, RiskIntelligence,
        RiskRecord, SuspiciousAccount, TransferRecord,
    };

    use super::super::annotations::AnnotationIndex;
    use super::super::{Filters, RenderGraph};
    use super::build_render_graph;

    pub(in crate::app) fn account(id: &str) -> AccountRecord {
        AccountRecord {
            id: id.to_owned(),
            ..AccountRecord::default()
        }
    }

    pub(in crate::app) fn transfer(source: &str, target: &str, amount: f64) -> TransferRecord {
        TransferRecord {
            source: source.to_owned(),
            target: target.to_owned(),
            amount,
            transaction_count: 1,
        }
    }

    pub(in crate::app) fn dataset(ids: &[&str], edges: &[(&str, &str, f64)]) -> GraphDataset {
        GraphDataset {
            nodes: ids.iter().map(|id| account(id)).collect(),
            edges: edges
                .iter()
                .map(|(source, target, amount)| transfer(source, target, *amount))
                .collect(),
        }
    }

    pub(in crate::app) fn render_graph(ids: &[&str], edges: &[(&str, &str, f64)]) -> RenderGraph {
        build_render_graph(
            &dataset(ids, edges),
            &AnnotationIndex::default(),
            Filters::default(),
        )
    }

    /// Suspicious accounts with their scores, plus risk records as `(id, score, level)`.
    pub(in crate::app) fn annotated(
        suspicious: &[(&str, f64)],
        risk: &[(&str, f64, &str)],
    ) -> AnnotationIndex {
        let fraud = FraudResult {
            fraud_rings: Vec::new(),
            suspicious_accounts: suspicious
                .iter()
                .map(|(id, score)| SuspiciousAccount {
                    account_id: (*id).to_owned(),
                    score: *score,
                    patterns: Vec::new(),
                    ring_id: None,
                })
                .collect(),
        };
        let risk = RiskIntelligence {
            risk_scores: risk
                .iter()
                .map(|(id, score, level)| RiskRecord {
                    account_id: (*id).to_owned(),
                    risk_score: *score,
                    risk_level: Some((*level).to_owned()),
                    risk_factors: Default::default(),
                    patterns: Vec::new(),
                })
                .collect(),
        };
        AnnotationIndex::build(Some(&fraud), Some(&risk))
    }

    /// Three-account cycle ring `R1 = {A, B, C}` plus a small outgoing transfer to `D`.
    pub(in crate::app) fn cycle_scenario() -> (GraphDataset, AnnotationIndex) {
        let dataset = dataset(
            &["A", "B", "C", "D"],
            &[
                ("A", "B", 100.0),
                ("B", "C", 100.0),
                ("C", "A", 100.0),
                ("C", "D", 5.0),
            ],
        );
        let fraud = FraudResult {
            fraud_rings: vec![FraudRing {
                ring_id: "R1".to_owned(),
                pattern_type: RingPattern::Cycle,
                risk_score: 91.0,
                member_count: 3,
                member_accounts: vec!["A".to_owned(), "B".to_owned(), "C".to_owned()],
            }],
            suspicious_accounts: ["A", "B", "C"]
                .iter()
                .map(|id| SuspiciousAccount {
                    account_id: (*id).to_owned(),
                    score: 88.0,
                    patterns: vec!["cycle_length_3".to_owned()],
                    ring_id: Some("R1".to_owned()),
                })
                .collect(),
        };
        let annotations = AnnotationIndex::build(Some(&fraud), None);
        (dataset, annotations)
    }
}
