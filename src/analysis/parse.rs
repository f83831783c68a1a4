use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::InputError;
use super::records::{FraudResult, GraphDataset, RiskIntelligence};

fn parse_object<T: DeserializeOwned>(raw: &str, kind: &'static str, envelope: &str) -> Result<T> {
    let parsed: Value =
        serde_json::from_str(raw).with_context(|| format!("invalid JSON in {kind} document"))?;
    let object = parsed
        .as_object()
        .ok_or(InputError::NotAnObject { kind })?;

    // Analysis responses sometimes arrive wrapped, e.g. `{"graph": {...}}`.
    let body = match object.get(envelope) {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => parsed,
    };

    serde_json::from_value(body).with_context(|| format!("unexpected shape of {kind} document"))
}

pub(super) fn parse_dataset(raw: &str) -> Result<GraphDataset> {
    parse_object(raw, "graph dataset", "graph")
}

pub(super) fn parse_fraud_result(raw: &str) -> Result<FraudResult> {
    parse_object(raw, "fraud result", "result")
}

pub(super) fn parse_risk_intelligence(raw: &str) -> Result<RiskIntelligence> {
    parse_object(raw, "risk intelligence", "result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RingPattern;

    #[test]
    fn parses_dataset_with_missing_numeric_fields() {
        let raw = r#"{
            "nodes": [{"id": "A", "in_degree": 2}, {"id": "B"}],
            "edges": [{"source": "A", "target": "B", "amount": 12.5}]
        }"#;

        let dataset = parse_dataset(raw).expect("dataset parses");
        assert_eq!(dataset.node_count(), 2);
        assert_eq!(dataset.nodes[0].in_degree, 2);
        assert_eq!(dataset.nodes[1].total_transactions, 0);
        assert_eq!(dataset.edges[0].transaction_count, 0);
        assert!((dataset.edges[0].amount - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_wrapped_dataset() {
        let raw = r#"{"graph": {"nodes": [{"id": "X"}], "edges": []}}"#;
        let dataset = parse_dataset(raw).expect("wrapped dataset parses");
        assert_eq!(dataset.nodes[0].id, "X");
    }

    #[test]
    fn parses_fraud_result_with_aliases_and_unknown_pattern() {
        let raw = r#"{
            "fraud_rings": [
                {"ring_id": "R1", "pattern_type": "cycle", "risk_score": 91.0,
                 "member_count": 3, "member_accounts": ["A", "B", "C"]},
                {"ring_id": "R2", "pattern_type": "layering_v2", "member_accounts": ["Z"]}
            ],
            "suspicious_accounts": [
                {"account_id": "A", "suspicion_score": 88.0, "detected_patterns": ["cycle_length_3"]}
            ]
        }"#;

        let result = parse_fraud_result(raw).expect("fraud result parses");
        assert_eq!(result.fraud_rings[0].pattern_type, RingPattern::Cycle);
        assert_eq!(result.fraud_rings[1].pattern_type, RingPattern::Other);
        assert!((result.suspicious_accounts[0].score - 88.0).abs() < f64::EPSILON);
        assert_eq!(result.suspicious_accounts[0].patterns, vec!["cycle_length_3"]);
    }

    #[test]
    fn parses_risk_intelligence_factors() {
        let raw = r#"{"risk_scores": [
            {"account_id": "A", "risk_score": 55.0, "risk_level": "MEDIUM",
             "risk_factors": {"velocity": 0.8, "fan_out": 3}, "patterns": []}
        ]}"#;

        let risk = parse_risk_intelligence(raw).expect("risk parses");
        assert_eq!(risk.risk_scores[0].risk_level.as_deref(), Some("MEDIUM"));
        assert_eq!(risk.risk_scores[0].risk_factors.len(), 2);
    }

    #[test]
    fn rejects_non_object_documents() {
        let error = parse_dataset("[1, 2, 3]").expect_err("array is rejected");
        assert!(error.to_string().contains("graph dataset"));
        assert!(parse_fraud_result("{not json").is_err());
    }
}
