use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use super::InputError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphDataset {
    #[serde(default)]
    pub nodes: Vec<AccountRecord>,
    #[serde(default)]
    pub edges: Vec<TransferRecord>,
}

impl GraphDataset {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keeps the first record for every account id and returns how many were dropped.
    pub fn dedup_accounts(&mut self) -> usize {
        let before = self.nodes.len();
        let mut seen = std::collections::HashSet::with_capacity(before);
        self.nodes.retain(|node| seen.insert(node.id.clone()));
        before - self.nodes.len()
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AccountRecord {
    pub id: String,
    #[serde(default)]
    pub in_degree: u32,
    #[serde(default)]
    pub out_degree: u32,
    #[serde(default)]
    pub total_amount_sent: f64,
    #[serde(default)]
    pub total_amount_received: f64,
    #[serde(default)]
    pub net_flow: f64,
    #[serde(default)]
    pub total_transactions: u32,
}

impl AccountRecord {
    pub fn degree(&self) -> u32 {
        self.in_degree.saturating_add(self.out_degree)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TransferRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub transaction_count: u32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FraudResult {
    #[serde(default)]
    pub fraud_rings: Vec<FraudRing>,
    #[serde(default)]
    pub suspicious_accounts: Vec<SuspiciousAccount>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FraudRing {
    pub ring_id: String,
    pub pattern_type: RingPattern,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub member_count: usize,
    #[serde(default)]
    pub member_accounts: Vec<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RingPattern {
    Cycle,
    FanIn,
    FanOut,
    ShellChain,
    #[serde(other)]
    Other,
}

impl RingPattern {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cycle => "cycle",
            Self::FanIn => "fan_in",
            Self::FanOut => "fan_out",
            Self::ShellChain => "shell_chain",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SuspiciousAccount {
    pub account_id: String,
    #[serde(default, alias = "suspicion_score")]
    pub score: f64,
    #[serde(default, alias = "detected_patterns")]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub ring_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RiskIntelligence {
    #[serde(default)]
    pub risk_scores: Vec<RiskRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RiskRecord {
    pub account_id: String,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub risk_factors: BTreeMap<String, Value>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const HIGH_THRESHOLD: f64 = 70.0;
    pub const MEDIUM_THRESHOLD: f64 = 40.0;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            Self::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskLevel {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(InputError::UnknownRiskLevel(value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_tiers_are_inclusive_at_lower_bound() {
        assert_eq!(RiskLevel::from_score(69.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(40.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
    }

    #[test]
    fn risk_level_parses_case_insensitively() {
        assert_eq!("critical".parse::<RiskLevel>().ok(), Some(RiskLevel::Critical));
        assert_eq!(" High ".parse::<RiskLevel>().ok(), Some(RiskLevel::High));
        assert!(matches!(
            "severe".parse::<RiskLevel>(),
            Err(InputError::UnknownRiskLevel(level)) if level == "severe"
        ));
    }

    #[test]
    fn dedup_keeps_first_account_record() {
        let mut dataset = GraphDataset {
            nodes: vec![
                AccountRecord {
                    id: "A".into(),
                    in_degree: 1,
                    ..Default::default()
                },
                AccountRecord {
                    id: "B".into(),
                    ..Default::default()
                },
                AccountRecord {
                    id: "A".into(),
                    in_degree: 9,
                    ..Default::default()
                },
            ],
            edges: Vec::new(),
        };

        assert_eq!(dataset.dedup_accounts(), 1);
        assert_eq!(dataset.node_count(), 2);
        assert_eq!(dataset.nodes[0].in_degree, 1);
    }
}
