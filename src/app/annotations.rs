use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::analysis::{
    FraudResult, FraudRing, RingPattern, RiskIntelligence, RiskLevel, RiskRecord, TransferRecord,
};

/// Directed `(source, target)` account pair.
pub(in crate::app) type EdgeKey = (String, String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(in crate::app) enum FraudPattern {
    Cycle,
    Smurfing,
    ShellChain,
}

impl FraudPattern {
    pub(in crate::app) const ALL: [Self; 3] = [Self::Cycle, Self::Smurfing, Self::ShellChain];

    fn from_ring(pattern: RingPattern) -> Option<Self> {
        match pattern {
            RingPattern::Cycle => Some(Self::Cycle),
            RingPattern::FanIn | RingPattern::FanOut => Some(Self::Smurfing),
            RingPattern::ShellChain => Some(Self::ShellChain),
            RingPattern::Other => None,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Cycle => 0,
            Self::Smurfing => 1,
            Self::ShellChain => 2,
        }
    }

    pub(in crate::app) fn label(self) -> &'static str {
        match self {
            Self::Cycle => "Cycles",
            Self::Smurfing => "Smurfing",
            Self::ShellChain => "Shell chains",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct Suspicion {
    pub(in crate::app) score: f64,
    pub(in crate::app) ring_id: Option<String>,
    pub(in crate::app) patterns: Vec<String>,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct RiskEntry {
    pub(in crate::app) record: RiskRecord,
    pub(in crate::app) level: Option<RiskLevel>,
}

#[derive(Debug, Default)]
pub(in crate::app) struct AnnotationIndex {
    suspicious: HashMap<String, Suspicion>,
    risk: HashMap<String, RiskEntry>,
    ring_membership: HashMap<String, String>,
    rings: Vec<FraudRing>,
    ring_by_id: HashMap<String, usize>,
    pattern_nodes: [HashSet<String>; 3],
}

impl AnnotationIndex {
    pub(in crate::app) fn build(
        fraud: Option<&FraudResult>,
        risk: Option<&RiskIntelligence>,
    ) -> Self {
        let mut index = Self::default();

        if let Some(fraud) = fraud {
            for ring in &fraud.fraud_rings {
                let pattern = FraudPattern::from_ring(ring.pattern_type);
                for member in &ring.member_accounts {
                    index
                        .ring_membership
                        .entry(member.clone())
                        .or_insert_with(|| ring.ring_id.clone());
                    if let Some(pattern) = pattern {
                        index.pattern_nodes[pattern.slot()].insert(member.clone());
                    }
                }
                index
                    .ring_by_id
                    .entry(ring.ring_id.clone())
                    .or_insert(index.rings.len());
                index.rings.push(ring.clone());
            }

            for account in &fraud.suspicious_accounts {
                let ring_id = account
                    .ring_id
                    .clone()
                    .or_else(|| index.ring_membership.get(&account.account_id).cloned());
                index.suspicious.insert(
                    account.account_id.clone(),
                    Suspicion {
                        score: account.score,
                        ring_id,
                        patterns: account.patterns.clone(),
                    },
                );
            }
        }

        if let Some(risk) = risk {
            for record in &risk.risk_scores {
                let level = record
                    .risk_level
                    .as_deref()
                    .and_then(|raw| match raw.parse::<RiskLevel>() {
                        Ok(level) => Some(level),
                        Err(error) => {
                            warn!(account = %record.account_id, %error, "falling back to score tier");
                            None
                        }
                    });
                index.risk.insert(
                    record.account_id.clone(),
                    RiskEntry {
                        record: record.clone(),
                        level,
                    },
                );
            }
        }

        debug!(
            suspicious = index.suspicious.len(),
            risk = index.risk.len(),
            rings = index.rings.len(),
            "rebuilt annotation index"
        );
        index
    }

    pub(in crate::app) fn suspicion(&self, id: &str) -> Option<&Suspicion> {
        self.suspicious.get(id)
    }

    pub(in crate::app) fn is_suspicious(&self, id: &str) -> bool {
        self.suspicious.contains_key(id)
    }

    pub(in crate::app) fn suspicious_ids(&self) -> impl Iterator<Item = &str> {
        self.suspicious.keys().map(String::as_str)
    }

    pub(in crate::app) fn risk(&self, id: &str) -> Option<&RiskEntry> {
        self.risk.get(id)
    }

    pub(in crate::app) fn ring_of(&self, id: &str) -> Option<&str> {
        self.ring_membership.get(id).map(String::as_str)
    }

    pub(in crate::app) fn ring(&self, ring_id: &str) -> Option<&FraudRing> {
        self.ring_by_id
            .get(ring_id)
            .and_then(|&index| self.rings.get(index))
    }

    pub(in crate::app) fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Suspicion scores outrank risk-intelligence scores for styling.
    pub(in crate::app) fn score_for(&self, id: &str) -> f64 {
        self.suspicious
            .get(id)
            .map(|suspicion| suspicion.score)
            .or_else(|| self.risk.get(id).map(|entry| entry.record.risk_score))
            .unwrap_or(0.0)
    }

    pub(in crate::app) fn risk_level_for(&self, id: &str) -> RiskLevel {
        self.risk
            .get(id)
            .and_then(|entry| entry.level)
            .unwrap_or_else(|| RiskLevel::from_score(self.score_for(id)))
    }

    pub(in crate::app) fn patterns_for(&self, id: &str) -> BTreeSet<String> {
        let mut patterns = BTreeSet::new();
        if let Some(suspicion) = self.suspicious.get(id) {
            patterns.extend(suspicion.patterns.iter().cloned());
        }
        if let Some(entry) = self.risk.get(id) {
            patterns.extend(entry.record.patterns.iter().cloned());
        }
        if let Some(ring) = self.ring_of(id).and_then(|ring_id| self.ring(ring_id)) {
            patterns.insert(ring.pattern_type.label().to_owned());
        }
        patterns
    }

    pub(in crate::app) fn pattern_nodes(&self, pattern: FraudPattern) -> &HashSet<String> {
        &self.pattern_nodes[pattern.slot()]
    }

    /// Member count of every pattern, in [`FraudPattern::ALL`] order.
    pub(in crate::app) fn pattern_counts(&self) -> [(FraudPattern, usize); 3] {
        FraudPattern::ALL.map(|pattern| (pattern, self.pattern_nodes[pattern.slot()].len()))
    }

    pub(in crate::app) fn pattern_links(
        &self,
        pattern: FraudPattern,
        edges: &[TransferRecord],
    ) -> HashSet<EdgeKey> {
        let members = self.pattern_nodes(pattern);
        edges
            .iter()
            .filter(|edge| members.contains(&edge.source) && members.contains(&edge.target))
            .map(|edge| (edge.source.clone(), edge.target.clone()))
            .collect()
    }
}
