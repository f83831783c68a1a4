mod load;
mod parse;
mod records;

use thiserror::Error;

pub use load::{AnalysisBundle, InputPaths, load_analysis};
pub use records::{
    AccountRecord, FraudResult, FraudRing, GraphDataset, RingPattern, RiskIntelligence,
    RiskLevel, RiskRecord, SuspiciousAccount, TransferRecord,
};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unknown risk level {0:?}")]
    UnknownRiskLevel(String),
    #[error("{kind} document is not a JSON object")]
    NotAnObject { kind: &'static str },
}
