use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::parse::{parse_dataset, parse_fraud_result, parse_risk_intelligence};
use super::records::{FraudResult, GraphDataset, RiskIntelligence};

#[derive(Clone, Debug, Default)]
pub struct InputPaths {
    pub dataset: Option<PathBuf>,
    pub fraud: Option<PathBuf>,
    pub risk: Option<PathBuf>,
}

/// Everything the analysis service produced for one investigation.
#[derive(Clone, Debug, Default)]
pub struct AnalysisBundle {
    pub dataset: Option<GraphDataset>,
    pub fraud: Option<FraudResult>,
    pub risk: Option<RiskIntelligence>,
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_optional<T>(
    path: Option<&Path>,
    kind: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Option<T> {
    let path = path?;
    match read_document(path).and_then(|raw| parse(&raw)) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(path = %path.display(), error = %format!("{error:#}"), "ignoring {kind} document");
            None
        }
    }
}

/// The dataset is mandatory once a path is given; analysis annotations are best-effort.
pub fn load_analysis(paths: &InputPaths) -> Result<AnalysisBundle> {
    let dataset = match paths.dataset.as_deref() {
        Some(path) => {
            let raw = read_document(path)?;
            let mut dataset = parse_dataset(&raw)
                .with_context(|| format!("failed to parse dataset {}", path.display()))?;
            let dropped = dataset.dedup_accounts();
            if dropped > 0 {
                warn!(dropped, "dataset listed duplicate account ids");
            }
            info!(
                nodes = dataset.node_count(),
                edges = dataset.edge_count(),
                "loaded transaction graph"
            );
            Some(dataset)
        }
        None => None,
    };

    let fraud = load_optional(paths.fraud.as_deref(), "fraud result", parse_fraud_result);
    let risk = load_optional(paths.risk.as_deref(), "risk intelligence", parse_risk_intelligence);

    if let Some(fraud) = &fraud {
        info!(
            rings = fraud.fraud_rings.len(),
            suspicious = fraud.suspicious_accounts.len(),
            "loaded fraud result"
        );
    }

    Ok(AnalysisBundle {
        dataset,
        fraud,
        risk,
    })
}
