use crate::model::AttemptResult;
use crate::policy::Policy;
use serde::{Deserialize, Serialize};

/// Distinct versions seen on successful and on failed attempts, first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSets {
    pub supported: Vec<String>,
    pub unsupported: Vec<String>,
}

/// Results without a version (nothing was attempted on the wire) stay out of
/// both sets. The two sets are not reconciled against each other.
pub fn classify(results: &[AttemptResult]) -> VersionSets {
    let mut sets = VersionSets::default();
    for result in results {
        let Some(version) = result.version.as_deref() else {
            continue;
        };
        let bucket = if result.success {
            &mut sets.supported
        } else {
            &mut sets.unsupported
        };
        if !bucket.iter().any(|seen| seen == version) {
            bucket.push(version.to_string());
        }
    }
    sets
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// One entry per candidate method, in configured order.
    pub results: Vec<AttemptResult>,
    pub supported: Vec<String>,
    pub unsupported: Vec<String>,
    pub is_good: bool,
}

impl CheckReport {
    pub fn from_results(results: Vec<AttemptResult>, policy: &Policy) -> Self {
        let VersionSets {
            supported,
            unsupported,
        } = classify(&results);
        let is_good = policy.evaluate(&supported);
        Self {
            results,
            supported,
            unsupported,
            is_good,
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = &AttemptResult> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AttemptResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
