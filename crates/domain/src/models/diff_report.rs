//! Diff report produced by the analysis phase.

use serde::{Deserialize, Serialize};

/// Narrative comparison of two snapshots.
///
/// Derived and ephemeral: produced per analysis run, delivered as the email
/// body, and discarded (optionally echoed into the status blob).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Key of the older snapshot, e.g. `visitors20260818`.
    pub prior_key: String,
    /// Key of the newer snapshot, e.g. `visitors20260825`.
    pub current_key: String,
    /// Free-text narrative returned by the narrative engine.
    pub narrative: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_report_serialization() {
        let report = DiffReport {
            prior_key: "visitors20260818".to_string(),
            current_key: "visitors20260825".to_string(),
            narrative: "Traffic doubled.".to_string(),
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"prior_key\":\"visitors20260818\""));
        assert!(json.contains("\"current_key\":\"visitors20260825\""));
        assert!(json.contains("Traffic doubled."));
    }
}
