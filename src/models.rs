//! Canonical records for the dashboard core.
//!
//! The normalized, defaulted in-memory shape of every entity the dashboard
//! works with, independent of how the source payload was structured.
//! `PatientSummary.id` is the sole join key across all derived fetches
//! (vitals, explain); no entity is ever looked up by anything else.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Risk thresholds
// ═══════════════════════════════════════════════════════════

/// Scores above this bound are High risk.
///
/// Mirrors the prediction server's risk bins. The client recomputes the
/// category from the score only when the server omits it; if a server-sent
/// category ever disagrees with these bounds, that is a defect on one side,
/// not something to special-case here.
pub const RISK_HIGH_THRESHOLD: f64 = 0.7;

/// Scores above this bound (and at or below [`RISK_HIGH_THRESHOLD`]) are Medium risk.
pub const RISK_MEDIUM_THRESHOLD: f64 = 0.4;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Risk category bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Fallback categorization when the server omits the category.
    pub fn from_score(score: f64) -> Self {
        if score > RISK_HIGH_THRESHOLD {
            Self::High
        } else if score > RISK_MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Lenient parse of a server-sent category string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable cohort-list snapshot of one patient.
///
/// Used only for list rendering and selection identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: i64,
    pub risk_score: Option<f64>,
    pub risk_category: Option<RiskCategory>,
    pub last_checkin: Option<String>,
}

/// A cohort patient: summary plus the raw model-feature object.
///
/// The features ride along because the explain fetch posts them back to the
/// prediction service. For payloads without a `features` key the whole raw
/// object stands in (the service tolerates extra fields).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub summary: PatientSummary,
    pub features: serde_json::Map<String, serde_json::Value>,
}

impl PatientRecord {
    pub fn id(&self) -> i64 {
        self.summary.id
    }
}

/// One point of a vitals series. Sequence order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsPoint {
    pub label: String,
    pub value: f64,
}

/// One feature's global importance. `importance` is always the absolute
/// magnitude; sign normalization happens at the normalizer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceItem {
    pub feature: String,
    pub importance: f64,
}

/// A single feature's contribution to a computed risk score.
///
/// `direction` is free-form ("up"/"down" from the current service, but any
/// string is tolerated and rendered verbatim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub feature: String,
    pub direction: String,
    pub magnitude: f64,
}

/// Result of a predict+explain fetch, replaced wholesale on every success.
///
/// The unknown sentinel (NaN score, empty category, no attributions) is what
/// a failed fetch collapses to — a failed explain must never leave a
/// previous patient's score on screen. Not serialized: NaN has no JSON
/// representation; the view layer formats it as "—".
#[derive(Debug, Clone)]
pub struct ExplainResult {
    pub risk_score: f64,
    pub risk_category: String,
    pub attributions: Vec<Attribution>,
}

impl ExplainResult {
    /// The defined "unknown" state.
    pub fn unknown() -> Self {
        Self {
            risk_score: f64::NAN,
            risk_category: String::new(),
            attributions: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.risk_score.is_nan()
            && self.risk_category.is_empty()
            && self.attributions.is_empty()
    }
}

impl Default for ExplainResult {
    fn default() -> Self {
        Self::unknown()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_fallback_matches_thresholds() {
        assert_eq!(RiskCategory::from_score(0.82), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(0.55), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(0.12), RiskCategory::Low);
        // Bounds are exclusive: exactly at a threshold falls to the lower bucket.
        assert_eq!(
            RiskCategory::from_score(RISK_HIGH_THRESHOLD),
            RiskCategory::Medium
        );
        assert_eq!(
            RiskCategory::from_score(RISK_MEDIUM_THRESHOLD),
            RiskCategory::Low
        );
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(RiskCategory::parse("high"), Some(RiskCategory::High));
        assert_eq!(RiskCategory::parse(" MEDIUM "), Some(RiskCategory::Medium));
        assert_eq!(RiskCategory::parse("Low"), Some(RiskCategory::Low));
        assert_eq!(RiskCategory::parse("critical"), None);
        assert_eq!(RiskCategory::parse(""), None);
    }

    #[test]
    fn category_display() {
        assert_eq!(RiskCategory::High.to_string(), "High");
        assert_eq!(RiskCategory::Low.as_str(), "Low");
    }

    #[test]
    fn unknown_explain_is_sentinel() {
        let unknown = ExplainResult::unknown();
        assert!(unknown.risk_score.is_nan());
        assert!(unknown.risk_category.is_empty());
        assert!(unknown.attributions.is_empty());
        assert!(unknown.is_unknown());
    }

    #[test]
    fn populated_explain_is_not_unknown() {
        let explain = ExplainResult {
            risk_score: 0.42,
            risk_category: "Medium".to_string(),
            attributions: vec![],
        };
        assert!(!explain.is_unknown());
    }

    #[test]
    fn patient_summary_serializes_absent_fields_as_null() {
        let summary = PatientSummary {
            id: 7,
            risk_score: None,
            risk_category: None,
            last_checkin: None,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"id\":7"));
        assert!(json.contains("\"risk_score\":null"));
    }
}
