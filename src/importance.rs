//! Importance ranking — a bounded, ordered list for bar display.

use serde::Serialize;

use crate::models::ImportanceItem;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Bars displayed; items ranked beyond this are dropped, not paginated.
const MAX_BARS: usize = 15;

/// Width denominator floor — keeps the division defined when every
/// magnitude is zero.
const WIDTH_EPSILON: f64 = 1e-4;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// One displayed bar: magnitude plus its width relative to the top item.
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceBar {
    pub feature: String,
    pub importance: f64,
    /// Percentage of the track width, 0–100. The top-ranked bar is 100
    /// unless all magnitudes are zero.
    pub width_pct: f64,
}

// ═══════════════════════════════════════════════════════════
// Ranking
// ═══════════════════════════════════════════════════════════

/// Rank importance items for display.
///
/// Magnitudes rank by absolute value (SHAP-style signed inputs are
/// equivalent to their unsigned counterparts). Duplicate feature keys keep
/// the first occurrence. The sort is stable, so equal magnitudes retain
/// input order — there is no secondary tie-break field.
pub fn rank_importance(items: &[ImportanceItem]) -> Vec<ImportanceBar> {
    let mut deduped: Vec<ImportanceItem> = Vec::with_capacity(items.len());
    for item in items {
        if deduped.iter().any(|seen| seen.feature == item.feature) {
            continue;
        }
        deduped.push(ImportanceItem {
            feature: item.feature.clone(),
            importance: item.importance.abs(),
        });
    }

    deduped.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    deduped.truncate(MAX_BARS);

    let denominator = deduped
        .first()
        .map(|top| top.importance)
        .unwrap_or(0.0)
        .max(WIDTH_EPSILON);

    deduped
        .into_iter()
        .map(|item| ImportanceBar {
            width_pct: (item.importance / denominator * 100.0).max(0.0),
            feature: item.feature,
            importance: item.importance,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
