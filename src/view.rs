//! View composition — controller state to render-ready view models.
//!
//! Assembles one serializable snapshot per fetch so the shell renders each
//! region (cohort table, detail panel, chart, bars) independently. All
//! number/label formatting lives here; failures never reach this layer, so
//! the only degenerate outputs are the neutral empty-state strings.

use serde::Serialize;

use crate::chart::{self, ChartGeometry, ChartSpec};
use crate::dashboard::{DisplayState, SelectionPhase};
use crate::importance;
use crate::models::{PatientSummary, RiskCategory};

// ═══════════════════════════════════════════════════════════
// Empty-state strings
// ═══════════════════════════════════════════════════════════

pub const NO_PATIENTS: &str = "No patients found.";
pub const NO_DATA: &str = "No data.";
pub const NO_IMPORTANCE: &str = "No importance available.";
pub const NO_CONTRIBUTORS: &str = "No strong contributors detected.";

/// Placeholder for a missing score/category/date.
const DASH: &str = "—";

/// Static risk-horizon subtitle under the detail headline.
const HORIZON_SUBTITLE: &str = "Next 50 days: Likely deterioration without intervention.";

// ═══════════════════════════════════════════════════════════
// View models
// ═══════════════════════════════════════════════════════════

/// One cohort table row.
#[derive(Debug, Clone, Serialize)]
pub struct CohortRow {
    pub id: i64,
    /// Zero-padded to three digits, e.g. `007`.
    pub id_label: String,
    pub score_label: String,
    pub category_label: String,
    /// CSS pill class: lowercased category, empty when there is no score.
    pub pill_class: String,
    pub last_checkin: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortTable {
    pub rows: Vec<CohortRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

/// The risk headline for the selected patient, derived from the explain
/// result (not from the cohort row — the score shown here is the one the
/// model just computed).
#[derive(Debug, Clone, Serialize)]
pub struct DetailPanel {
    pub score_label: String,
    pub category_label: String,
    pub pill_class: String,
    pub chip_label: String,
    pub subtitle: &'static str,
}

/// One contributing-factor bullet, in the order the model returned them.
#[derive(Debug, Clone, Serialize)]
pub struct AttributionLine {
    pub feature: String,
    pub direction: String,
    pub magnitude_label: String,
    /// Pre-rendered bullet text.
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributionList {
    pub lines: Vec<AttributionLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

/// One importance bar with its display label and value text.
#[derive(Debug, Clone, Serialize)]
pub struct BarRow {
    pub label: String,
    pub width_pct: f64,
    pub value_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportancePanel {
    pub bars: Vec<BarRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VitalsChart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartGeometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

/// Everything the shell needs to paint the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub phase: SelectionPhase,
    pub selected_id: Option<i64>,
    pub refreshed_at: Option<String>,
    pub cohort: CohortTable,
    pub importance: ImportancePanel,
    pub detail: DetailPanel,
    pub vitals: VitalsChart,
    pub attributions: AttributionList,
}

// ═══════════════════════════════════════════════════════════
// Composition
// ═══════════════════════════════════════════════════════════

pub(crate) fn compose(state: &DisplayState) -> DashboardSnapshot {
    let selected_id = state.selection.as_ref().map(|record| record.id());

    let rows: Vec<CohortRow> = state
        .patients
        .iter()
        .map(|record| cohort_row(&record.summary, selected_id))
        .collect();
    let cohort = CohortTable {
        placeholder: rows.is_empty().then_some(NO_PATIENTS),
        rows,
    };

    let bars: Vec<BarRow> = importance::rank_importance(&state.importance)
        .into_iter()
        .map(|bar| BarRow {
            label: display_name(&bar.feature),
            width_pct: bar.width_pct,
            value_label: format!("{:.3}", bar.importance),
        })
        .collect();
    let importance = ImportancePanel {
        placeholder: bars.is_empty().then_some(NO_IMPORTANCE),
        bars,
    };

    let chart = chart::scale_series(&state.vitals, &ChartSpec::default());
    let vitals = VitalsChart {
        placeholder: chart.is_none().then_some(NO_DATA),
        chart,
    };

    let lines: Vec<AttributionLine> = state
        .explain
        .attributions
        .iter()
        .map(|a| AttributionLine {
            feature: a.feature.clone(),
            direction: a.direction.clone(),
            magnitude_label: format!("{:.3}", a.magnitude),
            text: format!(
                "{} → pushes {} (score {:.3})",
                a.feature, a.direction, a.magnitude
            ),
        })
        .collect();
    let attributions = AttributionList {
        placeholder: lines.is_empty().then_some(NO_CONTRIBUTORS),
        lines,
    };

    DashboardSnapshot {
        phase: state.phase(),
        selected_id,
        refreshed_at: state.refreshed_at.clone(),
        cohort,
        importance,
        detail: detail_panel(state.explain.risk_score, &state.explain.risk_category),
        vitals,
        attributions,
    }
}

fn cohort_row(summary: &PatientSummary, selected_id: Option<i64>) -> CohortRow {
    let (score_label, category_label, pill_class) = match summary.risk_score {
        Some(score) => {
            let category = summary
                .risk_category
                .unwrap_or_else(|| RiskCategory::from_score(score));
            (
                format!("{score:.2}"),
                category.as_str().to_string(),
                category.as_str().to_ascii_lowercase(),
            )
        }
        None => (DASH.to_string(), DASH.to_string(), String::new()),
    };

    CohortRow {
        id: summary.id,
        id_label: format!("{:03}", summary.id),
        score_label,
        category_label,
        pill_class,
        last_checkin: summary.last_checkin.clone().unwrap_or_else(|| DASH.to_string()),
        selected: selected_id == Some(summary.id),
    }
}

fn detail_panel(risk_score: f64, risk_category: &str) -> DetailPanel {
    let score_label = if risk_score.is_finite() {
        format!("{risk_score:.2}")
    } else {
        DASH.to_string()
    };
    let category_label = if risk_category.is_empty() {
        DASH.to_string()
    } else {
        risk_category.to_string()
    };
    let pill_class = if risk_category.is_empty() {
        String::new()
    } else {
        risk_category.to_ascii_lowercase()
    };
    let chip_label = format!("{score_label} | {category_label} Risk");

    DetailPanel {
        score_label,
        category_label,
        pill_class,
        chip_label,
        subtitle: HORIZON_SUBTITLE,
    }
}

/// Feature keys render with underscores as spaces and the standalone
/// z-score suffix capitalized: `lactate_mean_z` → `lactate mean Z`.
pub fn display_name(feature: &str) -> String {
    feature
        .replace('_', " ")
        .split_whitespace()
        .map(|word| if word.eq_ignore_ascii_case("z") { "Z" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
