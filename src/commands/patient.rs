//! Patient creation and detail — Tauri IPC commands.

use std::sync::Arc;

use tauri::State;

use crate::api::{HttpRiskApi, PatientForm, RiskApi};
use crate::dashboard::Dashboard;
use crate::models::PatientRecord;
use crate::view::DashboardSnapshot;

type Shared<'a> = State<'a, Arc<Dashboard<HttpRiskApi>>>;

/// Save a new (or updated) patient, reload the cohort, and re-select the
/// created record. The error string is shown verbatim in the add form —
/// the one surface where a human-readable failure appears.
#[tauri::command]
pub async fn add_patient(
    form: PatientForm,
    state: Shared<'_>,
) -> Result<DashboardSnapshot, String> {
    state.add_patient(form).await.map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

/// Raw patient record for the standalone detail page.
#[tauri::command]
pub async fn get_patient(
    id: i64,
    state: Shared<'_>,
) -> Result<Option<PatientRecord>, String> {
    state.api().fetch_patient(id).await.map_err(|e| e.to_string())
}

/// Ordered model feature names, driving advanced-mode form generation.
#[tauri::command]
pub async fn list_features(state: Shared<'_>) -> Result<Vec<String>, String> {
    state
        .api()
        .fetch_feature_names()
        .await
        .map_err(|e| e.to_string())
}
