//! Dashboard screen — Tauri IPC commands.
//!
//! Thin wrappers over the refresh controller; every command hands back the
//! full [`DashboardSnapshot`] so each region re-renders from one payload.

use std::sync::Arc;

use tauri::State;

use crate::api::HttpRiskApi;
use crate::dashboard::Dashboard;
use crate::view::DashboardSnapshot;

type Shared<'a> = State<'a, Arc<Dashboard<HttpRiskApi>>>;

/// Startup fetch: patient list + global importance, auto-selecting the
/// first patient (which triggers its vitals/explain pair).
#[tauri::command]
pub async fn load_dashboard(state: Shared<'_>) -> Result<DashboardSnapshot, String> {
    state.load().await.map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

/// Current snapshot without triggering any fetch — used while regions for
/// an in-flight selection are still loading.
#[tauri::command]
pub async fn get_dashboard(state: Shared<'_>) -> Result<DashboardSnapshot, String> {
    state.snapshot().map_err(|e| e.to_string())
}

/// Select a cohort row and refresh its vitals + explain regions.
#[tauri::command]
pub async fn select_patient(
    id: i64,
    state: Shared<'_>,
) -> Result<DashboardSnapshot, String> {
    state.select_patient(id).await.map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}
