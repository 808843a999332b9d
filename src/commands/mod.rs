pub mod dashboard;
pub mod patient;

use std::sync::Arc;

use tauri::State;

use crate::api::{HttpRiskApi, RiskApi};
use crate::dashboard::Dashboard;

/// Health check IPC command — verifies the backend is running
#[tauri::command]
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}

/// Risk service availability for the frontend status indicator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServiceStatus {
    /// Whether the prediction service answered its health probe.
    pub reachable: bool,
    /// Base URL the probe hit.
    pub api_url: String,
    /// Human-readable status summary.
    pub summary: String,
}

/// Proactive check of the prediction service.
///
/// Called by the frontend on app load so the user sees whether the
/// dashboard is live before the first region renders. Unreachable is a
/// status, not an error — the command itself never fails over it.
#[tauri::command]
pub async fn check_service_status(
    state: State<'_, Arc<Dashboard<HttpRiskApi>>>,
) -> Result<ServiceStatus, String> {
    let api_url = state.api().base_url().to_string();
    match state.api().health().await {
        Ok(()) => Ok(ServiceStatus {
            reachable: true,
            summary: format!("Risk service ready at {api_url}"),
            api_url,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "risk service health check failed");
            Ok(ServiceStatus {
                reachable: false,
                summary: e.to_string(),
                api_url,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_returns_ok() {
        assert_eq!(health_check(), "ok");
    }

    #[test]
    fn service_status_serializes() {
        let status = ServiceStatus {
            reachable: false,
            api_url: "http://127.0.0.1:8000".to_string(),
            summary: "Cannot reach the risk service at http://127.0.0.1:8000".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"reachable\":false"));
        assert!(json.contains("\"api_url\":\"http://127.0.0.1:8000\""));
    }
}
