//! Risk prediction service client.
//!
//! `RiskApi` is the seam between the dashboard core and the JSON-over-HTTP
//! service: the refresh controller is generic over it, so tests drive the
//! controller with an in-process implementation and only `HttpRiskApi`
//! knows about the wire. Responses come back canonical — normalization
//! happens here, on the way in, so callers never touch raw payloads.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config;
use crate::models::{ExplainResult, ImportanceItem, PatientRecord, VitalsPoint};
use crate::normalize;

/// Connect timeout for all requests. There is no overall request timeout:
/// a hung request leaves its dashboard region loading, and staleness
/// tagging already makes late responses harmless.
const CONNECT_TIMEOUT_SECS: u64 = 5;

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Transport-tier errors. Normalization-tier problems never surface here —
/// they degrade to defaults inside `normalize`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cannot reach the risk service at {0}")]
    Connection(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Transport error: {0}")]
    Transport(String),
    /// Non-success status; the message is the server's `error` body field
    /// when present, the status reason otherwise.
    #[error("{0}")]
    Service(String),
    #[error("Malformed response: {0}")]
    ResponseParsing(String),
}

/// Message for a non-success response: prefer the server's `{error:…}`
/// body over the bare status line.
fn service_error_message(status_reason: &str, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| status_reason.to_string())
}

// ═══════════════════════════════════════════════════════════
// RiskApi seam
// ═══════════════════════════════════════════════════════════

/// The request surface the dashboard core depends on.
///
/// Methods return `impl Future + Send` rather than `async fn` so callers
/// can hold the futures across spawn boundaries on a multithreaded runtime.
pub trait RiskApi: Send + Sync {
    /// `GET /api/patients`
    fn fetch_patients(
        &self,
    ) -> impl Future<Output = Result<Vec<PatientRecord>, ApiError>> + Send;

    /// `GET /api/patients/{id}`
    fn fetch_patient(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<PatientRecord>, ApiError>> + Send;

    /// `GET /api/patients/{id}/vitals`
    fn fetch_vitals(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Vec<VitalsPoint>, ApiError>> + Send;

    /// `POST /api/predict_explain`
    fn fetch_explain(
        &self,
        features: Map<String, Value>,
    ) -> impl Future<Output = Result<ExplainResult, ApiError>> + Send;

    /// `GET /api/feature_importance`
    fn fetch_importance(
        &self,
    ) -> impl Future<Output = Result<Vec<ImportanceItem>, ApiError>> + Send;

    /// `GET /api/features`
    fn fetch_feature_names(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// `POST /api/patients` — returns the created record's id.
    fn create_patient(
        &self,
        request: NewPatientRequest,
    ) -> impl Future<Output = Result<i64, ApiError>> + Send;

    /// `GET /api/health`
    fn health(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

// ═══════════════════════════════════════════════════════════
// Create-patient payload
// ═══════════════════════════════════════════════════════════

/// Raw add-patient form input as collected by the shell. Field values are
/// the raw text the user typed; coercion and exclusion rules apply when the
/// form is turned into a request.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientForm {
    pub id: i64,
    #[serde(default)]
    pub last_checkin: String,
    /// Advanced mode sends the full feature vector under `features`;
    /// basic mode sends the compact clinical subset under `core`.
    #[serde(default)]
    pub advanced: bool,
    #[serde(default)]
    pub fields: std::collections::BTreeMap<String, String>,
    /// Optional vitals history, pasted as a JSON array.
    #[serde(default)]
    pub vitals_text: String,
}

/// Body for `POST /api/patients`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewPatientRequest {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checkin: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub core: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub features: Map<String, Value>,
    pub vitals_history: Vec<VitalsPoint>,
}

impl PatientForm {
    /// Build the create request. Empty field values are excluded entirely —
    /// never sent as zero; finite numbers go as numbers, other text (the
    /// `date` feature) verbatim.
    pub fn into_request(self) -> NewPatientRequest {
        let mut values = Map::new();
        for (key, raw) in &self.fields {
            if let Some(value) = normalize::coerce_field_value(raw) {
                values.insert(key.clone(), value);
            }
        }

        let (core, features) = if self.advanced {
            (Map::new(), values)
        } else {
            (values, Map::new())
        };

        NewPatientRequest {
            id: self.id,
            last_checkin: Some(self.last_checkin.trim().to_string())
                .filter(|s| !s.is_empty()),
            core,
            features,
            vitals_history: normalize::parse_vitals_text(&self.vitals_text),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// HttpRiskApi
// ═══════════════════════════════════════════════════════════

/// `reqwest`-backed implementation of [`RiskApi`].
pub struct HttpRiskApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRiskApi {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Client pointed at the configured service URL.
    pub fn from_env() -> Self {
        Self::new(&config::api_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_transport(&self, error: reqwest::Error) -> ApiError {
        if error.is_connect() {
            ApiError::Connection(self.base_url.clone())
        } else if error.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(error.to_string())
        }
    }

    async fn decode(&self, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Request failed");
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Service(service_error_message(reason, &body)));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::ResponseParsing(e.to_string()))
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;
        self.decode(response).await
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;
        self.decode(response).await
    }
}

impl RiskApi for HttpRiskApi {
    async fn fetch_patients(&self) -> Result<Vec<PatientRecord>, ApiError> {
        let raw = self.get_json("/api/patients").await?;
        Ok(normalize::patient_list(&raw))
    }

    async fn fetch_patient(&self, id: i64) -> Result<Option<PatientRecord>, ApiError> {
        let raw = self.get_json(&format!("/api/patients/{id}")).await?;
        Ok(normalize::patient_record(&raw))
    }

    async fn fetch_vitals(&self, id: i64) -> Result<Vec<VitalsPoint>, ApiError> {
        let raw = self.get_json(&format!("/api/patients/{id}/vitals")).await?;
        Ok(normalize::vitals_series(&raw))
    }

    async fn fetch_explain(
        &self,
        features: Map<String, Value>,
    ) -> Result<ExplainResult, ApiError> {
        let body = serde_json::json!({ "features": features });
        let raw = self.post_json("/api/predict_explain", &body).await?;
        Ok(normalize::explain_result(&raw))
    }

    async fn fetch_importance(&self) -> Result<Vec<ImportanceItem>, ApiError> {
        let raw = self.get_json("/api/feature_importance").await?;
        Ok(normalize::importance_items(&raw))
    }

    async fn fetch_feature_names(&self) -> Result<Vec<String>, ApiError> {
        let raw = self.get_json("/api/features").await?;
        Ok(normalize::feature_names(&raw))
    }

    async fn create_patient(&self, request: NewPatientRequest) -> Result<i64, ApiError> {
        let raw = self.post_json("/api/patients", &request).await?;
        raw.get("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ApiError::ResponseParsing("created patient has no id".into()))
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.get_json("/api/health").await.map(|_| ())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> PatientForm {
        PatientForm {
            id: 12,
            last_checkin: "2025-09-08".to_string(),
            advanced: false,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            vitals_text: String::new(),
        }
    }

    #[test]
    fn basic_form_builds_core_payload_without_empty_fields() {
        let request = form(&[("age", "64"), ("sbp_mean", ""), ("lactate_mean", "2.1")])
            .into_request();

        assert_eq!(request.id, 12);
        assert_eq!(request.last_checkin.as_deref(), Some("2025-09-08"));
        assert_eq!(request.core.get("age"), Some(&serde_json::json!(64.0)));
        assert_eq!(
            request.core.get("lactate_mean"),
            Some(&serde_json::json!(2.1))
        );
        // Empty input means "not provided" — excluded, never zero.
        assert!(!request.core.contains_key("sbp_mean"));
        assert!(request.features.is_empty());
    }

    #[test]
    fn advanced_form_builds_features_payload() {
        let mut input = form(&[("age_z", "1.4"), ("date", "2025-09-08")]);
        input.advanced = true;
        let request = input.into_request();

        assert!(request.core.is_empty());
        assert_eq!(request.features.get("age_z"), Some(&serde_json::json!(1.4)));
        // Non-numeric text passes through verbatim.
        assert_eq!(
            request.features.get("date"),
            Some(&serde_json::json!("2025-09-08"))
        );
    }

    #[test]
    fn blank_checkin_is_omitted() {
        let mut input = form(&[]);
        input.last_checkin = "   ".to_string();
        assert_eq!(input.into_request().last_checkin, None);
    }

    #[test]
    fn vitals_text_feeds_history_and_bad_json_degrades_to_empty() {
        let mut input = form(&[]);
        input.vitals_text = r#"[{"label":"Sep 1","value":102}]"#.to_string();
        let request = input.clone().into_request();
        assert_eq!(request.vitals_history.len(), 1);
        assert_eq!(request.vitals_history[0].value, 102.0);

        input.vitals_text = "{broken".to_string();
        assert!(input.into_request().vitals_history.is_empty());
    }

    #[test]
    fn request_serializes_without_empty_sections() {
        let request = form(&[("age", "64")]).into_request();
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"core\""));
        assert!(!json.contains("\"features\""));
        assert!(json.contains("\"vitals_history\":[]"));
    }

    #[test]
    fn service_error_prefers_server_message() {
        assert_eq!(
            service_error_message("Bad Request", r#"{"error": "id is required"}"#),
            "id is required"
        );
        assert_eq!(
            service_error_message("Bad Request", "not json"),
            "Bad Request"
        );
        assert_eq!(service_error_message("Bad Request", r#"{"error": ""}"#), "Bad Request");
    }

    #[test]
    fn api_error_display_is_human_readable() {
        let error = ApiError::Connection("http://127.0.0.1:8000".into());
        assert_eq!(
            error.to_string(),
            "Cannot reach the risk service at http://127.0.0.1:8000"
        );
        assert_eq!(ApiError::Service("id is required".into()).to_string(), "id is required");
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = HttpRiskApi::new("http://127.0.0.1:8000/");
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }
}
