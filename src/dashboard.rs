//! Dashboard state container and selection refresh controller.
//!
//! **Why this exists**: every visual region (cohort table, vitals chart,
//! importance bars, detail panel) derives from shared fetch results, and the
//! fetches complete independently. One owner has to arbitrate which results
//! are still worth showing. `Dashboard` is that owner: nothing outside it
//! writes the selection, the vitals series, or the explain result.
//!
//! **Design**:
//! - `Dashboard` is generic over [`RiskApi`] so tests drive it with an
//!   in-process service.
//! - A selection event schedules exactly two independent operations —
//!   fetch-vitals(id) and fetch-explain(features) — and each one carries the
//!   selection id active at issue time. On completion the tag is compared
//!   against the current selection before any state is applied; a late
//!   response for a superseded selection is discarded, which is the only
//!   cancellation mechanism there is.
//! - Failures are isolated per request: a dead vitals endpoint still lets
//!   the explain panel fill in, and vice versa. Failed regions fall back to
//!   their defined empty/unknown state and the error goes to the log, never
//!   to the view.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::{ApiError, PatientForm, RiskApi};
use crate::models::{ExplainResult, ImportanceItem, PatientRecord, VitalsPoint};
use crate::view::DashboardSnapshot;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Selection machine phase.
///
/// `Ready` means the latest vitals and explain fetches for the current
/// selection id have both resolved — successfully or with their isolated
/// per-field fallback applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPhase {
    Idle,
    Loading,
    Ready,
}

/// Mutable display state. Written only by the controller methods below.
#[derive(Debug, Default)]
pub(crate) struct DisplayState {
    pub(crate) patients: Vec<PatientRecord>,
    pub(crate) importance: Vec<ImportanceItem>,
    pub(crate) selection: Option<PatientRecord>,
    pub(crate) vitals: Vec<VitalsPoint>,
    pub(crate) explain: ExplainResult,
    /// Selection id whose vitals fetch has resolved (fallback included).
    pub(crate) vitals_for: Option<i64>,
    /// Selection id whose explain fetch has resolved (fallback included).
    pub(crate) explain_for: Option<i64>,
    /// When cohort data was last applied (RFC 3339).
    pub(crate) refreshed_at: Option<String>,
}

impl DisplayState {
    fn selection_id(&self) -> Option<i64> {
        self.selection.as_ref().map(|record| record.id())
    }

    pub(crate) fn phase(&self) -> SelectionPhase {
        match self.selection_id() {
            None => SelectionPhase::Idle,
            Some(id) if self.vitals_for == Some(id) && self.explain_for == Some(id) => {
                SelectionPhase::Ready
            }
            Some(_) => SelectionPhase::Loading,
        }
    }
}

/// Errors from controller operations that commands surface to the shell.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Patient {0} is not in the cohort")]
    UnknownPatient(i64),
    #[error("{0}")]
    Api(#[from] ApiError),
}

// ═══════════════════════════════════════════════════════════
// Dashboard
// ═══════════════════════════════════════════════════════════

/// The single owned state container behind the dashboard.
pub struct Dashboard<A: RiskApi> {
    api: A,
    state: Mutex<DisplayState>,
}

impl<A: RiskApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(DisplayState::default()),
        }
    }

    /// Direct access to the service client, for passthrough commands
    /// (feature list, health probe) that own no display state.
    pub fn api(&self) -> &A {
        &self.api
    }

    fn lock(&self) -> Result<MutexGuard<'_, DisplayState>, DashboardError> {
        self.state.lock().map_err(|_| DashboardError::LockPoisoned)
    }

    // ── Initial load ────────────────────────────────────────

    /// Startup load: the patient list and the global feature importance,
    /// fetched independently of any selection and isolated from each other.
    /// When the list resolves and nothing is selected yet, its first entry
    /// is auto-selected, which triggers the per-selection fetch pair.
    pub async fn load(&self) -> Result<(), DashboardError> {
        let (patients, importance) =
            tokio::join!(self.api.fetch_patients(), self.api.fetch_importance());

        let patients = patients.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "patient list fetch failed");
            Vec::new()
        });
        let importance = importance.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "feature importance fetch failed");
            Vec::new()
        });

        let auto_select = {
            let mut state = self.lock()?;
            state.patients = patients;
            state.importance = importance;
            state.refreshed_at = Some(chrono::Utc::now().to_rfc3339());
            if state.selection.is_none() {
                state.patients.first().cloned()
            } else {
                None
            }
        };

        if let Some(first) = auto_select {
            self.refresh_selection(first).await;
        }
        Ok(())
    }

    // ── Selection ───────────────────────────────────────────

    /// Select a cohort patient by id and refresh its derived regions.
    pub async fn select_patient(&self, id: i64) -> Result<(), DashboardError> {
        let record = {
            let state = self.lock()?;
            state
                .patients
                .iter()
                .find(|record| record.id() == id)
                .cloned()
        };
        match record {
            Some(record) => {
                self.refresh_selection(record).await;
                Ok(())
            }
            None => Err(DashboardError::UnknownPatient(id)),
        }
    }

    /// The per-selection refresh pair.
    ///
    /// Both fetches carry `id` as their staleness tag. The two futures run
    /// concurrently and complete independently; `join!` only means this
    /// call resolves when both regions have settled.
    async fn refresh_selection(&self, record: PatientRecord) {
        let id = record.id();
        let features = record.features.clone();

        if let Ok(mut state) = self.state.lock() {
            state.selection = Some(record);
            // Invalidate derived regions so a slow fetch can never leave
            // another patient's data on screen.
            state.vitals = Vec::new();
            state.vitals_for = None;
            state.explain = ExplainResult::unknown();
            state.explain_for = None;
        }

        let vitals_task = self.run_vitals_fetch(id);
        let explain_task = self.run_explain_fetch(id, features);
        tokio::join!(vitals_task, explain_task);
    }

    async fn run_vitals_fetch(&self, tag: i64) {
        let series = match self.api.fetch_vitals(tag).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(patient = tag, error = %e, "vitals fetch failed");
                Vec::new()
            }
        };
        if let Ok(mut state) = self.state.lock() {
            if state.selection_id() == Some(tag) {
                state.vitals = series;
                state.vitals_for = Some(tag);
            } else {
                tracing::debug!(patient = tag, "discarding stale vitals response");
            }
        }
    }

    async fn run_explain_fetch(&self, tag: i64, features: Map<String, Value>) {
        let explain = match self.api.fetch_explain(features).await {
            Ok(explain) => explain,
            Err(e) => {
                tracing::warn!(patient = tag, error = %e, "predict+explain fetch failed");
                ExplainResult::unknown()
            }
        };
        if let Ok(mut state) = self.state.lock() {
            if state.selection_id() == Some(tag) {
                state.explain = explain;
                state.explain_for = Some(tag);
            } else {
                tracing::debug!(patient = tag, "discarding stale explain response");
            }
        }
    }

    // ── Add patient ─────────────────────────────────────────

    /// Create (or upsert) a patient, reload the cohort, and re-select the
    /// created record. Creation errors propagate — the add form is the one
    /// surface that shows a human-readable error. The reload and re-select
    /// follow the usual isolation rules; when the created id is missing
    /// from the reloaded list the selection falls back to none.
    pub async fn add_patient(&self, form: PatientForm) -> Result<i64, DashboardError> {
        let created_id = self.api.create_patient(form.into_request()).await?;

        let reloaded = self.api.fetch_patients().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cohort reload after create failed");
            Vec::new()
        });

        let created = {
            let mut state = self.lock()?;
            state.patients = reloaded;
            state.refreshed_at = Some(chrono::Utc::now().to_rfc3339());
            state
                .patients
                .iter()
                .find(|record| record.id() == created_id)
                .cloned()
        };

        match created {
            Some(record) => self.refresh_selection(record).await,
            None => {
                tracing::warn!(
                    patient = created_id,
                    "created patient missing from reloaded cohort; clearing selection"
                );
                if let Ok(mut state) = self.state.lock() {
                    state.selection = None;
                    state.vitals = Vec::new();
                    state.vitals_for = None;
                    state.explain = ExplainResult::unknown();
                    state.explain_for = None;
                }
            }
        }
        Ok(created_id)
    }

    // ── Reads ───────────────────────────────────────────────

    pub fn phase(&self) -> SelectionPhase {
        self.state
            .lock()
            .map(|state| state.phase())
            .unwrap_or(SelectionPhase::Idle)
    }

    /// Compose the current view snapshot for the shell.
    pub fn snapshot(&self) -> Result<DashboardSnapshot, DashboardError> {
        let state = self.lock()?;
        Ok(crate::view::compose(&state))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
