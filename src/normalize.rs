//! Payload normalization — raw API responses to canonical records.
//!
//! Every function here is total: malformed or missing fields degrade to
//! safe defaults (empty list, absent score, empty string) instead of
//! propagating an error. Nothing past this boundary ever sees a parse
//! failure. Shape tolerance is a small ordered set of extraction rules
//! applied in priority order — no type hierarchy.

use serde_json::{Map, Value};

use crate::models::{
    ImportanceItem, PatientRecord, PatientSummary, RiskCategory, VitalsPoint,
};

// ═══════════════════════════════════════════════════════════
// Scalar coercion
// ═══════════════════════════════════════════════════════════

/// Coerce a JSON value to a finite number.
///
/// Accepts numbers and numeric strings (the service and the add-patient form
/// both produce stringly-typed numbers). Empty strings, non-numeric strings,
/// NaN and infinities are all "no value".
pub fn finite_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Coerce a JSON value to a non-empty string.
fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// A patient id must be an integer; fractional numbers are rejected rather
/// than truncated so a corrupt id can never silently alias another patient.
fn integer_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        _ => None,
    }
}

/// Coerce one raw form-field value for a create/update payload.
///
/// Empty and whitespace-only inputs mean "field not provided" and are
/// excluded (`None`) rather than sent as zero. Finite numbers are sent as
/// numbers; any other non-empty string passes through verbatim (the `date`
/// feature is a string).
pub fn coerce_field_value(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(n) = trimmed.parse::<f64>().ok().filter(|v| v.is_finite()) {
        // from_f64 only refuses non-finite floats, filtered out above.
        if let Some(number) = serde_json::Number::from_f64(n) {
            return Some(Value::Number(number));
        }
    }
    Some(Value::String(trimmed.to_string()))
}

// ═══════════════════════════════════════════════════════════
// List unwrapping
// ═══════════════════════════════════════════════════════════

/// Accept a bare array or an object wrapping an array under `wrapper_key`.
/// Anything else normalizes to the empty slice.
fn unwrap_list<'a>(raw: &'a Value, wrapper_key: &str) -> &'a [Value] {
    match raw {
        Value::Array(items) => items,
        Value::Object(map) => match map.get(wrapper_key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        _ => &[],
    }
}

// ═══════════════════════════════════════════════════════════
// Patients
// ═══════════════════════════════════════════════════════════

/// Normalize a patient-list response (bare array or `{patients:[…]}`).
///
/// Entries without an integer id are dropped: the id is the sole join key
/// for every derived fetch, so a record without one is unrenderable.
pub fn patient_list(raw: &Value) -> Vec<PatientRecord> {
    unwrap_list(raw, "patients")
        .iter()
        .filter_map(patient_record)
        .collect()
}

/// Normalize a single raw patient object.
pub fn patient_record(raw: &Value) -> Option<PatientRecord> {
    let obj = raw.as_object()?;
    let id = integer_id(obj.get("id")?)?;

    let risk_score = obj.get("risk_score").and_then(finite_number);
    let risk_category = obj
        .get("risk_category")
        .and_then(|v| v.as_str())
        .and_then(RiskCategory::parse);
    let last_checkin = obj.get("last_checkin").and_then(non_empty_string);

    Some(PatientRecord {
        summary: PatientSummary {
            id,
            risk_score,
            risk_category,
            last_checkin,
        },
        features: features_of(obj),
    })
}

/// The feature object posted back to predict+explain: the `features` field
/// when present, otherwise the whole raw patient object (the service
/// tolerates the extra bookkeeping fields).
fn features_of(obj: &Map<String, Value>) -> Map<String, Value> {
    match obj.get("features") {
        Some(Value::Object(features)) => features.clone(),
        _ => obj.clone(),
    }
}

// ═══════════════════════════════════════════════════════════
// Feature importance
// ═══════════════════════════════════════════════════════════

/// Field names the importance magnitude may arrive under, in priority order.
const IMPORTANCE_ALIASES: &[&str] = &["importance", "weight", "value"];

/// Normalize an importance response (bare array or `{importance:[…]}`).
///
/// The magnitude is read from the first present alias field and taken as an
/// absolute value — SHAP-style signed weights rank by magnitude. Items with
/// an empty feature key or a non-finite magnitude are dropped; items with no
/// magnitude field at all keep a magnitude of zero.
pub fn importance_items(raw: &Value) -> Vec<ImportanceItem> {
    unwrap_list(raw, "importance")
        .iter()
        .filter_map(importance_item)
        .collect()
}

fn importance_item(raw: &Value) -> Option<ImportanceItem> {
    let obj = raw.as_object()?;
    let feature = obj.get("feature").and_then(non_empty_string)?;

    let magnitude = match IMPORTANCE_ALIASES
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
    {
        Some(value) => finite_number(value)?,
        None => 0.0,
    };

    Some(ImportanceItem {
        feature,
        importance: magnitude.abs(),
    })
}

// ═══════════════════════════════════════════════════════════
// Vitals
// ═══════════════════════════════════════════════════════════

/// Normalize a vitals response (`{series:[…]}` or a bare array).
///
/// Points whose value is not a finite number are dropped; a missing label
/// falls back to the 1-based position so the X axis stays readable.
pub fn vitals_series(raw: &Value) -> Vec<VitalsPoint> {
    unwrap_list(raw, "series")
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| vitals_point(entry, index))
        .collect()
}

fn vitals_point(raw: &Value, index: usize) -> Option<VitalsPoint> {
    let obj = raw.as_object()?;
    let value = finite_number(obj.get("value")?)?;
    let label = obj
        .get("label")
        .and_then(non_empty_string)
        .unwrap_or_else(|| (index + 1).to_string());
    Some(VitalsPoint { label, value })
}

/// Parse the free-text "vitals history" form input.
///
/// Invalid JSON, a non-array root, or garbage entries all yield an empty
/// sequence — the caller never sees an error.
pub fn parse_vitals_text(text: &str) -> Vec<VitalsPoint> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(root) => match root {
            Value::Array(_) => vitals_series(&root),
            _ => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════
// Explain
// ═══════════════════════════════════════════════════════════

/// Normalize a predict+explain response.
///
/// A non-finite or missing score becomes the NaN sentinel, a missing
/// category the empty string, and anything that is not a well-formed
/// attribution list an empty one — the result is always usable, never an
/// error.
pub fn explain_result(raw: &Value) -> crate::models::ExplainResult {
    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => return crate::models::ExplainResult::unknown(),
    };

    let risk_score = obj
        .get("risk_score")
        .and_then(finite_number)
        .unwrap_or(f64::NAN);
    let risk_category = obj
        .get("risk_category")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let attributions = match obj.get("attributions") {
        Some(Value::Array(items)) => items.iter().filter_map(attribution).collect(),
        _ => Vec::new(),
    };

    crate::models::ExplainResult {
        risk_score,
        risk_category,
        attributions,
    }
}

/// Attributions render in received order; direction is free-form.
fn attribution(raw: &Value) -> Option<crate::models::Attribution> {
    let obj = raw.as_object()?;
    Some(crate::models::Attribution {
        feature: obj
            .get("feature")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        direction: obj
            .get("direction")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        magnitude: obj.get("magnitude").and_then(finite_number).unwrap_or(0.0),
    })
}

// ═══════════════════════════════════════════════════════════
// Feature names
// ═══════════════════════════════════════════════════════════

/// Normalize the `{features:[…]}` response into an ordered name list.
pub fn feature_names(raw: &Value) -> Vec<String> {
    unwrap_list(raw, "features")
        .iter()
        .filter_map(non_empty_string)
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
