//! WebAssembly module for the SPFarms harvest dashboard
//!
//! Exposes the client-side workflow rules to the dashboard:
//! - Progress bar segments
//! - Pre-flight gate for the stage action
//! - Advisory weight totals
//! - Weight input parsing
//!
//! Structured values cross the boundary as JSON strings.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    advisory_lines, evaluate, parse_weight, progress, visible_action, Gate, Harvest,
    HarvestStatus, UserRole, WeightField, WeightSheet,
};
use wasm_bindgen::prelude::*;

fn warn(context: &str, message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(&format!("{}: {}", context, message)));
}

fn to_js(context: &str, result: Result<String, String>) -> Result<String, JsValue> {
    result.map_err(|message| {
        warn(context, &message);
        JsValue::from_str(&message)
    })
}

fn parse_harvest(harvest_json: &str) -> Result<Harvest, String> {
    serde_json::from_str(harvest_json).map_err(|e| format!("Invalid harvest JSON: {}", e))
}

fn parse_sheet(sheet_json: &str) -> Result<WeightSheet, String> {
    if sheet_json.trim().is_empty() {
        return Ok(WeightSheet::new());
    }
    serde_json::from_str(sheet_json).map_err(|e| format!("Invalid weights JSON: {}", e))
}

#[derive(Debug, Serialize)]
struct GateView {
    action: Option<&'static str>,
    label: Option<&'static str>,
    visible: bool,
    enabled: bool,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct AdvisoryView {
    lines: Vec<String>,
    totals: Vec<(WeightField, f64)>,
}

fn progress_json(status: &str) -> Result<String, String> {
    let status =
        HarvestStatus::from_str(status).ok_or_else(|| format!("Unknown status '{}'", status))?;
    serde_json::to_string(&progress(status)).map_err(|e| e.to_string())
}

fn gate_json(harvest_json: &str, sheet_json: &str, role: &str) -> Result<String, String> {
    let harvest = parse_harvest(harvest_json)?;
    let sheet = parse_sheet(sheet_json)?;
    let role = UserRole::from_str(role);

    let gate = evaluate(&harvest, &sheet, role);
    let visible = visible_action(&harvest, role).is_some();
    let view = GateView {
        action: gate.action().map(|a| a.endpoint()),
        label: gate.action().map(|a| a.label()),
        visible,
        enabled: visible && gate.is_ready(),
        reason: match &gate {
            Gate::Blocked { reason, .. } => Some(reason.to_string()),
            _ => None,
        },
    };
    serde_json::to_string(&view).map_err(|e| e.to_string())
}

fn advisory_json(harvest_json: &str, sheet_json: &str) -> Result<String, String> {
    let harvest = parse_harvest(harvest_json)?;
    let sheet = parse_sheet(sheet_json)?;
    let totals = WeightField::ALL
        .iter()
        .map(|field| {
            let total = sheet.total_for(&harvest.strains_in_harvest, *field);
            (*field, total.to_f64().unwrap_or(0.0))
        })
        .collect();
    let view = AdvisoryView {
        lines: advisory_lines(&harvest, &sheet),
        totals,
    };
    serde_json::to_string(&view).map_err(|e| e.to_string())
}

fn loss_percent(total_dry: f64, wet: f64) -> Option<f64> {
    let dry = Decimal::try_from(total_dry).ok()?;
    let wet = Decimal::try_from(wet).ok();
    shared::water_loss_percent(dry, wet).and_then(|loss| loss.to_f64())
}

fn weight_input(raw: &str) -> Result<Option<f64>, String> {
    let value = parse_weight(raw).map_err(|e| e.to_string())?;
    Ok(value.and_then(|v| v.to_f64()))
}

/// Progress bar segments for a status
#[wasm_bindgen]
pub fn harvest_progress(status: &str) -> Result<String, JsValue> {
    to_js("harvest_progress", progress_json(status))
}

/// Gate for the next stage action
#[wasm_bindgen]
pub fn evaluate_gate(harvest_json: &str, sheet_json: &str, role: &str) -> Result<String, JsValue> {
    to_js("evaluate_gate", gate_json(harvest_json, sheet_json, role))
}

/// Advisory totals and display lines for the stage form
#[wasm_bindgen]
pub fn advisory_totals(harvest_json: &str, sheet_json: &str) -> Result<String, JsValue> {
    to_js("advisory_totals", advisory_json(harvest_json, sheet_json))
}

/// Water loss percentage, or nothing when it should not be shown
#[wasm_bindgen]
pub fn water_loss_percent(total_dry: f64, wet: f64) -> Option<f64> {
    loss_percent(total_dry, wet)
}

/// Parse a weight field. Blank input is `undefined`, not zero.
#[wasm_bindgen]
pub fn parse_weight_input(raw: &str) -> Result<Option<f64>, JsValue> {
    weight_input(raw).map_err(|message| {
        warn("parse_weight_input", &message);
        JsValue::from_str(&message)
    })
}
