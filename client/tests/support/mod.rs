//! In-process fake of the facility API
//!
//! Holds harvests in memory, applies the same stage transitions as the real
//! server and records every request so tests can assert on what was sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use shared::{
    AddPlantsRequest, CreateHarvestRequest, FinishDryingRequest, Harvest, HarvestPlant,
    HarvestStatus, HarvestWeight, RecordStrainWeightRequest, RecordStrainWeightsRequest,
    StartDryingRequest, StrainRef, WeightField,
};

#[derive(Debug, Clone)]
pub struct LoggedRequest {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct FakeState {
    harvests: HashMap<i64, Harvest>,
    requests: Vec<LoggedRequest>,
    next_id: i64,
    fail_strain: Option<i64>,
    fail_action: Option<String>,
    fail_auxiliary: bool,
    wrap_in_data: bool,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeFacility {
    pub base_url: String,
    state: Shared,
}

impl FakeFacility {
    /// Bind to an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            next_id: 100,
            ..Default::default()
        }));
        let app = Router::new()
            .route("/api/v1/facility/harvests", get(list_harvests).post(create_harvest))
            .route("/api/v1/facility/harvests/:id", get(get_harvest))
            .route("/api/v1/facility/harvests/:id/:action", post(harvest_action))
            .route("/api/v1/facility/rooms", get(list_rooms))
            .route("/api/v1/audit_events", get(list_audit_events))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            state,
        }
    }

    pub fn insert(&self, harvest: Harvest) {
        self.state.lock().unwrap().harvests.insert(harvest.id, harvest);
    }

    pub fn harvest(&self, id: i64) -> Harvest {
        self.state.lock().unwrap().harvests[&id].clone()
    }

    pub fn requests(&self) -> Vec<LoggedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// POSTs seen for one harvest, as `action` segments
    pub fn posted_actions(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::POST)
            .filter_map(|r| r.path.rsplit('/').next().map(str::to_string))
            .collect()
    }

    /// Reject `record_strain_weight` for this strain
    pub fn fail_strain(&self, strain_id: i64) {
        self.state.lock().unwrap().fail_strain = Some(strain_id);
    }

    /// Answer 500 for this transition endpoint
    pub fn fail_action(&self, action: &str) {
        self.state.lock().unwrap().fail_action = Some(action.to_string());
    }

    /// Answer 500 for drying rooms and audit events
    pub fn fail_auxiliary(&self) {
        self.state.lock().unwrap().fail_auxiliary = true;
    }

    /// Wrap every response in `{ "data": ... }`
    pub fn wrap_in_data(&self) {
        self.state.lock().unwrap().wrap_in_data = true;
    }
}

pub fn strain(id: i64, name: &str) -> StrainRef {
    StrainRef {
        id,
        name: name.to_string(),
    }
}

/// A harvest in `status` with the given strains and nothing recorded
pub fn harvest_fixture(id: i64, status: HarvestStatus, strains: Vec<StrainRef>) -> Harvest {
    let mut harvest: Harvest = serde_json::from_value(json!({
        "id": id,
        "name": format!("Harvest {}", id),
        "status": status.as_str(),
    }))
    .unwrap();
    harvest.created_at = Some(Utc::now());
    harvest.strains_in_harvest = strains;
    harvest
}

fn reply(state: &FakeState, value: Value) -> Response {
    if state.wrap_in_data {
        Json(json!({ "data": value })).into_response()
    } else {
        Json(value).into_response()
    }
}

fn unprocessable(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": message })),
    )
        .into_response()
}

fn log(state: &mut FakeState, method: Method, path: String, body: Value) {
    state.requests.push(LoggedRequest { method, path, body });
}

async fn list_harvests(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    log(&mut state, Method::GET, "/facility/harvests".to_string(), Value::Null);
    let mut harvests: Vec<&Harvest> = state.harvests.values().collect();
    harvests.sort_by_key(|h| h.id);
    let value = serde_json::to_value(harvests).unwrap();
    reply(&state, value)
}

async fn create_harvest(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    log(&mut state, Method::POST, "/facility/harvests".to_string(), body.clone());
    let request: CreateHarvestRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return unprocessable(&e.to_string()),
    };
    let id = state.next_id;
    state.next_id += 1;
    let mut harvest = harvest_fixture(id, HarvestStatus::Active, vec![strain(1, "Blue Dream")]);
    harvest.name = request.name;
    harvest.harvested_at = request.harvested_at;
    harvest.harvest_plants = request
        .plant_ids
        .iter()
        .map(|plant_id| HarvestPlant {
            id: *plant_id,
            plant_id: *plant_id,
            plant_uid: None,
            strain_id: Some(1),
            strain_name: Some("Blue Dream".to_string()),
            wet_weight_grams: None,
        })
        .collect();
    state.harvests.insert(id, harvest.clone());
    let value = serde_json::to_value(&harvest).unwrap();
    (StatusCode::CREATED, reply(&state, value)).into_response()
}

async fn get_harvest(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap();
    log(&mut state, Method::GET, format!("/facility/harvests/{}", id), Value::Null);
    match state.harvests.get(&id) {
        Some(harvest) => {
            let value = serde_json::to_value(harvest).unwrap();
            reply(&state, value)
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Harvest not found" })),
        )
            .into_response(),
    }
}

async fn list_rooms(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let room_type = query.get("room_type").cloned().unwrap_or_default();
    log(
        &mut state,
        Method::GET,
        format!("/facility/rooms?room_type={}", room_type),
        Value::Null,
    );
    if state.fail_auxiliary {
        return (StatusCode::INTERNAL_SERVER_ERROR, "rooms unavailable").into_response();
    }
    let rooms = json!([
        { "id": 7, "name": "Dry Room 1", "room_type": "drying" },
        { "id": 8, "name": "Dry Room 2", "room_type": "drying" }
    ]);
    reply(&state, rooms)
}

async fn list_audit_events(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let id = query.get("auditable_id").cloned().unwrap_or_default();
    log(&mut state, Method::GET, format!("/audit_events?auditable_id={}", id), Value::Null);
    if state.fail_auxiliary {
        return (StatusCode::INTERNAL_SERVER_ERROR, "<html>500</html>").into_response();
    }
    let events = json!([{
        "id": 1,
        "action": "create",
        "actor": { "id": 3, "name": "Sam" },
        "created_at": "2026-04-01T08:00:00Z"
    }]);
    reply(&state, events)
}

fn sum_recorded(harvest: &Harvest, field: WeightField) -> Option<Decimal> {
    let values: Vec<Decimal> = harvest
        .harvest_weights
        .iter()
        .filter_map(|w| match field {
            WeightField::Wet => w.wet_weight_grams,
            WeightField::Dry => w.dry_weight_grams,
            WeightField::Waste => w.waste_weight_grams,
            WeightField::Flower => w.flower_weight_grams,
            WeightField::Shake => w.shake_weight_grams,
        })
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.into_iter().sum())
    }
}

fn record_weight(harvest: &mut Harvest, request: &RecordStrainWeightRequest) {
    let index = match harvest
        .harvest_weights
        .iter()
        .position(|w| w.strain_id == request.strain_id)
    {
        Some(index) => index,
        None => {
            harvest.harvest_weights.push(HarvestWeight {
                id: Some(harvest.harvest_weights.len() as i64 + 1),
                strain_id: request.strain_id,
                strain_name: None,
                wet_weight_grams: None,
                dry_weight_grams: None,
                waste_weight_grams: None,
                flower_weight_grams: None,
                shake_weight_grams: None,
            });
            harvest.harvest_weights.len() - 1
        }
    };
    let weight = &mut harvest.harvest_weights[index];
    if let Some(v) = request.wet_weight_grams {
        weight.wet_weight_grams = Some(v);
    }
    if let Some(v) = request.dry_weight_grams {
        weight.dry_weight_grams = Some(v);
    }
    if let Some(v) = request.waste_weight_grams {
        weight.waste_weight_grams = Some(v);
    }
    if let Some(v) = request.flower_weight_grams {
        weight.flower_weight_grams = Some(v);
    }
    if let Some(v) = request.shake_weight_grams {
        weight.shake_weight_grams = Some(v);
    }
}

async fn harvest_action(
    State(state): State<Shared>,
    Path((id, action)): Path<(i64, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut guard = state.lock().unwrap();
    let state = &mut *guard;
    log(
        state,
        Method::POST,
        format!("/facility/harvests/{}/{}", id, action),
        body.clone(),
    );

    if state.fail_action.as_deref() == Some(action.as_str()) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Database unavailable" })),
        )
            .into_response();
    }
    let fail_strain = state.fail_strain;
    let Some(harvest) = state.harvests.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Harvest not found" })))
            .into_response();
    };
    let now = Utc::now();

    match action.as_str() {
        "record_strain_weight" => {
            let request: RecordStrainWeightRequest = match serde_json::from_value(body) {
                Ok(request) => request,
                Err(e) => return unprocessable(&e.to_string()),
            };
            if fail_strain == Some(request.strain_id) {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "errors": [{ "title": "Invalid", "detail": "Strain is not in this harvest" }] })),
                )
                    .into_response();
            }
            record_weight(harvest, &request);
        }
        "record_strain_weights" => {
            let request: RecordStrainWeightsRequest = match serde_json::from_value(body) {
                Ok(request) => request,
                Err(e) => return unprocessable(&e.to_string()),
            };
            if request.weights.iter().any(|w| fail_strain == Some(w.strain_id)) {
                return unprocessable("Strain is not in this harvest");
            }
            for weight in &request.weights {
                record_weight(harvest, weight);
            }
        }
        "add_plants" => {
            let request: AddPlantsRequest = match serde_json::from_value(body) {
                Ok(request) => request,
                Err(e) => return unprocessable(&e.to_string()),
            };
            for plant_id in request.plant_ids {
                harvest.harvest_plants.push(HarvestPlant {
                    id: plant_id,
                    plant_id,
                    plant_uid: None,
                    strain_id: harvest.strains_in_harvest.first().map(|s| s.id),
                    strain_name: None,
                    wet_weight_grams: None,
                });
            }
        }
        "start_drying" => {
            if harvest.status != HarvestStatus::Active {
                return unprocessable("Harvest is not active");
            }
            let request: StartDryingRequest = serde_json::from_value(body).unwrap_or_default();
            harvest.status = HarvestStatus::Drying;
            harvest.drying_room_id = request.drying_room_id;
            harvest.drying_started_at = Some(now);
            if let Some(wet) = sum_recorded(harvest, WeightField::Wet) {
                harvest.wet_weight_grams = Some(wet);
            }
        }
        "finish_drying" => {
            if harvest.status != HarvestStatus::Drying {
                return unprocessable("Harvest is not drying");
            }
            let request: FinishDryingRequest = serde_json::from_value(body).unwrap_or_default();
            harvest.status = HarvestStatus::Dried;
            harvest.dried_at = Some(now);
            harvest.dry_weight_grams = request
                .dry_weight_grams
                .or_else(|| sum_recorded(harvest, WeightField::Dry));
            if let Some(waste) = request.waste_weight_grams {
                harvest.waste_weight_grams = Some(waste);
            }
        }
        "start_trimming" => {
            if harvest.status != HarvestStatus::Dried {
                return unprocessable("Harvest is not dried");
            }
            harvest.status = HarvestStatus::Trimming;
            harvest.trimming_started_at = Some(now);
        }
        "finish_trimming" => {
            if harvest.status != HarvestStatus::Trimming {
                return unprocessable("Harvest is not trimming");
            }
            harvest.status = HarvestStatus::Curing;
            harvest.trimming_finished_at = Some(now);
            harvest.flower_weight_grams = sum_recorded(harvest, WeightField::Flower);
            harvest.shake_weight_grams = sum_recorded(harvest, WeightField::Shake);
        }
        "finish_curing" => {
            if harvest.status != HarvestStatus::Curing {
                return unprocessable("Harvest is not curing");
            }
            harvest.status = HarvestStatus::Packaged;
            harvest.curing_finished_at = Some(now);
        }
        "admin_review" => {
            if harvest.status != HarvestStatus::Packaged {
                return unprocessable("Harvest is not packaged");
            }
            harvest.admin_reviewed_at = Some(now);
        }
        "close" => {
            if harvest.status != HarvestStatus::Packaged || harvest.admin_reviewed_at.is_none() {
                return unprocessable("Harvest must be reviewed before closing");
            }
            harvest.status = HarvestStatus::Closed;
            harvest.closed_at = Some(now);
        }
        other => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Unknown action {}", other) })),
            )
                .into_response()
        }
    }

    harvest.updated_at = Some(now);
    let value = serde_json::to_value(&*harvest).unwrap();
    reply(state, value)
}
