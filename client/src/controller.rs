//! Stage transition controller
//!
//! Owns the harvest shown on the page and drives it through the lifecycle.
//! The rules of which action is legal live in `shared::workflow`; this module
//! sequences the requests around each transition and keeps the local state in
//! step with what the server returns.
//!
//! Every mutating method takes `&mut self`, so a controller can only have one
//! action in flight.

use rust_decimal::Decimal;
use shared::{
    evaluate, parse_weight, rule_for, validate_add_plants, validate_strain_weight,
    AddPlantsRequest, AuditEvent, CurrentUser, FacilityRoom, FinishDryingRequest, Gate, Harvest,
    HarvestAction, RecordStrainWeightRequest, RecordStrainWeightsRequest, StartDryingRequest,
    WeightField, WeightSheet,
};

use crate::api::{invoke_transition, HarvestApi, TransitionBody};
use crate::config::{Config, WeightSubmission};
use crate::error::{ClientError, ClientResult};
use crate::view::{HarvestView, PageView};
use crate::weights_editor::WeightsEditor;

pub struct HarvestController<A: HarvestApi> {
    api: A,
    user: CurrentUser,
    submission: WeightSubmission,
    harvest: Option<Harvest>,
    load_error: Option<String>,
    editor: WeightsEditor,
    drying_room_id: Option<i64>,
    harvest_waste: String,
    error: Option<String>,
    drying_rooms: Vec<FacilityRoom>,
    audit_events: Vec<AuditEvent>,
}

impl<A: HarvestApi> HarvestController<A> {
    pub fn new(api: A, user: CurrentUser, submission: WeightSubmission) -> Self {
        Self {
            api,
            user,
            submission,
            harvest: None,
            load_error: None,
            editor: WeightsEditor::default(),
            drying_room_id: None,
            harvest_waste: String::new(),
            error: None,
            drying_rooms: Vec::new(),
            audit_events: Vec::new(),
        }
    }

    pub fn from_config(api: A, config: &Config) -> Self {
        Self::new(
            api,
            config.user.current_user(),
            config.workflow.weight_submission,
        )
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn harvest(&self) -> Option<&Harvest> {
        self.harvest.as_ref()
    }

    /// Inline error from the last failed action
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn sheet(&self) -> &WeightSheet {
        self.editor.sheet()
    }

    pub fn sheet_mut(&mut self) -> &mut WeightSheet {
        self.editor.sheet_mut()
    }

    pub fn editor(&self) -> &WeightsEditor {
        &self.editor
    }

    pub fn drying_rooms(&self) -> &[FacilityRoom] {
        &self.drying_rooms
    }

    pub fn audit_events(&self) -> &[AuditEvent] {
        &self.audit_events
    }

    pub fn set_weight(&mut self, strain_id: i64, field: WeightField, raw: impl Into<String>) {
        self.editor.set(strain_id, field, raw);
    }

    pub fn set_drying_room(&mut self, room_id: Option<i64>) {
        self.drying_room_id = room_id;
    }

    /// Harvest-level waste sent with `finish_drying`
    pub fn set_harvest_waste(&mut self, raw: impl Into<String>) {
        self.harvest_waste = raw.into();
    }

    /// Fetch a harvest and its auxiliary data.
    ///
    /// A failed fetch turns the page into an error page. Failures of the
    /// auxiliary lookups are logged and otherwise ignored.
    pub async fn load(&mut self, id: i64) -> ClientResult<&Harvest> {
        self.load_error = None;
        match self.api.get_harvest(id).await {
            Ok(harvest) => self.apply_update(harvest),
            Err(err) => {
                tracing::warn!(harvest_id = id, "Failed to load harvest: {}", err);
                self.harvest = None;
                self.load_error = Some(err.to_string());
                return Err(err);
            }
        }

        match self.api.list_drying_rooms().await {
            Ok(rooms) => self.drying_rooms = rooms,
            Err(err) => tracing::warn!("Failed to load drying rooms: {}", err),
        }
        match self.api.list_audit_events(id).await {
            Ok(events) => self.audit_events = events,
            Err(err) => tracing::warn!(harvest_id = id, "Failed to load audit events: {}", err),
        }

        self.harvest.as_ref().ok_or(ClientError::NotLoaded)
    }

    /// Re-fetch the current harvest
    pub async fn refresh(&mut self) -> ClientResult<&Harvest> {
        let id = self.loaded()?.id;
        let result = self.api.get_harvest(id).await;
        self.settle(result)
    }

    /// Replace local state with a harvest returned by the server
    pub fn apply_update(&mut self, harvest: Harvest) {
        self.editor.sync(&harvest);
        self.harvest_waste.clear();
        self.replace_harvest(harvest);
    }

    fn replace_harvest(&mut self, harvest: Harvest) {
        self.drying_room_id = harvest.drying_room_id;
        self.error = None;
        self.harvest = Some(harvest);
    }

    pub fn view(&self) -> PageView {
        if let Some(message) = &self.load_error {
            return PageView::Error(message.clone());
        }
        match &self.harvest {
            None => PageView::Loading,
            Some(harvest) => PageView::Ready(Box::new(HarvestView::build(
                harvest,
                self.editor.sheet(),
                self.user.role,
                &self.drying_rooms,
                &self.audit_events,
                self.error.as_deref(),
            ))),
        }
    }

    /// Run the harvest's next transition.
    ///
    /// On failure the local harvest is untouched, the form keeps its values
    /// and the message becomes the inline error.
    pub async fn submit(&mut self, action: HarvestAction) -> ClientResult<&Harvest> {
        let result = self.run_transition(action).await;
        self.settle(result)
    }

    pub async fn start_drying(&mut self) -> ClientResult<&Harvest> {
        self.submit(HarvestAction::StartDrying).await
    }

    pub async fn finish_drying(&mut self) -> ClientResult<&Harvest> {
        self.submit(HarvestAction::FinishDrying).await
    }

    pub async fn start_trimming(&mut self) -> ClientResult<&Harvest> {
        self.submit(HarvestAction::StartTrimming).await
    }

    pub async fn finish_trimming(&mut self) -> ClientResult<&Harvest> {
        self.submit(HarvestAction::FinishTrimming).await
    }

    pub async fn finish_curing(&mut self) -> ClientResult<&Harvest> {
        self.submit(HarvestAction::FinishCuring).await
    }

    pub async fn admin_review(&mut self) -> ClientResult<&Harvest> {
        self.submit(HarvestAction::AdminReview).await
    }

    pub async fn close(&mut self) -> ClientResult<&Harvest> {
        self.submit(HarvestAction::Close).await
    }

    pub async fn add_plants(&mut self, plant_ids: Vec<i64>) -> ClientResult<&Harvest> {
        let result = self.run_add_plants(plant_ids).await;
        self.settle(result)
    }

    /// Save one strain's weights from the editor.
    ///
    /// Values typed for other strains stay in the form.
    pub async fn save_strain(&mut self, strain_id: i64) -> ClientResult<&Harvest> {
        let result = match self.loaded() {
            Ok(harvest) => self.editor.save_strain(&self.api, harvest.id, strain_id).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(harvest) => {
                self.editor.sync_keeping_others(&harvest, strain_id);
                self.replace_harvest(harvest);
                self.loaded()
            }
            Err(err) => self.settle(Err(err)),
        }
    }

    fn loaded(&self) -> ClientResult<&Harvest> {
        self.harvest.as_ref().ok_or(ClientError::NotLoaded)
    }

    fn settle(&mut self, result: ClientResult<Harvest>) -> ClientResult<&Harvest> {
        match result {
            Ok(harvest) => {
                self.apply_update(harvest);
                self.loaded()
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn run_add_plants(&self, plant_ids: Vec<i64>) -> ClientResult<Harvest> {
        let harvest = self.loaded()?;
        let request = AddPlantsRequest { plant_ids };
        validate_add_plants(&request).map_err(|e| ClientError::Validation(e.to_string()))?;
        tracing::info!(
            harvest_id = harvest.id,
            count = request.plant_ids.len(),
            "Adding plants to harvest"
        );
        self.api.add_plants(harvest.id, &request).await
    }

    async fn run_transition(&self, action: HarvestAction) -> ClientResult<Harvest> {
        let harvest = self.loaded()?;
        let rule = rule_for(harvest)
            .filter(|rule| rule.action == action)
            .ok_or(ClientError::InvalidTransition {
                status: harvest.status,
                action,
            })?;

        match evaluate(harvest, self.editor.sheet(), self.user.role) {
            Gate::Ready(_) => {}
            Gate::Blocked { reason, .. } => return Err(ClientError::Validation(reason.to_string())),
            Gate::Terminal => {
                return Err(ClientError::InvalidTransition {
                    status: harvest.status,
                    action,
                })
            }
        }

        // Everything is parsed and validated before the first request goes out
        let records = self.editor.pending_requests(rule.submits)?;
        for record in &records {
            validate_strain_weight(record).map_err(|e| ClientError::Validation(e.to_string()))?;
        }
        let body = self.transition_body(harvest, action, !records.is_empty())?;

        tracing::info!(
            harvest_id = harvest.id,
            action = %action,
            records = records.len(),
            "Submitting harvest transition"
        );
        self.submit_weights(harvest.id, records).await?;
        invoke_transition(&self.api, harvest.id, action, body).await
    }

    fn transition_body(
        &self,
        harvest: &Harvest,
        action: HarvestAction,
        submitted_records: bool,
    ) -> ClientResult<TransitionBody> {
        let body = match action {
            HarvestAction::StartDrying => TransitionBody::StartDrying(StartDryingRequest {
                drying_room_id: self.drying_room_id,
            }),
            HarvestAction::FinishDrying => {
                // Per-strain records let the server compute the aggregate
                let dry_weight_grams = if submitted_records {
                    None
                } else {
                    let total = self
                        .editor
                        .sheet()
                        .total_for(&harvest.strains_in_harvest, WeightField::Dry);
                    (total > Decimal::ZERO).then_some(total)
                };
                TransitionBody::FinishDrying(FinishDryingRequest {
                    dry_weight_grams,
                    waste_weight_grams: parse_weight(&self.harvest_waste)?,
                })
            }
            _ => TransitionBody::Empty,
        };
        Ok(body)
    }

    async fn submit_weights(
        &self,
        harvest_id: i64,
        records: Vec<RecordStrainWeightRequest>,
    ) -> ClientResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        match self.submission {
            WeightSubmission::Batch => {
                self.api
                    .record_strain_weights(harvest_id, &RecordStrainWeightsRequest { weights: records })
                    .await?;
            }
            WeightSubmission::Sequential => {
                let mut recorded = Vec::with_capacity(records.len());
                for record in &records {
                    if let Err(source) = self.api.record_strain_weight(harvest_id, record).await {
                        tracing::warn!(
                            harvest_id,
                            strain_id = record.strain_id,
                            recorded = recorded.len(),
                            "Strain weight submission failed"
                        );
                        return Err(ClientError::PartialWeights {
                            recorded,
                            failed_strain: record.strain_id,
                            source: Box::new(source),
                        });
                    }
                    recorded.push(record.strain_id);
                }
            }
        }
        Ok(())
    }
}
