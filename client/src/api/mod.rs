//! Facility API access
//!
//! `HarvestApi` is the seam between the workflow controller and the network.
//! Every harvest endpoint answers with the full updated harvest.

mod error_body;
mod http;

pub use error_body::extract_error_message;
pub use http::HttpHarvestClient;

use async_trait::async_trait;
use shared::{
    AddPlantsRequest, AuditEvent, CreateHarvestRequest, FacilityRoom, FinishDryingRequest,
    Harvest, HarvestAction, RecordStrainWeightRequest, RecordStrainWeightsRequest,
    StartDryingRequest,
};

use crate::error::ClientResult;

#[async_trait]
pub trait HarvestApi: Send + Sync {
    async fn get_harvest(&self, id: i64) -> ClientResult<Harvest>;

    async fn list_harvests(&self) -> ClientResult<Vec<Harvest>>;

    async fn create_harvest(&self, request: &CreateHarvestRequest) -> ClientResult<Harvest>;

    async fn start_drying(&self, id: i64, request: &StartDryingRequest) -> ClientResult<Harvest>;

    async fn finish_drying(&self, id: i64, request: &FinishDryingRequest)
        -> ClientResult<Harvest>;

    async fn start_trimming(&self, id: i64) -> ClientResult<Harvest>;

    async fn finish_trimming(&self, id: i64) -> ClientResult<Harvest>;

    async fn finish_curing(&self, id: i64) -> ClientResult<Harvest>;

    async fn admin_review(&self, id: i64) -> ClientResult<Harvest>;

    async fn close(&self, id: i64) -> ClientResult<Harvest>;

    async fn record_strain_weight(
        &self,
        id: i64,
        request: &RecordStrainWeightRequest,
    ) -> ClientResult<Harvest>;

    async fn record_strain_weights(
        &self,
        id: i64,
        request: &RecordStrainWeightsRequest,
    ) -> ClientResult<Harvest>;

    async fn add_plants(&self, id: i64, request: &AddPlantsRequest) -> ClientResult<Harvest>;

    async fn list_drying_rooms(&self) -> ClientResult<Vec<FacilityRoom>>;

    async fn list_audit_events(&self, harvest_id: i64) -> ClientResult<Vec<AuditEvent>>;
}

/// Bodies for the transition endpoints that take one
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionBody {
    StartDrying(StartDryingRequest),
    FinishDrying(FinishDryingRequest),
    Empty,
}

/// Dispatch a named transition to the matching endpoint
pub async fn invoke_transition<A: HarvestApi + ?Sized>(
    api: &A,
    id: i64,
    action: HarvestAction,
    body: TransitionBody,
) -> ClientResult<Harvest> {
    match (action, body) {
        (HarvestAction::StartDrying, TransitionBody::StartDrying(req)) => {
            api.start_drying(id, &req).await
        }
        (HarvestAction::StartDrying, _) => api.start_drying(id, &StartDryingRequest::default()).await,
        (HarvestAction::FinishDrying, TransitionBody::FinishDrying(req)) => {
            api.finish_drying(id, &req).await
        }
        (HarvestAction::FinishDrying, _) => {
            api.finish_drying(id, &FinishDryingRequest::default()).await
        }
        (HarvestAction::StartTrimming, _) => api.start_trimming(id).await,
        (HarvestAction::FinishTrimming, _) => api.finish_trimming(id).await,
        (HarvestAction::FinishCuring, _) => api.finish_curing(id).await,
        (HarvestAction::AdminReview, _) => api.admin_review(id).await,
        (HarvestAction::Close, _) => api.close(id).await,
    }
}
