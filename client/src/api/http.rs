//! HTTP implementation of the facility API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    AddPlantsRequest, AuditEvent, CreateHarvestRequest, Envelope, FacilityRoom,
    FinishDryingRequest, Harvest, HarvestAction, RecordStrainWeightRequest,
    RecordStrainWeightsRequest, StartDryingRequest,
};
use tracing::Instrument;
use uuid::Uuid;

use super::{extract_error_message, HarvestApi};
use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Facility API client over HTTP
#[derive(Clone)]
pub struct HttpHarvestClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpHarvestClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("spf-harvest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Create a client with a custom base URL and no token (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let client = Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn harvest_path(id: i64, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("/facility/harvests/{}/{}", id, action),
            None => format!("/facility/harvests/{}", id),
        }
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request_id = Uuid::new_v4();
        let method_label = method.as_str().to_string();
        let span = tracing::debug_span!(
            "facility_api",
            method = %method_label,
            path = %path,
            request_id = %request_id
        );

        async move {
            let url = format!("{}{}", self.base_url, path);
            let mut request = self
                .client
                .request(method, &url)
                .header(reqwest::header::ACCEPT, "application/json")
                .header(REQUEST_ID_HEADER, request_id.to_string());
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|e| {
                tracing::warn!("Facility API request failed: {}", e);
                ClientError::Network(e)
            })?;

            let status = response.status();
            let text = response.text().await?;

            if !status.is_success() {
                let message = extract_error_message(status, &text);
                tracing::warn!(status = status.as_u16(), "Facility API error: {}", message);
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            tracing::debug!(status = status.as_u16(), "Facility API responded");
            let envelope: Envelope<T> = serde_json::from_str(&text)
                .map_err(|e| ClientError::Decode(format!("{} ({})", e, path)))?;
            Ok(envelope.into_inner())
        }
        .instrument(span)
        .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn post_action(&self, id: i64, action: HarvestAction) -> ClientResult<Harvest> {
        let path = Self::harvest_path(id, Some(action.endpoint()));
        self.post(&path, &serde_json::json!({})).await
    }
}

#[async_trait]
impl HarvestApi for HttpHarvestClient {
    async fn get_harvest(&self, id: i64) -> ClientResult<Harvest> {
        self.get(&Self::harvest_path(id, None)).await
    }

    async fn list_harvests(&self) -> ClientResult<Vec<Harvest>> {
        self.get("/facility/harvests").await
    }

    async fn create_harvest(&self, request: &CreateHarvestRequest) -> ClientResult<Harvest> {
        self.post("/facility/harvests", request).await
    }

    async fn start_drying(&self, id: i64, request: &StartDryingRequest) -> ClientResult<Harvest> {
        let path = Self::harvest_path(id, Some(HarvestAction::StartDrying.endpoint()));
        self.post(&path, request).await
    }

    async fn finish_drying(
        &self,
        id: i64,
        request: &FinishDryingRequest,
    ) -> ClientResult<Harvest> {
        let path = Self::harvest_path(id, Some(HarvestAction::FinishDrying.endpoint()));
        self.post(&path, request).await
    }

    async fn start_trimming(&self, id: i64) -> ClientResult<Harvest> {
        self.post_action(id, HarvestAction::StartTrimming).await
    }

    async fn finish_trimming(&self, id: i64) -> ClientResult<Harvest> {
        self.post_action(id, HarvestAction::FinishTrimming).await
    }

    async fn finish_curing(&self, id: i64) -> ClientResult<Harvest> {
        self.post_action(id, HarvestAction::FinishCuring).await
    }

    async fn admin_review(&self, id: i64) -> ClientResult<Harvest> {
        self.post_action(id, HarvestAction::AdminReview).await
    }

    async fn close(&self, id: i64) -> ClientResult<Harvest> {
        self.post_action(id, HarvestAction::Close).await
    }

    async fn record_strain_weight(
        &self,
        id: i64,
        request: &RecordStrainWeightRequest,
    ) -> ClientResult<Harvest> {
        self.post(&Self::harvest_path(id, Some("record_strain_weight")), request)
            .await
    }

    async fn record_strain_weights(
        &self,
        id: i64,
        request: &RecordStrainWeightsRequest,
    ) -> ClientResult<Harvest> {
        self.post(&Self::harvest_path(id, Some("record_strain_weights")), request)
            .await
    }

    async fn add_plants(&self, id: i64, request: &AddPlantsRequest) -> ClientResult<Harvest> {
        self.post(&Self::harvest_path(id, Some("add_plants")), request)
            .await
    }

    async fn list_drying_rooms(&self) -> ClientResult<Vec<FacilityRoom>> {
        self.get("/facility/rooms?room_type=drying").await
    }

    async fn list_audit_events(&self, harvest_id: i64) -> ClientResult<Vec<AuditEvent>> {
        self.get(&format!(
            "/audit_events?auditable_type=Harvest&auditable_id={}",
            harvest_id
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvest_paths() {
        assert_eq!(HttpHarvestClient::harvest_path(5, None), "/facility/harvests/5");
        assert_eq!(
            HttpHarvestClient::harvest_path(5, Some("finish_curing")),
            "/facility/harvests/5/finish_curing"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = HttpHarvestClient::with_base_url("http://localhost:3000/api/v1/");
        assert_eq!(client.base_url(), "http://localhost:3000/api/v1");
    }
}
