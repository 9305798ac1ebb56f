//! Per-strain weights editor
//!
//! The editor owns a weight sheet derived from the harvest. It never changes
//! the parent harvest itself: `save_strain` returns the server's fresh harvest
//! and the owner must feed it back through `HarvestController::apply_update`,
//! which in turn calls [`WeightsEditor::sync`].

use shared::{
    validate_strain_weight, Harvest, RecordStrainWeightRequest, WeightError, WeightField,
    WeightSheet,
};

use crate::api::HarvestApi;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default)]
pub struct WeightsEditor {
    sheet: WeightSheet,
    // What the server held when the sheet was last seeded
    baseline: WeightSheet,
}

impl WeightsEditor {
    pub fn new(harvest: &Harvest) -> Self {
        let sheet = WeightSheet::from_harvest(harvest);
        Self {
            baseline: sheet.clone(),
            sheet,
        }
    }

    pub fn sheet(&self) -> &WeightSheet {
        &self.sheet
    }

    pub fn sheet_mut(&mut self) -> &mut WeightSheet {
        &mut self.sheet
    }

    pub fn set(&mut self, strain_id: i64, field: WeightField, raw: impl Into<String>) {
        self.sheet.set(strain_id, field, raw);
    }

    /// Re-derive the sheet from a fresh server harvest
    pub fn sync(&mut self, harvest: &Harvest) {
        self.sheet = WeightSheet::from_harvest(harvest);
        self.baseline = self.sheet.clone();
    }

    /// Re-derive the sheet after `saved_strain` was recorded.
    ///
    /// Unsaved values typed for other strains are carried over onto the
    /// fresh copy.
    pub fn sync_keeping_others(&mut self, harvest: &Harvest, saved_strain: i64) {
        let previous = std::mem::replace(self, Self::new(harvest));
        for strain_id in previous.sheet.strain_ids().filter(|id| *id != saved_strain) {
            for field in WeightField::ALL {
                if previous.is_dirty(strain_id, field) {
                    self.sheet.set(strain_id, field, previous.sheet.raw(strain_id, field));
                }
            }
        }
    }

    /// Whether `field` differs from what the server already recorded
    pub fn is_dirty(&self, strain_id: i64, field: WeightField) -> bool {
        self.sheet.raw(strain_id, field).trim() != self.baseline.raw(strain_id, field).trim()
    }

    /// Records for the values typed since the last sync.
    ///
    /// Recorded values that were left untouched are not sent again.
    pub fn pending_requests(
        &self,
        fields: &[WeightField],
    ) -> Result<Vec<RecordStrainWeightRequest>, WeightError> {
        let requests = self
            .sheet
            .to_requests(fields)?
            .into_iter()
            .filter_map(|mut request| {
                for field in fields {
                    if !self.is_dirty(request.strain_id, *field) {
                        request.set(*field, None);
                    }
                }
                (!request.is_empty()).then_some(request)
            })
            .collect();
        Ok(requests)
    }

    /// Submit every typed field for one strain
    pub async fn save_strain<A: HarvestApi + ?Sized>(
        &self,
        api: &A,
        harvest_id: i64,
        strain_id: i64,
    ) -> ClientResult<Harvest> {
        let request = self
            .sheet
            .request_for(strain_id, &WeightField::ALL)?
            .ok_or_else(|| {
                ClientError::Validation(format!("No weights entered for strain {}", strain_id))
            })?;
        validate_strain_weight(&request).map_err(|e| ClientError::Validation(e.to_string()))?;

        tracing::info!(harvest_id, strain_id, "Recording strain weight");
        api.record_strain_weight(harvest_id, &request).await
    }
}
