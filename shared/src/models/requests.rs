//! Request bodies for the facility harvest endpoints
//!
//! Weights travel as JSON numbers; absent optionals are omitted rather than
//! sent as `null` or `0`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::weights::WeightField;

/// Body for `start_drying`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StartDryingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drying_room_id: Option<i64>,
}

/// Body for `finish_drying`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FinishDryingRequest {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub dry_weight_grams: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub waste_weight_grams: Option<Decimal>,
}

/// Body for `record_strain_weight`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordStrainWeightRequest {
    pub strain_id: i64,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub wet_weight_grams: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub dry_weight_grams: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub waste_weight_grams: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub flower_weight_grams: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub shake_weight_grams: Option<Decimal>,
}

impl RecordStrainWeightRequest {
    /// An empty record for one strain
    pub fn new(strain_id: i64) -> Self {
        Self {
            strain_id,
            wet_weight_grams: None,
            dry_weight_grams: None,
            waste_weight_grams: None,
            flower_weight_grams: None,
            shake_weight_grams: None,
        }
    }

    pub fn get(&self, field: WeightField) -> Option<Decimal> {
        match field {
            WeightField::Wet => self.wet_weight_grams,
            WeightField::Dry => self.dry_weight_grams,
            WeightField::Waste => self.waste_weight_grams,
            WeightField::Flower => self.flower_weight_grams,
            WeightField::Shake => self.shake_weight_grams,
        }
    }

    pub fn set(&mut self, field: WeightField, value: Option<Decimal>) {
        let slot = match field {
            WeightField::Wet => &mut self.wet_weight_grams,
            WeightField::Dry => &mut self.dry_weight_grams,
            WeightField::Waste => &mut self.waste_weight_grams,
            WeightField::Flower => &mut self.flower_weight_grams,
            WeightField::Shake => &mut self.shake_weight_grams,
        };
        *slot = value;
    }

    /// True when no weight was provided
    pub fn is_empty(&self) -> bool {
        WeightField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// Body for the batch `record_strain_weights` endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordStrainWeightsRequest {
    pub weights: Vec<RecordStrainWeightRequest>,
}

/// Body for `add_plants`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddPlantsRequest {
    pub plant_ids: Vec<i64>,
}

/// Body for creating a harvest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateHarvestRequest {
    pub name: String,
    pub plant_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvested_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
