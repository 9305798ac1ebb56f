//! Validation utilities for harvest input
//!
//! These run before anything is sent. The facility API repeats every check
//! and has the final word.

use rust_decimal::Decimal;

use crate::models::{AddPlantsRequest, CreateHarvestRequest, RecordStrainWeightRequest};
use crate::weights::WeightField;

/// Heaviest single weight the dashboard accepts, in grams (1 tonne)
pub const MAX_WEIGHT_GRAMS: u32 = 1_000_000;

/// Longest harvest name accepted
pub const MAX_HARVEST_NAME_LEN: usize = 120;

/// Validate a weight in grams
pub fn validate_weight_grams(weight: Decimal) -> Result<(), &'static str> {
    if weight < Decimal::ZERO {
        return Err("Weight cannot be negative");
    }
    if weight > Decimal::from(MAX_WEIGHT_GRAMS) {
        return Err("Weight exceeds 1,000,000 grams");
    }
    Ok(())
}

/// Validate a per-strain weight record before it is submitted
pub fn validate_strain_weight(request: &RecordStrainWeightRequest) -> Result<(), &'static str> {
    if request.strain_id <= 0 {
        return Err("Strain id must be positive");
    }
    if request.is_empty() {
        return Err("At least one weight must be provided");
    }
    for field in WeightField::ALL {
        if let Some(value) = request.get(field) {
            validate_weight_grams(value)?;
        }
    }
    Ok(())
}

/// Validate a list of plant ids
pub fn validate_plant_ids(plant_ids: &[i64]) -> Result<(), &'static str> {
    if plant_ids.is_empty() {
        return Err("At least one plant must be selected");
    }
    if plant_ids.iter().any(|id| *id <= 0) {
        return Err("Plant ids must be positive");
    }
    let mut sorted = plant_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != plant_ids.len() {
        return Err("Plant ids must not repeat");
    }
    Ok(())
}

/// Validate a request to add plants to a harvest
pub fn validate_add_plants(request: &AddPlantsRequest) -> Result<(), &'static str> {
    validate_plant_ids(&request.plant_ids)
}

/// Validate a harvest name
pub fn validate_harvest_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Harvest name is required");
    }
    if trimmed.chars().count() > MAX_HARVEST_NAME_LEN {
        return Err("Harvest name must be at most 120 characters");
    }
    Ok(())
}

/// Validate a request to create a harvest
pub fn validate_create_harvest(request: &CreateHarvestRequest) -> Result<(), &'static str> {
    validate_harvest_name(&request.name)?;
    validate_plant_ids(&request.plant_ids)
}
