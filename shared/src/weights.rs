//! Per-strain weight aggregation
//!
//! The weight sheet holds what the user typed for each strain, as raw text.
//! Empty text means "not provided", which is not the same as zero: only typed
//! values are ever submitted. Totals computed here are advisory; the server
//! recomputes the authoritative aggregates once the records are persisted.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Harvest, RecordStrainWeightRequest, StrainRef};
use crate::validation::MAX_WEIGHT_GRAMS;

/// A weight measured per strain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightField {
    Wet,
    Dry,
    Waste,
    Flower,
    Shake,
}

impl WeightField {
    pub const ALL: [WeightField; 5] = [
        WeightField::Wet,
        WeightField::Dry,
        WeightField::Waste,
        WeightField::Flower,
        WeightField::Shake,
    ];

    /// Field name used by the API
    pub fn json_key(&self) -> &'static str {
        match self {
            WeightField::Wet => "wet_weight_grams",
            WeightField::Dry => "dry_weight_grams",
            WeightField::Waste => "waste_weight_grams",
            WeightField::Flower => "flower_weight_grams",
            WeightField::Shake => "shake_weight_grams",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeightField::Wet => "wet",
            WeightField::Dry => "dry",
            WeightField::Waste => "waste",
            WeightField::Flower => "flower",
            WeightField::Shake => "shake",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "wet" | "wet_weight_grams" => Some(WeightField::Wet),
            "dry" | "dry_weight_grams" => Some(WeightField::Dry),
            "waste" | "waste_weight_grams" => Some(WeightField::Waste),
            "flower" | "flower_weight_grams" => Some(WeightField::Flower),
            "shake" | "shake_weight_grams" => Some(WeightField::Shake),
            _ => None,
        }
    }

    /// Aggregate value of this field on the harvest
    pub fn aggregate(&self, harvest: &Harvest) -> Option<Decimal> {
        match self {
            WeightField::Wet => harvest.wet_weight_grams,
            WeightField::Dry => harvest.dry_weight_grams,
            WeightField::Waste => harvest.waste_weight_grams,
            WeightField::Flower => harvest.flower_weight_grams,
            WeightField::Shake => harvest.shake_weight_grams,
        }
    }
}

impl std::fmt::Display for WeightField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Why a typed weight cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightError {
    #[error("'{0}' is not a number")]
    Invalid(String),

    #[error("weight cannot be negative: {0}")]
    Negative(String),

    #[error("{field} weight for strain {strain_id}: {reason}")]
    Field {
        strain_id: i64,
        field: WeightField,
        reason: Box<WeightError>,
    },
}

/// Parse one weight input in grams.
///
/// Blank input is `Ok(None)`.
pub fn parse_weight(raw: &str) -> Result<Option<Decimal>, WeightError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| WeightError::Invalid(trimmed.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(WeightError::Negative(trimmed.to_string()));
    }
    Ok(Some(value))
}

/// Whether a parsed weight is above the heaviest accepted value
pub fn exceeds_limit(value: Decimal) -> bool {
    value > Decimal::from(MAX_WEIGHT_GRAMS)
}

/// Value used for advisory sums: anything unusable counts as zero,
/// including values over the weight limit
pub fn advisory_value(raw: &str) -> Decimal {
    parse_weight(raw)
        .ok()
        .flatten()
        .filter(|v| !exceeds_limit(*v))
        .unwrap_or(Decimal::ZERO)
}

/// Sum that stops at `Decimal::MAX` instead of overflowing
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| acc.checked_add(v).unwrap_or(Decimal::MAX))
}

/// Raw inputs for one strain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrainWeightEntry {
    #[serde(default)]
    pub wet: String,
    #[serde(default)]
    pub dry: String,
    #[serde(default)]
    pub waste: String,
    #[serde(default)]
    pub flower: String,
    #[serde(default)]
    pub shake: String,
}

impl StrainWeightEntry {
    pub fn raw(&self, field: WeightField) -> &str {
        match field {
            WeightField::Wet => &self.wet,
            WeightField::Dry => &self.dry,
            WeightField::Waste => &self.waste,
            WeightField::Flower => &self.flower,
            WeightField::Shake => &self.shake,
        }
    }

    pub fn set(&mut self, field: WeightField, raw: impl Into<String>) {
        let slot = match field {
            WeightField::Wet => &mut self.wet,
            WeightField::Dry => &mut self.dry,
            WeightField::Waste => &mut self.waste,
            WeightField::Flower => &mut self.flower,
            WeightField::Shake => &mut self.shake,
        };
        *slot = raw.into();
    }

    pub fn is_blank(&self, field: WeightField) -> bool {
        self.raw(field).trim().is_empty()
    }
}

/// Weight inputs keyed by strain id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightSheet {
    entries: BTreeMap<i64, StrainWeightEntry>,
}

impl WeightSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a sheet from the weights the server already holds
    pub fn from_harvest(harvest: &Harvest) -> Self {
        let mut sheet = Self::new();
        for weight in &harvest.harvest_weights {
            let entry = sheet.entries.entry(weight.strain_id).or_default();
            let recorded = [
                (WeightField::Wet, weight.wet_weight_grams),
                (WeightField::Dry, weight.dry_weight_grams),
                (WeightField::Waste, weight.waste_weight_grams),
                (WeightField::Flower, weight.flower_weight_grams),
                (WeightField::Shake, weight.shake_weight_grams),
            ];
            for (field, value) in recorded {
                if let Some(value) = value {
                    entry.set(field, value.normalize().to_string());
                }
            }
        }
        sheet
    }

    pub fn set(&mut self, strain_id: i64, field: WeightField, raw: impl Into<String>) {
        self.entries.entry(strain_id).or_default().set(field, raw);
    }

    pub fn raw(&self, strain_id: i64, field: WeightField) -> &str {
        self.entries
            .get(&strain_id)
            .map(|e| e.raw(field))
            .unwrap_or("")
    }

    pub fn entry(&self, strain_id: i64) -> Option<&StrainWeightEntry> {
        self.entries.get(&strain_id)
    }

    /// Strains with an entry, in id order
    pub fn strain_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    /// Parsed value for one strain and field
    pub fn value(&self, strain_id: i64, field: WeightField) -> Result<Option<Decimal>, WeightError> {
        parse_weight(self.raw(strain_id, field))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Advisory sum across every strain on the sheet
    pub fn total(&self, field: WeightField) -> Decimal {
        saturating_sum(self.entries.values().map(|e| advisory_value(e.raw(field))))
    }

    /// Advisory sum restricted to the given strains
    pub fn total_for(&self, strains: &[StrainRef], field: WeightField) -> Decimal {
        saturating_sum(strains.iter().map(|s| advisory_value(self.raw(s.id, field))))
    }

    /// Whether every strain has a strictly positive value for `field`
    pub fn all_positive(&self, strains: &[StrainRef], field: WeightField) -> bool {
        self.missing(strains, field).is_empty()
    }

    /// Strains whose value for `field` is blank, unparseable or not positive
    pub fn missing<'a>(&self, strains: &'a [StrainRef], field: WeightField) -> Vec<&'a StrainRef> {
        strains
            .iter()
            .filter(|s| !matches!(self.value(s.id, field), Ok(Some(v)) if v > Decimal::ZERO))
            .collect()
    }

    /// Strains whose value for `field` is over the weight limit
    pub fn over_limit<'a>(&self, strains: &'a [StrainRef], field: WeightField) -> Vec<&'a StrainRef> {
        strains
            .iter()
            .filter(|s| matches!(self.value(s.id, field), Ok(Some(v)) if exceeds_limit(v)))
            .collect()
    }

    /// Record request for one strain from whatever is typed in `fields`.
    ///
    /// Only this strain's inputs are parsed. `Ok(None)` when nothing is typed.
    pub fn request_for(
        &self,
        strain_id: i64,
        fields: &[WeightField],
    ) -> Result<Option<RecordStrainWeightRequest>, WeightError> {
        let entry = match self.entries.get(&strain_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let mut request = RecordStrainWeightRequest::new(strain_id);
        for field in fields {
            let value = parse_weight(entry.raw(*field)).map_err(|reason| WeightError::Field {
                strain_id,
                field: *field,
                reason: Box::new(reason),
            })?;
            request.set(*field, value);
        }
        Ok(Some(request).filter(|r| !r.is_empty()))
    }

    /// Build one record request per strain that has something typed in
    /// `fields`. Strains are visited in id order.
    pub fn to_requests(
        &self,
        fields: &[WeightField],
    ) -> Result<Vec<RecordStrainWeightRequest>, WeightError> {
        let mut requests = Vec::new();
        for strain_id in self.strain_ids() {
            if let Some(request) = self.request_for(strain_id, fields)? {
                requests.push(request);
            }
        }
        Ok(requests)
    }
}

/// Water lost while drying, as a percentage of the wet weight.
///
/// Only meaningful once a wet weight is known and some dry weight has been
/// entered. `None` as well when the ratio does not fit in a `Decimal`.
pub fn water_loss_percent(total_dry: Decimal, wet_weight: Option<Decimal>) -> Option<Decimal> {
    let wet = wet_weight.filter(|w| *w > Decimal::ZERO)?;
    if total_dry <= Decimal::ZERO {
        return None;
    }
    let loss = Decimal::ONE
        .checked_sub(total_dry.checked_div(wet)?)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(loss.round_dp(1))
}

/// Trimmed flower as a percentage of the dry weight
pub fn trim_yield_percent(total_flower: Decimal, dry_weight: Option<Decimal>) -> Option<Decimal> {
    let dry = dry_weight.filter(|d| *d > Decimal::ZERO)?;
    if total_flower <= Decimal::ZERO {
        return None;
    }
    let ratio = total_flower.checked_div(dry)?.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(ratio.round_dp(1))
}

/// Grams without trailing zeros, e.g. `180g`
pub fn format_grams(value: Decimal) -> String {
    format!("{}g", value.normalize())
}

/// Advisory lines shown under the stage form
pub fn advisory_lines(harvest: &Harvest, sheet: &WeightSheet) -> Vec<String> {
    use crate::models::HarvestStatus;

    let strains = &harvest.strains_in_harvest;
    let mut lines = Vec::new();
    match harvest.status {
        HarvestStatus::Active => {
            let wet = sheet.total_for(strains, WeightField::Wet);
            if wet > Decimal::ZERO {
                lines.push(format!("Total wet: {}", format_grams(wet)));
            }
        }
        HarvestStatus::Drying => {
            let dry = sheet.total_for(strains, WeightField::Dry);
            lines.push(format!("Total dry: {}", format_grams(dry)));
            if let (Some(loss), Some(wet)) = (
                water_loss_percent(dry, harvest.wet_weight_grams),
                harvest.wet_weight_grams,
            ) {
                lines.push(format!(
                    "Water loss: {:.1}% from {} wet",
                    loss,
                    format_grams(wet)
                ));
            }
        }
        HarvestStatus::Trimming => {
            let flower = sheet.total_for(strains, WeightField::Flower);
            lines.push(format!("Total flower: {}", format_grams(flower)));
            let shake = sheet.total_for(strains, WeightField::Shake);
            if shake > Decimal::ZERO {
                lines.push(format!("Total shake: {}", format_grams(shake)));
            }
            let waste = sheet.total_for(strains, WeightField::Waste);
            if waste > Decimal::ZERO {
                lines.push(format!("Total waste: {}", format_grams(waste)));
            }
            if let Some(yield_pct) = trim_yield_percent(flower, harvest.dry_weight_grams) {
                lines.push(format!("Flower yield: {:.1}% of dry", yield_pct));
            }
        }
        _ => {}
    }
    lines
}
