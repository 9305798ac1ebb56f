//! Harvest models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ActorRef;

/// Post-harvest processing status.
///
/// The order of the variants is the order of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStatus {
    Active,
    Drying,
    Dried,
    Trimming,
    Curing,
    Packaged,
    Closed,
}

impl HarvestStatus {
    /// Every status, in workflow order
    pub const ALL: [HarvestStatus; 7] = [
        HarvestStatus::Active,
        HarvestStatus::Drying,
        HarvestStatus::Dried,
        HarvestStatus::Trimming,
        HarvestStatus::Curing,
        HarvestStatus::Packaged,
        HarvestStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HarvestStatus::Active => "active",
            HarvestStatus::Drying => "drying",
            HarvestStatus::Dried => "dried",
            HarvestStatus::Trimming => "trimming",
            HarvestStatus::Curing => "curing",
            HarvestStatus::Packaged => "packaged",
            HarvestStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(HarvestStatus::Active),
            "drying" => Some(HarvestStatus::Drying),
            "dried" => Some(HarvestStatus::Dried),
            "trimming" => Some(HarvestStatus::Trimming),
            "curing" => Some(HarvestStatus::Curing),
            "packaged" => Some(HarvestStatus::Packaged),
            "closed" => Some(HarvestStatus::Closed),
            _ => None,
        }
    }

    /// Position of this status in [`HarvestStatus::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            HarvestStatus::Active => "Active",
            HarvestStatus::Drying => "Drying",
            HarvestStatus::Dried => "Dried",
            HarvestStatus::Trimming => "Trimming",
            HarvestStatus::Curing => "Curing",
            HarvestStatus::Packaged => "Packaged",
            HarvestStatus::Closed => "Closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, HarvestStatus::Closed)
    }
}

impl std::fmt::Display for HarvestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One post-harvest processing run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Harvest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub uid: Option<String>,
    pub status: HarvestStatus,

    #[serde(default)]
    pub wet_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub dry_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub waste_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub flower_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub shake_weight_grams: Option<Decimal>,

    #[serde(default)]
    pub strains_in_harvest: Vec<StrainRef>,
    #[serde(default)]
    pub harvest_weights: Vec<HarvestWeight>,
    #[serde(default)]
    pub harvest_plants: Vec<HarvestPlant>,

    #[serde(default)]
    pub drying_room_id: Option<i64>,
    #[serde(default)]
    pub drying_room_name: Option<String>,
    #[serde(default)]
    pub drying_days: Option<i32>,
    #[serde(default)]
    pub curing_days: Option<i32>,

    #[serde(default)]
    pub harvested_at: Option<NaiveDate>,
    #[serde(default)]
    pub drying_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dried_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trimming_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trimming_finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub curing_finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub admin_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admin_reviewed_by: Option<ActorRef>,

    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Harvest {
    /// Whether an admin has signed off on the packaged harvest
    pub fn is_reviewed(&self) -> bool {
        self.admin_reviewed_at.is_some()
    }

    /// Recorded weights for one strain, if any
    pub fn weight_for(&self, strain_id: i64) -> Option<&HarvestWeight> {
        self.harvest_weights.iter().find(|w| w.strain_id == strain_id)
    }

    /// Number of plants captured for one strain
    pub fn plant_count(&self, strain_id: i64) -> usize {
        self.harvest_plants
            .iter()
            .filter(|p| p.strain_id == Some(strain_id))
            .count()
    }

    /// Timestamp written when the harvest entered `status`
    pub fn entered_at(&self, status: HarvestStatus) -> Option<DateTime<Utc>> {
        match status {
            HarvestStatus::Active => self.created_at,
            HarvestStatus::Drying => self.drying_started_at,
            HarvestStatus::Dried => self.dried_at,
            HarvestStatus::Trimming => self.trimming_started_at,
            HarvestStatus::Curing => self.trimming_finished_at,
            HarvestStatus::Packaged => self.curing_finished_at,
            HarvestStatus::Closed => self.closed_at,
        }
    }
}

/// A strain contributing plants to a harvest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrainRef {
    pub id: i64,
    pub name: String,
}

/// Per-strain weights recorded for a harvest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestWeight {
    #[serde(default)]
    pub id: Option<i64>,
    pub strain_id: i64,
    #[serde(default)]
    pub strain_name: Option<String>,
    #[serde(default)]
    pub wet_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub dry_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub waste_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub flower_weight_grams: Option<Decimal>,
    #[serde(default)]
    pub shake_weight_grams: Option<Decimal>,
}

/// A plant physically included in a harvest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestPlant {
    pub id: i64,
    pub plant_id: i64,
    #[serde(default)]
    pub plant_uid: Option<String>,
    #[serde(default)]
    pub strain_id: Option<i64>,
    #[serde(default)]
    pub strain_name: Option<String>,
    #[serde(default)]
    pub wet_weight_grams: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_order_matches_index() {
        for (i, status) in HarvestStatus::ALL.iter().enumerate() {
            assert_eq!(status.index(), i);
            assert_eq!(HarvestStatus::from_str(status.as_str()), Some(*status));
        }
        assert!(HarvestStatus::Active < HarvestStatus::Closed);
    }

    #[test]
    fn test_deserialize_minimal_harvest() {
        let json = r#"{"id": 12, "name": "Fall run", "status": "drying", "wet_weight_grams": "800.0"}"#;
        let harvest: Harvest = serde_json::from_str(json).unwrap();
        assert_eq!(harvest.status, HarvestStatus::Drying);
        assert_eq!(harvest.wet_weight_grams, Some(Decimal::from(800)));
        assert!(harvest.strains_in_harvest.is_empty());
        assert!(!harvest.is_reviewed());
    }

    #[test]
    fn test_deserialize_numeric_weights_and_unknown_fields() {
        let json = r#"{
            "id": 3, "name": "H3", "uid": "HRV-003", "status": "packaged",
            "metrc_tag": "ignored",
            "strains_in_harvest": [{"id": 1, "name": "Blue Dream"}],
            "harvest_weights": [{"strain_id": 1, "dry_weight_grams": 120.5}],
            "harvest_plants": [{"id": 9, "plant_id": 40, "strain_id": 1}],
            "admin_reviewed_at": "2026-03-01T10:00:00Z",
            "admin_reviewed_by": {"id": 2, "name": "Admin"}
        }"#;
        let harvest: Harvest = serde_json::from_str(json).unwrap();
        assert!(harvest.is_reviewed());
        assert_eq!(harvest.plant_count(1), 1);
        assert_eq!(
            harvest.weight_for(1).and_then(|w| w.dry_weight_grams),
            Some(Decimal::new(1205, 1))
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let json = r#"{"id": 1, "name": "X", "status": "composted"}"#;
        assert!(serde_json::from_str::<Harvest>(json).is_err());
    }
}
