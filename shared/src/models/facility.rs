//! Facility lookups shown alongside a harvest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ActorRef;

/// A grow-facility room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacilityRoom {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub room_type: Option<String>,
}

/// Entry in a harvest's activity log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub id: i64,
    pub action: String,
    #[serde(default)]
    pub actor: Option<ActorRef>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
