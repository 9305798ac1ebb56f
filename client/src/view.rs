//! Derived page state for one harvest

use serde::Serialize;
use shared::{
    advisory_lines, evaluate, progress, rule_for, visible_action, AuditEvent, FacilityRoom, Gate,
    Harvest, HarvestAction, Progress, UserRole, WeightField, WeightSheet,
};

/// The single stage action offered on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionView {
    pub action: HarvestAction,
    pub label: &'static str,
    pub enabled: bool,
    /// Why the action is disabled
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestView {
    pub harvest: Harvest,
    pub progress: Progress,
    pub action: Option<ActionView>,
    /// Fields the stage form collects per strain
    pub stage_fields: Vec<WeightField>,
    pub sheet: WeightSheet,
    pub advisory: Vec<String>,
    pub drying_rooms: Vec<FacilityRoom>,
    pub audit_events: Vec<AuditEvent>,
    /// Inline error from the last failed action
    pub error: Option<String>,
}

impl HarvestView {
    pub fn build(
        harvest: &Harvest,
        sheet: &WeightSheet,
        role: UserRole,
        drying_rooms: &[FacilityRoom],
        audit_events: &[AuditEvent],
        error: Option<&str>,
    ) -> Self {
        let action = visible_action(harvest, role).map(|action| {
            let gate = evaluate(harvest, sheet, role);
            let blocked_reason = match &gate {
                Gate::Blocked { reason, .. } => Some(reason.to_string()),
                _ => None,
            };
            ActionView {
                action,
                label: action.label(),
                enabled: gate.is_ready(),
                blocked_reason,
            }
        });
        let stage_fields = rule_for(harvest)
            .map(|rule| rule.submits.to_vec())
            .unwrap_or_default();

        Self {
            harvest: harvest.clone(),
            progress: progress(harvest.status),
            action,
            stage_fields,
            sheet: sheet.clone(),
            advisory: advisory_lines(harvest, sheet),
            drying_rooms: drying_rooms.to_vec(),
            audit_events: audit_events.to_vec(),
            error: error.map(str::to_string),
        }
    }
}

/// What the harvest page shows
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", content = "view", rename_all = "snake_case")]
pub enum PageView {
    Loading,
    /// The harvest could not be fetched; no retry is offered
    Error(String),
    Ready(Box<HarvestView>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{HarvestStatus, StrainRef};

    fn harvest(status: HarvestStatus) -> Harvest {
        let mut h: Harvest = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Spring",
            "status": status.as_str(),
        }))
        .unwrap();
        h.strains_in_harvest = vec![
            StrainRef { id: 1, name: "A".to_string() },
            StrainRef { id: 2, name: "B".to_string() },
        ];
        h
    }

    #[test]
    fn test_disabled_action_carries_reason() {
        let h = harvest(HarvestStatus::Drying);
        let mut sheet = WeightSheet::new();
        sheet.set(1, WeightField::Dry, "100");
        let view = HarvestView::build(&h, &sheet, UserRole::Staff, &[], &[], None);

        let action = view.action.unwrap();
        assert_eq!(action.label, "Mark as Dried");
        assert!(!action.enabled);
        assert_eq!(
            action.blocked_reason.as_deref(),
            Some("Enter a dry weight greater than zero for: B")
        );
        assert_eq!(view.stage_fields, vec![WeightField::Dry]);
        assert_eq!(view.progress.filled_count(), 2);
    }

    #[test]
    fn test_admin_actions_hidden_from_staff() {
        let h = harvest(HarvestStatus::Packaged);
        let sheet = WeightSheet::new();
        let staff = HarvestView::build(&h, &sheet, UserRole::Staff, &[], &[], None);
        assert!(staff.action.is_none());

        let admin = HarvestView::build(&h, &sheet, UserRole::Admin, &[], &[], Some("boom"));
        assert_eq!(admin.action.unwrap().action, HarvestAction::AdminReview);
        assert_eq!(admin.error.as_deref(), Some("boom"));
    }
}
