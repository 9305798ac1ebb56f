//! Harvest stage transitions
//!
//! The server owns the state machine. This table mirrors it so the client can
//! decide which single action to offer for a harvest, what has to be entered
//! before that action is enabled, and which weights get submitted with it.

use serde::{Deserialize, Serialize};

use crate::models::{Harvest, HarvestStatus, StrainRef, UserRole};
use crate::weights::{WeightField, WeightSheet};

/// A named server-side transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestAction {
    StartDrying,
    FinishDrying,
    StartTrimming,
    FinishTrimming,
    FinishCuring,
    AdminReview,
    Close,
}

impl HarvestAction {
    pub const ALL: [HarvestAction; 7] = [
        HarvestAction::StartDrying,
        HarvestAction::FinishDrying,
        HarvestAction::StartTrimming,
        HarvestAction::FinishTrimming,
        HarvestAction::FinishCuring,
        HarvestAction::AdminReview,
        HarvestAction::Close,
    ];

    /// Path segment under `/facility/harvests/:id/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            HarvestAction::StartDrying => "start_drying",
            HarvestAction::FinishDrying => "finish_drying",
            HarvestAction::StartTrimming => "start_trimming",
            HarvestAction::FinishTrimming => "finish_trimming",
            HarvestAction::FinishCuring => "finish_curing",
            HarvestAction::AdminReview => "admin_review",
            HarvestAction::Close => "close",
        }
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            HarvestAction::StartDrying => "Start Drying",
            HarvestAction::FinishDrying => "Mark as Dried",
            HarvestAction::StartTrimming => "Start Trimming",
            HarvestAction::FinishTrimming => "Finish Trimming",
            HarvestAction::FinishCuring => "Finish Curing",
            HarvestAction::AdminReview => "Admin Review",
            HarvestAction::Close => "Close Harvest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.endpoint() == s)
    }
}

impl std::fmt::Display for HarvestAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}

/// What must hold before a transition may be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Every strain needs a positive value for `field`. When
    /// `waived_by_aggregate` is set, an existing harvest-level value for the
    /// same field lifts the requirement.
    StrainWeights {
        field: WeightField,
        waived_by_aggregate: bool,
    },
    /// A single confirmation, nothing to enter
    Confirmation,
    /// Only admins may perform the action
    AdminRole,
}

/// Which side of the admin review a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Any,
    Pending,
    Reviewed,
}

impl ReviewState {
    fn matches(&self, harvest: &Harvest) -> bool {
        match self {
            ReviewState::Any => true,
            ReviewState::Pending => !harvest.is_reviewed(),
            ReviewState::Reviewed => harvest.is_reviewed(),
        }
    }
}

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: HarvestStatus,
    pub review: ReviewState,
    pub action: HarvestAction,
    pub precondition: Precondition,
    /// Per-strain fields submitted before the transition fires
    pub submits: &'static [WeightField],
    pub to: HarvestStatus,
}

impl TransitionRule {
    /// Field that must be filled in for every strain, after waivers
    pub fn required_field(&self, harvest: &Harvest) -> Option<WeightField> {
        match self.precondition {
            Precondition::StrainWeights {
                field,
                waived_by_aggregate,
            } => {
                if waived_by_aggregate && field.aggregate(harvest).is_some() {
                    None
                } else {
                    Some(field)
                }
            }
            _ => None,
        }
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self.precondition, Precondition::AdminRole)
    }

    pub fn collects_weights(&self) -> bool {
        !self.submits.is_empty()
    }
}

/// The harvest lifecycle, one rule per legal forward step
pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: HarvestStatus::Active,
        review: ReviewState::Any,
        action: HarvestAction::StartDrying,
        precondition: Precondition::StrainWeights {
            field: WeightField::Wet,
            waived_by_aggregate: true,
        },
        submits: &[WeightField::Wet, WeightField::Waste],
        to: HarvestStatus::Drying,
    },
    TransitionRule {
        from: HarvestStatus::Drying,
        review: ReviewState::Any,
        action: HarvestAction::FinishDrying,
        precondition: Precondition::StrainWeights {
            field: WeightField::Dry,
            waived_by_aggregate: false,
        },
        submits: &[WeightField::Dry],
        to: HarvestStatus::Dried,
    },
    TransitionRule {
        from: HarvestStatus::Dried,
        review: ReviewState::Any,
        action: HarvestAction::StartTrimming,
        precondition: Precondition::Confirmation,
        submits: &[],
        to: HarvestStatus::Trimming,
    },
    TransitionRule {
        from: HarvestStatus::Trimming,
        review: ReviewState::Any,
        action: HarvestAction::FinishTrimming,
        precondition: Precondition::StrainWeights {
            field: WeightField::Flower,
            waived_by_aggregate: false,
        },
        submits: &[WeightField::Flower, WeightField::Shake, WeightField::Waste],
        to: HarvestStatus::Curing,
    },
    TransitionRule {
        from: HarvestStatus::Curing,
        review: ReviewState::Any,
        action: HarvestAction::FinishCuring,
        precondition: Precondition::Confirmation,
        submits: &[],
        to: HarvestStatus::Packaged,
    },
    TransitionRule {
        from: HarvestStatus::Packaged,
        review: ReviewState::Pending,
        action: HarvestAction::AdminReview,
        precondition: Precondition::AdminRole,
        submits: &[],
        to: HarvestStatus::Packaged,
    },
    TransitionRule {
        from: HarvestStatus::Packaged,
        review: ReviewState::Reviewed,
        action: HarvestAction::Close,
        precondition: Precondition::AdminRole,
        submits: &[],
        to: HarvestStatus::Closed,
    },
];

/// The single legal forward rule for the harvest's current state
pub fn rule_for(harvest: &Harvest) -> Option<&'static TransitionRule> {
    TRANSITIONS
        .iter()
        .find(|rule| rule.from == harvest.status && rule.review.matches(harvest))
}

/// Rule for a specific action
pub fn rule_for_action(action: HarvestAction) -> &'static TransitionRule {
    let index = match action {
        HarvestAction::StartDrying => 0,
        HarvestAction::FinishDrying => 1,
        HarvestAction::StartTrimming => 2,
        HarvestAction::FinishTrimming => 3,
        HarvestAction::FinishCuring => 4,
        HarvestAction::AdminReview => 5,
        HarvestAction::Close => 6,
    };
    &TRANSITIONS[index]
}

/// Why the offered action cannot be taken yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    MissingWeights {
        field: WeightField,
        strains: Vec<StrainRef>,
    },
    /// A value that would be submitted is over the weight limit
    OverLimit {
        field: WeightField,
        strains: Vec<StrainRef>,
    },
    AdminRequired,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::MissingWeights { field, strains } => {
                let names: Vec<&str> = strains.iter().map(|s| s.name.as_str()).collect();
                write!(
                    f,
                    "Enter a {} weight greater than zero for: {}",
                    field,
                    names.join(", ")
                )
            }
            BlockReason::OverLimit { field, strains } => {
                let names: Vec<&str> = strains.iter().map(|s| s.name.as_str()).collect();
                write!(
                    f,
                    "The {} weight exceeds 1,000,000 grams for: {}",
                    field,
                    names.join(", ")
                )
            }
            BlockReason::AdminRequired => write!(f, "Only an admin can perform this action"),
        }
    }
}

/// Client-side decision for the harvest's next action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Ready(HarvestAction),
    Blocked {
        action: HarvestAction,
        reason: BlockReason,
    },
    /// Closed, nothing left to do
    Terminal,
}

impl Gate {
    pub fn action(&self) -> Option<HarvestAction> {
        match self {
            Gate::Ready(action) | Gate::Blocked { action, .. } => Some(*action),
            Gate::Terminal => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Gate::Ready(_))
    }
}

/// Evaluate the pre-flight gate for the harvest's next action
pub fn evaluate(harvest: &Harvest, sheet: &WeightSheet, role: UserRole) -> Gate {
    let Some(rule) = rule_for(harvest) else {
        return Gate::Terminal;
    };

    if rule.requires_admin() && !role.is_admin() {
        return Gate::Blocked {
            action: rule.action,
            reason: BlockReason::AdminRequired,
        };
    }

    if let Some(field) = rule.required_field(harvest) {
        let missing = sheet.missing(&harvest.strains_in_harvest, field);
        if !missing.is_empty() {
            return Gate::Blocked {
                action: rule.action,
                reason: BlockReason::MissingWeights {
                    field,
                    strains: missing.into_iter().cloned().collect(),
                },
            };
        }
    }

    for field in rule.submits {
        let over = sheet.over_limit(&harvest.strains_in_harvest, *field);
        if !over.is_empty() {
            return Gate::Blocked {
                action: rule.action,
                reason: BlockReason::OverLimit {
                    field: *field,
                    strains: over.into_iter().cloned().collect(),
                },
            };
        }
    }

    Gate::Ready(rule.action)
}

/// The action the page shows, if any.
///
/// Admin-only actions are not shown to other roles at all.
pub fn visible_action(harvest: &Harvest, role: UserRole) -> Option<HarvestAction> {
    let rule = rule_for(harvest)?;
    if rule.requires_admin() && !role.is_admin() {
        return None;
    }
    Some(rule.action)
}
