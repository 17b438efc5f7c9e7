//! Draft transitions as a closed set of actions and a pure reducer.

use serde::{Deserialize, Serialize};

use super::catalog::{BATHROOM_OPTIONS, BEDROOM_OPTIONS, Category, TIMELINE_OPTIONS, is_valid_choice};
use super::draft::PreferenceDraft;
use crate::error::WizardError;

/// Checkbox flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    NeedsAssistance,
    FirstTimeBuyer,
}

/// Free-text and single-choice fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Name,
    Email,
    Phone,
    PreferredCommunities,
    Bedrooms,
    Bathrooms,
    Timeline,
    Notes,
}

impl std::fmt::Display for TextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::PreferredCommunities => "preferred_communities",
            Self::Bedrooms => "bedrooms",
            Self::Bathrooms => "bathrooms",
            Self::Timeline => "timeline",
            Self::Notes => "notes",
        };
        write!(f, "{s}")
    }
}

/// Budget range endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeField {
    BudgetMin,
    BudgetMax,
}

/// Every way the wizard may change its draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    ToggleTag { category: Category, tag: String },
    SetFlag { flag: Flag, value: bool },
    SetField { field: TextField, value: String },
    SetRange { field: RangeField, value: String },
}

/// Apply one action to a draft.
///
/// Tags outside a category's vocabulary and choice values outside their
/// option list are rejected; everything else is accepted as typed.
pub fn reduce(mut draft: PreferenceDraft, action: Action) -> Result<PreferenceDraft, WizardError> {
    match action {
        Action::ToggleTag { category, tag } => {
            if !category.recognizes(&tag) {
                return Err(WizardError::UnknownTag {
                    category: category.to_string(),
                    tag,
                });
            }
            draft.tags_mut(category).toggle(&tag);
        }
        Action::SetFlag { flag, value } => match flag {
            Flag::NeedsAssistance => draft.needs_assistance = value,
            Flag::FirstTimeBuyer => draft.first_time_buyer = value,
        },
        Action::SetField { field, value } => {
            let options = match field {
                TextField::Bedrooms => Some(BEDROOM_OPTIONS),
                TextField::Bathrooms => Some(BATHROOM_OPTIONS),
                TextField::Timeline => Some(TIMELINE_OPTIONS),
                _ => None,
            };
            if let Some(options) = options {
                if !is_valid_choice(options, &value) {
                    return Err(WizardError::InvalidChoice {
                        field: field.to_string(),
                        value,
                    });
                }
            }
            let slot = match field {
                TextField::Name => &mut draft.name,
                TextField::Email => &mut draft.email,
                TextField::Phone => &mut draft.phone,
                TextField::PreferredCommunities => &mut draft.preferred_communities,
                TextField::Bedrooms => &mut draft.bedrooms,
                TextField::Bathrooms => &mut draft.bathrooms,
                TextField::Timeline => &mut draft.timeline,
                TextField::Notes => &mut draft.notes,
            };
            *slot = value;
        }
        Action::SetRange { field, value } => match field {
            RangeField::BudgetMin => draft.budget_min = value,
            RangeField::BudgetMax => draft.budget_max = value,
        },
    }
    Ok(draft)
}
