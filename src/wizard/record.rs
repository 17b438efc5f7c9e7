//! Flattening a draft into the wide `buyer_preferences` row.

use serde::Serialize;
use serde_json::{Map, Value};

use super::catalog::Category;
use super::draft::PreferenceDraft;
use crate::error::WizardError;

/// One row for the `buyer_preferences` table: one boolean column per
/// known tag plus the scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PreferenceRecord(Map<String, Value>);

impl PreferenceRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn flag(&self, column: &str) -> Option<bool> {
        self.0.get(column).and_then(Value::as_bool)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Build the persisted record. Blank numeric inputs become `null`.
pub fn flatten(draft: &PreferenceDraft) -> Result<PreferenceRecord, WizardError> {
    let mut row = Map::new();
    row.insert("name".into(), draft.name.trim().into());
    row.insert("email".into(), draft.email.trim().into());
    row.insert("phone".into(), draft.phone.trim().into());

    for category in Category::ALL {
        let selected = draft.tags(category);
        for option in category.options() {
            row.insert(option.column.into(), selected.contains(option.tag).into());
        }
    }

    row.insert(
        "needs_down_payment_assistance".into(),
        draft.needs_assistance.into(),
    );
    row.insert(
        "preferred_communities".into(),
        draft.preferred_communities.clone().into(),
    );
    row.insert(
        "budget_min".into(),
        parse_whole("budget_min", &draft.budget_min)?.into(),
    );
    row.insert(
        "budget_max".into(),
        parse_whole("budget_max", &draft.budget_max)?.into(),
    );
    row.insert(
        "bedrooms_min".into(),
        parse_whole("bedrooms_min", &draft.bedrooms)?.into(),
    );
    row.insert(
        "bathrooms_min".into(),
        parse_decimal("bathrooms_min", &draft.bathrooms)?.into(),
    );
    row.insert("timeline".into(), draft.timeline.clone().into());
    row.insert("is_first_time_buyer".into(), draft.first_time_buyer.into());
    row.insert("additional_notes".into(), draft.notes.clone().into());

    Ok(PreferenceRecord(row))
}

/// Whole number, truncating any fractional part. Blank → `None`.
fn parse_whole(field: &str, raw: &str) -> Result<Option<i64>, WizardError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Some(n));
    }
    // `i64::MAX as f64` rounds up to 2^63, which does not fit.
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64 => {
            Ok(Some(n.trunc() as i64))
        }
        _ => Err(WizardError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Option<f64>, WizardError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(WizardError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}
