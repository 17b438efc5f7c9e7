//! The in-progress buyer preference record.

use serde::{Deserialize, Serialize};

use super::catalog::Category;

/// A set of tags that keeps first-selection order for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag` if absent, remove it if present. Returns whether it is now
    /// a member.
    pub fn toggle(&mut self, tag: &str) -> bool {
        if let Some(pos) = self.0.iter().position(|t| t == tag) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(tag.to_string());
            true
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same members, ignoring order.
    pub fn same_members(&self, other: &TagSet) -> bool {
        self.len() == other.len() && self.iter().all(|t| other.contains(t))
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            let tag = tag.into();
            if !set.contains(&tag) {
                set.0.push(tag);
            }
        }
        set
    }
}

/// Required contact fields on the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Phone,
}

impl std::fmt::Display for ContactField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
        }
    }
}

/// Everything the wizard has collected so far. Numeric inputs stay raw
/// strings until submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDraft {
    pub name: String,
    pub email: String,
    pub phone: String,

    pub programs: TagSet,
    pub financing: TagSet,
    pub needs_assistance: bool,
    pub property_types: TagSet,
    pub locations: TagSet,
    pub preferred_communities: String,
    pub lifestyle: TagSet,

    pub budget_min: String,
    pub budget_max: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub timeline: String,
    pub first_time_buyer: bool,
    pub notes: String,
}

impl PreferenceDraft {
    pub fn tags(&self, category: Category) -> &TagSet {
        match category {
            Category::Programs => &self.programs,
            Category::Financing => &self.financing,
            Category::PropertyTypes => &self.property_types,
            Category::Locations => &self.locations,
            Category::Lifestyle => &self.lifestyle,
        }
    }

    pub fn tags_mut(&mut self, category: Category) -> &mut TagSet {
        match category {
            Category::Programs => &mut self.programs,
            Category::Financing => &mut self.financing,
            Category::PropertyTypes => &mut self.property_types,
            Category::Locations => &mut self.locations,
            Category::Lifestyle => &mut self.lifestyle,
        }
    }

    /// Contact fields that are still blank.
    pub fn missing_contact_fields(&self) -> Vec<ContactField> {
        [
            (ContactField::Name, &self.name),
            (ContactField::Email, &self.email),
            (ContactField::Phone, &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}
