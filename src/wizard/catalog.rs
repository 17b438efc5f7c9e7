//! Fixed vocabularies for the buyer preference wizard.
//!
//! Each selectable tag maps to exactly one boolean column of the
//! `buyer_preferences` table. Adding an option is one line in the table.

use serde::{Deserialize, Serialize};

/// A selectable tag and the column it sets when chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagColumn {
    pub tag: &'static str,
    pub column: &'static str,
}

const fn tc(tag: &'static str, column: &'static str) -> TagColumn {
    TagColumn { tag, column }
}

pub const PROGRAMS: &[TagColumn] = &[
    tc("HUD Homes", "interested_in_hud_homes"),
    tc("REO Properties", "interested_in_reo_properties"),
    tc("Conventional Homes", "interested_in_conventional"),
    tc("New Construction", "interested_in_new_construction"),
];

pub const FINANCING: &[TagColumn] = &[
    tc("FHA Loan", "interested_in_fha"),
    tc("VA Loan", "interested_in_va"),
    tc("USDA Loan", "interested_in_usda"),
    tc("Conventional Loan", "interested_in_conventional_loan"),
];

pub const PROPERTY_TYPES: &[TagColumn] = &[
    tc("Single Family", "property_type_single_family"),
    tc("Condo", "property_type_condo"),
    tc("Townhouse", "property_type_townhouse"),
    tc("Land", "property_type_land"),
    tc("Manufactured", "property_type_manufactured"),
];

pub const LOCATIONS: &[TagColumn] = &[
    tc("Coastal", "location_coastal"),
    tc("Mountains", "location_mountains"),
    tc("Piedmont", "location_piedmont"),
    tc("Triangle", "location_triangle"),
    tc("Charlotte", "location_charlotte"),
];

pub const LIFESTYLE: &[TagColumn] = &[
    tc("Waterfront", "lifestyle_waterfront"),
    tc("Golf Community", "lifestyle_golf_community"),
    tc("Rural", "lifestyle_rural"),
    tc("Urban", "lifestyle_urban"),
    tc("Suburban", "lifestyle_suburban"),
    tc("Retirement", "lifestyle_retirement"),
];

/// Multiple-choice preference categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Programs,
    Financing,
    PropertyTypes,
    Locations,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Programs,
        Self::Financing,
        Self::PropertyTypes,
        Self::Locations,
        Self::Lifestyle,
    ];

    pub fn options(&self) -> &'static [TagColumn] {
        match self {
            Self::Programs => PROGRAMS,
            Self::Financing => FINANCING,
            Self::PropertyTypes => PROPERTY_TYPES,
            Self::Locations => LOCATIONS,
            Self::Lifestyle => LIFESTYLE,
        }
    }

    /// Column set when `tag` is selected, if `tag` belongs to this category.
    pub fn column_for(&self, tag: &str) -> Option<&'static str> {
        self.options()
            .iter()
            .find(|o| o.tag == tag)
            .map(|o| o.column)
    }

    pub fn recognizes(&self, tag: &str) -> bool {
        self.column_for(tag).is_some()
    }

    /// Wizard step on which this category is asked.
    pub fn step(&self) -> u8 {
        match self {
            Self::Programs => 1,
            Self::Financing => 2,
            Self::PropertyTypes => 3,
            Self::Locations => 4,
            Self::Lifestyle => 5,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Programs => "programs",
            Self::Financing => "financing",
            Self::PropertyTypes => "property_types",
            Self::Locations => "locations",
            Self::Lifestyle => "lifestyle",
        };
        write!(f, "{s}")
    }
}

/// Heading shown for one wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub id: u8,
    pub title: &'static str,
    pub description: &'static str,
}

pub const STEPS: [StepInfo; 7] = [
    StepInfo {
        id: 1,
        title: "Home Buying Programs",
        description: "What types of home buying opportunities interest you?",
    },
    StepInfo {
        id: 2,
        title: "Financing Options",
        description: "Which financing programs are you considering?",
    },
    StepInfo {
        id: 3,
        title: "Property Type",
        description: "What type of property are you looking for?",
    },
    StepInfo {
        id: 4,
        title: "Location Preferences",
        description: "Where in North Carolina would you like to live?",
    },
    StepInfo {
        id: 5,
        title: "Lifestyle Features",
        description: "What lifestyle features are important to you?",
    },
    StepInfo {
        id: 6,
        title: "Budget & Requirements",
        description: "Tell us about your budget and space needs",
    },
    StepInfo {
        id: 7,
        title: "Your Information",
        description: "How can we contact you with matching properties?",
    },
];

/// One entry of a single-choice select. The empty value means "any".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn co(value: &'static str, label: &'static str) -> ChoiceOption {
    ChoiceOption { value, label }
}

pub const BEDROOM_OPTIONS: &[ChoiceOption] = &[
    co("", "Any"),
    co("1", "1+"),
    co("2", "2+"),
    co("3", "3+"),
    co("4", "4+"),
    co("5", "5+"),
];

pub const BATHROOM_OPTIONS: &[ChoiceOption] = &[
    co("", "Any"),
    co("1", "1+"),
    co("1.5", "1.5+"),
    co("2", "2+"),
    co("2.5", "2.5+"),
    co("3", "3+"),
];

pub const TIMELINE_OPTIONS: &[ChoiceOption] = &[
    co("", "Select timeline"),
    co("immediate", "Ready to buy now"),
    co("3-6 months", "3-6 months"),
    co("6-12 months", "6-12 months"),
    co("just browsing", "Just browsing"),
];

pub fn is_valid_choice(options: &[ChoiceOption], value: &str) -> bool {
    options.iter().any(|o| o.value == value)
}
