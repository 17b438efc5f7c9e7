//! Client-side filtering of fetched listings.

use serde::{Deserialize, Serialize};

use super::model::{Property, PropertyStatus};

/// Search box plus the two dropdowns on the properties page. `"all"` or an
/// absent value matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub listing_type: Option<String>,
}

fn is_all(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|v| v.is_empty() || v == "all")
        .unwrap_or(true)
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [&property.title, &property.address_line1, &property.city]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
        };
        let matches_status = is_all(&self.status)
            || self.status.as_deref() == Some(property.status.as_str());
        let matches_type = is_all(&self.listing_type)
            || self.listing_type.as_deref() == Some(property.listing_type.as_str());

        matches_search && matches_status && matches_type
    }

    pub fn apply<'a>(&self, properties: &'a [Property]) -> Vec<&'a Property> {
        properties.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Summary cards under the listings table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub pending: usize,
    pub sold: usize,
}

impl StatusCounts {
    pub fn tally(properties: &[Property]) -> Self {
        properties.iter().fold(Self::default(), |mut acc, p| {
            match p.status {
                PropertyStatus::Active => acc.active += 1,
                PropertyStatus::Pending => acc.pending += 1,
                PropertyStatus::Sold => acc.sold += 1,
                PropertyStatus::Withdrawn => {}
            }
            acc
        })
    }
}
