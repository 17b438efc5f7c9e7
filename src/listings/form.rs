//! Property edit form. Raw inputs in, typed update patch out.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::model::PropertyStatus;
use crate::error::ListingError;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// URL slug: lowercase, runs of anything else collapsed to `-`, no leading
/// or trailing dash.
pub fn slugify(title: &str) -> String {
    NON_ALNUM
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Edit form as submitted. Numeric inputs arrive as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyForm {
    pub title: String,
    pub description: String,
    pub property_type: String,
    pub listing_type: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub county: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_feet: String,
    pub lot_size: String,
    pub year_built: String,
    pub price: String,
    pub hud_case_number: String,
    pub status: String,
    pub is_featured: bool,
}

impl Default for PropertyForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            property_type: "single_family".to_string(),
            listing_type: "standard".to_string(),
            address_line1: String::new(),
            address_line2: String::new(),
            city: String::new(),
            state: "NC".to_string(),
            zip_code: String::new(),
            county: String::new(),
            bedrooms: String::new(),
            bathrooms: String::new(),
            square_feet: String::new(),
            lot_size: String::new(),
            year_built: String::new(),
            price: String::new(),
            hud_case_number: String::new(),
            status: "active".to_string(),
            is_featured: false,
        }
    }
}

impl PropertyForm {
    /// Build the column patch. Blank numeric fields become `null`.
    pub fn to_patch(&self) -> Result<Value, ListingError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ListingError::MissingField("title".to_string()));
        }
        let price_raw = self.price.trim();
        if price_raw.is_empty() {
            return Err(ListingError::MissingField("price".to_string()));
        }
        let price = Decimal::from_str(price_raw).map_err(|_| invalid("price", price_raw))?;
        let status =
            PropertyStatus::from_str(self.status.trim()).map_err(|_| invalid("status", &self.status))?;

        Ok(json!({
            "title": title,
            "slug": slugify(title),
            "description": self.description,
            "property_type": self.property_type,
            "listing_type": self.listing_type,
            "address_line1": self.address_line1,
            "address_line2": self.address_line2,
            "city": self.city,
            "state": self.state,
            "zip_code": self.zip_code,
            "county": self.county,
            "bedrooms": parse_opt::<u32>("bedrooms", &self.bedrooms)?,
            "bathrooms": parse_opt::<f64>("bathrooms", &self.bathrooms)?,
            "square_feet": parse_opt::<u32>("square_feet", &self.square_feet)?,
            "lot_size": parse_opt::<f64>("lot_size", &self.lot_size)?,
            "year_built": parse_opt::<i32>("year_built", &self.year_built)?,
            "price": price,
            "hud_case_number": self.hud_case_number,
            "status": status,
            "is_featured": self.is_featured,
        }))
    }
}

fn invalid(field: &str, value: &str) -> ListingError {
    ListingError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_opt<T: FromStr>(field: &str, raw: &str) -> Result<Option<T>, ListingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| invalid(field, raw))
}
