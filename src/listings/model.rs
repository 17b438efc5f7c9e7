//! Property listing rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Active,
    Pending,
    Sold,
    Withdrawn,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Sold => "sold",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl std::str::FromStr for PropertyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "sold" => Ok(Self::Sold),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(format!("unknown property status: {other}")),
        }
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row from the properties table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub price: Decimal,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub square_feet: Option<u32>,
    pub status: PropertyStatus,
    pub listing_type: String,
    #[serde(default)]
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn property_from_row() {
        let id = Uuid::new_v4();
        let p: Property = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": "Sound-side Cottage",
            "address_line1": "12 Marsh Ln",
            "city": "Southport",
            "state": "NC",
            "zip_code": "28461",
            "price": "329900.00",
            "bedrooms": 3,
            "bathrooms": 2.5,
            "square_feet": 1480,
            "status": "active",
            "listing_type": "hud",
            "created_at": "2026-09-01T12:00:00Z",
            "slug": "sound-side-cottage"
        }))
        .unwrap();
        assert_eq!(p.id, id);
        assert_eq!(p.price, dec!(329900.00));
        assert_eq!(p.status, PropertyStatus::Active);
        assert!(!p.is_featured);
        assert!(p.description.is_none());
    }

    #[test]
    fn numeric_price_also_accepted() {
        let p: Property = serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "title": "Lot 7",
            "address_line1": "Rt 1",
            "city": "Boone",
            "state": "NC",
            "zip_code": "28607",
            "price": 45000,
            "status": "sold",
            "listing_type": "standard",
            "created_at": "2026-09-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(p.price, dec!(45000));
        assert!(p.bedrooms.is_none());
    }

    #[test]
    fn status_parse_and_display() {
        for status in [
            PropertyStatus::Active,
            PropertyStatus::Pending,
            PropertyStatus::Sold,
            PropertyStatus::Withdrawn,
        ] {
            assert_eq!(status.as_str().parse::<PropertyStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{status}\"")
            );
        }
        assert!("archived".parse::<PropertyStatus>().is_err());
    }
}
