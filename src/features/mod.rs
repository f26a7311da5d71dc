//! Feature normalization: raw listing fields to canonical feature records.
//!
//! Raw scraped rows ([`RawListingRecord`]) carry free text in every column.
//! [`ListingDraft::from_raw`] parses each field independently, keeping
//! `None` for anything unparseable; [`ListingDraft::complete`] then yields a
//! [`LabeledRecord`] only when every field resolved.

pub mod normalize;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use normalize::{
    classify_property_type, extract_bedrooms, normalize_furnishing, parse_area, parse_int,
    parse_rent, select_area, title_case,
};

/// Canonical furnishing levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Furnishing {
    Unfurnished,
    SemiFurnished,
    FullyFurnished,
}

impl Furnishing {
    pub const ALL: [Furnishing; 3] = [
        Furnishing::Unfurnished,
        Furnishing::SemiFurnished,
        Furnishing::FullyFurnished,
    ];

    /// Category label used by the encoder and in API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Furnishing::Unfurnished => "Unfurnished",
            Furnishing::SemiFurnished => "Semi-Furnished",
            Furnishing::FullyFurnished => "Fully-Furnished",
        }
    }
}

impl fmt::Display for Furnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical property types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Apartment,
    Villa,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::Villa => "Villa",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unprocessed row of the scraped listing dataset.
///
/// Column names match the CSV header of the source dataset.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawListingRecord {
    #[serde(rename = "Type", default)]
    pub listing_type: Option<String>,
    #[serde(rename = "Rent/Month", default)]
    pub rent: Option<String>,
    #[serde(rename = "Bathrooms", default)]
    pub bathrooms: Option<String>,
    #[serde(rename = "Carpet_area(sq.ft)", default)]
    pub carpet_area: Option<String>,
    #[serde(rename = "Build_up_area(sq.ft)", default)]
    pub built_up_area: Option<String>,
    #[serde(rename = "Furnishing", default)]
    pub furnishing: Option<String>,
    #[serde(rename = "Locality", default)]
    pub locality: Option<String>,
}

/// The feature set consumed by both training and inference.
///
/// All fields are populated; partially resolved listings never become a
/// `CanonicalFeatureRecord`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFeatureRecord {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqft: f64,
    pub furnishing: Furnishing,
    pub property_type: PropertyType,
    pub locality: String,
}

/// A canonical record paired with its observed monthly rent.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledRecord {
    pub features: CanonicalFeatureRecord,
    pub rent: f64,
}

/// A listing after field-level parsing, before completeness checks.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingDraft {
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area_sqft: Option<f64>,
    pub furnishing: Furnishing,
    pub property_type: PropertyType,
    pub locality: String,
    pub rent: Option<f64>,
}

impl ListingDraft {
    /// Parse every field of a raw row. The locality has already been
    /// resolved by the caller.
    pub fn from_raw(raw: &RawListingRecord, locality: String) -> Self {
        let listing_type = raw.listing_type.as_deref().unwrap_or("");
        Self {
            bedrooms: extract_bedrooms(listing_type),
            bathrooms: raw.bathrooms.as_deref().and_then(parse_int),
            area_sqft: select_area(raw.carpet_area.as_deref(), raw.built_up_area.as_deref()),
            furnishing: normalize_furnishing(raw.furnishing.as_deref()),
            property_type: classify_property_type(listing_type),
            locality,
            rent: raw.rent.as_deref().and_then(parse_rent),
        }
    }

    /// Returns the labeled record when every required field resolved.
    pub fn complete(self) -> Option<LabeledRecord> {
        Some(LabeledRecord {
            features: CanonicalFeatureRecord {
                bedrooms: self.bedrooms?,
                bathrooms: self.bathrooms?,
                area_sqft: self.area_sqft?,
                furnishing: self.furnishing,
                property_type: self.property_type,
                locality: self.locality,
            },
            rent: self.rent?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(listing_type: &str, rent: &str, carpet: &str, built_up: &str) -> RawListingRecord {
        RawListingRecord {
            listing_type: Some(listing_type.to_string()),
            rent: Some(rent.to_string()),
            bathrooms: Some("2".to_string()),
            carpet_area: Some(carpet.to_string()),
            built_up_area: Some(built_up.to_string()),
            furnishing: Some("Semi Furnished".to_string()),
            locality: Some("Andheri West".to_string()),
        }
    }

    #[test]
    fn test_draft_from_raw_complete() {
        let draft = ListingDraft::from_raw(
            &raw("2 BHK Apartment", "45000", "", "850"),
            "Andheri".to_string(),
        );
        let record = draft.complete().unwrap();
        assert_eq!(record.features.bedrooms, 2);
        assert_eq!(record.features.bathrooms, 2);
        assert_eq!(record.features.area_sqft, 850.0);
        assert_eq!(record.features.furnishing, Furnishing::SemiFurnished);
        assert_eq!(record.features.property_type, PropertyType::Apartment);
        assert_eq!(record.rent, 45000.0);
    }

    #[test]
    fn test_draft_missing_bedrooms_is_incomplete() {
        let draft =
            ListingDraft::from_raw(&raw("Penthouse", "45000", "900", ""), "Worli".to_string());
        assert_eq!(draft.bedrooms, None);
        assert!(draft.complete().is_none());
    }

    #[test]
    fn test_draft_missing_area_is_incomplete() {
        let draft = ListingDraft::from_raw(&raw("1 RK", "15000", "", ""), "Dadar".to_string());
        assert!(draft.complete().is_none());
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(Furnishing::FullyFurnished.to_string(), "Fully-Furnished");
        assert_eq!(PropertyType::Villa.to_string(), "Villa");
    }
}
