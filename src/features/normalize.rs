//! String-cleaning and parsing primitives shared by training and inference.
//!
//! Every parser returns `None` for "unparseable"; none of them fail or
//! substitute zero.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Furnishing, PropertyType};

lazy_static! {
    static ref BEDROOM_RE: Regex = Regex::new(r"(\d+)\s*(RK|BHK)").unwrap();
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parse an integer after removing every non-digit character.
///
/// `"2 Bathrooms"` → `Some(2)`, `"--"` → `None`.
pub fn parse_int(raw: &str) -> Option<u32> {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Parse an area in square feet after removing every non-digit character.
pub fn parse_area(raw: &str) -> Option<f64> {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Parse a rent amount. Anything that is not a finite number is missing.
pub fn parse_rent(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Extract the bedroom count from a listing type such as `"2 BHK Apartment"` or `"1 RK"`.
pub fn extract_bedrooms(raw: &str) -> Option<u32> {
    BEDROOM_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Title-case a string: a letter is upper-cased when the previous character
/// is not a letter, otherwise lower-cased.
///
/// `"semi-furnished"` → `"Semi-Furnished"`, `"VILE parle"` → `"Vile Parle"`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_is_letter = false;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Normalize a furnishing label. Missing or unrecognized values become
/// [`Furnishing::Unfurnished`].
pub fn normalize_furnishing(raw: Option<&str>) -> Furnishing {
    let Some(raw) = raw else {
        return Furnishing::Unfurnished;
    };
    match title_case(raw.trim()).as_str() {
        "Semi-Furnished" | "Semi Furnished" => Furnishing::SemiFurnished,
        "Fully-Furnished" | "Fully Furnished" => Furnishing::FullyFurnished,
        // "Unfurnished", "Missing", "Nan" and everything else
        _ => Furnishing::Unfurnished,
    }
}

/// Classify the property type. Only an explicit `"Villa"` substring yields a villa;
/// studios and RK units collapse into apartments.
pub fn classify_property_type(raw: &str) -> PropertyType {
    if raw.contains("Villa") {
        PropertyType::Villa
    } else {
        PropertyType::Apartment
    }
}

/// Pick the area: carpet area when parseable, otherwise built-up area.
pub fn select_area(carpet: Option<&str>, built_up: Option<&str>) -> Option<f64> {
    carpet
        .and_then(parse_area)
        .or_else(|| built_up.and_then(parse_area))
}
