//! Seeded generator of raw listings in the scraped-dataset schema.
//!
//! Produces messy but learnable rows: sub-pocket locality names, mixed
//! furnishing spellings, carpet or built-up area, a small share of missing
//! cells and implausible rows for the domain filter to remove.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::features::RawListingRecord;

/// (locality text, rent per sqft, sampling weight)
const LOCALITY_TABLE: &[(&str, f64, u32)] = &[
    ("Andheri West", 62.0, 14),
    ("Andheri East", 55.0, 10),
    ("Bandra West", 110.0, 8),
    ("Borivali West", 42.0, 8),
    ("Kandarpada", 40.0, 3),
    ("Malad West", 45.0, 8),
    ("Goregaon East", 50.0, 8),
    ("Powai", 65.0, 8),
    ("Chembur", 48.0, 6),
    ("Worli", 120.0, 5),
    ("Thane West", 30.0, 9),
    ("Khar West", 95.0, 4),
    ("Dadar West", 80.0, 5),
    ("Nashik", 20.0, 1),
];

const FURNISHING_LABELS: &[(&str, f64)] = &[
    ("Unfurnished", 1.0),
    ("Semi Furnished", 1.1),
    ("Semi-Furnished", 1.1),
    ("Fully Furnished", 1.25),
    ("Missing", 1.0),
];

/// Deterministic synthetic listing source.
pub struct SyntheticListings {
    rng: StdRng,
}

impl SyntheticListings {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick_locality(&mut self) -> (&'static str, f64) {
        let total: u32 = LOCALITY_TABLE.iter().map(|(_, _, w)| w).sum();
        let mut roll = self.rng.gen_range(0..total);
        for &(name, rate, weight) in LOCALITY_TABLE {
            if roll < weight {
                return (name, rate);
            }
            roll -= weight;
        }
        let (name, rate, _) = LOCALITY_TABLE[0];
        (name, rate)
    }

    fn maybe(&mut self, value: String, missing_prob: f64) -> Option<String> {
        if self.rng.gen_bool(missing_prob) {
            None
        } else {
            Some(value)
        }
    }

    /// Generate one listing.
    pub fn next_record(&mut self) -> RawListingRecord {
        let (locality, rate) = self.pick_locality();

        let is_villa = self.rng.gen_bool(0.04);
        let is_studio = !is_villa && self.rng.gen_bool(0.05);
        let bedrooms: u32 = if is_studio {
            1
        } else if is_villa {
            self.rng.gen_range(1..=5)
        } else {
            self.rng.gen_range(1..=4)
        };
        let listing_type = if is_studio {
            "1 RK Studio".to_string()
        } else if is_villa {
            format!("{} BHK Villa", bedrooms)
        } else {
            format!("{} BHK Apartment", bedrooms)
        };

        let base_area = match bedrooms {
            1 => 480.0,
            n => 380.0 * n as f64,
        };
        let area = (base_area * self.rng.gen_range(1.0..1.6)).round();
        let bathrooms = bedrooms.max(1) - u32::from(bedrooms > 2 && self.rng.gen_bool(0.5));

        let (furnishing, furnishing_mult) =
            FURNISHING_LABELS[self.rng.gen_range(0..FURNISHING_LABELS.len())];
        let villa_mult = if is_villa { 1.3 } else { 1.0 };
        let noise = self.rng.gen_range(0.85..1.15);
        let mut rent = area * rate * furnishing_mult * villa_mult * noise;
        // occasional data-entry outliers
        if self.rng.gen_bool(0.02) {
            rent /= 20.0;
        }

        let use_carpet = self.rng.gen_bool(0.6);
        let area_text = if self.rng.gen_bool(0.5) {
            format!("{}", area)
        } else {
            format!("{} sqft", area)
        };
        let (carpet_area, built_up_area) = if use_carpet {
            (Some(area_text), None)
        } else {
            (None, Some(area_text))
        };

        RawListingRecord {
            listing_type: self.maybe(listing_type, 0.01),
            rent: self.maybe(format!("{:.0}", rent), 0.01),
            bathrooms: self.maybe(format!("{}", bathrooms), 0.02),
            carpet_area,
            built_up_area,
            furnishing: self.maybe(furnishing.to_string(), 0.05),
            locality: self.maybe(locality.to_string(), 0.01),
        }
    }

    /// Generate `n` listings.
    pub fn records(&mut self, n: usize) -> Vec<RawListingRecord> {
        (0..n).map(|_| self.next_record()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_deterministic() {
        let a = SyntheticListings::new(3).records(50);
        let b = SyntheticListings::new(3).records(50);
        assert_eq!(
            a.iter().map(|r| r.rent.clone()).collect::<Vec<_>>(),
            b.iter().map(|r| r.rent.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_generator_fills_area_column() {
        let records = SyntheticListings::new(1).records(100);
        assert!(records
            .iter()
            .all(|r| r.carpet_area.is_some() != r.built_up_area.is_some()));
    }
}
