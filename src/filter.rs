//! Domain filter: plausibility rules that drop implausible training rows.
//!
//! Rejected rows are dropped silently; only aggregate counts are reported.

use tracing::info;

use crate::config::FilterBounds;
use crate::error::{PredictorError, Result};
use crate::features::{LabeledRecord, ListingDraft, PropertyType};

/// Row counts at each stage of filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Rows handed to the filter.
    pub total: usize,
    /// Rows with every required field present.
    pub complete: usize,
    /// Complete rows with positive rent and area above the floor.
    pub before_constraints: usize,
    /// Rows passing every domain constraint.
    pub kept: usize,
}

impl FilterReport {
    pub fn dropped(&self) -> usize {
        self.total - self.kept
    }
}

/// Applies [`FilterBounds`] to parsed listings.
#[derive(Clone, Debug, Default)]
pub struct DomainFilter {
    bounds: FilterBounds,
}

impl DomainFilter {
    pub fn new(bounds: FilterBounds) -> Self {
        Self { bounds }
    }

    /// Positive rent, at least one bathroom and area above the floor.
    fn passes_basic(&self, row: &LabeledRecord) -> bool {
        row.rent > 0.0
            && row.features.bathrooms >= 1
            && row.features.area_sqft > self.bounds.min_area_exclusive
    }

    /// Area-per-bedroom, rent-per-area and villa rules.
    fn passes_constraints(&self, row: &LabeledRecord) -> bool {
        let b = &self.bounds;
        let f = &row.features;
        let area = f.area_sqft;

        let area_ok = match f.bedrooms {
            0 => false,
            1 => area >= b.single_bedroom_min_area,
            n => area >= b.per_bedroom_min_area * n as f64,
        };
        let rent_ok =
            row.rent >= area * b.min_rent_per_sqft && row.rent <= area * b.max_rent_per_sqft;
        let villa_ok =
            !(f.property_type == PropertyType::Villa && f.bedrooms < b.villa_min_bedrooms);

        area_ok && rent_ok && villa_ok
    }

    /// Whether a complete row survives every rule.
    pub fn accepts(&self, row: &LabeledRecord) -> bool {
        self.passes_basic(row) && self.passes_constraints(row)
    }

    /// Drop incomplete and implausible rows, logging the before/after counts.
    pub fn apply(&self, drafts: Vec<ListingDraft>) -> (Vec<LabeledRecord>, FilterReport) {
        let total = drafts.len();
        let complete: Vec<LabeledRecord> =
            drafts.into_iter().filter_map(ListingDraft::complete).collect();
        let n_complete = complete.len();

        let basic: Vec<LabeledRecord> = complete
            .into_iter()
            .filter(|row| self.passes_basic(row))
            .collect();
        let before_constraints = basic.len();

        let kept: Vec<LabeledRecord> = basic
            .into_iter()
            .filter(|row| self.passes_constraints(row))
            .collect();

        let report = FilterReport {
            total,
            complete: n_complete,
            before_constraints,
            kept: kept.len(),
        };
        info!(
            total = report.total,
            complete = report.complete,
            before_constraints = report.before_constraints,
            after_constraints = report.kept,
            "domain filter applied"
        );
        (kept, report)
    }
}

/// Fail the run when fewer than `min_rows` rows survived cleaning.
pub fn ensure_min_rows(kept: usize, min_rows: usize) -> Result<()> {
    if kept < min_rows {
        return Err(PredictorError::InsufficientData {
            required: min_rows,
            got: kept,
        });
    }
    Ok(())
}
