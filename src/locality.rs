//! Locality classification.
//!
//! A single [`resolve`] entry point serves both stages, selected by
//! [`ResolveMode`]:
//!
//! - **Training** cleans the free text, merges sub-pockets and directional
//!   suffixes into their parent locality through an ordered substring table,
//!   and leaves rare labels to be re-bucketed by a fitted
//!   [`LocalityVocabulary`].
//! - **Inference** searches the free text for one of the
//!   [`CANONICAL_LOCALITIES`] (case-insensitive, first match in list order)
//!   and falls back to [`OTHER`].
//!
//! Absent or blank input resolves to [`UNKNOWN`] in training and [`OTHER`]
//! at inference.

use std::collections::{BTreeSet, HashMap};

use crate::features::title_case;

/// Catch-all bucket for localities outside the known set.
pub const OTHER: &str = "Other";

/// Training-time label for rows without any locality text.
pub const UNKNOWN: &str = "Unknown";

/// The fixed set of localities recognised at inference time, in match order.
pub const CANONICAL_LOCALITIES: [&str; 21] = [
    "Andheri",
    "Bandra",
    "Borivali",
    "Malad",
    "Goregaon",
    "Kandivali",
    "Juhu",
    "Santacruz",
    "Vile Parle",
    "Powai",
    "Kurla",
    "Chembur",
    "Ghatkopar",
    "Dadar",
    "Matunga",
    "Worli",
    "Lower Parel",
    "Colaba",
    "Byculla",
    "Mulund",
    "Thane",
];

/// Ordered merge table: the first entry whose needle occurs in the
/// normalized (lower-cased) locality wins.
const MERGE_TABLE: &[(&[&str], &str)] = &[
    (&["andheri"], "Andheri"),
    (&["goregaon"], "Goregaon"),
    (&["malad"], "Malad"),
    (&["jogeshwari"], "Jogeshwari"),
    (&["kandarpada", "borivali"], "Borivali"),
    (&["kurla"], "Kurla"),
    (&["powai"], "Powai"),
    (&["bandra"], "Bandra"),
    (&["khar"], "Khar"),
    (&["juhu"], "Juhu"),
    (&["dadar"], "Dadar"),
    (&["worli"], "Worli"),
    (&["prabhadevi"], "Prabhadevi"),
    (&["chembur"], "Chembur"),
    (&["bhandup"], "Bhandup"),
];

/// Which stage is resolving the locality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveMode {
    Training,
    Inference,
}

/// Resolve a free-text locality or address to a locality label.
pub fn resolve(raw: Option<&str>, mode: ResolveMode) -> String {
    let text = raw.map(str::trim).filter(|s| !s.is_empty());
    match mode {
        ResolveMode::Training => match text {
            None => UNKNOWN.to_string(),
            Some(text) => {
                let normalized = normalize_locality(text);
                if normalized.is_empty() {
                    UNKNOWN.to_string()
                } else {
                    merge_locality(&normalized)
                }
            }
        },
        ResolveMode::Inference => text
            .and_then(match_canonical)
            .unwrap_or(OTHER)
            .to_string(),
    }
}

/// Strip digits and non-alphabetic characters, collapse whitespace, title-case.
///
/// `"Andheri (W) 400058"` → `"Andheri W"`.
pub fn normalize_locality(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let letters: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
        .collect();
    let collapsed = letters.split_whitespace().collect::<Vec<_>>().join(" ");
    title_case(&collapsed)
}

/// Merge a normalized locality into its parent locality, if one is known.
pub fn merge_locality(normalized: &str) -> String {
    let lowered = normalized.to_lowercase();
    MERGE_TABLE
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| lowered.contains(needle)))
        .map(|(_, parent)| parent.to_string())
        .unwrap_or_else(|| title_case(&lowered))
}

/// Find the first canonical locality named anywhere in `text`.
pub fn match_canonical(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    CANONICAL_LOCALITIES
        .iter()
        .copied()
        .find(|loc| lowered.contains(&loc.to_lowercase()))
}

/// Locality labels with enough training support to keep their own category.
///
/// Labels seen fewer than `min_support` times are re-bucketed to [`OTHER`],
/// which bounds the one-hot cardinality.
#[derive(Clone, Debug)]
pub struct LocalityVocabulary {
    min_support: usize,
    counts: HashMap<String, usize>,
    supported: BTreeSet<String>,
}

impl LocalityVocabulary {
    /// Count label frequencies and keep those meeting `min_support`.
    pub fn fit<'a, I>(labels: I, min_support: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for label in labels {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
        let supported = counts
            .iter()
            .filter(|(_, &count)| count >= min_support)
            .map(|(label, _)| label.clone())
            .collect();
        Self {
            min_support,
            counts,
            supported,
        }
    }

    /// Map a label to itself when supported, otherwise to [`OTHER`].
    pub fn bucket(&self, label: &str) -> String {
        if self.supported.contains(label) {
            label.to_string()
        } else {
            OTHER.to_string()
        }
    }

    pub fn min_support(&self) -> usize {
        self.min_support
    }

    /// Supported labels in sorted order.
    pub fn supported(&self) -> impl Iterator<Item = &str> {
        self.supported.iter().map(String::as_str)
    }

    /// The `n` most frequent labels after bucketing, most frequent first.
    pub fn top(&self, n: usize) -> Vec<(String, usize)> {
        let mut bucketed: HashMap<String, usize> = HashMap::new();
        for (label, &count) in &self.counts {
            *bucketed.entry(self.bucket(label)).or_insert(0) += count;
        }
        let mut ranked: Vec<(String, usize)> = bucketed.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}
