//! Listing dataset loading and train/test splitting.
//!
//! The raw dataset is a CSV export of scraped listings with one
//! [`RawListingRecord`] per row. Cells may be empty or hold free text; all
//! interpretation happens in [`crate::features`].

pub mod synthetic;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{PredictorError, Result};
use crate::features::RawListingRecord;

pub use synthetic::SyntheticListings;

/// Load every row of a listing CSV file.
pub fn load_listings<P: AsRef<Path>>(path: P) -> Result<Vec<RawListingRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let records = read_listings(std::io::BufReader::new(file))?;
    debug!(path = %path.display(), rows = records.len(), "loaded listings");
    Ok(records)
}

/// Read listings from any CSV source with a header row.
///
/// Rows that cannot be decoded (bad UTF-8, broken quoting) are skipped and
/// counted; I/O failures abort the load.
pub fn read_listings<R: Read>(reader: R) -> Result<Vec<RawListingRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rdr.deserialize() {
        match row {
            Ok(record) => records.push(record),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                debug!(error = %err, "skipping undecodable listing row");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, kept = records.len(), "skipped undecodable listing rows");
    }
    Ok(records)
}

/// Write listings as CSV with the raw dataset's header names.
pub fn write_listings<P: AsRef<Path>>(path: P, records: &[RawListingRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Row indices of a train/test partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded RNG and hold out `ceil(n * test_ratio)` rows.
///
/// The same `(n, test_ratio, seed)` always yields the same partition.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(PredictorError::InvalidParameter(format!(
            "test_ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }
    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PredictorError::EmptyData(format!(
            "cannot split {} rows with test_ratio {}",
            n, test_ratio
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Type,Rent/Month,Bathrooms,Carpet_area(sq.ft),Build_up_area(sq.ft),Furnishing,Locality,Seller
2 BHK Apartment,45000,2,,850,Semi Furnished,Andheri West,Agent
1 RK Studio,15000,1,320,,,Kandarpada,Owner
";

    #[test]
    fn test_read_listings_handles_empty_cells() {
        let records = read_listings(CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].listing_type.as_deref(), Some("2 BHK Apartment"));
        assert_eq!(records[0].carpet_area, None);
        assert_eq!(records[0].built_up_area.as_deref(), Some("850"));
        assert_eq!(records[1].furnishing, None);
        assert_eq!(records[1].locality.as_deref(), Some("Kandarpada"));
    }

    #[test]
    fn test_read_listings_skips_undecodable_rows() {
        let mut bytes = CSV.as_bytes().to_vec();
        bytes.extend_from_slice(b"3 BHK Apartment,60000,3,1100,,Furnished,Bandra \xff\xfe,Owner\n");
        bytes.extend_from_slice(b"2 BHK Apartment,38000,2,700,,Unfurnished,Powai,Agent\n");

        let records = read_listings(bytes.as_slice()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].locality.as_deref(), Some("Powai"));
    }

    #[test]
    fn test_write_then_load_listings() {
        let records = read_listings(CSV.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");

        write_listings(&path, &records).unwrap();
        let loaded = load_listings(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].rent.as_deref(), Some("15000"));
    }

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);

        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_reproducible() {
        let a = train_test_split(1000, 0.2, 42).unwrap();
        let b = train_test_split(1000, 0.2, 42).unwrap();
        let c = train_test_split(1000, 0.2, 7).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn test_split_rejects_degenerate_input() {
        assert!(train_test_split(1, 0.2, 42).is_err());
        assert!(train_test_split(10, 0.0, 42).is_err());
        assert!(train_test_split(10, 1.0, 42).is_err());
    }
}
