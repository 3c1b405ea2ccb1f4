//! Dataset loading
//! Reads problem/solution pairs from a CSV file

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub problem: String,
    pub solution: String,
}

/// Loads the dataset from a CSV file.
///
/// Returns the rows together with the raw file bytes, which the model cache
/// hashes to detect a changed dataset. See [`parse_dataset`] for the accepted
/// layout.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<(Vec<DatasetRow>, Vec<u8>)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::Dataset {
        reason: format!("cannot read '{}': {}", path.display(), e),
    })?;

    let rows = parse_dataset(&bytes)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "loaded dataset");

    Ok((rows, bytes))
}

/// Parses CSV bytes into dataset rows.
///
/// Headers are matched case-insensitively after trimming, so ` Problem ` and
/// `SOLUTION` are accepted. Extra columns are ignored. Every row must carry a
/// non-empty problem and solution.
pub fn parse_dataset(bytes: &[u8]) -> Result<Vec<DatasetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();

    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| Error::Dataset {
            reason: format!("missing '{}' column (found: {:?})", name, headers),
        })
    };
    let problem_col = column("problem")?;
    let solution_col = column("solution")?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // quoted fields may span lines, so prefer the reader's own position
        let line = record.position().map_or(i as u64 + 2, |p| p.line());

        let problem = record.get(problem_col).unwrap_or("").trim();
        let solution = record.get(solution_col).unwrap_or("").trim();
        if problem.is_empty() || solution.is_empty() {
            return Err(Error::Dataset {
                reason: format!("line {}: problem and solution must both be non-empty", line),
            });
        }

        rows.push(DatasetRow {
            problem: problem.to_string(),
            solution: solution.to_string(),
        });
    }

    if rows.is_empty() {
        return Err(Error::Dataset { reason: "no rows".to_string() });
    }

    Ok(rows)
}
