use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::models::LocationQuery;

#[derive(Debug, Deserialize)]
struct LocationRow {
    #[serde(rename = "City", alias = "city", default)]
    city: Option<String>,
    #[serde(rename = "State", alias = "state", default)]
    state: Option<String>,
}

/// Loads location rows from a headered CSV file.
///
/// An unreadable file, or one whose header lacks `City` or `State`, is an
/// [`AppError::InputFormat`]. Individual rows that fail to decode or miss a
/// value are skipped.
pub fn load_locations(path: &Path) -> Result<Vec<LocationQuery>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::InputFormat(format!("Cannot read location file {}: {e}", path.display()))
    })?;
    read_locations(file)
}

/// Reads location rows from any CSV source. See [`load_locations`].
pub fn read_locations<R: Read>(reader: R) -> Result<Vec<LocationQuery>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AppError::InputFormat(format!("Cannot read CSV header: {e}")))?;
    for required in ["City", "State"] {
        if !headers
            .iter()
            .any(|h| h == required || h == required.to_lowercase())
        {
            return Err(AppError::InputFormat(format!(
                "Location file has no '{required}' column"
            )));
        }
    }

    let mut locations = Vec::new();
    for (index, row) in csv_reader.deserialize::<LocationRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => {
                return Err(AppError::InputFormat(format!("Cannot read location file: {e}")));
            }
            Err(e) => {
                // Header is line 1.
                tracing::warn!(line = index + 2, error = %e, "Skipping malformed location row");
                continue;
            }
        };

        if let (Some(city), Some(state)) = (row.city, row.state) {
            let location = LocationQuery::new(city, state);
            if location.is_complete() {
                locations.push(location);
            }
        }
    }

    Ok(locations)
}
