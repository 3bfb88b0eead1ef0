use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{CleanedListing, RawListingRow, TownDemographics};
use crate::error::{PipelineError, Result};

/// Candidate column names per field, tried in order. Raw listing files vary
/// by source vintage, so lookup is tolerant; headers are compared after
/// lower-casing and replacing spaces with underscores.
const PRICE_COLUMNS: &[&str] = &["price", "list_price", "listing_price", "asking_price"];
const SQFT_COLUMNS: &[&str] = &[
    "sqft",
    "square_feet",
    "living_area_sqft",
    "area_sqft",
    "living_area",
    "square_footage",
];
const BEDROOM_COLUMNS: &[&str] = &["bedrooms", "beds", "bed"];
const BATHROOM_COLUMNS: &[&str] = &["bathrooms", "baths", "bath"];
const CITY_COLUMNS: &[&str] = &["city", "town", "municipality"];
const PROPERTY_TYPE_COLUMNS: &[&str] = &["property_type", "propertytype", "type", "home_type"];
const FLOOD_COLUMNS: &[&str] = &["flood_risk", "flood"];
const FIRE_COLUMNS: &[&str] = &["fire_risk", "fire"];
const WIND_COLUMNS: &[&str] = &["wind_risk", "wind"];
const AIR_COLUMNS: &[&str] = &["air_risk", "air_quality_risk", "air"];
const HEAT_COLUMNS: &[&str] = &["heat_risk", "heat"];
const WALK_COLUMNS: &[&str] = &["walk_score", "walkscore"];
const BIKE_COLUMNS: &[&str] = &["bike_score", "bikescore"];
const TRANSIT_COLUMNS: &[&str] = &["transit_score", "transitscore"];

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

fn column_index(headers: &HashMap<String, usize>, candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| headers.get(*candidate).copied())
}

fn cell(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.to_string())
}

/// Read the raw listing file. The price and city columns must exist in the
/// header; everything else degrades per-row to `None` when absent.
pub fn read_raw_listings<P: AsRef<Path>>(path: P) -> Result<Vec<RawListingRow>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect();

    let price_idx = column_index(&headers, PRICE_COLUMNS).ok_or_else(|| {
        PipelineError::MissingColumn {
            column: "price".to_string(),
            file: path.display().to_string(),
        }
    })?;
    let city_idx = column_index(&headers, CITY_COLUMNS).ok_or_else(|| {
        PipelineError::MissingColumn {
            column: "city".to_string(),
            file: path.display().to_string(),
        }
    })?;

    let sqft_idx = column_index(&headers, SQFT_COLUMNS);
    let bedrooms_idx = column_index(&headers, BEDROOM_COLUMNS);
    let bathrooms_idx = column_index(&headers, BATHROOM_COLUMNS);
    let property_type_idx = column_index(&headers, PROPERTY_TYPE_COLUMNS);
    let flood_idx = column_index(&headers, FLOOD_COLUMNS);
    let fire_idx = column_index(&headers, FIRE_COLUMNS);
    let wind_idx = column_index(&headers, WIND_COLUMNS);
    let air_idx = column_index(&headers, AIR_COLUMNS);
    let heat_idx = column_index(&headers, HEAT_COLUMNS);
    let walk_idx = column_index(&headers, WALK_COLUMNS);
    let bike_idx = column_index(&headers, BIKE_COLUMNS);
    let transit_idx = column_index(&headers, TRANSIT_COLUMNS);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let fingerprint = record.iter().collect::<Vec<_>>().join("\u{1f}");
        rows.push(RawListingRow {
            price: cell(&record, Some(price_idx)),
            sqft: cell(&record, sqft_idx),
            bedrooms: cell(&record, bedrooms_idx),
            bathrooms: cell(&record, bathrooms_idx),
            city: cell(&record, Some(city_idx)),
            property_type: cell(&record, property_type_idx),
            flood_risk: cell(&record, flood_idx),
            fire_risk: cell(&record, fire_idx),
            wind_risk: cell(&record, wind_idx),
            air_risk: cell(&record, air_idx),
            heat_risk: cell(&record, heat_idx),
            walk_score: cell(&record, walk_idx),
            bike_score: cell(&record, bike_idx),
            transit_score: cell(&record, transit_idx),
            fingerprint,
        });
    }

    info!(rows = rows.len(), file = %path.display(), "raw listings loaded");
    Ok(rows)
}

fn read_typed<T: DeserializeOwned, P: AsRef<Path>>(
    path: P,
    required_columns: &[&str],
) -> Result<Vec<T>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for column in required_columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(PipelineError::MissingColumn {
                column: column.to_string(),
                file: path.display().to_string(),
            });
        }
    }

    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    debug!(rows = records.len(), file = %path.display(), "dataset loaded");
    Ok(records)
}

/// Read a previously written cleaned listing dataset.
pub fn read_cleaned_listings<P: AsRef<Path>>(path: P) -> Result<Vec<CleanedListing>> {
    read_typed(path, &["price", "city"])
}

/// Read a town demographic dataset (census or synthetic, same schema).
pub fn read_demographics<P: AsRef<Path>>(path: P) -> Result<Vec<TownDemographics>> {
    read_typed(path, &["townName", "medianIncome", "population"])
}

/// Serialize records to a CSV file, creating parent directories as needed.
pub fn write_records<T: Serialize, P: AsRef<Path>>(path: P, records: &[T]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(rows = records.len(), file = %path.display(), "dataset written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_listings_with_vintage_column_names() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "raw.csv",
            "Price,Town,Square Feet,Beds\n\"$350,000\",Boston,1200,3\n",
        );
        let rows = read_raw_listings(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price.as_deref(), Some("$350,000"));
        assert_eq!(rows[0].city.as_deref(), Some("Boston"));
        assert_eq!(rows[0].sqft.as_deref(), Some("1200"));
        assert_eq!(rows[0].bedrooms.as_deref(), Some("3"));
        assert_eq!(rows[0].bathrooms, None);
    }

    #[test]
    fn missing_price_column_is_fatal() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "raw.csv", "city,sqft\nBoston,1200\n");
        let err = read_raw_listings(&path).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref column, .. } if column == "price"
        ));
    }

    #[test]
    fn missing_file_is_fatal_and_names_the_path() {
        let err = read_raw_listings("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile(_)));
        assert!(err.to_string().contains("does/not/exist.csv"));
    }

    #[test]
    fn empty_cells_become_none() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "raw.csv", "price,city,sqft\n350000,Boston,\n");
        let rows = read_raw_listings(&path).unwrap();
        assert_eq!(rows[0].sqft, None);
    }

    #[test]
    fn demographics_round_trip_preserves_missing_income() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("census.csv");
        let towns = vec![
            TownDemographics {
                town_name: "Boston".to_string(),
                median_income: Some(89_000.0),
                population: Some(650_000),
            },
            TownDemographics {
                town_name: "Gosnold".to_string(),
                median_income: None,
                population: Some(70),
            },
        ];
        write_records(&path, &towns).unwrap();
        let read_back = read_demographics(&path).unwrap();
        assert_eq!(read_back, towns);
    }

    #[test]
    fn demographics_without_required_columns_fail() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "census.csv", "townName,population\nBoston,650000\n");
        let err = read_demographics(&path).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref column, .. } if column == "medianIncome"
        ));
    }
}
