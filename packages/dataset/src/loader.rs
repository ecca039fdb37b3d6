//! CSV loader for the incident table.
//!
//! Columns are located by header name (surrounding whitespace ignored), so
//! column order and extra columns do not matter. Every required column must
//! be present.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crime_route_geography_models::{BoundingBox, Coordinate};
use crime_route_incident_models::{ArrestMade, CrimeRecord};

use crate::parsing::{parse_age, parse_date, parse_f64};
use crate::{DataLoadError, Dataset};

const CRIME_TYPE: &str = "Crime Type";
const DATE: &str = "Date";
const LOCATION: &str = "Location";
const LATITUDE: &str = "Latitude";
const LONGITUDE: &str = "Longitude";
const SUSPECT_GENDER: &str = "Suspect Gender";
const SUSPECT_AGE: &str = "Suspect Age";
const VICTIM_GENDER: &str = "Victim Gender";
const VICTIM_AGE: &str = "Victim Age";
const ARREST_MADE: &str = "Arrest Made";
const CASE_STATUS: &str = "Case Status";
const DESCRIPTION: &str = "Description";

/// Header names every incident file must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    CRIME_TYPE,
    DATE,
    LOCATION,
    LATITUDE,
    LONGITUDE,
    SUSPECT_GENDER,
    SUSPECT_AGE,
    VICTIM_GENDER,
    VICTIM_AGE,
    ARREST_MADE,
    CASE_STATUS,
    DESCRIPTION,
];

/// Options controlling validation during load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Region every incident must fall inside. Coordinates are always
    /// checked for finiteness and global range; this adds a regional check.
    pub bounds: Option<BoundingBox>,
}

/// Column name -> index lookup built from the header row.
struct Columns(BTreeMap<&'static str, usize>);

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, DataLoadError> {
        let mut map = BTreeMap::new();
        for column in REQUIRED_COLUMNS {
            let idx = headers
                .iter()
                .position(|h| h.trim() == *column)
                .ok_or(DataLoadError::MissingColumn { column })?;
            map.insert(*column, idx);
        }
        Ok(Self(map))
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, column: &'static str) -> &'r str {
        self.0
            .get(column)
            .and_then(|idx| record.get(*idx))
            .map_or("", str::trim)
    }
}

impl Dataset {
    /// Loads the incident table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the file is missing or malformed, a
    /// required column is absent, or any row fails validation.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self, DataLoadError> {
        log::info!("Loading crime records from {}", path.display());

        let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_reader(file, options)?;

        log::info!(
            "Loaded {} crime records from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Loads the incident table from any CSV byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the stream is malformed, a required
    /// column is absent, or any row fails validation.
    pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Self, DataLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::None)
            .from_reader(reader);

        let columns = Columns::resolve(reader.headers()?)?;

        let mut records = Vec::new();
        for (id, result) in reader.records().enumerate() {
            let row = result?;
            records.push(parse_row(&columns, &row, id, options)?);
        }

        log::debug!("Parsed {} rows", records.len());
        Ok(Self::from_records(records))
    }
}

fn parse_row(
    columns: &Columns,
    row: &csv::StringRecord,
    id: usize,
    options: &LoadOptions,
) -> Result<CrimeRecord, DataLoadError> {
    let row_number = id + 1;

    let raw_date = columns.get(row, DATE);
    let date = parse_date(raw_date).ok_or_else(|| DataLoadError::InvalidDate {
        row: row_number,
        value: raw_date.to_string(),
    })?;

    let latitude = parse_number(columns, row, LATITUDE, row_number)?;
    let longitude = parse_number(columns, row, LONGITUDE, row_number)?;
    let coord = Coordinate::new(latitude, longitude);
    let in_region = options.bounds.is_none_or(|b| b.contains(coord));
    if !coord.is_valid() || !in_region {
        return Err(DataLoadError::InvalidCoordinate {
            row: row_number,
            latitude,
            longitude,
        });
    }

    let arrest_raw = columns.get(row, ARREST_MADE);
    let arrest_made =
        arrest_raw
            .parse::<ArrestMade>()
            .map_err(|_| DataLoadError::InvalidField {
                row: row_number,
                column: ARREST_MADE,
                message: format!("expected Yes or No, got '{arrest_raw}'"),
            })?;

    Ok(CrimeRecord {
        id,
        crime_type: columns.get(row, CRIME_TYPE).to_string(),
        date,
        location: columns.get(row, LOCATION).to_string(),
        latitude,
        longitude,
        suspect_gender: columns.get(row, SUSPECT_GENDER).to_string(),
        suspect_age: parse_age_column(columns, row, SUSPECT_AGE, row_number)?,
        victim_gender: columns.get(row, VICTIM_GENDER).to_string(),
        victim_age: parse_age_column(columns, row, VICTIM_AGE, row_number)?,
        arrest_made,
        case_status: columns.get(row, CASE_STATUS).to_string(),
        description: columns.get(row, DESCRIPTION).to_string(),
    })
}

fn parse_number(
    columns: &Columns,
    row: &csv::StringRecord,
    column: &'static str,
    row_number: usize,
) -> Result<f64, DataLoadError> {
    let raw = columns.get(row, column);
    parse_f64(raw).ok_or_else(|| DataLoadError::InvalidField {
        row: row_number,
        column,
        message: format!("expected a number, got '{raw}'"),
    })
}

fn parse_age_column(
    columns: &Columns,
    row: &csv::StringRecord,
    column: &'static str,
    row_number: usize,
) -> Result<u32, DataLoadError> {
    let raw = columns.get(row, column);
    parse_age(raw).ok_or_else(|| DataLoadError::InvalidField {
        row: row_number,
        column,
        message: format!("expected a whole number of years, got '{raw}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Crime Type,Date,Location,Latitude,Longitude,Suspect Gender,Suspect Age,Victim Gender,Victim Age,Arrest Made,Case Status,Description";

    fn load(body: &str) -> Result<Dataset, DataLoadError> {
        load_with(body, LoadOptions::default())
    }

    fn load_with(body: &str, options: LoadOptions) -> Result<Dataset, DataLoadError> {
        let csv = format!("{HEADER}\n{body}");
        Dataset::from_reader(csv.as_bytes(), &options)
    }

    #[test]
    fn loads_well_formed_rows() {
        let ds = load(
            "Theft,2023-01-02,T. Nagar,13.0418,80.2341,Male,30,Female,25,No,Open,Phone stolen\n\
             Robbery,2023-02-11,Mylapore,13.0339,80.2619,Male,27,Male,52,Yes,Closed,Chain snatching\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.crime_type, "Theft");
        assert_eq!(first.arrest_made, ArrestMade::No);
        assert_eq!(first.suspect_age, 30);
        assert_eq!(ds.records()[1].id, 1);
        assert_eq!(ds.records()[1].case_status, "Closed");
    }

    #[test]
    fn tolerates_reordered_and_extra_columns() {
        let csv = "Description,Extra,Case Status,Arrest Made,Victim Age,Victim Gender,Suspect Age,Suspect Gender,Longitude,Latitude,Location,Date,Crime Type\n\
                   Wallet stolen,x,Open,No,25,Female,30,Male,80.2341,13.0418,T. Nagar,2023-01-02,Theft\n";
        let ds = Dataset::from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(ds.records()[0].crime_type, "Theft");
        assert!((ds.records()[0].latitude - 13.0418).abs() < 1e-9);
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Crime Type,Date\nTheft,2023-01-01\n";
        let err = Dataset::from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(
            matches!(err, DataLoadError::MissingColumn { column } if column == "Location"),
            "{err}"
        );
    }

    #[test]
    fn one_bad_date_aborts_the_load() {
        let err = load(
            "Theft,2023-01-02,T. Nagar,13.0418,80.2341,Male,30,Female,25,No,Open,ok\n\
             Theft,not-a-date,T. Nagar,13.0418,80.2341,Male,30,Female,25,No,Open,bad\n",
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidDate { row: 2, .. }), "{err}");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = load("Theft,2023-01-02,Nowhere,113.0,80.2,Male,30,Female,25,No,Open,x\n")
            .unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidCoordinate { row: 1, .. }));
    }

    #[test]
    fn rejects_coordinates_outside_configured_region() {
        let options = LoadOptions {
            bounds: Some(BoundingBox::new(79.9, 12.7, 80.5, 13.4)),
        };
        let err = load_with(
            "Theft,2023-01-02,Delhi,28.61,77.21,Male,30,Female,25,No,Open,x\n",
            options,
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidCoordinate { .. }));
    }

    #[test]
    fn rejects_unknown_arrest_value() {
        let err = load("Theft,2023-01-02,T. Nagar,13.0,80.2,Male,30,Female,25,Pending,Open,x\n")
            .unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::InvalidField { column, .. } if column == ARREST_MADE
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = load("Theft,2023-01-02,T. Nagar\n").unwrap_err();
        assert!(matches!(err, DataLoadError::Csv(_)), "{err}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Dataset::load(
            Path::new("/definitely/not/here.csv"),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }
}
