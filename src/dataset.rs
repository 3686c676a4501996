mod clean;
pub(crate) mod record;

use std::{collections::HashSet, fs::File, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub(crate) use self::clean::clean;
pub(crate) use self::record::{BookingRecord, RawRecord};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// The dataset lacks columns the dashboard depends on.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("dataset is missing required columns: {}", .missing.join(", "))]
pub(crate) struct SchemaError {
    pub(crate) missing: Vec<String>,
}

#[derive(Debug, Error)]
pub(crate) enum DatasetError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("cannot open dataset {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("delimiter must be a single ASCII character, got {0:?}")]
    Delimiter(String),
}

/// Header names of the columns with a fixed role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct Columns {
    pub(crate) booking_id: String,
    pub(crate) customer_id: String,
    pub(crate) date: String,
    pub(crate) time: String,
    pub(crate) vehicle_type: String,
    pub(crate) booking_status: String,
    pub(crate) avg_vtat: String,
    pub(crate) avg_ctat: String,
    pub(crate) booking_value: String,
    pub(crate) ride_distance: String,
    pub(crate) driver_rating: String,
    pub(crate) customer_rating: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            booking_id: "Booking ID".to_string(),
            customer_id: "Customer ID".to_string(),
            date: "Date".to_string(),
            time: "Time".to_string(),
            vehicle_type: "Vehicle Type".to_string(),
            booking_status: "Booking Status".to_string(),
            avg_vtat: "Avg VTAT".to_string(),
            avg_ctat: "Avg CTAT".to_string(),
            booking_value: "Booking Value".to_string(),
            ride_distance: "Ride Distance".to_string(),
            driver_rating: "Driver Ratings".to_string(),
            customer_rating: "Customer Rating".to_string(),
        }
    }
}

/// Positions of every column within a row, resolved from the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) booking_id: usize,
    pub(crate) customer_id: usize,
    pub(crate) date: usize,
    pub(crate) time: usize,
    pub(crate) vehicle_type: usize,
    pub(crate) booking_status: usize,
    pub(crate) avg_vtat: usize,
    pub(crate) avg_ctat: usize,
    pub(crate) booking_value: usize,
    pub(crate) ride_distance: usize,
    pub(crate) driver_rating: usize,
    pub(crate) customer_rating: usize,
    /// Columns without a role, as `(position, name)` in header order.
    pub(crate) extra: Vec<(usize, String)>,
}

impl Layout {
    /// Maps each role in `columns` to its position in `headers`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] naming every role column absent from
    /// `headers`.
    pub(crate) fn resolve(headers: &[String], columns: &Columns) -> Result<Self, SchemaError> {
        let mut missing = Vec::new();
        let mut locate = |name: &str| {
            let position = headers.iter().position(|header| header == name);
            if position.is_none() {
                missing.push(name.to_string());
            }
            position.unwrap_or_default()
        };

        let mut layout = Self {
            booking_id: locate(&columns.booking_id),
            customer_id: locate(&columns.customer_id),
            date: locate(&columns.date),
            time: locate(&columns.time),
            vehicle_type: locate(&columns.vehicle_type),
            booking_status: locate(&columns.booking_status),
            avg_vtat: locate(&columns.avg_vtat),
            avg_ctat: locate(&columns.avg_ctat),
            booking_value: locate(&columns.booking_value),
            ride_distance: locate(&columns.ride_distance),
            driver_rating: locate(&columns.driver_rating),
            customer_rating: locate(&columns.customer_rating),
            extra: Vec::new(),
        };
        if !missing.is_empty() {
            return Err(SchemaError { missing });
        }

        let claimed = layout.role_positions();
        layout.extra = headers
            .iter()
            .enumerate()
            .filter(|(position, _)| !claimed.contains(position))
            .map(|(position, name)| (position, name.clone()))
            .collect();
        Ok(layout)
    }

    fn role_positions(&self) -> [usize; 12] {
        [
            self.booking_id,
            self.customer_id,
            self.date,
            self.time,
            self.vehicle_type,
            self.booking_status,
            self.avg_vtat,
            self.avg_ctat,
            self.booking_value,
            self.ride_distance,
            self.driver_rating,
            self.customer_rating,
        ]
    }

    fn extra_names(&self) -> Vec<String> {
        self.extra.iter().map(|(_, name)| name.clone()).collect()
    }
}

/// The canonical table: cleaned, deduplicated and immutable once built.
#[derive(Debug, Default)]
pub(crate) struct Table {
    records: Vec<BookingRecord>,
    extra_columns: Vec<String>,
}

impl Table {
    pub(crate) fn new(records: Vec<BookingRecord>, extra_columns: Vec<String>) -> Self {
        Self {
            records,
            extra_columns,
        }
    }

    pub(crate) fn records(&self) -> &[BookingRecord] {
        &self.records
    }

    pub(crate) fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct non-null vehicle types, in order of first appearance.
    pub(crate) fn vehicle_types(&self) -> Vec<String> {
        self.distinct(|record| record.vehicle_type.as_deref())
    }

    /// Distinct non-null booking statuses, in order of first appearance.
    pub(crate) fn booking_statuses(&self) -> Vec<String> {
        self.distinct(|record| record.booking_status.as_deref())
    }

    fn distinct<'a>(&'a self, key: impl Fn(&'a BookingRecord) -> Option<&'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(key)
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect()
    }
}

/// Reads the dataset at `path` and runs the cleaning pipeline over it.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed as delimited text,
/// or if a required column is missing from its header.
pub(crate) fn load_and_clean(
    path: &Path,
    delimiter: u8,
    columns: &Columns,
) -> Result<Table, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loading dataset from {}", path.display());
    from_reader(file, delimiter, columns)
}

/// Builds the canonical table from delimited text with a header row.
///
/// # Errors
///
/// Returns an error if the input is not valid delimited text or if a required
/// column is missing from its header.
pub(crate) fn from_reader<R: io::Read>(
    reader: R,
    delimiter: u8,
    columns: &Columns,
) -> Result<Table, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    let layout = Layout::resolve(&headers, columns)?;

    // Undecodable bytes become U+FFFD so one bad cell never drops a row.
    let rows = reader
        .byte_records()
        .map(|row| row.map(|row| RawRecord::new(row.iter().map(String::from_utf8_lossy))))
        .collect::<Result<Vec<_>, _>>()?;
    let raw_count = rows.len();
    let records = clean(&layout, rows);
    info!(
        "Cleaned {} raw rows into {} bookings ({} duplicates removed)",
        raw_count,
        records.len(),
        raw_count - records.len()
    );
    Ok(Table::new(records, layout.extra_names()))
}

/// Converts a delimiter setting into the byte the reader expects.
///
/// # Errors
///
/// Returns [`DatasetError::Delimiter`] unless `value` is one ASCII character.
pub(crate) fn parse_delimiter(value: &str) -> Result<u8, DatasetError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(DatasetError::Delimiter(value.to_string())),
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches(BYTE_ORDER_MARK)
        .replace('"', "")
        .trim()
        .to_string()
}
