use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;

/// The token the source dataset uses for a missing value.
pub(crate) const NULL_SENTINEL: &str = "null";

/// Datetime layouts tried, in order, when fusing the date and time columns.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// One row as read from the dataset, in header order.
///
/// Every cell is kept as the reader returned it; no field has been
/// interpreted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawRecord {
    pub(crate) cells: Vec<String>,
}

impl RawRecord {
    pub(crate) fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the cell at `index`, or `None` when the row is shorter than the
    /// header.
    pub(crate) fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// A canonical booking, the unit every aggregate operates on.
#[derive(Debug, Clone, Default)]
pub(crate) struct BookingRecord {
    pub(crate) booking_id: Option<String>,
    pub(crate) customer_id: Option<String>,
    pub(crate) timestamp: Option<NaiveDateTime>,
    pub(crate) vehicle_type: Option<String>,
    pub(crate) booking_status: Option<String>,
    pub(crate) avg_vtat: Option<f64>,
    pub(crate) avg_ctat: Option<f64>,
    pub(crate) booking_value: Option<f64>,
    pub(crate) ride_distance: Option<f64>,
    pub(crate) driver_rating: Option<f64>,
    pub(crate) customer_rating: Option<f64>,
    /// Cleaned values of the columns with no fixed role, in the order of
    /// `Table::extra_columns`.
    pub(crate) extra: Vec<Option<String>>,
}

impl BookingRecord {
    fn numeric_fields(&self) -> [Option<f64>; 6] {
        [
            self.avg_vtat,
            self.avg_ctat,
            self.booking_value,
            self.ride_distance,
            self.driver_rating,
            self.customer_rating,
        ]
    }

    /// Every string-typed value of the record, extras included.
    #[cfg(test)]
    pub(crate) fn text_fields(&self) -> impl Iterator<Item = Option<&str>> {
        [
            self.booking_id.as_deref(),
            self.customer_id.as_deref(),
            self.vehicle_type.as_deref(),
            self.booking_status.as_deref(),
        ]
        .into_iter()
        .chain(self.extra.iter().map(Option::as_deref))
    }
}

// Floats compare by value so that `100` and `100.0` collapse to one row.
impl PartialEq for BookingRecord {
    fn eq(&self, other: &Self) -> bool {
        self.booking_id == other.booking_id
            && self.customer_id == other.customer_id
            && self.timestamp == other.timestamp
            && self.vehicle_type == other.vehicle_type
            && self.booking_status == other.booking_status
            && self
                .numeric_fields()
                .iter()
                .zip(other.numeric_fields().iter())
                .all(|(a, b)| float_key(*a) == float_key(*b))
            && self.extra == other.extra
    }
}

// Coerced floats are always finite, so value equality is reflexive.
impl Eq for BookingRecord {}

impl Hash for BookingRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.booking_id.hash(state);
        self.customer_id.hash(state);
        self.timestamp.hash(state);
        self.vehicle_type.hash(state);
        self.booking_status.hash(state);
        for value in self.numeric_fields() {
            float_key(value).hash(state);
        }
        self.extra.hash(state);
    }
}

fn float_key(value: Option<f64>) -> Option<u64> {
    // `-0.0 == 0.0` must hash the same.
    value.map(|v| if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() })
}

/// Strips every double quote, then surrounding whitespace.
pub(crate) fn normalize_identifier(cell: &str) -> String {
    cell.replace('"', "").trim().to_string()
}

/// Parses `"<date> <time>"` as a single datetime. Any failure is `None`.
pub(crate) fn fuse_datetime(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = date?.trim();
    let time = time?.trim();
    if date.is_empty() || time.is_empty() {
        return None;
    }
    let joined = format!("{date} {time}");
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&joined, format).ok())
}

/// Parses a numeric cell. Anything that is not a finite number becomes `None`.
pub(crate) fn coerce_float(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sentinel substitution and whitespace normalization of a text cell.
///
/// The sentinel is matched on the trimmed value, so a padded `" null "` can
/// not survive as `"null"`.
pub(crate) fn clean_text(cell: Option<String>) -> Option<String> {
    let value = cell?;
    let trimmed = value.trim();
    if trimmed == NULL_SENTINEL {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn identifier_loses_quotes_and_padding() {
        assert_eq!(normalize_identifier("\"B001\""), "B001");
        assert_eq!(normalize_identifier("  \"\"\"CNR5884300\"\"\" "), "CNR5884300");
        assert_eq!(normalize_identifier("\" B002 \""), "B002");
    }

    #[test]
    fn datetime_fusion() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            fuse_datetime(Some("2024-01-15"), Some("10:30:00")),
            Some(expected)
        );
        assert_eq!(
            fuse_datetime(Some(" 2024-01-15 "), Some("10:30")),
            Some(expected)
        );
        assert_eq!(
            fuse_datetime(Some("01/15/2024"), Some("10:30:00")),
            Some(expected)
        );
    }

    #[test]
    fn datetime_failure_is_none() {
        assert_eq!(fuse_datetime(Some("2024-13-45"), Some("10:30:00")), None);
        assert_eq!(fuse_datetime(Some("null"), Some("10:30:00")), None);
        assert_eq!(fuse_datetime(Some("2024-01-15"), Some("")), None);
        assert_eq!(fuse_datetime(None, Some("10:30:00")), None);
    }

    #[test]
    fn float_coercion_never_fails() {
        assert_eq!(coerce_float(Some("4.5")), Some(4.5));
        assert_eq!(coerce_float(Some(" 100 ")), Some(100.0));
        assert_eq!(coerce_float(Some("null")), None);
        assert_eq!(coerce_float(Some("")), None);
        assert_eq!(coerce_float(Some("abc")), None);
        assert_eq!(coerce_float(Some("NaN")), None);
        assert_eq!(coerce_float(Some("inf")), None);
        assert_eq!(coerce_float(None), None);
    }

    #[test]
    fn text_cleaning() {
        assert_eq!(clean_text(Some("null".to_string())), None);
        assert_eq!(clean_text(Some("  Sedan ".to_string())), Some("Sedan".to_string()));
        assert_eq!(clean_text(Some(" null ".to_string())), None);
        assert_eq!(clean_text(Some("NULL".to_string())), Some("NULL".to_string()));
        assert_eq!(clean_text(Some("nullable".to_string())), Some("nullable".to_string()));
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn equal_floats_hash_alike() {
        let a = BookingRecord {
            booking_value: Some(100.0),
            ride_distance: Some(0.0),
            ..Default::default()
        };
        let b = BookingRecord {
            booking_value: "100".parse().ok(),
            ride_distance: Some(-0.0),
            ..Default::default()
        };
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
