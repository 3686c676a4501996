use std::collections::HashSet;

use super::{
    record::{clean_text, coerce_float, fuse_datetime, normalize_identifier},
    BookingRecord, Layout, RawRecord,
};

/// Runs the cleaning pipeline over every raw row.
///
/// Each row is cleaned on its own: identifiers lose their quotes, the date and
/// time cells fuse into one timestamp, numeric cells are coerced, the `"null"`
/// sentinel becomes a missing value and text is trimmed. Rows that equal an
/// earlier cleaned row in every field are then dropped, keeping the first.
pub(crate) fn clean(layout: &Layout, rows: Vec<RawRecord>) -> Vec<BookingRecord> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .map(|row| clean_record(layout, &row))
        .filter(|record| seen.insert(record.clone()))
        .collect()
}

fn clean_record(layout: &Layout, row: &RawRecord) -> BookingRecord {
    // An empty cell is a missing value, not an empty string.
    let cell = |position: usize| row.get(position).filter(|value| !value.is_empty());
    let text = |position: usize| clean_text(cell(position).map(str::to_string));
    let identifier = |position: usize| clean_text(cell(position).map(normalize_identifier));

    BookingRecord {
        booking_id: identifier(layout.booking_id),
        customer_id: identifier(layout.customer_id),
        timestamp: fuse_datetime(cell(layout.date), cell(layout.time)),
        vehicle_type: text(layout.vehicle_type),
        booking_status: text(layout.booking_status),
        avg_vtat: coerce_float(cell(layout.avg_vtat)),
        avg_ctat: coerce_float(cell(layout.avg_ctat)),
        booking_value: coerce_float(cell(layout.booking_value)),
        ride_distance: coerce_float(cell(layout.ride_distance)),
        driver_rating: coerce_float(cell(layout.driver_rating)),
        customer_rating: coerce_float(cell(layout.customer_rating)),
        extra: layout
            .extra
            .iter()
            .map(|(position, _)| text(*position))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::dataset::{record::NULL_SENTINEL, Columns};

    const HEADERS: [&str; 13] = [
        "Date",
        "Time",
        "Booking ID",
        "Booking Status",
        "Customer ID",
        "Vehicle Type",
        "Avg VTAT",
        "Avg CTAT",
        "Booking Value",
        "Ride Distance",
        "Driver Ratings",
        "Customer Rating",
        "Payment Method",
    ];

    fn layout() -> Layout {
        let headers: Vec<String> = HEADERS.iter().map(ToString::to_string).collect();
        Layout::resolve(&headers, &Columns::default()).unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn row(
        booking_id: &str,
        date: &str,
        time: &str,
        vehicle_type: &str,
        status: &str,
        booking_value: &str,
        driver_rating: &str,
        payment: &str,
    ) -> RawRecord {
        RawRecord::new([
            date,
            time,
            booking_id,
            status,
            "\"C001\"",
            vehicle_type,
            "",
            "",
            booking_value,
            "",
            driver_rating,
            "",
            payment,
        ])
    }

    /// Writes a cleaned record back as a raw row in `HEADERS` order.
    fn render(record: &BookingRecord) -> RawRecord {
        let text = |value: &Option<String>| value.clone().unwrap_or_else(|| NULL_SENTINEL.into());
        let number = |value: Option<f64>| value.map_or_else(|| NULL_SENTINEL.into(), |v| v.to_string());
        RawRecord::new([
            record
                .timestamp
                .map_or_else(String::new, |ts| ts.format("%Y-%m-%d").to_string()),
            record
                .timestamp
                .map_or_else(String::new, |ts| ts.format("%H:%M:%S").to_string()),
            text(&record.booking_id),
            text(&record.booking_status),
            text(&record.customer_id),
            text(&record.vehicle_type),
            number(record.avg_vtat),
            number(record.avg_ctat),
            number(record.booking_value),
            number(record.ride_distance),
            number(record.driver_rating),
            number(record.customer_rating),
            text(&record.extra[0]),
        ])
    }

    fn messy_rows() -> Vec<RawRecord> {
        vec![
            row("\"B001\"", "2024-01-15", "10:30:00", "Sedan", "Completed", "null", "4.5", " UPI "),
            row("\"B002\"", "2024-01-20", "bad", " SUV ", "null", "100", "x", "null"),
            row(" \"B003\" ", "", "", "null", "Cancelled by Driver", "", "", ""),
            row("\"B002\"", "2024-01-20", "bad", "SUV", "null", "100.0", "", "null"),
        ]
    }

    #[test]
    fn cleans_scenario_row() {
        let records = clean(&layout(), messy_rows());
        let record = &records[0];
        assert_eq!(record.booking_id.as_deref(), Some("B001"));
        assert_eq!(record.customer_id.as_deref(), Some("C001"));
        assert_eq!(
            record.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
        );
        assert_eq!(record.vehicle_type.as_deref(), Some("Sedan"));
        assert_eq!(record.booking_status.as_deref(), Some("Completed"));
        assert_eq!(record.booking_value, None);
        assert_eq!(record.driver_rating, Some(4.5));
        assert_eq!(record.extra, vec![Some("UPI".to_string())]);
    }

    #[test]
    fn degrades_bad_cells_to_null() {
        let records = clean(&layout(), messy_rows());
        let record = &records[1];
        assert_eq!(record.timestamp, None);
        assert_eq!(record.vehicle_type.as_deref(), Some("SUV"));
        assert_eq!(record.booking_status, None);
        assert_eq!(record.driver_rating, None);
        assert_eq!(record.extra, vec![None]);

        let record = &records[2];
        assert_eq!(record.booking_id.as_deref(), Some("B003"));
        assert_eq!(record.timestamp, None);
        assert_eq!(record.vehicle_type, None);
        assert_eq!(record.booking_value, None);
    }

    #[test]
    fn numeric_formatting_does_not_defeat_dedup() {
        let records = clean(&layout(), messy_rows());
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].booking_value, Some(100.0));
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let rows = vec![
            row("B1", "2024-01-01", "00:00:00", "Sedan", "Completed", "1", "", ""),
            row("B2", "2024-01-01", "00:00:00", "Sedan", "Completed", "2", "", ""),
            row("\"B1\"", "2024-01-01", "00:00:00", "Sedan ", "Completed", "1.00", "", ""),
            row("B3", "2024-01-01", "00:00:00", "Sedan", "Completed", "3", "", ""),
            row("B2", "2024-01-01", "00:00:00", "Sedan", "Completed", "2", "", "Cash"),
        ];
        let ids: Vec<_> = clean(&layout(), rows)
            .into_iter()
            .map(|record| record.booking_id.unwrap())
            .collect();
        // The last row differs in an extra column, so it stays.
        assert_eq!(ids, ["B1", "B2", "B3", "B2"]);
    }

    #[test]
    fn duplicate_ids_alone_are_kept() {
        let rows = vec![
            row("B1", "2024-01-01", "00:00:00", "Sedan", "Completed", "1", "", ""),
            row("B1", "2024-01-01", "00:00:00", "Sedan", "Completed", "2", "", ""),
        ];
        assert_eq!(clean(&layout(), rows).len(), 2);
    }

    #[test]
    fn no_sentinel_or_padding_survives() {
        for record in clean(&layout(), messy_rows()) {
            for value in record.text_fields().flatten() {
                assert_ne!(value, NULL_SENTINEL);
                assert_eq!(value, value.trim());
            }
        }
    }

    #[test]
    fn cleaning_is_a_fixed_point() {
        let layout = layout();
        let once = clean(&layout, messy_rows());
        let twice = clean(&layout, once.iter().map(render).collect());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input() {
        assert!(clean(&layout(), Vec::new()).is_empty());
    }
}
