//! Filtering and aggregation over the canonical table.
//!
//! Every function here is a pure computation over a filtered subset. Missing
//! values are left out of a computation, never counted as zero, and an empty
//! input yields a zero count, an empty grouping, or `NaN` for a mean.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt,
};

use chrono::{Datelike, NaiveDateTime};

use crate::dataset::{BookingRecord, Table};

pub(crate) const STATUS_COMPLETED: &str = "Completed";
pub(crate) const STATUS_CANCELLED_BY_DRIVER: &str = "Cancelled by Driver";
pub(crate) const STATUS_CANCELLED_BY_CUSTOMER: &str = "Cancelled by Customer";

/// The selected vehicle types and booking statuses.
///
/// A record passes only if both its vehicle type and its booking status are
/// selected; a record missing either value never passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FilterSpec {
    pub(crate) vehicle_types: HashSet<String>,
    pub(crate) booking_statuses: HashSet<String>,
}

impl FilterSpec {
    pub(crate) fn new<V, S>(vehicle_types: V, booking_statuses: S) -> Self
    where
        V: IntoIterator<Item = String>,
        S: IntoIterator<Item = String>,
    {
        Self {
            vehicle_types: vehicle_types.into_iter().collect(),
            booking_statuses: booking_statuses.into_iter().collect(),
        }
    }

    /// Selects every vehicle type and booking status observed in `table`.
    pub(crate) fn all(table: &Table) -> Self {
        Self::new(table.vehicle_types(), table.booking_statuses())
    }

    fn matches(&self, record: &BookingRecord) -> bool {
        record
            .vehicle_type
            .as_ref()
            .is_some_and(|vehicle_type| self.vehicle_types.contains(vehicle_type))
            && record
                .booking_status
                .as_ref()
                .is_some_and(|status| self.booking_statuses.contains(status))
    }
}

/// Returns the records of `table` that pass `spec`, in table order.
pub(crate) fn apply_filter<'a>(table: &'a Table, spec: &FilterSpec) -> Vec<&'a BookingRecord> {
    table
        .records()
        .iter()
        .filter(|record| spec.matches(record))
        .collect()
}

/// A numeric field of [`BookingRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumericField {
    AvgVtat,
    AvgCtat,
    BookingValue,
    RideDistance,
    DriverRating,
    CustomerRating,
}

impl NumericField {
    pub(crate) fn value(self, record: &BookingRecord) -> Option<f64> {
        match self {
            Self::AvgVtat => record.avg_vtat,
            Self::AvgCtat => record.avg_ctat,
            Self::BookingValue => record.booking_value,
            Self::RideDistance => record.ride_distance,
            Self::DriverRating => record.driver_rating,
            Self::CustomerRating => record.customer_rating,
        }
    }
}

/// A categorical field of [`BookingRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CategoryField {
    VehicleType,
    BookingStatus,
}

impl CategoryField {
    pub(crate) fn value(self, record: &BookingRecord) -> Option<&str> {
        match self {
            Self::VehicleType => record.vehicle_type.as_deref(),
            Self::BookingStatus => record.booking_status.as_deref(),
        }
    }
}

/// A calendar month, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Month {
    year: i32,
    month: u32,
}

impl From<NaiveDateTime> for Month {
    fn from(timestamp: NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One equal-width histogram bin.
///
/// Bins hold `(lower, upper]`, except the first, which also holds its lower
/// edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bin {
    pub(crate) lower: f64,
    pub(crate) upper: f64,
    pub(crate) count: usize,
}

pub(crate) fn count_total(records: &[&BookingRecord]) -> usize {
    records.len()
}

pub(crate) fn count_completed(records: &[&BookingRecord]) -> usize {
    count_status(records, |status| status == STATUS_COMPLETED)
}

pub(crate) fn count_cancelled(records: &[&BookingRecord]) -> usize {
    count_status(records, |status| {
        status == STATUS_CANCELLED_BY_DRIVER || status == STATUS_CANCELLED_BY_CUSTOMER
    })
}

fn count_status(records: &[&BookingRecord], predicate: impl Fn(&str) -> bool) -> usize {
    records
        .iter()
        .filter(|record| record.booking_status.as_deref().is_some_and(&predicate))
        .count()
}

/// The mean of the non-null values of `field`; `NaN` if there are none.
pub(crate) fn mean(records: &[&BookingRecord], field: NumericField) -> f64 {
    mean_of(records.iter().filter_map(|record| field.value(record)))
}

#[allow(clippy::cast_precision_loss)] // record counts stay far below 2^52
fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Counts records per distinct value of `key`. Records with a null key are
/// dropped.
pub(crate) fn group_count<'a>(
    records: &[&'a BookingRecord],
    key: CategoryField,
) -> BTreeMap<&'a str, usize> {
    records
        .iter()
        .filter_map(|record| key.value(*record))
        .fold(BTreeMap::new(), |mut acc, value| {
            *acc.entry(value).or_insert(0) += 1;
            acc
        })
}

/// The mean of `field` per distinct value of `key`.
///
/// A group whose records all lack `field` is kept with a `NaN` mean.
pub(crate) fn group_mean<'a>(
    records: &[&'a BookingRecord],
    key: CategoryField,
    field: NumericField,
) -> BTreeMap<&'a str, f64> {
    group_values(records, key, field)
        .into_iter()
        .map(|(group, values)| (group, mean_of(values.into_iter())))
        .collect()
}

/// The sum of `field` per distinct value of `key`; `0.0` for a group whose
/// records all lack `field`.
pub(crate) fn group_sum<'a>(
    records: &[&'a BookingRecord],
    key: CategoryField,
    field: NumericField,
) -> BTreeMap<&'a str, f64> {
    group_values(records, key, field)
        .into_iter()
        .map(|(group, values)| (group, values.into_iter().sum()))
        .collect()
}

fn group_values<'a>(
    records: &[&'a BookingRecord],
    key: CategoryField,
    field: NumericField,
) -> BTreeMap<&'a str, Vec<f64>> {
    records.iter().fold(BTreeMap::new(), |mut acc, record| {
        if let Some(group) = key.value(*record) {
            let values: &mut Vec<f64> = acc.entry(group).or_default();
            values.extend(field.value(record));
        }
        acc
    })
}

/// Partitions records by the calendar month of their timestamp. Records
/// without a timestamp are left out.
pub(crate) fn monthly_bucket<'a>(
    records: &[&'a BookingRecord],
) -> BTreeMap<Month, Vec<&'a BookingRecord>> {
    records.iter().fold(BTreeMap::new(), |mut acc, record| {
        if let Some(timestamp) = record.timestamp {
            acc.entry(Month::from(timestamp))
                .or_insert_with(Vec::new)
                .push(*record);
        }
        acc
    })
}

pub(crate) fn monthly_count(records: &[&BookingRecord]) -> BTreeMap<Month, usize> {
    monthly_bucket(records)
        .into_iter()
        .map(|(month, bucket)| (month, count_total(&bucket)))
        .collect()
}

pub(crate) fn monthly_mean(records: &[&BookingRecord], field: NumericField) -> BTreeMap<Month, f64> {
    monthly_bucket(records)
        .into_iter()
        .map(|(month, bucket)| (month, mean(&bucket, field)))
        .collect()
}

/// Counts records per month and per value of `key`.
///
/// Every month lists every value of `key` seen in any month, with zero where
/// the month has none.
pub(crate) fn monthly_group_count<'a>(
    records: &[&'a BookingRecord],
    key: CategoryField,
) -> BTreeMap<Month, BTreeMap<&'a str, usize>> {
    let buckets = monthly_bucket(records);
    let categories: BTreeSet<&str> = buckets
        .values()
        .flatten()
        .filter_map(|record| key.value(*record))
        .collect();
    buckets
        .into_iter()
        .map(|(month, bucket)| {
            let mut counts: BTreeMap<&str, usize> =
                categories.iter().map(|category| (*category, 0)).collect();
            counts.extend(group_count(&bucket, key));
            (month, counts)
        })
        .collect()
}

pub(crate) fn monthly_group_mean<'a>(
    records: &[&'a BookingRecord],
    key: CategoryField,
    field: NumericField,
) -> BTreeMap<Month, BTreeMap<&'a str, f64>> {
    monthly_bucket(records)
        .into_iter()
        .map(|(month, bucket)| (month, group_mean(&bucket, key, field)))
        .collect()
}

/// Splits the non-null values of `field` into `n` equal-width bins spanning
/// their observed range.
///
/// Returns no bins when there are no values or `n` is zero. When every value
/// is the same, each bin is that single point and the first one holds all
/// the values.
pub(crate) fn histogram_buckets(records: &[&BookingRecord], field: NumericField, n: usize) -> Vec<Bin> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|record| field.value(record))
        .collect();
    if values.is_empty() || n == 0 {
        return Vec::new();
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &value| {
            (lo.min(value), hi.max(value))
        });

    let mut bins: Vec<Bin> = (0..n)
        .map(|i| Bin {
            lower: edge(min, max, i, n),
            upper: edge(min, max, i + 1, n),
            count: 0,
        })
        .collect();
    for value in values {
        let index = if max > min {
            bin_index(value, min, max, n)
        } else {
            0
        };
        bins[index].count += 1;
    }
    bins
}

/// The `i`-th of `n` equal-width edges from `min` to `max`, exact at both
/// ends and finite even when `max - min` overflows.
#[allow(clippy::cast_precision_loss)]
fn edge(min: f64, max: f64, i: usize, n: usize) -> f64 {
    if i == 0 {
        return min;
    }
    if i == n {
        return max;
    }
    let t = i as f64 / n as f64;
    let span = max - min;
    if span.is_finite() {
        min + span * t
    } else {
        min * (1.0 - t) + max * t
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn bin_index(value: f64, min: f64, max: f64, n: usize) -> usize {
    let span = max - min;
    let fraction = if span.is_finite() {
        (value - min) / span
    } else {
        (value * 0.5 - min * 0.5) / (max * 0.5 - min * 0.5)
    };
    let position = fraction * n as f64;
    (position.ceil() as usize).saturating_sub(1).min(n - 1)
}
