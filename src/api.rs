mod booking_status;
mod booking_value;
mod filter;
mod key_metrics;
mod monthly_trends;
mod page;
mod raw_data;
mod ride_distance;

use std::{collections::BTreeMap, sync::Arc};

use async_graphql::{
    types::connection::{Connection, Edge},
    Context, EmptyMutation, EmptySubscription, InputValueError, InputValueResult, MergedObject,
    OutputType, Result, Scalar, ScalarType, SimpleObject, Value,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDateTime;

pub(crate) use self::filter::BookingFilter;
use crate::{
    aggregate::{apply_filter, Bin, FilterSpec, Month},
    dataset::{BookingRecord, Table},
};

/// The default page size for connections when neither `first` nor `last` is provided.
const DEFAULT_PAGE_SIZE: usize = 100;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A set of queries defined in the schema.
///
/// This is exposed only for [`Schema`], and not used directly.
#[derive(Default, MergedObject)]
pub(crate) struct Query(
    filter::FilterQuery,
    key_metrics::KeyMetricsQuery,
    booking_status::BookingStatusQuery,
    ride_distance::RideDistanceQuery,
    booking_value::BookingValueQuery,
    monthly_trends::MonthlyTrendsQuery,
    raw_data::RawDataQuery,
    page::PageQuery,
);

pub(crate) type Schema = async_graphql::Schema<Query, EmptyMutation, EmptySubscription>;

pub(crate) fn schema(table: Arc<Table>) -> Schema {
    Schema::build(Query::default(), EmptyMutation, EmptySubscription)
        .data(table)
        .finish()
}

/// A local date and time without offset, as read from the dataset.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub(crate) struct DateTime(NaiveDateTime);

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> InputValueResult<Self> {
        match &value {
            Value::String(s) => Ok(DateTime(NaiveDateTime::parse_from_str(
                s,
                DATETIME_FORMAT,
            )?)),
            _ => Err(InputValueError::expected_type(value)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.format(DATETIME_FORMAT).to_string())
    }
}

#[derive(SimpleObject, Debug, PartialEq)]
pub(crate) struct CategoryCount {
    value: String,
    count: usize,
}

#[derive(SimpleObject, Debug, PartialEq)]
pub(crate) struct CategoryValue {
    value: String,
    /// `null` when the category has no values to aggregate.
    amount: Option<f64>,
}

#[derive(SimpleObject, Debug, PartialEq)]
pub(crate) struct MonthlyCount {
    /// Calendar month as `YYYY-MM`.
    month: String,
    count: usize,
}

#[derive(SimpleObject, Debug, PartialEq)]
pub(crate) struct MonthlyValue {
    /// Calendar month as `YYYY-MM`.
    month: String,
    /// `null` when the month has no values to aggregate.
    value: Option<f64>,
}

#[derive(SimpleObject, Debug)]
pub(crate) struct MonthlyCategoryCounts {
    month: String,
    counts: Vec<CategoryCount>,
}

#[derive(SimpleObject, Debug)]
pub(crate) struct MonthlyCategoryValues {
    month: String,
    values: Vec<CategoryValue>,
}

#[derive(SimpleObject, Debug, PartialEq)]
pub(crate) struct HistogramBin {
    lower: f64,
    upper: f64,
    count: usize,
}

impl From<Bin> for HistogramBin {
    fn from(bin: Bin) -> Self {
        Self {
            lower: bin.lower,
            upper: bin.upper,
            count: bin.count,
        }
    }
}

#[derive(SimpleObject)]
pub(crate) struct TotalCountField {
    pub(crate) total_count: usize,
}

/// Maps a `NaN` aggregate to `null`.
fn finite(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

fn category_counts(counts: BTreeMap<&str, usize>) -> Vec<CategoryCount> {
    counts
        .into_iter()
        .map(|(value, count)| CategoryCount {
            value: value.to_string(),
            count,
        })
        .collect()
}

fn category_values(values: BTreeMap<&str, f64>) -> Vec<CategoryValue> {
    values
        .into_iter()
        .map(|(value, amount)| CategoryValue {
            value: value.to_string(),
            amount: finite(amount),
        })
        .collect()
}

fn monthly_counts(counts: BTreeMap<Month, usize>) -> Vec<MonthlyCount> {
    counts
        .into_iter()
        .map(|(month, count)| MonthlyCount {
            month: month.to_string(),
            count,
        })
        .collect()
}

fn monthly_values(values: BTreeMap<Month, f64>) -> Vec<MonthlyValue> {
    values
        .into_iter()
        .map(|(month, value)| MonthlyValue {
            month: month.to_string(),
            value: finite(value),
        })
        .collect()
}

/// Returns the records that pass `filter`; an omitted filter keeps every
/// record with both a vehicle type and a booking status.
fn filtered<'a>(table: &'a Table, filter: Option<&BookingFilter>) -> Vec<&'a BookingRecord> {
    let spec = filter.map_or_else(|| FilterSpec::all(table), |filter| filter.to_spec(table));
    apply_filter(table, &spec)
}

fn load_filtered<'a>(
    ctx: &Context<'a>,
    filter: Option<&BookingFilter>,
) -> Result<Vec<&'a BookingRecord>> {
    let table = ctx.data::<Arc<Table>>()?;
    Ok(filtered(table, filter))
}

/// Pages through `items` by position.
///
/// Cursors are the base64-encoded position of an item in `items`.
fn load_connection<T, N>(
    items: &[T],
    to_node: impl Fn(&T) -> N,
    after: Option<String>,
    before: Option<String>,
    first: Option<usize>,
    last: Option<usize>,
) -> Result<Connection<String, N, TotalCountField>>
where
    N: OutputType,
{
    let len = items.len();
    let (start, end, has_previous, has_next) = if let Some(before) = before {
        if after.is_some() {
            return Err("cannot use both `after` and `before`".into());
        }
        if first.is_some() {
            return Err("'before' and 'first' cannot be specified simultaneously".into());
        }
        let last = last.unwrap_or(DEFAULT_PAGE_SIZE);
        let end = decode_cursor(&before)?.min(len);
        let start = end.saturating_sub(last);
        (start, end, start > 0, false)
    } else if let Some(after) = after {
        if last.is_some() {
            return Err("'after' and 'last' cannot be specified simultaneously".into());
        }
        let first = first.unwrap_or(DEFAULT_PAGE_SIZE);
        let start = decode_cursor(&after)?.saturating_add(1).min(len);
        let end = start.saturating_add(first).min(len);
        (start, end, false, end < len)
    } else if let Some(last) = last {
        if first.is_some() {
            return Err("first and last cannot be used together".into());
        }
        let start = len.saturating_sub(last);
        (start, len, start > 0, false)
    } else {
        let first = first.unwrap_or(DEFAULT_PAGE_SIZE);
        let end = first.min(len);
        (0, end, false, end < len)
    };

    let mut connection = Connection::with_additional_fields(
        has_previous,
        has_next,
        TotalCountField { total_count: len },
    );
    for (position, item) in items.iter().enumerate().take(end).skip(start) {
        connection
            .edges
            .push(Edge::new(encode_cursor(position), to_node(item)));
    }
    Ok(connection)
}

fn encode_cursor(position: usize) -> String {
    general_purpose::STANDARD.encode(position.to_string())
}

fn decode_cursor(cursor: &str) -> Result<usize> {
    let decoded = general_purpose::STANDARD.decode(cursor)?;
    Ok(String::from_utf8(decoded)?.parse()?)
}

#[cfg(test)]
struct TestSchema {
    schema: Schema,
}

#[cfg(test)]
impl TestSchema {
    fn new(records: Vec<BookingRecord>) -> Self {
        let table = Arc::new(Table::new(records, Vec::new()));
        Self {
            schema: schema(table),
        }
    }

    fn from_csv(text: &str) -> Self {
        let table = crate::dataset::from_reader(
            text.as_bytes(),
            b',',
            &crate::dataset::Columns::default(),
        )
        .unwrap();
        Self {
            schema: schema(Arc::new(table)),
        }
    }

    async fn execute(&self, query: &str) -> async_graphql::Response {
        let request: async_graphql::Request = query.into();
        self.schema.execute(request).await
    }
}
