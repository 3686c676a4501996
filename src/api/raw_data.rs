use std::sync::Arc;

use async_graphql::{
    connection::{query, Connection},
    Context, Object, Result, SimpleObject,
};

use crate::{
    api::{self, BookingFilter, DateTime, TotalCountField},
    dataset::{BookingRecord, Table},
};

/// A cleaned booking, as stored in the canonical table.
#[derive(SimpleObject)]
pub(super) struct Booking {
    booking_id: Option<String>,
    customer_id: Option<String>,
    timestamp: Option<DateTime>,
    vehicle_type: Option<String>,
    booking_status: Option<String>,
    avg_vtat: Option<f64>,
    avg_ctat: Option<f64>,
    booking_value: Option<f64>,
    ride_distance: Option<f64>,
    driver_rating: Option<f64>,
    customer_rating: Option<f64>,

    /// Columns outside the booking schema, in dataset order.
    extra: Vec<ExtraField>,
}

#[derive(SimpleObject)]
struct ExtraField {
    name: String,
    value: Option<String>,
}

impl Booking {
    fn new(record: &BookingRecord, extra_columns: &[String]) -> Self {
        Self {
            booking_id: record.booking_id.clone(),
            customer_id: record.customer_id.clone(),
            timestamp: record.timestamp.map(DateTime),
            vehicle_type: record.vehicle_type.clone(),
            booking_status: record.booking_status.clone(),
            avg_vtat: record.avg_vtat,
            avg_ctat: record.avg_ctat,
            booking_value: record.booking_value,
            ride_distance: record.ride_distance,
            driver_rating: record.driver_rating,
            customer_rating: record.customer_rating,
            extra: extra_columns
                .iter()
                .zip(&record.extra)
                .map(|(name, value)| ExtraField {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

/// The leading rows of the filtered subset, as shown on the Raw Data page.
#[derive(SimpleObject)]
pub(super) struct RawDataPage {
    rows: Vec<Booking>,

    /// The number of rows in the filtered subset.
    total_count: usize,
}

impl RawDataPage {
    pub(super) fn compute(table: &Table, records: &[&BookingRecord]) -> Self {
        Self {
            rows: records
                .iter()
                .take(api::DEFAULT_PAGE_SIZE)
                .map(|record| Booking::new(record, table.extra_columns()))
                .collect(),
            total_count: records.len(),
        }
    }
}

#[derive(Default)]
pub(super) struct RawDataQuery {}

#[Object]
impl RawDataQuery {
    async fn raw_data(
        &self,
        ctx: &Context<'_>,
        filter: Option<BookingFilter>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<Connection<String, Booking, TotalCountField>> {
        let table = ctx.data::<Arc<Table>>()?;
        let records = api::filtered(table, filter.as_ref());
        query(
            after,
            before,
            first,
            last,
            |after, before, first, last| async move {
                api::load_connection(
                    &records,
                    |record| Booking::new(record, table.extra_columns()),
                    after,
                    before,
                    first,
                    last,
                )
            },
        )
        .await
    }
}
