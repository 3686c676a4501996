use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    aggregate::{
        count_cancelled, count_completed, count_total, group_count, mean, monthly_count,
        CategoryField, NumericField,
    },
    api::{self, BookingFilter, CategoryCount, MonthlyCount},
    dataset::BookingRecord,
};

#[derive(SimpleObject)]
pub(super) struct KeyMetrics {
    /// The number of rides.
    total_rides: i32,

    /// The number of completed rides.
    completed_rides: i32,

    /// The number of rides cancelled by either the driver or the customer.
    cancelled_rides: i32,

    /// The average driver rating over rated rides.
    avg_driver_rating: Option<f64>,

    /// The average customer rating over rated rides.
    avg_customer_rating: Option<f64>,

    /// The average vehicle time to arrival, in minutes.
    avg_vtat: Option<f64>,

    /// The average customer time to arrival, in minutes.
    avg_ctat: Option<f64>,

    /// The number of rides per booking status.
    status_distribution: Vec<CategoryCount>,

    /// The number of rides per month.
    rides_per_month: Vec<MonthlyCount>,
}

impl KeyMetrics {
    pub(super) fn compute(records: &[&BookingRecord]) -> Result<Self> {
        Ok(Self {
            total_rides: count_total(records).try_into()?,
            completed_rides: count_completed(records).try_into()?,
            cancelled_rides: count_cancelled(records).try_into()?,
            avg_driver_rating: api::finite(mean(records, NumericField::DriverRating)),
            avg_customer_rating: api::finite(mean(records, NumericField::CustomerRating)),
            avg_vtat: api::finite(mean(records, NumericField::AvgVtat)),
            avg_ctat: api::finite(mean(records, NumericField::AvgCtat)),
            status_distribution: api::category_counts(group_count(
                records,
                CategoryField::BookingStatus,
            )),
            rides_per_month: api::monthly_counts(monthly_count(records)),
        })
    }
}

#[derive(Default)]
pub(super) struct KeyMetricsQuery {}

#[Object]
impl KeyMetricsQuery {
    #[allow(clippy::unused_async)]
    async fn key_metrics(
        &self,
        ctx: &Context<'_>,
        filter: Option<BookingFilter>,
    ) -> Result<KeyMetrics> {
        let records = api::load_filtered(ctx, filter.as_ref())?;
        KeyMetrics::compute(&records)
    }
}
