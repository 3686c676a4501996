use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    aggregate::{histogram_buckets, monthly_mean, NumericField},
    api::{self, BookingFilter, HistogramBin, MonthlyValue},
    dataset::BookingRecord,
};

pub(super) const DISTRIBUTION_BINS: usize = 30;
pub(super) const RANGE_BINS: usize = 10;
const MAX_BINS: usize = 1000;

#[derive(SimpleObject)]
pub(super) struct RideDistanceStat {
    /// A fine-grained histogram of ride distances.
    distribution: Vec<HistogramBin>,

    /// A coarse histogram of ride distances, one bin per distance range.
    ranges: Vec<HistogramBin>,

    /// The average ride distance per month.
    avg_distance_per_month: Vec<MonthlyValue>,
}

impl RideDistanceStat {
    pub(super) fn compute(
        records: &[&BookingRecord],
        distribution_bins: usize,
        range_bins: usize,
    ) -> Self {
        let histogram = |bins| -> Vec<HistogramBin> {
            histogram_buckets(records, NumericField::RideDistance, bins)
                .into_iter()
                .map(HistogramBin::from)
                .collect()
        };
        Self {
            distribution: histogram(distribution_bins),
            ranges: histogram(range_bins),
            avg_distance_per_month: api::monthly_values(monthly_mean(
                records,
                NumericField::RideDistance,
            )),
        }
    }
}

#[derive(Default)]
pub(super) struct RideDistanceQuery {}

#[Object]
impl RideDistanceQuery {
    #[allow(clippy::unused_async)]
    async fn ride_distance(
        &self,
        ctx: &Context<'_>,
        filter: Option<BookingFilter>,
        #[graphql(default_with = "DISTRIBUTION_BINS")] distribution_bins: usize,
        #[graphql(default_with = "RANGE_BINS")] range_bins: usize,
    ) -> Result<RideDistanceStat> {
        if distribution_bins > MAX_BINS || range_bins > MAX_BINS {
            return Err(format!("bin count cannot exceed {MAX_BINS}").into());
        }
        let records = api::load_filtered(ctx, filter.as_ref())?;
        Ok(RideDistanceStat::compute(
            &records,
            distribution_bins,
            range_bins,
        ))
    }
}
