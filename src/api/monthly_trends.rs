use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    aggregate::{monthly_count, monthly_mean, NumericField},
    api::{self, BookingFilter, MonthlyCount, MonthlyValue},
    dataset::BookingRecord,
};

#[derive(SimpleObject)]
pub(super) struct MonthlyTrendStat {
    /// The number of rides per month.
    rides_per_month: Vec<MonthlyCount>,

    /// The average driver rating per month.
    avg_driver_rating_per_month: Vec<MonthlyValue>,
}

impl MonthlyTrendStat {
    pub(super) fn compute(records: &[&BookingRecord]) -> Self {
        Self {
            rides_per_month: api::monthly_counts(monthly_count(records)),
            avg_driver_rating_per_month: api::monthly_values(monthly_mean(
                records,
                NumericField::DriverRating,
            )),
        }
    }
}

#[derive(Default)]
pub(super) struct MonthlyTrendsQuery {}

#[Object]
impl MonthlyTrendsQuery {
    #[allow(clippy::unused_async)]
    async fn monthly_trends(
        &self,
        ctx: &Context<'_>,
        filter: Option<BookingFilter>,
    ) -> Result<MonthlyTrendStat> {
        let records = api::load_filtered(ctx, filter.as_ref())?;
        Ok(MonthlyTrendStat::compute(&records))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        aggregate::{STATUS_CANCELLED_BY_DRIVER, STATUS_COMPLETED},
        api::{tests::booking, TestSchema},
        dataset::BookingRecord,
    };

    #[tokio::test]
    async fn trends_by_month() {
        let schema = TestSchema::new(vec![
            booking("B1", "Sedan", STATUS_COMPLETED, 3, None),
            BookingRecord {
                driver_rating: Some(5.0),
                ..booking("B2", "Sedan", STATUS_COMPLETED, 3, None)
            },
            BookingRecord {
                driver_rating: None,
                ..booking("B3", "SUV", STATUS_CANCELLED_BY_DRIVER, 1, None)
            },
            BookingRecord {
                timestamp: None,
                ..booking("B4", "SUV", STATUS_COMPLETED, 1, None)
            },
        ]);
        let query = r"
        {
            monthlyTrends {
                ridesPerMonth { month count }
                avgDriverRatingPerMonth { month value }
            }
        }";
        let res = schema.execute(query).await;
        assert_eq!(
            res.data.to_string(),
            r#"{monthlyTrends: {ridesPerMonth: [{month: "2024-01", count: 1}, {month: "2024-03", count: 2}], avgDriverRatingPerMonth: [{month: "2024-01", value: null}, {month: "2024-03", value: 4.5}]}}"#
        );
    }
}
