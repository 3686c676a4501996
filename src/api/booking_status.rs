use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    aggregate::{group_count, monthly_group_count, CategoryField},
    api::{self, BookingFilter, CategoryCount, MonthlyCategoryCounts},
    dataset::BookingRecord,
};

#[derive(SimpleObject)]
pub(super) struct BookingStatusStat {
    /// The number of rides per booking status, most frequent first.
    status_counts: Vec<CategoryCount>,

    /// The number of rides per booking status for each month. Every month
    /// lists every status, with zero where it has none.
    monthly_status_counts: Vec<MonthlyCategoryCounts>,
}

impl BookingStatusStat {
    pub(super) fn compute(records: &[&BookingRecord]) -> Self {
        let mut status_counts =
            api::category_counts(group_count(records, CategoryField::BookingStatus));
        // Stable, so equal counts keep their alphabetical order.
        status_counts.sort_by(|a, b| b.count.cmp(&a.count));

        let monthly_status_counts = monthly_group_count(records, CategoryField::BookingStatus)
            .into_iter()
            .map(|(month, counts)| MonthlyCategoryCounts {
                month: month.to_string(),
                counts: api::category_counts(counts),
            })
            .collect();

        Self {
            status_counts,
            monthly_status_counts,
        }
    }
}

#[derive(Default)]
pub(super) struct BookingStatusQuery {}

#[Object]
impl BookingStatusQuery {
    #[allow(clippy::unused_async)]
    async fn booking_status(
        &self,
        ctx: &Context<'_>,
        filter: Option<BookingFilter>,
    ) -> Result<BookingStatusStat> {
        let records = api::load_filtered(ctx, filter.as_ref())?;
        Ok(BookingStatusStat::compute(&records))
    }
}
