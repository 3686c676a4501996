use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    aggregate::{group_mean, group_sum, monthly_group_mean, CategoryField, NumericField},
    api::{self, BookingFilter, CategoryValue, MonthlyCategoryValues},
    dataset::BookingRecord,
};

#[derive(SimpleObject)]
pub(super) struct BookingValueStat {
    /// The average booking value per vehicle type, lowest first. Vehicle
    /// types without any booking value come last with a `null` amount.
    avg_value_by_vehicle: Vec<CategoryValue>,

    /// The total booking value per vehicle type.
    total_value_by_vehicle: Vec<CategoryValue>,

    /// The average booking value per vehicle type for each month.
    monthly_avg_value_by_vehicle: Vec<MonthlyCategoryValues>,
}

impl BookingValueStat {
    pub(super) fn compute(records: &[&BookingRecord]) -> Self {
        let mut avg_value_by_vehicle = api::category_values(group_mean(
            records,
            CategoryField::VehicleType,
            NumericField::BookingValue,
        ));
        avg_value_by_vehicle.sort_by(|a, b| match (a.amount, b.amount) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (a, b) => a.is_none().cmp(&b.is_none()),
        });

        let monthly_avg_value_by_vehicle =
            monthly_group_mean(records, CategoryField::VehicleType, NumericField::BookingValue)
                .into_iter()
                .map(|(month, values)| MonthlyCategoryValues {
                    month: month.to_string(),
                    values: api::category_values(values),
                })
                .collect();

        Self {
            avg_value_by_vehicle,
            total_value_by_vehicle: api::category_values(group_sum(
                records,
                CategoryField::VehicleType,
                NumericField::BookingValue,
            )),
            monthly_avg_value_by_vehicle,
        }
    }
}

#[derive(Default)]
pub(super) struct BookingValueQuery {}

#[Object]
impl BookingValueQuery {
    #[allow(clippy::unused_async)]
    async fn booking_value_by_vehicle(
        &self,
        ctx: &Context<'_>,
        filter: Option<BookingFilter>,
    ) -> Result<BookingValueStat> {
        let records = api::load_filtered(ctx, filter.as_ref())?;
        Ok(BookingValueStat::compute(&records))
    }
}
