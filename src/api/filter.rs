use std::sync::Arc;

use async_graphql::{Context, InputObject, Object, Result, SimpleObject};

use crate::{aggregate::FilterSpec, dataset::Table};

#[derive(InputObject, Debug, Default)]
pub(crate) struct BookingFilter {
    /// Vehicle types to keep. Omit to keep every observed vehicle type; an
    /// empty list keeps nothing.
    vehicle_types: Option<Vec<String>>,
    /// Booking statuses to keep. Omit to keep every observed status; an empty
    /// list keeps nothing.
    booking_statuses: Option<Vec<String>>,
}

impl BookingFilter {
    pub(crate) fn to_spec(&self, table: &Table) -> FilterSpec {
        FilterSpec::new(
            self.vehicle_types
                .clone()
                .unwrap_or_else(|| table.vehicle_types()),
            self.booking_statuses
                .clone()
                .unwrap_or_else(|| table.booking_statuses()),
        )
    }
}

#[derive(SimpleObject)]
struct FilterOptions {
    /// Distinct vehicle types, in order of first appearance in the dataset.
    vehicle_types: Vec<String>,
    /// Distinct booking statuses, in order of first appearance in the dataset.
    booking_statuses: Vec<String>,
}

#[derive(Default)]
pub(super) struct FilterQuery {}

#[Object]
impl FilterQuery {
    /// The values a filter can select, which are also its defaults.
    #[allow(clippy::unused_async)]
    async fn filter_options(&self, ctx: &Context<'_>) -> Result<FilterOptions> {
        let table = ctx.data::<Arc<Table>>()?;
        Ok(FilterOptions {
            vehicle_types: table.vehicle_types(),
            booking_statuses: table.booking_statuses(),
        })
    }
}
