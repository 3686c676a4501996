use std::sync::Arc;

use async_graphql::{Context, Enum, Object, Result, Union};

use super::{
    booking_status::BookingStatusStat,
    booking_value::BookingValueStat,
    key_metrics::KeyMetrics,
    monthly_trends::MonthlyTrendStat,
    raw_data::RawDataPage,
    ride_distance::{RideDistanceStat, DISTRIBUTION_BINS, RANGE_BINS},
};
use crate::{
    api::{self, BookingFilter},
    dataset::Table,
};

/// A dashboard page.
#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub(super) enum Page {
    KeyMetrics,
    BookingStatus,
    RideDistance,
    BookingValueByVehicle,
    MonthlyTrends,
    RawData,
}

/// The view rendered by a dashboard page.
#[derive(Union)]
pub(super) enum DashboardView {
    KeyMetrics(KeyMetrics),
    BookingStatus(BookingStatusStat),
    RideDistance(RideDistanceStat),
    BookingValueByVehicle(BookingValueStat),
    MonthlyTrends(MonthlyTrendStat),
    RawData(RawDataPage),
}

#[derive(Default)]
pub(super) struct PageQuery {}

#[Object]
impl PageQuery {
    /// Computes the view of `page` over the bookings that pass `filter`.
    #[allow(clippy::unused_async)]
    async fn dashboard(
        &self,
        ctx: &Context<'_>,
        page: Page,
        filter: Option<BookingFilter>,
    ) -> Result<DashboardView> {
        let table = ctx.data::<Arc<Table>>()?;
        let records = api::filtered(table, filter.as_ref());
        let view = match page {
            Page::KeyMetrics => DashboardView::KeyMetrics(KeyMetrics::compute(&records)?),
            Page::BookingStatus => {
                DashboardView::BookingStatus(BookingStatusStat::compute(&records))
            }
            Page::RideDistance => DashboardView::RideDistance(RideDistanceStat::compute(
                &records,
                DISTRIBUTION_BINS,
                RANGE_BINS,
            )),
            Page::BookingValueByVehicle => {
                DashboardView::BookingValueByVehicle(BookingValueStat::compute(&records))
            }
            Page::MonthlyTrends => {
                DashboardView::MonthlyTrends(MonthlyTrendStat::compute(&records))
            }
            Page::RawData => DashboardView::RawData(RawDataPage::compute(table, &records)),
        };
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        aggregate::{STATUS_CANCELLED_BY_CUSTOMER, STATUS_COMPLETED},
        api::{tests::booking, TestSchema},
        dataset::BookingRecord,
    };

    fn bookings() -> Vec<BookingRecord> {
        vec![
            booking("B1", "Sedan", STATUS_COMPLETED, 1, Some(100.0)),
            booking("B2", "SUV", STATUS_CANCELLED_BY_CUSTOMER, 1, None),
            booking("B3", "Sedan", STATUS_COMPLETED, 2, Some(300.0)),
        ]
    }

    #[tokio::test]
    async fn key_metrics_page() {
        let schema = TestSchema::new(bookings());
        let query = r"
        {
            dashboard(page: KEY_METRICS) {
                __typename
                ... on KeyMetrics { totalRides completedRides cancelledRides }
            }
        }";
        let res = schema.execute(query).await;
        assert_eq!(
            res.data.to_string(),
            r#"{dashboard: {__typename: "KeyMetrics", totalRides: 3, completedRides: 2, cancelledRides: 1}}"#
        );
    }

    #[tokio::test]
    async fn page_follows_filter() {
        let schema = TestSchema::new(bookings());
        let query = r#"
        {
            dashboard(page: BOOKING_VALUE_BY_VEHICLE, filter: {vehicleTypes: ["Sedan"]}) {
                ... on BookingValueStat { avgValueByVehicle { value amount } }
            }
        }"#;
        let res = schema.execute(query).await;
        assert_eq!(
            res.data.to_string(),
            r#"{dashboard: {avgValueByVehicle: [{value: "Sedan", amount: 200.0}]}}"#
        );
    }

    #[tokio::test]
    async fn every_page_resolves() {
        let schema = TestSchema::new(bookings());
        for (page, typename) in [
            ("KEY_METRICS", "KeyMetrics"),
            ("BOOKING_STATUS", "BookingStatusStat"),
            ("RIDE_DISTANCE", "RideDistanceStat"),
            ("BOOKING_VALUE_BY_VEHICLE", "BookingValueStat"),
            ("MONTHLY_TRENDS", "MonthlyTrendStat"),
            ("RAW_DATA", "RawDataPage"),
        ] {
            let query = format!("{{ dashboard(page: {page}) {{ __typename }} }}");
            let res = schema.execute(&query).await;
            assert!(res.errors.is_empty(), "{page}: {:?}", res.errors);
            let data = res.data.into_json().unwrap();
            assert_eq!(data["dashboard"]["__typename"], typename);
        }
    }

    #[tokio::test]
    async fn raw_data_page_is_capped() {
        let records = (1..=120)
            .map(|i| booking(&format!("B{i}"), "Sedan", STATUS_COMPLETED, 1, None))
            .collect();
        let schema = TestSchema::new(records);
        let query = r"
        {
            dashboard(page: RAW_DATA) {
                ... on RawDataPage { totalCount rows { bookingId } }
            }
        }";
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(data["dashboard"]["totalCount"], 120);
        assert_eq!(data["dashboard"]["rows"].as_array().unwrap().len(), 100);
    }
}
