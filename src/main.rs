mod aggregate;
mod api;
mod dataset;
mod settings;
mod web;

use std::{process::exit, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    dataset::DatasetError,
    settings::{Args, Settings},
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings =
        Settings::load(args.config.as_deref()).context("cannot load the configuration")?;
    if let Some(path) = args.dataset {
        settings.dataset.path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log.filter))
        .init();
    info!("Ride Bookings Dashboard Server");

    let delimiter = dataset::parse_delimiter(&settings.dataset.delimiter)?;
    let table = match dataset::load_and_clean(
        &settings.dataset.path,
        delimiter,
        &settings.dataset.columns,
    ) {
        Ok(table) => table,
        Err(DatasetError::Schema(e)) => {
            error!("{}", e);
            exit(1);
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("cannot load {}", settings.dataset.path.display())
            })
        }
    };
    info!(
        "Loaded {} bookings ({} vehicle types, {} booking statuses)",
        table.len(),
        table.vehicle_types().len(),
        table.booking_statuses().len()
    );

    let schema = api::schema(Arc::new(table));
    web::serve(schema, settings.web.address).await
}
