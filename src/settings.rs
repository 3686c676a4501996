use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use clap::Parser;
use config::{builder::DefaultState, ConfigBuilder, ConfigError, File};
use serde::Deserialize;

use crate::dataset::Columns;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DATASET: &str = "ncr_ride_bookings.csv";
const DEFAULT_DELIMITER: &str = ",";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(version)]
pub(crate) struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Path to the ride bookings dataset, overriding `dataset.path`.
    #[arg(long, value_name = "PATH")]
    pub(crate) dataset: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Web {
    #[serde(deserialize_with = "deserialize_socket_addr")]
    pub(crate) address: SocketAddr,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DatasetSettings {
    pub(crate) path: PathBuf,
    pub(crate) delimiter: String,
    #[serde(default)]
    pub(crate) columns: Columns,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Log {
    /// A `tracing_subscriber::EnvFilter` directive, e.g. `info` or
    /// `ride_dashboard_server=debug`.
    pub(crate) filter: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Settings {
    pub(crate) web: Web,
    pub(crate) dataset: DatasetSettings,
    pub(crate) log: Log,
}

impl Settings {
    /// Load settings from the given TOML file, with sane defaults. Without a
    /// file, the defaults alone apply.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::<DefaultState>::default()
            .set_default("web.address", DEFAULT_ADDR)?
            .set_default("dataset.path", DEFAULT_DATASET)?
            .set_default("dataset.delimiter", DEFAULT_DELIMITER)?
            .set_default("log.filter", DEFAULT_LOG_FILTER)?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
