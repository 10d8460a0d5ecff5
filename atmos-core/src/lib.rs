//! Core library for the `atmos` weather client.
//!
//! This crate defines:
//! - The WeatherAPI.com client (current conditions and forecasts)
//! - Validation of forecast dates
//! - Mapping of raw JSON responses onto typed records
//! - On-disk configuration for the CLI
//!
//! It is used by `atmos-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod validate;

pub use client::{Endpoint, HttpTransport, Transport, WeatherClient};
pub use config::Config;
pub use error::{AtmosError, Result};
pub use mapper::map_response;
pub use model::{Astro, Condition, Current, Day, Forecast, ForecastDay, Hour, Location, WeatherData};
pub use validate::{validate_datetime, validate_format};
