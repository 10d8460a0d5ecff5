//! Records returned by the client, shaped after the WeatherAPI.com payloads.
//!
//! Optional fields stay `None` when the upstream response omits them. The
//! forecast records are the exception: a forecast day without its date,
//! summaries or hourly breakdown cannot be decoded at all.

use serde::{Deserialize, Serialize};

/// Sky state as reported by the upstream service (e.g. "Sunny").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub text: Option<String>,
    pub icon: Option<String>,
    pub code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Current {
    pub last_updated_epoch: Option<i64>,
    pub last_updated: Option<String>,
    pub temp_c: Option<f64>,
    pub temp_f: Option<f64>,
    /// `1` during daylight, `0` at night.
    pub is_day: Option<i64>,
    pub condition: Option<Condition>,
}

impl Current {
    pub fn is_daytime(&self) -> Option<bool> {
        self.is_day.map(|flag| flag != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tz_id: Option<String>,
    pub localtime_epoch: Option<i64>,
    pub localtime: Option<String>,
}

/// Daily summary inside a [`ForecastDay`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Day {
    pub maxtemp_c: Option<f64>,
    pub mintemp_c: Option<f64>,
    pub maxtemp_f: Option<f64>,
    pub mintemp_f: Option<f64>,
    pub condition: Option<Condition>,
    #[serde(alias = "total_precip_mm")]
    pub totalprecip_mm: Option<f64>,
    pub daily_chance_of_rain: Option<i64>,
    pub daily_chance_of_snow: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Astro {
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hour {
    pub time: Option<String>,
    pub temp_c: Option<f64>,
    pub condition: Option<Condition>,
    pub feelslike_c: Option<f64>,
    pub chance_of_rain: Option<i64>,
}

/// One day of a forecast. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub date_epoch: i64,
    pub day: Day,
    pub astro: Astro,
    pub hour: Vec<Hour>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

/// Root of a mapped response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherData {
    pub location: Option<Location>,
    pub current: Option<Current>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
}

impl WeatherData {
    pub fn new(location: Location, current: Current) -> Self {
        Self { location: Some(location), current: Some(current), forecast: None }
    }

    /// A value is only usable once both location and current conditions are set.
    pub fn is_populated(&self) -> bool {
        self.location.is_some() && self.current.is_some()
    }

    pub fn with_forecast(mut self, forecast: Forecast) -> Self {
        self.forecast = Some(forecast);
        self
    }
}
