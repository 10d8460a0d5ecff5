use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    error::{AtmosError, Result},
    model::{Current, Forecast, Location, WeatherData},
};

/// Converts a decoded response body into [`WeatherData`].
///
/// `location` and `current` must both be present. Unknown keys are ignored
/// at every level; a `forecast` section, when present, must be complete.
pub fn map_response(payload: &Map<String, Value>) -> Result<WeatherData> {
    let (Some(location), Some(current)) = (section(payload, "location"), section(payload, "current"))
    else {
        return Err(AtmosError::missing("response must contain 'location' and 'current' keys"));
    };

    let data = WeatherData::new(decode::<Location>("location", location)?, decode::<Current>("current", current)?);

    match section(payload, "forecast") {
        Some(forecast) => Ok(data.with_forecast(decode::<Forecast>("forecast", forecast)?)),
        None => Ok(data),
    }
}

fn section<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|value| !value.is_null())
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| AtmosError::missing(format!("{name}: {e}")))
}
