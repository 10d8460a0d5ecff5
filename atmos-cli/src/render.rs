use atmos_core::{Condition, Current, ForecastDay, Location, WeatherData};

/// Human-readable text for a mapped response, one line per item.
pub fn summary(data: &WeatherData) -> String {
    let mut lines = Vec::new();

    if let Some(location) = &data.location {
        lines.push(location_line(location));
    }
    if let Some(current) = &data.current {
        lines.push(current_line(current));
    }
    if let Some(forecast) = &data.forecast {
        lines.extend(forecast.forecastday.iter().map(forecast_day_line));
    }

    lines.into_iter().map(|line| line + "\n").collect()
}

fn current_line(current: &Current) -> String {
    format!(
        "Now: {} ({}), {}{}",
        temperature(current.temp_c, current.temp_f),
        condition_text(current.condition.as_ref()),
        match current.is_daytime() {
            Some(true) => "day",
            Some(false) => "night",
            None => "-",
        },
        current.last_updated.as_deref().map(|t| format!(", updated {t}")).unwrap_or_default(),
    )
}

fn forecast_day_line(fd: &ForecastDay) -> String {
    format!(
        "{}: {} / {}, {}, rain {}, sun {}-{}",
        fd.date,
        temperature(fd.day.maxtemp_c, fd.day.maxtemp_f),
        temperature(fd.day.mintemp_c, fd.day.mintemp_f),
        condition_text(fd.day.condition.as_ref()),
        percent(fd.day.daily_chance_of_rain),
        fd.astro.sunrise.as_deref().unwrap_or("?"),
        fd.astro.sunset.as_deref().unwrap_or("?"),
    )
}

fn location_line(location: &Location) -> String {
    let parts: Vec<&str> = [&location.name, &location.region, &location.country]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect();

    let name = if parts.is_empty() { "Unknown location".to_string() } else { parts.join(", ") };
    match &location.localtime {
        Some(local) => format!("{name} (local time {local})"),
        None => name,
    }
}

fn temperature(celsius: Option<f64>, fahrenheit: Option<f64>) -> String {
    match (celsius, fahrenheit) {
        (Some(c), Some(f)) => format!("{c:.1}°C/{f:.1}°F"),
        (Some(c), None) => format!("{c:.1}°C"),
        (None, Some(f)) => format!("{f:.1}°F"),
        (None, None) => "?".to_string(),
    }
}

fn condition_text(condition: Option<&Condition>) -> &str {
    condition.and_then(|c| c.text.as_deref()).unwrap_or("Unknown")
}

fn percent(value: Option<i64>) -> String {
    value.map(|v| format!("{v}%")).unwrap_or_else(|| "?".to_string())
}
