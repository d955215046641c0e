//! One Call response model and plain-text report rendering.
//!
//! Weather data is always fetched in imperial units; metric requests are
//! converted here. Timestamps render in the location's local time using
//! the response's own `timezone_offset`.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

// ── Units ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Imperial,
    Metric,
}

impl Units {
    /// Anything that isn't recognizably metric defaults to imperial.
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("metric") {
            Self::Metric
        } else {
            Self::Imperial
        }
    }

    fn temp_suffix(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    fn wind_suffix(self) -> &'static str {
        match self {
            Self::Metric => "km/h",
            Self::Imperial => "mph",
        }
    }
}

/// Fahrenheit → Celsius when metric is requested.
pub fn convert_temperature(fahrenheit: f64, units: Units) -> f64 {
    match units {
        Units::Metric => (fahrenheit - 32.0) * 5.0 / 9.0,
        Units::Imperial => fahrenheit,
    }
}

/// mph → km/h when metric is requested.
pub fn convert_wind_speed(mph: f64, units: Units) -> f64 {
    match units {
        Units::Metric => mph * 1.60934,
        Units::Imperial => mph,
    }
}

// ── One Call 3.0 response model ─────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OneCallResponse {
    #[serde(default)]
    pub timezone_offset: i32,
    pub current: Option<CurrentConditions>,
    #[serde(default)]
    pub daily: Vec<DailyForecast>,
    #[serde(default)]
    pub hourly: Vec<HourlyForecast>,
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentConditions {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct DailyForecast {
    pub dt: i64,
    #[serde(default)]
    pub summary: String,
    pub temp: DailyTemp,
    pub wind_speed: f64,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct DailyTemp {
    pub day: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize)]
pub struct HourlyForecast {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherAlert {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    #[serde(default)]
    pub description: String,
}

fn description(weather: &[Condition]) -> &str {
    weather.first().map(|c| c.description.as_str()).unwrap_or("")
}

// ── Rendering ───────────────────────────────────────────────────────

fn local_time(epoch: i64, offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    Some(DateTime::from_timestamp(epoch, 0)?.with_timezone(&offset))
}

fn format_date(epoch: i64, offset_secs: i32) -> String {
    local_time(epoch, offset_secs)
        .map(|t| t.format("%A, %B %d, %Y").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

fn format_date_time(epoch: i64, offset_secs: i32) -> String {
    local_time(epoch, offset_secs)
        .map(|t| t.format("%A, %B %d, %Y at %H:%M").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

pub fn render_daily(resp: &OneCallResponse, lat: f64, lon: f64, units: Units) -> String {
    let mut out = format!("Weather Forecast for {lat}, {lon}:\n\n");
    for day in &resp.daily {
        out.push_str(&format!("Date: {}\n", format_date(day.dt, resp.timezone_offset)));
        out.push_str(&format!("Summary: {}\n", day.summary));
        out.push_str(&format!(
            "Day Temperature: {:.1}{}\n",
            convert_temperature(day.temp.day, units),
            units.temp_suffix()
        ));
        out.push_str(&format!(
            "Min Temperature: {:.1}{}\n",
            convert_temperature(day.temp.min, units),
            units.temp_suffix()
        ));
        out.push_str(&format!(
            "Max Temperature: {:.1}{}\n",
            convert_temperature(day.temp.max, units),
            units.temp_suffix()
        ));
        out.push_str(&format!("Weather: {}\n", description(&day.weather)));
        out.push_str(&format!(
            "Wind Speed: {:.1} {}\n",
            convert_wind_speed(day.wind_speed, units),
            units.wind_suffix()
        ));
        out.push_str("---\n\n");
    }
    append_alerts(&mut out, resp, false);
    out
}

pub fn render_current(resp: &OneCallResponse, lat: f64, lon: f64, units: Units) -> String {
    let Some(current) = &resp.current else {
        // Nothing to report; the orchestrator treats this as a failure.
        return String::new();
    };

    let mut out = format!(
        "Current Weather Forecast for {lat}, {lon} on {}:\n\n",
        format_date(current.dt, resp.timezone_offset)
    );
    out.push_str(&format!(
        "Temperature: {:.1}{}\n",
        convert_temperature(current.temp, units),
        units.temp_suffix()
    ));
    out.push_str(&format!(
        "Feels Like: {:.1}{}\n",
        convert_temperature(current.feels_like, units),
        units.temp_suffix()
    ));
    out.push_str(&format!("Weather: {}\n", description(&current.weather)));
    out.push_str(&format!(
        "Wind Speed: {:.1} {}\n",
        convert_wind_speed(current.wind_speed, units),
        units.wind_suffix()
    ));
    out.push_str("---\n\n");
    append_alerts(&mut out, resp, false);
    out
}

pub fn render_hourly(resp: &OneCallResponse, lat: f64, lon: f64, units: Units) -> String {
    let mut out = format!("Hourly Weather Forecast for {lat}, {lon}:\n\n");
    for hour in &resp.hourly {
        out.push_str(&format!(
            "Date & Time: {}\n",
            format_date_time(hour.dt, resp.timezone_offset)
        ));
        out.push_str(&format!(
            "Temperature: {:.1}{}\n",
            convert_temperature(hour.temp, units),
            units.temp_suffix()
        ));
        out.push_str(&format!(
            "Feels Like: {:.1}{}\n",
            convert_temperature(hour.feels_like, units),
            units.temp_suffix()
        ));
        out.push_str(&format!("Weather: {}\n", description(&hour.weather)));
        out.push_str(&format!(
            "Wind Speed: {:.1} {}\n",
            convert_wind_speed(hour.wind_speed, units),
            units.wind_suffix()
        ));
        out.push_str("---\n\n");
    }
    append_alerts(&mut out, resp, true);
    out
}

fn append_alerts(out: &mut String, resp: &OneCallResponse, with_time: bool) {
    if resp.alerts.is_empty() {
        return;
    }
    out.push_str("Alerts:\n\n");
    for alert in &resp.alerts {
        let (start, end) = if with_time {
            (
                format_date_time(alert.start, resp.timezone_offset),
                format_date_time(alert.end, resp.timezone_offset),
            )
        } else {
            (
                format_date(alert.start, resp.timezone_offset),
                format_date(alert.end, resp.timezone_offset),
            )
        };
        out.push_str(&format!("Event: {}\n", alert.event));
        out.push_str(&format!("From: {start} to {end}\n"));
        out.push_str(&format!("Details: {}\n", alert.description));
        out.push_str("---\n\n");
    }
}
