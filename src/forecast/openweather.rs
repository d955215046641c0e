//! Production `ReportGenerator`: OpenAI resolves free text to
//! coordinates + unit preference, OpenWeather One Call 3.0 supplies the
//! data, `format` renders the report.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::ForecastError;
use crate::forecast::format::{self, OneCallResponse, Units};
use crate::forecast::ReportGenerator;
use crate::pipeline::request::{ReportRequest, ReportType};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

const RESOLVER_SYSTEM_PROMPT: &str = "You are an expert at parsing data and finding \
coordinates based on input. I am going to provide you some text containing coordinates \
or a location. Your job is to respond in json format with the coordinates. You may need \
to lookup the coordinates if a location (city, zip code, etc) is provided. You also need \
to determine unit type. The options are imperial and metric (watch for things like \
fahrenheit, celsius). Default to imperial if nothing is provided. The output should \
ALWAYS have these parameters: lat:latitude, long:longitude, units:units";

pub struct OpenWeatherGenerator {
    http: reqwest::Client,
    openai_api_key: SecretString,
    model: String,
    max_tokens: u32,
    weather_api_key: SecretString,
}

/// Coordinates and unit preference resolved from the request body.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResolvedLocation {
    lat: f64,
    lon: f64,
    units: Units,
}

// ── Chat-completions wire types ─────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenWeatherGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            openai_api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            max_tokens: config.openai_max_tokens,
            weather_api_key: config.weather_api_key.clone(),
        }
    }

    async fn resolve_location(&self, location_text: &str) -> Result<ResolvedLocation, ForecastError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: RESOLVER_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: location_text,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.5,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        let response = self
            .http
            .post(OPENAI_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.openai_api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| ForecastError::Resolve(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Resolve(format!(
                "location resolver returned HTTP {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::Resolve(format!("unreadable resolver response: {e}")))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ForecastError::Resolve("resolver response had no choices".to_string()))?;

        let resolved = parse_resolver_reply(content)?;
        debug!(lat = resolved.lat, lon = resolved.lon, "Location resolved");
        Ok(resolved)
    }

    async fn fetch_weather(
        &self,
        location: ResolvedLocation,
        report_type: ReportType,
    ) -> Result<OneCallResponse, ForecastError> {
        // Imperial at the wire; metric conversion happens at render time.
        let response = self
            .http
            .get(ONECALL_URL)
            .query(&[
                ("units", "imperial"),
                ("exclude", exclude_list(report_type)),
                ("lat", &location.lat.to_string()),
                ("lon", &location.lon.to_string()),
                ("appid", self.weather_api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Upstream(format!(
                "weather service returned HTTP {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ForecastError::Upstream(format!("unreadable weather response: {e}")))
    }
}

#[async_trait]
impl ReportGenerator for OpenWeatherGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<String, ForecastError> {
        let location = self.resolve_location(&request.location_text).await?;
        let weather = self.fetch_weather(location, request.report_type).await?;

        let report = match request.report_type {
            ReportType::Daily => {
                format::render_daily(&weather, location.lat, location.lon, location.units)
            }
            ReportType::Current => {
                format::render_current(&weather, location.lat, location.lon, location.units)
            }
            ReportType::Hourly => {
                format::render_hourly(&weather, location.lat, location.lon, location.units)
            }
        };
        Ok(report)
    }
}

/// One Call sections to skip, per report type.
fn exclude_list(report_type: ReportType) -> &'static str {
    match report_type {
        ReportType::Daily => "current,minutely,hourly",
        ReportType::Current => "daily,minutely,hourly",
        ReportType::Hourly => "daily,minutely,current",
    }
}

/// Parse the resolver's JSON reply. Models sometimes emit the coordinates
/// as strings rather than numbers; both are accepted.
fn parse_resolver_reply(content: &str) -> Result<ResolvedLocation, ForecastError> {
    let value: serde_json::Value = serde_json::from_str(content.trim())
        .map_err(|e| ForecastError::Resolve(format!("resolver reply was not JSON: {e}")))?;

    let lat = coord(&value, "lat")?;
    let lon = coord(&value, "long")?;
    let units = value
        .get("units")
        .and_then(|v| v.as_str())
        .map(Units::from_token)
        .unwrap_or(Units::Imperial);

    Ok(ResolvedLocation { lat, lon, units })
}

fn coord(value: &serde_json::Value, key: &str) -> Result<f64, ForecastError> {
    let field = value
        .get(key)
        .ok_or_else(|| ForecastError::Resolve(format!("resolver reply missing '{key}'")))?;

    field
        .as_f64()
        .or_else(|| field.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ForecastError::Resolve(format!("resolver reply has non-numeric '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_reply_with_numbers() {
        let loc =
            parse_resolver_reply(r#"{"lat": 47.61, "long": -122.33, "units": "metric"}"#).unwrap();
        assert_eq!(loc.lat, 47.61);
        assert_eq!(loc.lon, -122.33);
        assert_eq!(loc.units, Units::Metric);
    }

    #[test]
    fn resolver_reply_with_string_coordinates() {
        let loc =
            parse_resolver_reply(r#"{"lat": "47.61", "long": "-122.33", "units": "imperial"}"#)
                .unwrap();
        assert_eq!(loc.lat, 47.61);
        assert_eq!(loc.lon, -122.33);
        assert_eq!(loc.units, Units::Imperial);
    }

    #[test]
    fn resolver_reply_missing_units_defaults_imperial() {
        let loc = parse_resolver_reply(r#"{"lat": 1.0, "long": 2.0}"#).unwrap();
        assert_eq!(loc.units, Units::Imperial);
    }

    #[test]
    fn resolver_reply_missing_coordinate_fails() {
        assert!(matches!(
            parse_resolver_reply(r#"{"lat": 1.0, "units": "metric"}"#),
            Err(ForecastError::Resolve(_))
        ));
    }

    #[test]
    fn resolver_reply_non_json_fails() {
        assert!(matches!(
            parse_resolver_reply("Sorry, I can't find that place."),
            Err(ForecastError::Resolve(_))
        ));
    }

    #[test]
    fn exclude_lists_cover_each_type() {
        assert_eq!(exclude_list(ReportType::Daily), "current,minutely,hourly");
        assert_eq!(exclude_list(ReportType::Current), "daily,minutely,hourly");
        assert_eq!(exclude_list(ReportType::Hourly), "daily,minutely,current");
    }
}
