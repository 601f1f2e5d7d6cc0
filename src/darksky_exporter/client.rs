// darksky_exporter - Prometheus metrics exporter for the Dark Sky API
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;
use std::num::ParseFloatError;

/// Data blocks the forecast endpoint can leave out. Everything except `currently`
/// is excluded since only current conditions are exported.
const EXCLUDE_BLOCKS: &str = "minutely,hourly,daily,alerts,flags";

/// Unit system requested from the API: degrees celsius, hPa, km, mm/h, and m/s.
const UNITS_SI: &str = "si";

const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    InvalidBaseUrl(Url),
    InvalidApiKey,
    Unexpected(StatusCode),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::InvalidBaseUrl(url) => write!(f, "invalid base URL {}", url),
            Self::InvalidApiKey => write!(f, "API key rejected"),
            Self::Unexpected(status) => write!(f, "unexpected status {}", status),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs contain the API key, never let them end up in logs.
        Self::Internal(e.without_url())
    }
}

/// Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates { latitude, longitude }
    }
}

#[derive(Debug)]
pub enum CoordinateError {
    Invalid(ParseFloatError),
    NotFinite,
    OutOfRange(f64, f64),
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "invalid coordinate: {}", e),
            Self::NotFinite => write!(f, "coordinate must be a finite number"),
            Self::OutOfRange(v, max) => write!(f, "coordinate {} outside of range -{} to {}", v, max, max),
        }
    }
}

impl error::Error for CoordinateError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

/// Parse a latitude in decimal degrees, between -90 and 90 inclusive.
pub fn parse_latitude(s: &str) -> Result<f64, CoordinateError> {
    parse_degrees(s, MAX_LATITUDE)
}

/// Parse a longitude in decimal degrees, between -180 and 180 inclusive.
pub fn parse_longitude(s: &str) -> Result<f64, CoordinateError> {
    parse_degrees(s, MAX_LONGITUDE)
}

fn parse_degrees(s: &str, max: f64) -> Result<f64, CoordinateError> {
    let v = s.trim().parse::<f64>().map_err(CoordinateError::Invalid)?;
    if !v.is_finite() {
        Err(CoordinateError::NotFinite)
    } else if v.abs() > max {
        Err(CoordinateError::OutOfRange(v, max))
    } else {
        Ok(v)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Source of current weather conditions for a location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn currently(&self, location: &Coordinates) -> Result<Forecast, ClientError>;
}

#[derive(Debug)]
pub struct DarkSkyClient {
    client: Client,
    base_url: Url,
    api_key: String,
    language: String,
}

impl DarkSkyClient {
    const USER_AGENT: &'static str = "Dark Sky Prometheus Exporter (https://github.com/56quarters/darksky_exporter)";
    const JSON_RESPONSE: &'static str = "application/json";

    /// Create a new client for the API at `base_url`.
    ///
    /// Any path or query string of `base_url` is replaced when making requests. An
    /// error is returned if `base_url` cannot have a path (e.g. `mailto:` URLs).
    pub fn new<K, L>(client: Client, base_url: Url, api_key: K, language: L) -> Result<Self, ClientError>
    where
        K: Into<String>,
        L: Into<String>,
    {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        Ok(DarkSkyClient {
            client,
            base_url,
            api_key: api_key.into(),
            language: language.into(),
        })
    }

    async fn make_request(&self, url: Url) -> Result<Response, ClientError> {
        let res = self
            .client
            .get(url)
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            Err(ClientError::InvalidApiKey)
        } else {
            Err(ClientError::Unexpected(status))
        }
    }

    fn forecast_url(&self, location: &Coordinates) -> Url {
        let mut url = self.base_url.clone();
        {
            url.path_segments_mut()
                .map(|mut p| {
                    p.clear()
                        .push("forecast")
                        .push(&self.api_key)
                        .push(&location.to_string());
                })
                // Base URLs that can't have path segments are rejected by new()
                .expect("unable to modify forecast URL path segments");
        }

        url.query_pairs_mut()
            .clear()
            .append_pair("units", UNITS_SI)
            .append_pair("lang", &self.language)
            .append_pair("exclude", EXCLUDE_BLOCKS);

        url
    }
}

#[async_trait]
impl WeatherSource for DarkSkyClient {
    async fn currently(&self, location: &Coordinates) -> Result<Forecast, ClientError> {
        // Log only the location, the URL itself includes the API key.
        tracing::debug!(message = "making current conditions request", location = %location);

        let res = self.make_request(self.forecast_url(location)).await?;
        Ok(res.json::<Forecast>().await?)
    }
}

/// Forecast response, restricted to the `currently` data block.
///
/// The latitude and longitude are those reported by the API which may differ
/// slightly from the requested location.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Forecast {
    #[serde(alias = "latitude")]
    pub latitude: f64,
    #[serde(alias = "longitude")]
    pub longitude: f64,
    #[serde(alias = "timezone")]
    pub timezone: Option<String>,
    #[serde(alias = "currently")]
    pub currently: Currently,
}

impl Forecast {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Current conditions. Any field may be missing when the API has no data for it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Currently {
    #[serde(alias = "time")]
    pub time: i64,
    #[serde(alias = "summary")]
    pub summary: Option<String>,
    #[serde(alias = "icon")]
    pub icon: Option<String>,
    #[serde(alias = "temperature")]
    pub temperature: Option<f64>,
    #[serde(alias = "apparentTemperature")]
    pub apparent_temperature: Option<f64>,
    #[serde(alias = "dewPoint")]
    pub dew_point: Option<f64>,
    #[serde(alias = "humidity")]
    pub humidity: Option<f64>,
    #[serde(alias = "pressure")]
    pub pressure: Option<f64>,
    #[serde(alias = "windSpeed")]
    pub wind_speed: Option<f64>,
    #[serde(alias = "windGust")]
    pub wind_gust: Option<f64>,
    #[serde(alias = "windBearing")]
    pub wind_bearing: Option<f64>,
    #[serde(alias = "cloudCover")]
    pub cloud_cover: Option<f64>,
    #[serde(alias = "uvIndex")]
    pub uv_index: Option<f64>,
    #[serde(alias = "visibility")]
    pub visibility: Option<f64>,
    #[serde(alias = "ozone")]
    pub ozone: Option<f64>,
    #[serde(alias = "precipIntensity")]
    pub precip_intensity: Option<f64>,
    #[serde(alias = "precipProbability")]
    pub precip_probability: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::{parse_latitude, parse_longitude, ClientError, CoordinateError, Coordinates, DarkSkyClient, Forecast};
    use reqwest::{Client, Url};

    const RESPONSE: &str = r#"{
        "latitude": 51.4416,
        "longitude": 5.4697,
        "timezone": "Europe/Amsterdam",
        "currently": {
            "time": 1566918000,
            "summary": "Clear",
            "icon": "clear-day",
            "precipIntensity": 0.0102,
            "precipProbability": 0.01,
            "precipType": "rain",
            "temperature": 24.47,
            "apparentTemperature": 24.81,
            "dewPoint": 17.43,
            "humidity": 0.65,
            "pressure": 1017.6,
            "windSpeed": 2.51,
            "windGust": 4.43,
            "windBearing": 97,
            "cloudCover": 0.06,
            "uvIndex": 5,
            "visibility": 16.093,
            "ozone": 289.7
        },
        "offset": 2
    }"#;

    fn client() -> DarkSkyClient {
        DarkSkyClient::new(
            Client::new(),
            Url::parse("https://api.darksky.net/").unwrap(),
            "abc123",
            "en",
        )
        .unwrap()
    }

    #[test]
    fn test_forecast_url() {
        let url = client().forecast_url(&Coordinates::new(51.4416, 5.4697));

        assert_eq!("/forecast/abc123/51.4416,5.4697", url.path());
        assert_eq!(
            Some("units=si&lang=en&exclude=minutely%2Chourly%2Cdaily%2Calerts%2Cflags"),
            url.query()
        );
    }

    #[test]
    fn test_forecast_url_replaces_base_path() {
        let client = DarkSkyClient::new(
            Client::new(),
            Url::parse("http://localhost:1234/some/prefix?x=y").unwrap(),
            "key",
            "nl",
        )
        .unwrap();
        let url = client.forecast_url(&Coordinates::new(-33.8688, 151.2093));

        assert_eq!("/forecast/key/-33.8688,151.2093", url.path());
        assert!(url.query().unwrap().contains("lang=nl"));
        assert!(!url.query().unwrap().contains("x=y"));
    }

    #[test]
    fn test_new_cannot_be_a_base() {
        let res = DarkSkyClient::new(Client::new(), Url::parse("mailto:weather@example.com").unwrap(), "key", "en");
        assert!(matches!(res, Err(ClientError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(51.4416, parse_latitude("51.4416").unwrap());
        assert_eq!(-33.8688, parse_latitude("-33.8688").unwrap());
        assert_eq!(90.0, parse_latitude("90").unwrap());
        assert_eq!(-180.0, parse_longitude("-180").unwrap());
        assert_eq!(151.2093, parse_longitude("151.2093").unwrap());
    }

    #[test]
    fn test_parse_coordinates_not_finite() {
        assert!(matches!(parse_latitude("NaN"), Err(CoordinateError::NotFinite)));
        assert!(matches!(parse_longitude("inf"), Err(CoordinateError::NotFinite)));
        assert!(matches!(parse_longitude("-inf"), Err(CoordinateError::NotFinite)));
    }

    #[test]
    fn test_parse_coordinates_out_of_range() {
        assert!(matches!(parse_latitude("90.5"), Err(CoordinateError::OutOfRange(..))));
        assert!(matches!(parse_latitude("-91"), Err(CoordinateError::OutOfRange(..))));
        assert!(matches!(parse_longitude("200"), Err(CoordinateError::OutOfRange(..))));
        assert!(matches!(parse_latitude("120"), Err(CoordinateError::OutOfRange(..))));
    }

    #[test]
    fn test_parse_coordinates_invalid() {
        assert!(matches!(parse_latitude("north"), Err(CoordinateError::Invalid(_))));
        assert!(matches!(parse_longitude(""), Err(CoordinateError::Invalid(_))));
    }

    #[test]
    fn test_decode_forecast() {
        let forecast: Forecast = serde_json::from_str(RESPONSE).unwrap();

        assert_eq!(Coordinates::new(51.4416, 5.4697), forecast.coordinates());
        assert_eq!(1566918000, forecast.currently.time);
        assert_eq!(Some(24.47), forecast.currently.temperature);
        assert_eq!(Some(24.81), forecast.currently.apparent_temperature);
        assert_eq!(Some(17.43), forecast.currently.dew_point);
        assert_eq!(Some(0.65), forecast.currently.humidity);
        assert_eq!(Some(1017.6), forecast.currently.pressure);
        assert_eq!(Some(2.51), forecast.currently.wind_speed);
        assert_eq!(Some(97.0), forecast.currently.wind_bearing);
        assert_eq!(Some(0.06), forecast.currently.cloud_cover);
        assert_eq!(Some(16.093), forecast.currently.visibility);
        assert_eq!(Some(289.7), forecast.currently.ozone);
        assert_eq!(Some(0.0102), forecast.currently.precip_intensity);
        assert_eq!(Some(0.01), forecast.currently.precip_probability);
    }

    #[test]
    fn test_decode_forecast_missing_fields() {
        let forecast: Forecast = serde_json::from_str(
            r#"{"latitude": 1.5, "longitude": 2.5, "currently": {"time": 10, "temperature": 3.0}}"#,
        )
        .unwrap();

        assert_eq!(Some(3.0), forecast.currently.temperature);
        assert_eq!(None, forecast.currently.wind_bearing);
        assert_eq!(None, forecast.timezone);
    }

    #[test]
    fn test_decode_forecast_without_currently() {
        let res: Result<Forecast, _> = serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5}"#);
        assert!(res.is_err());
    }
}
