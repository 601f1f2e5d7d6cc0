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

use crate::client::{Coordinates, Forecast};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::collections::HashSet;
use std::error;
use std::fmt;
use std::sync::atomic::AtomicU64;

const KMH_PER_MS: f64 = 3.6;

/// Gauge holding a floating point value, one per distinct set of coordinate labels.
pub type GaugeFamily = Family<CoordinateLabels, Gauge<f64, AtomicU64>>;

#[derive(Debug)]
pub enum MetricsError {
    Duplicate(String),
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(name) => write!(f, "metric {} already registered", name),
        }
    }
}

impl error::Error for MetricsError {}

/// Labels identifying the location a gauge value was observed at.
///
/// Values are formatted with six decimal places (e.g. `51.441600`). Changing
/// this formatting changes the identity of every series.
#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CoordinateLabels {
    pub latitude: String,
    pub longitude: String,
}

impl From<Coordinates> for CoordinateLabels {
    fn from(c: Coordinates) -> Self {
        CoordinateLabels {
            latitude: format!("{:.6}", c.latitude),
            longitude: format!("{:.6}", c.longitude),
        }
    }
}

/// Registry of gauge families that refuses to register the same name twice.
///
/// Families are registered at startup while the registry is mutably borrowed. After
/// that, values are updated through the `GaugeFamily` handles returned from
/// `register` and the registry itself is only used for rendering, which is safe to
/// do concurrently with updates.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    inner: Registry,
    names: HashSet<String>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new gauge family with coordinate labels and return a handle to it.
    pub fn register(&mut self, name: &str, help: &str) -> Result<GaugeFamily, MetricsError> {
        if !self.names.insert(name.to_owned()) {
            return Err(MetricsError::Duplicate(name.to_owned()));
        }

        let family = GaugeFamily::default();
        self.inner.register(name, help, family.clone());
        Ok(family)
    }

    /// Render every registered family in the text exposition format.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        encode(&mut buf, &self.inner)?;
        Ok(buf)
    }
}

/// Holder for metrics that can be set from a `Forecast` response.
///
/// All metrics are created and registered upon call to `ForecastMetrics::new()`. Metrics
/// all share the prefix "darksky_" and have "latitude" and "longitude" labels set to the
/// location reported by the API (e.g. `{latitude="51.441600",longitude="5.469700"}`).
#[derive(Debug, Clone)]
pub struct ForecastMetrics {
    temperature: GaugeFamily,
    precip_intensity: GaugeFamily,
    precip_probability: GaugeFamily,
    apparent_temperature: GaugeFamily,
    dew_point: GaugeFamily,
    humidity: GaugeFamily,
    pressure: GaugeFamily,
    wind_speed: GaugeFamily,
    wind_bearing: GaugeFamily,
    cloud_cover: GaugeFamily,
    visibility: GaugeFamily,
    ozone: GaugeFamily,
    observation_timestamp: GaugeFamily,
}

impl ForecastMetrics {
    /// Create a new `ForecastMetrics` and register each metric with the provided `MetricRegistry`.
    ///
    /// # Panics
    ///
    /// If any metric has already been registered, this method will panic.
    pub fn new(reg: &mut MetricRegistry) -> Self {
        Self::try_new(reg).unwrap_or_else(|e| panic!("unable to register forecast metrics: {}", e))
    }

    /// Create a new `ForecastMetrics`, returning an error if any metric has already
    /// been registered with the provided `MetricRegistry`.
    pub fn try_new(reg: &mut MetricRegistry) -> Result<Self, MetricsError> {
        Ok(Self {
            temperature: reg.register("darksky_temperature_celcius", "Temperature in degree Celcius")?,
            precip_intensity: reg.register("darksky_precipitation_intensity", "Precipitation intensity in mm/h")?,
            precip_probability: reg.register("darksky_precipitation_probability", "Precipitation probability")?,
            apparent_temperature: reg.register(
                "darksky_apparent_temperature_celcius",
                "Apparent temperature in degree Celcius",
            )?,
            dew_point: reg.register("darksky_dew_point_celcius", "Dew point in degree Celcius")?,
            humidity: reg.register("darksky_humidity", "Relative humidity (0-1)")?,
            pressure: reg.register("darksky_pressure_mbar", "Pressure in mB")?,
            wind_speed: reg.register("darksky_wind_speed_kmh", "Wind speed in km/h")?,
            wind_bearing: reg.register("darksky_bearing_degree", "Wind bearing in degrees")?,
            cloud_cover: reg.register("darksky_cloud_cover", "Cloud cover (0-1)")?,
            visibility: reg.register("darksky_visibility_km", "Visibility in km")?,
            ozone: reg.register("darksky_ozone_dobson", "Ozone in dobson")?,
            observation_timestamp: reg.register(
                "darksky_observation_timestamp_seconds",
                "Time of the most recent observation as a UNIX timestamp",
            )?,
        })
    }

    /// Set every metric from the provided forecast.
    ///
    /// If the forecast doesn't contain a value for a particular metric, the metric is set
    /// to zero so that no value from an earlier forecast is exported alongside the newer
    /// observation timestamp.
    pub fn observe(&self, forecast: &Forecast) {
        let labels = CoordinateLabels::from(forecast.coordinates());
        let cur = &forecast.currently;

        self.set_from_value(&labels, &self.temperature, cur.temperature);
        self.set_from_value(&labels, &self.precip_intensity, cur.precip_intensity);
        self.set_from_value(&labels, &self.precip_probability, cur.precip_probability);
        self.set_from_value(&labels, &self.apparent_temperature, cur.apparent_temperature);
        self.set_from_value(&labels, &self.dew_point, cur.dew_point);
        self.set_from_value(&labels, &self.humidity, cur.humidity);
        self.set_from_value(&labels, &self.pressure, cur.pressure);
        // SI units from the API are m/s
        self.set_from_value(&labels, &self.wind_speed, cur.wind_speed.map(|v| v * KMH_PER_MS));
        self.set_from_value(&labels, &self.wind_bearing, cur.wind_bearing);
        self.set_from_value(&labels, &self.cloud_cover, cur.cloud_cover);
        self.set_from_value(&labels, &self.visibility, cur.visibility);
        self.set_from_value(&labels, &self.ozone, cur.ozone);
        self.set_from_value(&labels, &self.observation_timestamp, Some(cur.time as f64));
    }

    fn set_from_value(&self, labels: &CoordinateLabels, gauge: &GaugeFamily, value: Option<f64>) {
        gauge.get_or_create(labels).set(value.unwrap_or_default());
    }
}
