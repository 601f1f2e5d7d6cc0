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

//! Prometheus metrics exporter for the Dark Sky API
//!
//! ## Features
//!
//! `darksky_exporter` periodically fetches current weather conditions for a single location
//! using the [Dark Sky API] and emits them as Prometheus metrics. Users must supply an API key
//! and may pick the location to fetch conditions for. The following metrics are emitted after
//! each successful request. Fields the API has no data for at a location are reported as `0`.
//! The `latitude` and `longitude` labels are the location reported by the API, formatted with
//! six decimal places.
//!
//! * `darksky_temperature_celcius{latitude=$LAT, longitude=$LONG}` - Temperature, in degrees celsius.
//! * `darksky_apparent_temperature_celcius{latitude=$LAT, longitude=$LONG}` - Apparent temperature, in degrees celsius.
//! * `darksky_dew_point_celcius{latitude=$LAT, longitude=$LONG}` - Dew point, in degrees celsius.
//! * `darksky_humidity{latitude=$LAT, longitude=$LONG}` - Relative humidity (0-1).
//! * `darksky_pressure_mbar{latitude=$LAT, longitude=$LONG}` - Sea-level air pressure, in millibars.
//! * `darksky_wind_speed_kmh{latitude=$LAT, longitude=$LONG}` - Wind speed, in kilometers per hour.
//! * `darksky_bearing_degree{latitude=$LAT, longitude=$LONG}` - Direction the wind is coming from, in degrees.
//! * `darksky_cloud_cover{latitude=$LAT, longitude=$LONG}` - Fraction of the sky covered by clouds (0-1).
//! * `darksky_visibility_km{latitude=$LAT, longitude=$LONG}` - Visibility, in kilometers.
//! * `darksky_ozone_dobson{latitude=$LAT, longitude=$LONG}` - Columnar density of ozone, in Dobson units.
//! * `darksky_precipitation_intensity{latitude=$LAT, longitude=$LONG}` - Precipitation intensity, in millimeters per hour.
//! * `darksky_precipitation_probability{latitude=$LAT, longitude=$LONG}` - Probability of precipitation (0-1).
//! * `darksky_observation_timestamp_seconds{latitude=$LAT, longitude=$LONG}` - Time of the most recent
//!   observation. Values stop changing while the API is unavailable, use this to detect stale data.
//!
//! [Dark Sky API]: https://darksky.net/dev/docs
//!
//! ## Build
//!
//! `darksky_exporter` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! git clone git@github.com:56quarters/darksky_exporter.git && cd darksky_exporter
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Run
//!
//! `darksky_exporter` requires an API key. By default, conditions are fetched for Eindhoven, NL
//! every two minutes. Pick a different location and interval as demonstrated below.
//!
//! ```text
//! ./darksky_exporter --api-key YOUR_KEY --latitude 42.3601 --longitude -71.0589 --every 5m
//! ```
//!
//! The interval may be any duration such as `90s`, `5m`, or `1h 30m`, optionally prefixed with
//! `@every`. Each interval results in one API request so keep the free tier request limit in mind.
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `8080` at `/metrics`. Once `darksky_exporter`
//! is running, configure scrapes of it by your Prometheus server. Add the host running
//! `darksky_exporter` as a target under the Prometheus `scrape_configs` section as described by
//! the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     15s
//!   evaluation_interval: 15s
//!   external_labels:
//!     monitor: 'my_prom'
//!
//! scrape_configs:
//! - job_name: darksky_exporter
//!   static_configs:
//!   - targets: ['example:8080']
//! ```
//!

pub mod client;
pub mod http;
pub mod metrics;
pub mod sampler;
pub mod schedule;
