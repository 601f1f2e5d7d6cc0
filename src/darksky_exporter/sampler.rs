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

use crate::client::{Coordinates, WeatherSource};
use crate::metrics::ForecastMetrics;
use tracing::{Instrument, Level};

/// Fetches current conditions for a single location and publishes them as metrics.
#[derive(Debug)]
pub struct Sampler<S> {
    source: S,
    metrics: ForecastMetrics,
    location: Coordinates,
}

impl<S> Sampler<S>
where
    S: WeatherSource,
{
    pub fn new(source: S, metrics: ForecastMetrics, location: Coordinates) -> Self {
        Sampler {
            source,
            metrics,
            location,
        }
    }

    /// Fetch current conditions once and update metrics from them.
    ///
    /// Errors are logged and otherwise ignored: existing metric values are left as they
    /// were so that the last successful observation continues to be exported.
    pub async fn run_once(&self) {
        tracing::debug!(message = "collecting sample", location = %self.location);

        match self
            .source
            .currently(&self.location)
            .instrument(tracing::span!(Level::DEBUG, "darksky_currently"))
            .await
        {
            Ok(forecast) => {
                self.metrics.observe(&forecast);
                tracing::info!(
                    message = "fetched current conditions",
                    location = %forecast.coordinates(),
                    time = forecast.currently.time,
                );
            }
            Err(e) => {
                tracing::error!(message = "failed to fetch current conditions, skipping sample", error = %e);
            }
        }
    }
}
