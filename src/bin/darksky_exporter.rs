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

use clap::Parser;
use darksky_exporter::client::{Coordinates, DarkSkyClient};
use darksky_exporter::http::RequestContext;
use darksky_exporter::metrics::{ForecastMetrics, MetricRegistry};
use darksky_exporter::sampler::Sampler;
use darksky_exporter::schedule::Schedule;
use reqwest::{Client, Url};
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_LISTEN_ADDR: &str = ":8080";
const DEFAULT_LATITUDE: f64 = 51.4416;
const DEFAULT_LONGITUDE: f64 = 5.4697;
const DEFAULT_EVERY: &str = "2m";
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_API_URL: &str = "https://api.darksky.net/";

#[derive(Debug, Parser)]
#[clap(name = "darksky_exporter", version = clap::crate_version!())]
struct DarkSkyExporterApplication {
    /// Dark Sky API key
    #[clap(long)]
    api_key: String,

    /// Latitude of the location to fetch current conditions for, in decimal degrees
    #[clap(long, default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true, value_parser = darksky_exporter::client::parse_latitude)]
    latitude: f64,

    /// Longitude of the location to fetch current conditions for, in decimal degrees
    #[clap(long, default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true, value_parser = darksky_exporter::client::parse_longitude)]
    longitude: f64,

    /// Fetch current conditions at this interval, e.g. '90s', '2m', or '@every 1h'
    #[clap(long, default_value = DEFAULT_EVERY)]
    every: Schedule,

    /// Base URL for the Dark Sky API
    #[clap(long, default_value = DEFAULT_API_URL)]
    api_url: Url,

    /// Language to request text summaries from the Dark Sky API in
    #[clap(long, default_value_t = DEFAULT_LANGUAGE.into())]
    language: String,

    /// Timeout for fetching current conditions from the Dark Sky API, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Address to listen on for HTTP requests. A port by itself (e.g. ':8080') listens on
    /// all interfaces since the purpose is to expose metrics to an external system
    /// (Prometheus or another agent for ingestion)
    #[clap(long, default_value = DEFAULT_LISTEN_ADDR, value_parser = darksky_exporter::http::parse_listen_address)]
    listen_address: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = DarkSkyExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let api_url = opts.api_url.clone();
    let location = Coordinates::new(opts.latitude, opts.longitude);
    let client = DarkSkyClient::new(http_client, opts.api_url, opts.api_key, opts.language).unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize Dark Sky client", error = %e);
        process::exit(1)
    });
    let mut registry = MetricRegistry::new();
    let metrics = ForecastMetrics::new(&mut registry);
    let sampler = Sampler::new(client, metrics, location);
    let schedule = opts.every;

    tokio::spawn(async move {
        tracing::info!(
            message = "polling started",
            api_url = %api_url,
            location = %location,
            schedule = %schedule,
        );

        schedule.run(|| sampler.run_once()).await;
    });

    let context = Arc::new(RequestContext::new(registry));
    let app = darksky_exporter::http::router(context);
    let server = axum::Server::try_bind(&opts.listen_address).unwrap_or_else(|e| {
        tracing::error!(message = "error binding to address", address = %opts.listen_address, error = %e);
        process::exit(1)
    });

    let server = server.serve(app.into_make_service());
    tracing::info!(message = "server started", address = %server.local_addr());

    server
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
