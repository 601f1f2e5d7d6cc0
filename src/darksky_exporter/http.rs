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

use crate::metrics::MetricRegistry;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::{AddrParseError, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const METRICS_PATH: &str = "/metrics";
const TEXT_FORMAT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Global state shared between all HTTP requests via `Arc`.
#[derive(Debug)]
pub struct RequestContext {
    registry: MetricRegistry,
}

impl RequestContext {
    pub fn new(registry: MetricRegistry) -> Self {
        RequestContext { registry }
    }
}

/// Create a router that exposes metrics from the context registry at `/metrics`.
///
/// Requests for other paths get a 404 and other methods for `/metrics` get a 405.
pub fn router(context: Arc<RequestContext>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(text_metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

/// Render all metrics in the registry in the text exposition format.
pub async fn text_metrics_handler(State(context): State<Arc<RequestContext>>) -> Response {
    match context.registry.render() {
        Ok(buf) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            (StatusCode::OK, [(CONTENT_TYPE, TEXT_FORMAT)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Parse an address to listen on. In addition to a full socket address, a bare
/// port like `:8080` is accepted and means every interface on that port.
pub fn parse_listen_address(s: &str) -> Result<SocketAddr, AddrParseError> {
    if s.starts_with(':') {
        format!("{}{}", Ipv4Addr::UNSPECIFIED, s).parse()
    } else {
        s.parse()
    }
}
