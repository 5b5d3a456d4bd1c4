// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use actix_web::{
	App, HttpResponse, HttpServer,
	error::{self, JsonPayloadError, QueryPayloadError},
	web,
};
use anyhow::{Context, Result};
use floorplan_booking::BookingEngine;
use floorplan_sdk::types::ErrorResponse;
use tracing::info;

use crate::{config::GatewayRuntimeConfig, middleware::LoggingMiddleware, routes::configure_routes};

/// Shared state handed to every request handler
pub struct GatewayState {
	pub engine: Arc<BookingEngine>,
	/// Only this user may publish layouts
	pub admin_username: String,
}

/// Gateway server
pub struct GatewayServer {
	config: GatewayRuntimeConfig,
	state: web::Data<GatewayState>,
}

impl GatewayServer {
	/// Open the configured history store and build the engine on top of it
	pub fn new(config: GatewayRuntimeConfig) -> Result<Self> {
		let store = config
			.booking
			.open_store()
			.context("Failed to open floor plan history")?;
		let engine = BookingEngine::new(config.booking.engine_config(), store);

		info!(
			target: "server",
			"History backend: {:?} (max booking attempts: {})",
			config.booking.storage.backend,
			engine.config().max_booking_attempts
		);

		let state = web::Data::new(GatewayState {
			engine: Arc::new(engine),
			admin_username: config.admin_username.clone(),
		});

		Ok(Self { config, state })
	}

	/// Start the HTTP server and run until shutdown
	pub async fn serve(self) -> Result<()> {
		let state = self.state;
		let max_body_bytes = self.config.max_body_bytes;

		info!(
			target: "server",
			"Listening on {} with {} workers",
			self.config.bind_addr,
			self.config.workers
		);

		HttpServer::new(move || {
			App::new()
				.app_data(state.clone())
				.app_data(json_config(max_body_bytes))
				.app_data(query_config())
				.wrap(LoggingMiddleware)
				.configure(configure_routes)
		})
		.workers(self.config.workers)
		.bind(self.config.bind_addr)
		.with_context(|| format!("Failed to bind {}", self.config.bind_addr))?
		.run()
		.await
		.context("HTTP server terminated with an error")
	}
}

/// Malformed bodies get the same error shape as every other failure
fn json_config(limit: usize) -> web::JsonConfig {
	web::JsonConfig::default()
		.limit(limit)
		.error_handler(|err: JsonPayloadError, _req| {
			let response = bad_request(&err.to_string());
			error::InternalError::from_response(err, response).into()
		})
}

fn query_config() -> web::QueryConfig {
	web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req| {
		let response = bad_request(&err.to_string());
		error::InternalError::from_response(err, response).into()
	})
}

fn bad_request(message: &str) -> HttpResponse {
	HttpResponse::BadRequest().json(ErrorResponse {
		error: message.to_string(),
		kind: "bad_request".to_string(),
	})
}
