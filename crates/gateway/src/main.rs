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

//! Floor Plan Gateway Service
//!
//! HTTP front end for the floor plan booking engine. It publishes layouts,
//! serves the latest layout of a version, recommends rooms and books them.
//!
//! Requests are decoded here and handed to the synchronous engine on the
//! blocking thread pool. The only caller identity the gateway knows is the
//! configured admin username required for publishing.

mod auth;
mod config;
mod handlers;
mod logging;
mod middleware;
mod routes;
mod server;

use anyhow::{Context, Result};
use tracing::info;

use crate::{config::GatewayRuntimeConfig, logging::init_logging};
use server::GatewayServer;

#[actix_rt::main]
async fn main() -> Result<()> {
	// Initialize logging first
	init_logging()?;

	let config = GatewayRuntimeConfig::from_env().context("Failed to load gateway configuration")?;
	info!(target: "server", "Starting Floorplan Gateway on {}", config.bind_addr);

	let server = GatewayServer::new(config).context("Failed to create gateway server")?;

	info!(target: "server", "Gateway server initialized");

	server.serve().await.context("Failed to run gateway server")?;

	Ok(())
}
