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

//! Command line client for the floor plan gateway

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use floorplan_sdk::{
	SyncClient,
	types::{BookingRequest, BookingStatus, Floor, PublishRequest, RecommendQuery},
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "floorplan", about = "Publish floor plans and book meeting rooms", version)]
struct Cli {
	/// Gateway base URL
	#[arg(long, env = "FLOORPLAN_URL", default_value = DEFAULT_URL)]
	url: String,

	/// Enable debug logging on stderr
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the latest layout of a version
	Show {
		#[arg(long)]
		username: String,
		#[arg(long)]
		version: String,
	},
	/// Publish floors read from a JSON file (`[Floor]`)
	Publish {
		#[arg(long)]
		username: String,
		#[arg(long)]
		version: String,
		#[arg(long)]
		file: PathBuf,
	},
	/// Rank rooms that fit a meeting
	Recommend {
		#[arg(long)]
		version: String,
		#[arg(long)]
		participants: u32,
		/// Identifier of the room to favour
		#[arg(long)]
		last_room: Option<String>,
	},
	/// Book a room by display name
	Book {
		#[arg(long)]
		version: String,
		#[arg(long)]
		room: String,
		#[arg(long)]
		participants: u32,
	},
	/// List every entry of a version, newest first
	History {
		#[arg(long)]
		version: String,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let filter = if cli.verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	let client = SyncClient::new(&cli.url).context("Failed to create gateway client")?;
	debug!("Using gateway at {}", cli.url);

	match cli.command {
		Commands::Show { username, version } => {
			let floors = client.latest_floor_plan(&username, &version)?;
			match floors {
				Some(floors) => print_json(&floors)?,
				None => println!("No floor plan published under '{version}'"),
			}
		}
		Commands::Publish {
			username,
			version,
			file,
		} => {
			let floors = read_floors(&file)?;
			let response = client.publish(&PublishRequest {
				username,
				version,
				floors,
			})?;
			print_json(&response)?;
		}
		Commands::Recommend {
			version,
			participants,
			last_room,
		} => {
			let rooms = client.recommend_rooms(&RecommendQuery {
				version_tag: version,
				participants,
				last_room_name: last_room,
			})?;
			print_json(&rooms)?;
		}
		Commands::Book {
			version,
			room,
			participants,
		} => {
			let response = client.book_room(&BookingRequest {
				room_name: room,
				participants,
				version,
			})?;
			if response.status != BookingStatus::Booked {
				bail!("{}", response.message);
			}
			println!("{}", response.message);
		}
		Commands::History { version } => {
			let entries = client.history(&version)?;
			print_json(&entries)?;
		}
	}

	Ok(())
}

fn read_floors(path: &Path) -> Result<Vec<Floor>> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("Failed to read {}", path.display()))?;
	serde_json::from_str(&content)
		.with_context(|| format!("{} is not a JSON list of floors", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}
