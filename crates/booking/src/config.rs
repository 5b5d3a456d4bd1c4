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

use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
	engine::EngineConfig,
	history::{FileHistoryStore, HistoryStore, MemoryHistoryStore, StoreError},
};

/// Environment variable prefix (e.g. `FLOORPLAN__STORAGE__BACKEND=file`)
pub const ENV_PREFIX: &str = "FLOORPLAN";

/// Default history log location for the file backend
pub const DEFAULT_HISTORY_PATH: &str = "data/floorplan-history.jsonl";

/// Default number of read-modify-append cycles per booking
pub const DEFAULT_MAX_BOOKING_ATTEMPTS: u32 = 3;

/// Which history store backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	Memory,
	File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
	pub backend: StorageBackend,
	/// JSON-lines log path (file backend only)
	pub path: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: StorageBackend::Memory,
			path: PathBuf::from(DEFAULT_HISTORY_PATH),
		}
	}
}

/// Booking service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
	pub storage: StorageConfig,
	pub max_booking_attempts: u32,
	pub verbose_logging: bool,
}

impl Default for BookingConfig {
	fn default() -> Self {
		Self {
			storage: StorageConfig::default(),
			max_booking_attempts: DEFAULT_MAX_BOOKING_ATTEMPTS,
			verbose_logging: false,
		}
	}
}

impl BookingConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(environment())
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file, with environment variables taking precedence
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(environment())
			.build()?;

		cfg.try_deserialize()
	}

	pub fn engine_config(&self) -> EngineConfig {
		EngineConfig {
			max_booking_attempts: self.max_booking_attempts.max(1),
			verbose_logging: self.verbose_logging,
		}
	}

	/// Open the configured history store
	pub fn open_store(&self) -> Result<Arc<dyn HistoryStore>, StoreError> {
		Ok(match self.storage.backend {
			StorageBackend::Memory => Arc::new(MemoryHistoryStore::new()),
			StorageBackend::File => Arc::new(FileHistoryStore::open(&self.storage.path)?),
		})
	}
}

fn environment() -> config::Environment {
	config::Environment::with_prefix(ENV_PREFIX)
		.prefix_separator("__")
		.separator("__")
		.try_parsing(true)
}
