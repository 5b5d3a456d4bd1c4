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

//! Snapshot encoding for the history log
//!
//! Snapshots are stored as a JSON envelope:
//!
//! ```text
//! { "schema": 1, "checksum": "<sha256 hex of payload>", "payload": "<snapshot json>" }
//! ```
//!
//! The checksum covers the exact payload bytes, so any change to a stored
//! record is detected on decode instead of being read back as a different
//! floor plan.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::Snapshot;

/// Envelope schema version written by this codec
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Decode and encode failures
///
/// Every decode failure means the stored data cannot be trusted. The engine
/// reports these as data corruption, never as a business outcome.
#[derive(Debug, Error)]
pub enum CodecError {
	#[error("Failed to encode snapshot: {0}")]
	Encode(String),
	#[error("Malformed snapshot envelope: {0}")]
	Malformed(String),
	#[error("Unsupported snapshot schema: found v{found}, expected v{expected}")]
	SchemaMismatch { found: u32, expected: u32 },
	#[error("Snapshot checksum mismatch: expected {expected}, got {actual}")]
	ChecksumMismatch { expected: String, actual: String },
	#[error("Snapshot belongs to version '{found}' but is stored under '{expected}'")]
	TagMismatch { expected: String, found: String },
}

/// Converts snapshots to and from the string stored in the history log
pub trait SnapshotCodec: Send + Sync {
	fn encode(&self, snapshot: &Snapshot) -> Result<String, CodecError>;

	fn decode(&self, encoded: &str) -> Result<Snapshot, CodecError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
	schema: u32,
	checksum: String,
	payload: String,
}

/// JSON codec with schema versioning and a SHA-256 payload checksum
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotCodec;

impl JsonSnapshotCodec {
	pub fn new() -> Self {
		Self
	}
}

impl SnapshotCodec for JsonSnapshotCodec {
	fn encode(&self, snapshot: &Snapshot) -> Result<String, CodecError> {
		let payload =
			serde_json::to_string(snapshot).map_err(|e| CodecError::Encode(e.to_string()))?;

		let envelope = Envelope {
			schema: SNAPSHOT_SCHEMA_VERSION,
			checksum: sha256_hex(payload.as_bytes()),
			payload,
		};

		serde_json::to_string(&envelope).map_err(|e| CodecError::Encode(e.to_string()))
	}

	fn decode(&self, encoded: &str) -> Result<Snapshot, CodecError> {
		let envelope: Envelope =
			serde_json::from_str(encoded).map_err(|e| CodecError::Malformed(e.to_string()))?;

		if envelope.schema != SNAPSHOT_SCHEMA_VERSION {
			return Err(CodecError::SchemaMismatch {
				found: envelope.schema,
				expected: SNAPSHOT_SCHEMA_VERSION,
			});
		}

		let actual = sha256_hex(envelope.payload.as_bytes());
		if actual != envelope.checksum {
			return Err(CodecError::ChecksumMismatch {
				expected: envelope.checksum,
				actual,
			});
		}

		serde_json::from_str(&envelope.payload).map_err(|e| CodecError::Malformed(e.to_string()))
	}
}

fn sha256_hex(data: &[u8]) -> String {
	let mut hasher = Sha256::new();
	hasher.update(data);
	hex::encode(hasher.finalize())
}
