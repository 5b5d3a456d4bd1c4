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

mod layout;

pub use layout::{MAX_ID_DRAWS, rank_rooms};

use std::sync::Arc;

use chrono::Utc;
use floorplan_sdk::types::{Floor, Room};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
	codec::{CodecError, JsonSnapshotCodec, SnapshotCodec},
	history::{AppendOutcome, HistoryRecord, HistoryStore, PendingRecord, StoreError},
	ids::{RoomIdGenerator, UuidRoomIdGenerator},
	types::{
		BookingOutcome, ConflictReason, HistoryEntry, Missing, PublishReceipt, Snapshot,
	},
};
use layout::{LayoutError, prepare_layout};

/// Caller input that violates a precondition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	#[error("Version tag must be provided")]
	EmptyVersionTag,
	#[error("Room identifier '{0}' appears more than once in the layout")]
	DuplicateRoomId(String),
}

/// Error types for booking engine operations
///
/// Business outcomes (unknown room, already booked, capacity) are not
/// errors; see [`BookingOutcome`]. Everything here interrupts the request.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Validation failed: {0}")]
	Validation(#[from] ValidationError),
	#[error("Stored snapshot is corrupted: {0}")]
	DataCorruption(#[from] CodecError),
	#[error("History storage failure: {0}")]
	Storage(#[from] StoreError),
	#[error("Could not generate a unique room identifier on floor {floor_number}")]
	IdentifierExhausted { floor_number: i32 },
}

impl EngineError {
	/// Stable machine readable kind
	pub fn kind(&self) -> &'static str {
		match self {
			EngineError::Validation(_) => "validation",
			EngineError::DataCorruption(_) => "data_corruption",
			EngineError::Storage(_) => "storage_failure",
			EngineError::IdentifierExhausted { .. } => "identifier_exhausted",
		}
	}
}

impl From<LayoutError> for EngineError {
	fn from(err: LayoutError) -> Self {
		match err {
			LayoutError::DuplicateRoomId(id) => {
				EngineError::Validation(ValidationError::DuplicateRoomId(id))
			}
			LayoutError::IdentifierExhausted { floor_number } => {
				EngineError::IdentifierExhausted { floor_number }
			}
		}
	}
}

/// Configuration for the booking engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Read-modify-append cycles a booking may run before giving up on a
	/// contended tag (values below 1 are treated as 1)
	pub max_booking_attempts: u32,
	pub verbose_logging: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			max_booking_attempts: 3,
			verbose_logging: false,
		}
	}
}

/// Booking engine over the versioned floor plan history
///
/// Every operation is synchronous and performs at most one read of a
/// tag's latest entry and one append per attempt. Bookings append
/// conditionally on the entry they read still being the tag's head, and
/// retry a bounded number of times, so concurrent bookings can never
/// silently overwrite each other.
///
/// The engine holds no state of its own beyond its collaborators and can
/// be shared between threads behind an `Arc`.
pub struct BookingEngine {
	config: EngineConfig,
	store: Arc<dyn HistoryStore>,
	codec: Arc<dyn SnapshotCodec>,
	ids: Arc<dyn RoomIdGenerator>,
}

impl BookingEngine {
	/// Create an engine with the JSON codec and random room identifiers
	pub fn new(config: EngineConfig, store: Arc<dyn HistoryStore>) -> Self {
		Self::with_components(
			config,
			store,
			Arc::new(JsonSnapshotCodec::new()),
			Arc::new(UuidRoomIdGenerator),
		)
	}

	pub fn with_components(
		config: EngineConfig,
		store: Arc<dyn HistoryStore>,
		codec: Arc<dyn SnapshotCodec>,
		ids: Arc<dyn RoomIdGenerator>,
	) -> Self {
		Self {
			config,
			store,
			codec,
			ids,
		}
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Publish a fresh layout under a version tag
	///
	/// Rooms without an identifier get one. Every room starts available
	/// with zero booking weight, whatever the caller sent.
	pub fn publish(
		&self,
		author: &str,
		tag: &str,
		mut floors: Vec<Floor>,
	) -> Result<PublishReceipt, EngineError> {
		if tag.is_empty() {
			return Err(ValidationError::EmptyVersionTag.into());
		}

		let room_ids = prepare_layout(&mut floors, self.ids.as_ref())?;
		let snapshot = Snapshot::new(author, tag, floors);
		let entry_id = self.store.append(self.pending_record(&snapshot)?)?;

		info!(
			target: "engine",
			"Published version '{}' by '{}': {} floors, {} rooms, entry={}",
			tag,
			author,
			snapshot.floors.len(),
			room_ids.len(),
			entry_id
		);

		Ok(PublishReceipt { entry_id, room_ids })
	}

	/// Latest layout of a version, or `None` if the tag is unknown
	pub fn latest_snapshot(&self, tag: &str) -> Result<Option<Vec<Floor>>, EngineError> {
		Ok(self
			.load_latest(tag)?
			.map(|(_, snapshot)| snapshot.floors))
	}

	/// Rank bookable rooms of the latest layout for a meeting
	///
	/// An unknown tag yields no rooms. See [`rank_rooms`] for the order.
	pub fn recommend_rooms(
		&self,
		tag: &str,
		participants: u32,
		preferred_id: Option<&str>,
	) -> Result<Vec<Room>, EngineError> {
		let Some((_, snapshot)) = self.load_latest(tag)? else {
			return Ok(Vec::new());
		};

		let rooms = rank_rooms(&snapshot, participants, preferred_id);

		if self.config.verbose_logging {
			debug!(
				target: "engine",
				"Recommended {} rooms for {} participants in '{}' (preferred={:?})",
				rooms.len(),
				participants,
				tag,
				preferred_id
			);
		}

		Ok(rooms)
	}

	/// Book the first room whose display name matches
	///
	/// On success the room becomes unavailable and its booking weight grows
	/// by one in a new snapshot appended under the same tag. Nothing is
	/// appended for any other outcome.
	pub fn book_room(
		&self,
		room_name: &str,
		participants: u32,
		tag: &str,
	) -> Result<BookingOutcome, EngineError> {
		let max_attempts = self.config.max_booking_attempts.max(1);

		for attempt in 1..=max_attempts {
			let Some((record, mut snapshot)) = self.load_latest(tag)? else {
				return Ok(BookingOutcome::NotFound(Missing::VersionTag(tag.to_string())));
			};

			let Some(room) = snapshot.find_room_by_name_mut(room_name) else {
				return Ok(BookingOutcome::NotFound(Missing::Room(room_name.to_string())));
			};

			if !room.available {
				return Ok(BookingOutcome::Conflict {
					room_name: room_name.to_string(),
					reason: ConflictReason::AlreadyBooked,
				});
			}

			if room.capacity < participants {
				return Ok(BookingOutcome::CapacityExceeded {
					room_name: room_name.to_string(),
					capacity: room.capacity,
					participants,
				});
			}

			room.available = false;
			room.booking_weight += 1;
			let room_id = room.room_id.clone();

			let next = Snapshot {
				version_tag: record.version_tag.clone(),
				author: record.author.clone(),
				floors: snapshot.floors,
				created_at: Utc::now(),
			};

			match self
				.store
				.append_if_head(self.pending_record(&next)?, Some(record.id))?
			{
				AppendOutcome::Appended(entry_id) => {
					info!(
						target: "engine",
						"Booked room '{}' ({}) in '{}' for {} participants, entry={}",
						room_name,
						room_id,
						tag,
						participants,
						entry_id
					);
					return Ok(BookingOutcome::Booked {
						room_name: room_name.to_string(),
						room_id,
						entry_id,
					});
				}
				AppendOutcome::HeadMoved { current } => {
					warn!(
						target: "engine",
						"Head of '{}' moved from {} to {:?} while booking '{}' (attempt {}/{})",
						tag,
						record.id,
						current,
						room_name,
						attempt,
						max_attempts
					);
				}
			}
		}

		Ok(BookingOutcome::Conflict {
			room_name: room_name.to_string(),
			reason: ConflictReason::Contended {
				attempts: max_attempts,
			},
		})
	}

	/// Every entry of a version, newest first
	pub fn history(&self, tag: &str) -> Result<Vec<HistoryEntry>, EngineError> {
		self.store
			.all_by_tag(tag)?
			.iter()
			.map(|record| {
				Ok(HistoryEntry {
					id: record.id,
					snapshot: self.decode_record(record)?,
				})
			})
			.collect()
	}

	fn load_latest(&self, tag: &str) -> Result<Option<(HistoryRecord, Snapshot)>, EngineError> {
		let Some(record) = self.store.latest_by_tag(tag)? else {
			if self.config.verbose_logging {
				debug!(target: "engine", "No history for version '{}'", tag);
			}
			return Ok(None);
		};

		let snapshot = self.decode_record(&record)?;
		Ok(Some((record, snapshot)))
	}

	fn decode_record(&self, record: &HistoryRecord) -> Result<Snapshot, EngineError> {
		let snapshot = self.codec.decode(&record.encoded_snapshot)?;
		if snapshot.version_tag != record.version_tag {
			return Err(CodecError::TagMismatch {
				expected: record.version_tag.clone(),
				found: snapshot.version_tag,
			}
			.into());
		}
		Ok(snapshot)
	}

	fn pending_record(&self, snapshot: &Snapshot) -> Result<PendingRecord, EngineError> {
		Ok(PendingRecord {
			version_tag: snapshot.version_tag.clone(),
			author: snapshot.author.clone(),
			encoded_snapshot: self.codec.encode(snapshot)?,
			timestamp: snapshot.created_at,
		})
	}
}
