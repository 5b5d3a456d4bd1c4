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

use chrono::{DateTime, Utc};
use floorplan_sdk::types::{Floor, Room};
use serde::{Deserialize, Serialize};

/// Storage id of a history entry
///
/// Ids are assigned by the history store and strictly increase across the
/// whole log, so the highest id for a tag is that tag's current state.
pub type EntryId = u64;

/// One complete floor plan state at a point in time
///
/// A snapshot is never modified after it has been appended to the history.
/// Bookings decode an owned copy, change it, and append the copy as a new
/// snapshot under the same version tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
	/// Version tag (lineage) this snapshot belongs to
	pub version_tag: String,
	/// Identity of the user who published the lineage
	pub author: String,
	/// Floors in display order
	pub floors: Vec<Floor>,
	/// When this snapshot was created
	pub created_at: DateTime<Utc>,
}

impl Snapshot {
	pub fn new(author: impl Into<String>, version_tag: impl Into<String>, floors: Vec<Floor>) -> Self {
		Self {
			version_tag: version_tag.into(),
			author: author.into(),
			floors,
			created_at: Utc::now(),
		}
	}

	/// Iterate over every room in floor/room enumeration order
	pub fn rooms(&self) -> impl Iterator<Item = &Room> {
		self.floors.iter().flat_map(|floor| floor.rooms.iter())
	}

	/// First room, in enumeration order, whose display name matches
	pub fn find_room_by_name_mut(&mut self, name: &str) -> Option<&mut Room> {
		self.floors
			.iter_mut()
			.flat_map(|floor| floor.rooms.iter_mut())
			.find(|room| room.name == name)
	}

	pub fn room_count(&self) -> usize {
		self.floors.iter().map(|floor| floor.rooms.len()).sum()
	}
}

/// A decoded history entry: a stored snapshot plus its storage id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
	pub id: EntryId,
	pub snapshot: Snapshot,
}

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
	/// Storage id of the appended entry
	pub entry_id: EntryId,
	/// Identifier of every room in the published layout, in enumeration order
	pub room_ids: Vec<String>,
}

/// What a booking request could not find
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
	VersionTag(String),
	Room(String),
}

/// Why a booking was rejected as a conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
	/// The room is already booked in the latest snapshot
	AlreadyBooked,
	/// Other writers kept appending to the tag while we tried to book
	Contended { attempts: u32 },
}

/// Business outcome of a booking request
///
/// None of these are errors: callers branch on the variant. Storage and
/// decode failures are reported separately as `EngineError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
	Booked {
		room_name: String,
		room_id: String,
		entry_id: EntryId,
	},
	NotFound(Missing),
	Conflict {
		room_name: String,
		reason: ConflictReason,
	},
	CapacityExceeded {
		room_name: String,
		capacity: u32,
		participants: u32,
	},
}

impl BookingOutcome {
	pub fn is_booked(&self) -> bool {
		matches!(self, BookingOutcome::Booked { .. })
	}

	/// Human readable description, suitable for API responses
	pub fn message(&self) -> String {
		match self {
			BookingOutcome::Booked { room_name, .. } => {
				format!("Room {} booked successfully.", room_name)
			}
			BookingOutcome::NotFound(Missing::VersionTag(tag)) => {
				format!("Floor plan version '{}' not found.", tag)
			}
			BookingOutcome::NotFound(Missing::Room(name)) => {
				format!("Room {} not found.", name)
			}
			BookingOutcome::Conflict {
				room_name,
				reason: ConflictReason::AlreadyBooked,
			} => format!("Room {} is already booked.", room_name),
			BookingOutcome::Conflict {
				room_name,
				reason: ConflictReason::Contended { attempts },
			} => format!(
				"Room {} could not be booked after {} attempts due to concurrent updates.",
				room_name, attempts
			),
			BookingOutcome::CapacityExceeded {
				room_name,
				capacity,
				participants,
			} => format!(
				"Room {} does not have enough capacity ({} < {}).",
				room_name, capacity, participants
			),
		}
	}
}
