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
use serde::{Deserialize, Deserializer, Serialize};

/// A bookable room on a floor
///
/// Field names on the wire follow the floor plan JSON format used by
/// existing clients (`roomId`, `isAvailable`, `bookingWeightage`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
	/// Unique identifier within a snapshot (empty when the caller wants one generated)
	#[serde(default, deserialize_with = "null_as_default")]
	pub room_id: String,
	/// Display name (not guaranteed unique)
	pub name: String,
	/// Maximum number of participants
	pub capacity: u32,
	/// Whether the room can currently be booked
	#[serde(default, rename = "isAvailable", deserialize_with = "null_as_default")]
	pub available: bool,
	/// Number of successful bookings, used as a popularity tie-break
	#[serde(default, rename = "bookingWeightage", deserialize_with = "null_as_default")]
	pub booking_weight: u32,
}

impl Room {
	/// Create a room without an identifier, as a publisher would submit it
	pub fn new(name: impl Into<String>, capacity: u32) -> Self {
		Self {
			room_id: String::new(),
			name: name.into(),
			capacity,
			available: true,
			booking_weight: 0,
		}
	}

	/// Same as [`Room::new`] with a caller-chosen identifier
	pub fn with_id(room_id: impl Into<String>, name: impl Into<String>, capacity: u32) -> Self {
		Self {
			room_id: room_id.into(),
			..Self::new(name, capacity)
		}
	}
}

/// One floor of the building with its rooms in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
	pub floor_number: i32,
	#[serde(default, deserialize_with = "null_as_default")]
	pub rooms: Vec<Room>,
}

impl Floor {
	pub fn new(floor_number: i32, rooms: Vec<Room>) -> Self {
		Self {
			floor_number,
			rooms,
		}
	}
}

/// Request to publish a new floor plan version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
	/// Caller identity (must be the admin user)
	pub username: String,
	/// Version tag the layout is published under
	pub version: String,
	/// Floors of the new layout
	#[serde(rename = "floorDTOs")]
	pub floors: Vec<Floor>,
}

/// Response from publishing a floor plan version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
	pub version: String,
	/// Storage id of the new history entry
	pub entry_id: u64,
	/// Identifier of every room in the published layout, in floor/room order
	pub room_ids: Vec<String>,
}

/// Query for the latest layout of a version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlanQuery {
	pub username: String,
	pub version: String,
}

/// Query for room recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendQuery {
	pub version_tag: String,
	pub participants: u32,
	/// Identifier of the room to favour; named after the historical query parameter
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_room_name: Option<String>,
}

/// Request to book a room by display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
	pub room_name: String,
	pub participants: u32,
	pub version: String,
}

/// Outcome of a booking request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
	Booked,
	NotFound,
	Conflict,
	CapacityExceeded,
}

/// Response from a booking request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
	pub status: BookingStatus,
	pub room_name: String,
	/// Human readable explanation
	pub message: String,
	/// Identifier of the booked room (only on success)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub room_id: Option<String>,
	/// Storage id of the history entry created by the booking (only on success)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub entry_id: Option<u64>,
}

/// Query for the history of a version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryQuery {
	pub version: String,
}

/// One entry of a version's history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
	pub id: u64,
	pub version_tag: String,
	pub author: String,
	pub timestamp: DateTime<Utc>,
	pub floors: Vec<Floor>,
}

/// Error body returned by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	/// Machine readable error kind (e.g. `validation`, `storage_failure`)
	pub kind: String,
}

/// Explicit `null` means the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_room_wire_names() {
		let room = Room::with_id("FL-1-RM-1", "Alpha", 4);
		let json = serde_json::to_value(&room).unwrap();

		assert_eq!(json["roomId"], "FL-1-RM-1");
		assert_eq!(json["name"], "Alpha");
		assert_eq!(json["capacity"], 4);
		assert_eq!(json["isAvailable"], true);
		assert_eq!(json["bookingWeightage"], 0);
	}

	#[test]
	fn test_room_input_without_state_fields() {
		let room: Room = serde_json::from_str(r#"{"name":"Beta","capacity":10}"#).unwrap();

		assert!(room.room_id.is_empty());
		assert_eq!(room.capacity, 10);
		assert!(!room.available);
		assert_eq!(room.booking_weight, 0);
	}

	#[test]
	fn test_room_input_with_null_fields() {
		let room: Room = serde_json::from_str(
			r#"{"roomId":null,"name":"Alpha","capacity":4,"isAvailable":null,"bookingWeightage":null}"#,
		)
		.unwrap();

		assert!(room.room_id.is_empty());
		assert_eq!(room.name, "Alpha");
		assert!(!room.available);
		assert_eq!(room.booking_weight, 0);

		let floor: Floor = serde_json::from_str(r#"{"floorNumber":1,"rooms":null}"#).unwrap();
		assert!(floor.rooms.is_empty());
	}

	#[test]
	fn test_publish_request_with_null_room_fields() {
		let body = r#"{
			"username": "admin",
			"version": "v1",
			"floorDTOs": [{"floorNumber": 1, "rooms": [
				{"roomId": null, "name": "Alpha", "capacity": 4, "isAvailable": null, "bookingWeightage": 0}
			]}]
		}"#;
		let request: PublishRequest = serde_json::from_str(body).unwrap();

		assert!(request.floors[0].rooms[0].room_id.is_empty());
	}

	#[test]
	fn test_publish_request_uses_floor_dtos_field() {
		let body = r#"{
			"username": "admin",
			"version": "v1",
			"floorDTOs": [{"floorNumber": 2, "rooms": [{"name": "Gamma", "capacity": 6}]}]
		}"#;
		let request: PublishRequest = serde_json::from_str(body).unwrap();

		assert_eq!(request.floors.len(), 1);
		assert_eq!(request.floors[0].floor_number, 2);
		assert_eq!(request.floors[0].rooms[0].name, "Gamma");
	}

	#[test]
	fn test_recommend_query_optional_room() {
		let query: RecommendQuery =
			serde_json::from_str(r#"{"versionTag":"v1","participants":3}"#).unwrap();
		assert_eq!(query.last_room_name, None);

		let json = serde_json::to_value(&query).unwrap();
		assert!(json.get("lastRoomName").is_none());
	}

	#[test]
	fn test_booking_status_serialization() {
		let json = serde_json::to_string(&BookingStatus::CapacityExceeded).unwrap();
		assert_eq!(json, "\"capacity_exceeded\"");
	}
}
