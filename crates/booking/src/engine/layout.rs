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

use std::collections::HashSet;

use floorplan_sdk::types::{Floor, Room};

use crate::{ids::RoomIdGenerator, types::Snapshot};

/// How many times a generator may collide with existing identifiers before
/// a publish is abandoned
pub const MAX_ID_DRAWS: u32 = 16;

/// Why a layout could not be prepared for publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
	DuplicateRoomId(String),
	IdentifierExhausted { floor_number: i32 },
}

/// Normalize a layout for publication
///
/// Assigns identifiers to rooms that lack one and resets every room to
/// available with zero booking weight. Returns every room identifier in
/// enumeration order.
pub(crate) fn prepare_layout(
	floors: &mut [Floor],
	ids: &dyn RoomIdGenerator,
) -> Result<Vec<String>, LayoutError> {
	let mut seen = HashSet::new();
	for room in floors.iter().flat_map(|floor| floor.rooms.iter()) {
		if !room.room_id.is_empty() && !seen.insert(room.room_id.clone()) {
			return Err(LayoutError::DuplicateRoomId(room.room_id.clone()));
		}
	}

	let mut room_ids = Vec::new();
	for floor in floors.iter_mut() {
		let floor_number = floor.floor_number;
		for room in floor.rooms.iter_mut() {
			if room.room_id.is_empty() {
				room.room_id = draw_unique_id(ids, floor_number, &mut seen)?;
			}
			room.available = true;
			room.booking_weight = 0;
			room_ids.push(room.room_id.clone());
		}
	}

	Ok(room_ids)
}

fn draw_unique_id(
	ids: &dyn RoomIdGenerator,
	floor_number: i32,
	seen: &mut HashSet<String>,
) -> Result<String, LayoutError> {
	for _ in 0..MAX_ID_DRAWS {
		let candidate = ids.generate(floor_number);
		if !candidate.is_empty() && seen.insert(candidate.clone()) {
			return Ok(candidate);
		}
	}
	Err(LayoutError::IdentifierExhausted { floor_number })
}

/// Rank the rooms of a snapshot for a meeting
///
/// Only available rooms that fit every participant are returned. The room
/// whose identifier equals `preferred_id` sorts first; the rest follow by
/// booking weight, most booked first. The sort is stable, so ties keep
/// floor/room order.
pub fn rank_rooms(snapshot: &Snapshot, participants: u32, preferred_id: Option<&str>) -> Vec<Room> {
	let mut eligible: Vec<Room> = snapshot
		.rooms()
		.filter(|room| room.available && room.capacity >= participants)
		.cloned()
		.collect();

	eligible.sort_by(|a, b| {
		preference_rank(a, preferred_id)
			.cmp(&preference_rank(b, preferred_id))
			.then_with(|| b.booking_weight.cmp(&a.booking_weight))
	});

	eligible
}

fn preference_rank(room: &Room, preferred_id: Option<&str>) -> u8 {
	match preferred_id {
		Some(id) if id == room.room_id => 0,
		_ => 1,
	}
}
