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

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Produces identifiers for rooms published without one
///
/// Implementations only need to be unique for practical purposes. The
/// engine re-draws when a generated value collides with an identifier
/// already present in the same publish batch.
pub trait RoomIdGenerator: Send + Sync {
	fn generate(&self, floor_number: i32) -> String;
}

/// Random identifiers of the form `FL-<floor>-RM-<uuid>`
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRoomIdGenerator;

impl RoomIdGenerator for UuidRoomIdGenerator {
	fn generate(&self, floor_number: i32) -> String {
		format!("FL-{}-RM-{}", floor_number, Uuid::new_v4().simple())
	}
}

/// Deterministic identifiers of the form `FL-<floor>-RM-<n>`
///
/// The counter is shared by all floors, so identifiers never repeat within
/// one generator instance.
#[derive(Debug)]
pub struct SequentialRoomIdGenerator {
	next: AtomicU64,
}

impl SequentialRoomIdGenerator {
	pub fn new() -> Self {
		Self::starting_at(1)
	}

	pub fn starting_at(first: u64) -> Self {
		Self {
			next: AtomicU64::new(first),
		}
	}
}

impl Default for SequentialRoomIdGenerator {
	fn default() -> Self {
		Self::new()
	}
}

impl RoomIdGenerator for SequentialRoomIdGenerator {
	fn generate(&self, floor_number: i32) -> String {
		let n = self.next.fetch_add(1, Ordering::Relaxed);
		format!("FL-{}-RM-{}", floor_number, n)
	}
}
