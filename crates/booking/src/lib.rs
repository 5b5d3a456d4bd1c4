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

//! Floorplan Booking Engine
//!
//! This crate keeps the versioned history of a building's floor plan and
//! implements room recommendation and booking on top of it.
//!
//! Architecture:
//! - Append-only history log keyed by version tag (memory or JSON-lines file)
//! - Snapshots stored through a checksummed, schema-versioned codec
//! - Bookings derive a new snapshot from the latest one and append it
//!   conditionally on the head they read (optimistic concurrency)
//! - Collaborators are injected; there is no process-wide state

pub mod codec;
pub mod config;
pub mod engine;
pub mod history;
pub mod ids;
pub mod types;

pub use codec::{CodecError, JsonSnapshotCodec, SnapshotCodec};
pub use config::BookingConfig;
pub use engine::{BookingEngine, EngineConfig, EngineError, ValidationError, rank_rooms};
pub use history::{
	AppendOutcome, FileHistoryStore, HistoryRecord, HistoryStore, MemoryHistoryStore,
	PendingRecord, StoreError,
};
pub use ids::{RoomIdGenerator, SequentialRoomIdGenerator, UuidRoomIdGenerator};
pub use types::*;
