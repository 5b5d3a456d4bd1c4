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

//! Append-only history log keyed by version tag
//!
//! The history store is the only shared mutable resource of the booking
//! service. Records are only ever added; there is no update or delete.
//! Every appended record gets an id greater than any id handed out before
//! it, so "latest entry for a tag" is simply the highest id for that tag.

mod file;
mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::EntryId;
pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("History I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Failed to serialize history record: {0}")]
	Serialization(String),
	#[error("History log corrupted at line {line}: {reason}")]
	Corrupted { line: usize, reason: String },
	#[error("History store lock poisoned")]
	LockPoisoned,
	#[error("History log could not be restored after a failed append; reopen the store")]
	Unrecoverable,
}

/// Persisted shape of one history entry
///
/// `encoded_snapshot` is opaque to the store; it is produced and read back
/// by a [`crate::codec::SnapshotCodec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
	pub id: EntryId,
	pub version_tag: String,
	pub author: String,
	pub encoded_snapshot: String,
	pub timestamp: DateTime<Utc>,
}

/// A record waiting to be appended; the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
	pub version_tag: String,
	pub author: String,
	pub encoded_snapshot: String,
	pub timestamp: DateTime<Utc>,
}

impl PendingRecord {
	fn into_record(self, id: EntryId) -> HistoryRecord {
		HistoryRecord {
			id,
			version_tag: self.version_tag,
			author: self.author,
			encoded_snapshot: self.encoded_snapshot,
			timestamp: self.timestamp,
		}
	}
}

/// Result of a conditional append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
	/// The record was appended under the returned id
	Appended(EntryId),
	/// Another writer appended to the tag first; nothing was written
	HeadMoved { current: Option<EntryId> },
}

pub trait HistoryStore: Send + Sync {
	/// Append a record unconditionally
	///
	/// The insert is atomic; returns the id assigned to the record.
	fn append(&self, record: PendingRecord) -> Result<EntryId, StoreError>;

	/// Append a record only if the tag's latest entry is still `expected_head`
	///
	/// `None` means "the tag has no entries yet". The head check and the
	/// insert happen atomically with respect to other appends on the same tag.
	fn append_if_head(
		&self,
		record: PendingRecord,
		expected_head: Option<EntryId>,
	) -> Result<AppendOutcome, StoreError>;

	/// Most recent record for a tag
	fn latest_by_tag(&self, tag: &str) -> Result<Option<HistoryRecord>, StoreError>;

	/// All records for a tag, newest first
	fn all_by_tag(&self, tag: &str) -> Result<Vec<HistoryRecord>, StoreError>;

	/// Id of the most recent record for a tag
	fn head(&self, tag: &str) -> Result<Option<EntryId>, StoreError> {
		Ok(self.latest_by_tag(tag)?.map(|record| record.id))
	}
}

#[cfg(test)]
pub(crate) fn pending(tag: &str, payload: &str) -> PendingRecord {
	PendingRecord {
		version_tag: tag.to_string(),
		author: "admin".to_string(),
		encoded_snapshot: payload.to_string(),
		timestamp: Utc::now(),
	}
}
