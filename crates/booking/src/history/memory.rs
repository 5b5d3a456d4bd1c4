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

use dashmap::DashMap;

use super::{AppendOutcome, HistoryRecord, HistoryStore, PendingRecord, StoreError};
use crate::types::EntryId;

/// In-process history store
///
/// Records are kept per tag in ascending id order. Ids come from one
/// counter shared by all tags and are drawn while the tag's shard is
/// write-locked, so per-tag order always matches id order.
pub struct MemoryHistoryStore {
	tags: DashMap<String, Vec<HistoryRecord>>,
	next_id: AtomicU64,
}

impl MemoryHistoryStore {
	pub fn new() -> Self {
		Self {
			tags: DashMap::new(),
			next_id: AtomicU64::new(1),
		}
	}

	/// Total number of records across all tags
	pub fn record_count(&self) -> usize {
		self.tags.iter().map(|entry| entry.value().len()).sum()
	}
}

impl Default for MemoryHistoryStore {
	fn default() -> Self {
		Self::new()
	}
}

impl HistoryStore for MemoryHistoryStore {
	fn append(&self, record: PendingRecord) -> Result<EntryId, StoreError> {
		let mut records = self.tags.entry(record.version_tag.clone()).or_default();
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		records.push(record.into_record(id));
		Ok(id)
	}

	fn append_if_head(
		&self,
		record: PendingRecord,
		expected_head: Option<EntryId>,
	) -> Result<AppendOutcome, StoreError> {
		let mut records = self.tags.entry(record.version_tag.clone()).or_default();

		let current = records.last().map(|r| r.id);
		if current != expected_head {
			return Ok(AppendOutcome::HeadMoved { current });
		}

		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		records.push(record.into_record(id));
		Ok(AppendOutcome::Appended(id))
	}

	fn latest_by_tag(&self, tag: &str) -> Result<Option<HistoryRecord>, StoreError> {
		Ok(self
			.tags
			.get(tag)
			.and_then(|records| records.last().cloned()))
	}

	fn all_by_tag(&self, tag: &str) -> Result<Vec<HistoryRecord>, StoreError> {
		Ok(self
			.tags
			.get(tag)
			.map(|records| records.iter().rev().cloned().collect())
			.unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use std::{sync::Arc, thread};

	use super::*;
	use crate::history::pending;

	#[test]
	fn test_append_and_latest() {
		let store = MemoryHistoryStore::new();

		let first = store.append(pending("v1", "a")).unwrap();
		let second = store.append(pending("v1", "b")).unwrap();
		assert!(second > first);

		let latest = store.latest_by_tag("v1").unwrap().unwrap();
		assert_eq!(latest.id, second);
		assert_eq!(latest.encoded_snapshot, "b");
	}

	#[test]
	fn test_unknown_tag_is_empty() {
		let store = MemoryHistoryStore::new();
		store.append(pending("v1", "a")).unwrap();

		assert!(store.latest_by_tag("v2").unwrap().is_none());
		assert!(store.all_by_tag("v2").unwrap().is_empty());
		assert_eq!(store.head("v2").unwrap(), None);
	}

	#[test]
	fn test_all_by_tag_newest_first() {
		let store = MemoryHistoryStore::new();
		store.append(pending("v1", "a")).unwrap();
		store.append(pending("v2", "x")).unwrap();
		store.append(pending("v1", "b")).unwrap();
		store.append(pending("v1", "c")).unwrap();

		let payloads: Vec<_> = store
			.all_by_tag("v1")
			.unwrap()
			.into_iter()
			.map(|r| r.encoded_snapshot)
			.collect();
		assert_eq!(payloads, vec!["c", "b", "a"]);
		assert_eq!(store.record_count(), 4);
	}

	#[test]
	fn test_conditional_append() {
		let store = MemoryHistoryStore::new();

		let outcome = store.append_if_head(pending("v1", "a"), None).unwrap();
		let AppendOutcome::Appended(first) = outcome else {
			panic!("expected append on empty tag, got {outcome:?}");
		};

		// Stale expectation: tag is no longer empty
		let outcome = store.append_if_head(pending("v1", "b"), None).unwrap();
		assert_eq!(
			outcome,
			AppendOutcome::HeadMoved {
				current: Some(first)
			}
		);
		assert_eq!(store.all_by_tag("v1").unwrap().len(), 1);

		let outcome = store
			.append_if_head(pending("v1", "b"), Some(first))
			.unwrap();
		assert!(matches!(outcome, AppendOutcome::Appended(id) if id > first));
	}

	#[test]
	fn test_concurrent_conditional_appends_single_winner() {
		let store = Arc::new(MemoryHistoryStore::new());
		let head = store.append(pending("v1", "base")).unwrap();

		let handles: Vec<_> = (0..8)
			.map(|i| {
				let store = store.clone();
				thread::spawn(move || {
					store
						.append_if_head(pending("v1", &format!("w{}", i)), Some(head))
						.unwrap()
				})
			})
			.collect();

		let winners = handles
			.into_iter()
			.map(|h| h.join().unwrap())
			.filter(|outcome| matches!(outcome, AppendOutcome::Appended(_)))
			.count();

		assert_eq!(winners, 1);
		assert_eq!(store.all_by_tag("v1").unwrap().len(), 2);
	}
}
