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

use std::{
	collections::HashMap,
	fs::{File, OpenOptions},
	io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write},
	path::{Path, PathBuf},
	sync::{Mutex, MutexGuard},
};

use tracing::{error, info, warn};

use super::{AppendOutcome, HistoryRecord, HistoryStore, PendingRecord, StoreError};
use crate::types::EntryId;

/// History store backed by an append-only JSON-lines file
///
/// Each line holds one [`HistoryRecord`]. Opening the file scans it once to
/// build a per-tag index of record positions; records are read back from
/// the file on demand. Every append is written and synced before its id is
/// returned.
///
/// A final line without its newline is a write torn by a crash. It is
/// discarded on open. An append that fails part way is truncated away
/// again; if that truncation fails too, the store refuses further appends.
pub struct FileHistoryStore {
	path: PathBuf,
	state: Mutex<FileState>,
}

/// Storage operations the store needs from its log file
trait LogFile: Read + Write + Seek + Send {
	fn sync_data(&self) -> io::Result<()>;
	fn set_len(&self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
	fn sync_data(&self) -> io::Result<()> {
		File::sync_data(self)
	}

	fn set_len(&self, len: u64) -> io::Result<()> {
		File::set_len(self, len)
	}
}

/// Where one record lives in the log
#[derive(Debug, Clone, Copy)]
struct RecordSlot {
	id: EntryId,
	offset: u64,
	/// Length without the trailing newline
	len: usize,
	line: usize,
}

struct FileState {
	file: Box<dyn LogFile>,
	tags: HashMap<String, Vec<RecordSlot>>,
	next_id: EntryId,
	/// Length of the log up to the last complete record
	len: u64,
	next_line: usize,
	failed: bool,
}

impl FileHistoryStore {
	/// Open or create a history log at the given path
	pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
		let path = path.as_ref().to_path_buf();
		if let Some(parent) = path.parent()
			&& !parent.as_os_str().is_empty()
		{
			std::fs::create_dir_all(parent)?;
		}

		let file = OpenOptions::new()
			.read(true)
			.append(true)
			.create(true)
			.open(&path)?;

		let state = FileState::scan(Box::new(file), &path)?;

		info!(
			target: "history",
			"Opened history log {} ({} records, {} tags)",
			path.display(),
			state.record_count(),
			state.tags.len()
		);

		Ok(Self {
			path,
			state: Mutex::new(state),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn lock(&self) -> Result<MutexGuard<'_, FileState>, StoreError> {
		self.state.lock().map_err(|_| StoreError::LockPoisoned)
	}
}

impl FileState {
	fn empty(file: Box<dyn LogFile>) -> Self {
		Self {
			file,
			tags: HashMap::new(),
			next_id: 1,
			len: 0,
			next_line: 1,
			failed: false,
		}
	}

	/// Rebuild the index from the log, dropping a torn final line
	fn scan(file: Box<dyn LogFile>, path: &Path) -> Result<Self, StoreError> {
		let mut state = Self::empty(file);
		state.file.seek(SeekFrom::Start(0))?;

		let mut torn = None;
		{
			let mut reader = BufReader::new(&mut state.file);
			let mut buf = Vec::new();
			loop {
				buf.clear();
				let read = reader.read_until(b'\n', &mut buf)?;
				if read == 0 {
					break;
				}

				let line = state.next_line;
				if buf.last() != Some(&b'\n') {
					torn = Some((line, read));
					break;
				}

				let offset = state.len;
				state.len += read as u64;
				state.next_line += 1;

				let content = &buf[..read - 1];
				if content.iter().all(u8::is_ascii_whitespace) {
					continue;
				}

				let record: HistoryRecord =
					serde_json::from_slice(content).map_err(|e| StoreError::Corrupted {
						line,
						reason: e.to_string(),
					})?;

				if record.id < state.next_id {
					return Err(StoreError::Corrupted {
						line,
						reason: format!(
							"record id {} is not greater than previous id {}",
							record.id,
							state.next_id - 1
						),
					});
				}

				state.next_id = record.id + 1;
				state.tags.entry(record.version_tag).or_default().push(RecordSlot {
					id: record.id,
					offset,
					len: content.len(),
					line,
				});
			}
		}

		if let Some((line, bytes)) = torn {
			warn!(
				target: "history",
				"Discarding torn write at line {} of {} ({} bytes)",
				line,
				path.display(),
				bytes
			);
			state.file.set_len(state.len)?;
			state.file.sync_data()?;
		}

		Ok(state)
	}

	fn record_count(&self) -> usize {
		self.tags.values().map(Vec::len).sum()
	}

	fn head(&self, tag: &str) -> Option<EntryId> {
		self.tags
			.get(tag)
			.and_then(|slots| slots.last())
			.map(|slot| slot.id)
	}

	fn read(&mut self, slot: RecordSlot) -> Result<HistoryRecord, StoreError> {
		let mut buf = vec![0; slot.len];
		self.file.seek(SeekFrom::Start(slot.offset))?;
		self.file.read_exact(&mut buf)?;

		let record: HistoryRecord =
			serde_json::from_slice(&buf).map_err(|e| StoreError::Corrupted {
				line: slot.line,
				reason: e.to_string(),
			})?;

		if record.id != slot.id {
			return Err(StoreError::Corrupted {
				line: slot.line,
				reason: format!("expected record id {}, found {}", slot.id, record.id),
			});
		}

		Ok(record)
	}

	fn write(&mut self, record: PendingRecord) -> Result<EntryId, StoreError> {
		if self.failed {
			return Err(StoreError::Unrecoverable);
		}

		let id = self.next_id;
		let record = record.into_record(id);

		let mut line =
			serde_json::to_vec(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
		line.push(b'\n');

		if let Err(err) = self.persist(&line) {
			self.roll_back();
			return Err(err.into());
		}

		let slot = RecordSlot {
			id,
			offset: self.len,
			len: line.len() - 1,
			line: self.next_line,
		};
		self.len += line.len() as u64;
		self.next_line += 1;
		self.next_id += 1;
		self.tags.entry(record.version_tag).or_default().push(slot);

		Ok(id)
	}

	fn persist(&mut self, bytes: &[u8]) -> io::Result<()> {
		self.file.write_all(bytes)?;
		self.file.flush()?;
		self.file.sync_data()
	}

	/// Cut the log back to the last complete record
	fn roll_back(&mut self) {
		match self
			.file
			.set_len(self.len)
			.and_then(|()| self.file.sync_data())
		{
			Ok(()) => {
				warn!(
					target: "history",
					"Append failed; history log truncated back to {} bytes",
					self.len
				);
			}
			Err(e) => {
				error!(
					target: "history",
					"Append failed and the history log could not be truncated: {}",
					e
				);
				self.failed = true;
			}
		}
	}
}

impl HistoryStore for FileHistoryStore {
	fn append(&self, record: PendingRecord) -> Result<EntryId, StoreError> {
		self.lock()?.write(record)
	}

	fn append_if_head(
		&self,
		record: PendingRecord,
		expected_head: Option<EntryId>,
	) -> Result<AppendOutcome, StoreError> {
		let mut state = self.lock()?;

		let current = state.head(&record.version_tag);
		if current != expected_head {
			return Ok(AppendOutcome::HeadMoved { current });
		}

		state.write(record).map(AppendOutcome::Appended)
	}

	fn latest_by_tag(&self, tag: &str) -> Result<Option<HistoryRecord>, StoreError> {
		let mut state = self.lock()?;
		let Some(slot) = state.tags.get(tag).and_then(|slots| slots.last()).copied() else {
			return Ok(None);
		};
		state.read(slot).map(Some)
	}

	fn all_by_tag(&self, tag: &str) -> Result<Vec<HistoryRecord>, StoreError> {
		let mut state = self.lock()?;
		let slots: Vec<RecordSlot> = state
			.tags
			.get(tag)
			.map(|slots| slots.iter().rev().copied().collect())
			.unwrap_or_default();

		slots.into_iter().map(|slot| state.read(slot)).collect()
	}

	fn head(&self, tag: &str) -> Result<Option<EntryId>, StoreError> {
		Ok(self.lock()?.head(tag))
	}
}
