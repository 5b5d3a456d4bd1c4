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

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use floorplan_booking::{BookingEngine, EngineConfig, MemoryHistoryStore};
use floorplan_sdk::types::{Floor, Room};

const ROOMS_PER_FLOOR: usize = 32;
const FLOOR_COUNTS: &[usize] = &[1, 8, 32];
const BOOKER_COUNTS: &[usize] = &[1, 2, 4, 8];
const BOOKINGS_PER_THREAD: usize = 64;

fn layout(floor_count: usize) -> Vec<Floor> {
	(0..floor_count)
		.map(|f| {
			let rooms = (0..ROOMS_PER_FLOOR)
				.map(|r| Room::new(format!("F{f}-R{r}"), 2 + (r % 12) as u32))
				.collect();
			Floor::new(f as i32 + 1, rooms)
		})
		.collect()
}

fn engine(max_booking_attempts: u32) -> BookingEngine {
	BookingEngine::new(
		EngineConfig {
			max_booking_attempts,
			verbose_logging: false,
		},
		Arc::new(MemoryHistoryStore::new()),
	)
}

fn bench_recommend(c: &mut Criterion) {
	let mut group = c.benchmark_group("recommend_rooms");

	for &floors in FLOOR_COUNTS {
		let engine = engine(3);
		engine.publish("bench", "v1", layout(floors)).unwrap();

		group.bench_with_input(
			BenchmarkId::from_parameter(format!("{}rooms", floors * ROOMS_PER_FLOOR)),
			&engine,
			|b, engine| b.iter(|| engine.recommend_rooms("v1", 6, Some("missing")).unwrap()),
		);
	}

	group.finish();
}

fn bench_publish(c: &mut Criterion) {
	let mut group = c.benchmark_group("publish");
	let engine = engine(3);

	for &floors in FLOOR_COUNTS {
		let floors_layout = layout(floors);
		group.bench_with_input(
			BenchmarkId::from_parameter(format!("{}rooms", floors * ROOMS_PER_FLOOR)),
			&floors_layout,
			|b, floors_layout| {
				b.iter(|| engine.publish("bench", "v1", floors_layout.clone()).unwrap())
			},
		);
	}

	group.finish();
}

fn bench_contended_booking(c: &mut Criterion) {
	let mut group = c.benchmark_group("book_room");
	group.sample_size(10);

	for &bookers in BOOKER_COUNTS {
		group.bench_with_input(
			BenchmarkId::from_parameter(format!("{}t", bookers)),
			&bookers,
			|b, &bookers| {
				b.iter_custom(|iters| {
					let mut total_duration = Duration::ZERO;

					for _ in 0..iters {
						total_duration += run_bookings(bookers);
					}

					total_duration
				});
			},
		);
	}

	group.finish();
}

/// Every thread books its own rooms of one shared version tag
fn run_bookings(bookers: usize) -> Duration {
	let rooms_needed = bookers * BOOKINGS_PER_THREAD;
	let floors = rooms_needed.div_ceil(ROOMS_PER_FLOOR);

	let engine = Arc::new(engine(rooms_needed as u32));
	engine.publish("bench", "v1", layout(floors)).unwrap();

	let barrier = Arc::new(Barrier::new(bookers + 1));
	let handles: Vec<_> = (0..bookers)
		.map(|t| {
			let engine = Arc::clone(&engine);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				for i in 0..BOOKINGS_PER_THREAD {
					let slot = t * BOOKINGS_PER_THREAD + i;
					let name = format!("F{}-R{}", slot / ROOMS_PER_FLOOR, slot % ROOMS_PER_FLOOR);
					let outcome = engine.book_room(&name, 1, "v1").unwrap();
					assert!(outcome.is_booked());
				}
			})
		})
		.collect();

	barrier.wait();
	let start = Instant::now();
	for handle in handles {
		handle.join().unwrap();
	}
	start.elapsed()
}

criterion_group!(benches, bench_recommend, bench_publish, bench_contended_booking);
criterion_main!(benches);
