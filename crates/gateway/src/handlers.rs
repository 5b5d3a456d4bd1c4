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

use actix_web::{HttpResponse, Responder, error::BlockingError, http::StatusCode, web};
use floorplan_booking::{BookingOutcome, EngineError, HistoryEntry, Missing};
use floorplan_sdk::types::{
	BookingRequest, BookingResponse, BookingStatus, ErrorResponse, FloorPlanQuery,
	HistoryEntryView, HistoryQuery, PublishRequest, PublishResponse, RecommendQuery,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
	auth::{self, AuthError},
	server::GatewayState,
};

/// Error types for gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("Authorization error: {0}")]
	Auth(#[from] AuthError),
	#[error(transparent)]
	Engine(#[from] EngineError),
	#[error("Engine task was cancelled")]
	Blocking(#[from] BlockingError),
}

impl GatewayError {
	/// Machine readable kind carried in the error body
	pub fn kind(&self) -> &'static str {
		match self {
			GatewayError::Auth(_) => "forbidden",
			GatewayError::Engine(e) => e.kind(),
			GatewayError::Blocking(_) => "internal",
		}
	}
}

impl actix_web::ResponseError for GatewayError {
	fn status_code(&self) -> StatusCode {
		match self {
			GatewayError::Auth(_) => StatusCode::FORBIDDEN,
			GatewayError::Engine(EngineError::Validation(_)) => StatusCode::BAD_REQUEST,
			GatewayError::Engine(_) | GatewayError::Blocking(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	fn error_response(&self) -> HttpResponse {
		let status = self.status_code();
		if status.is_server_error() {
			error!(target: "server", kind = self.kind(), "{}", self);
		}

		HttpResponse::build(status).json(ErrorResponse {
			error: self.to_string(),
			kind: self.kind().to_string(),
		})
	}
}

/// Health check endpoint
pub async fn health() -> impl Responder {
	HttpResponse::Ok().json(serde_json::json!({
		"status": "ok",
		"service": "floorplan-gateway"
	}))
}

/// Publish a new layout under a version tag (admin only)
pub async fn publish_floor_plan(
	state: web::Data<GatewayState>,
	request: web::Json<PublishRequest>,
) -> Result<HttpResponse, GatewayError> {
	let PublishRequest {
		username,
		version,
		floors,
	} = request.into_inner();

	auth::require_admin(&username, &state.admin_username)?;

	let engine = state.engine.clone();
	let tag = version.clone();
	let receipt = web::block(move || engine.publish(&username, &tag, floors)).await??;

	Ok(HttpResponse::Ok().json(PublishResponse {
		version,
		entry_id: receipt.entry_id,
		room_ids: receipt.room_ids,
	}))
}

/// Latest layout of a version, `null` when the version is unknown
pub async fn latest_floor_plan(
	state: web::Data<GatewayState>,
	query: web::Query<FloorPlanQuery>,
) -> Result<HttpResponse, GatewayError> {
	let FloorPlanQuery { username, version } = query.into_inner();
	debug!(target: "server", "Floor plan '{}' requested by '{}'", version, username);

	let engine = state.engine.clone();
	let floors = web::block(move || engine.latest_snapshot(&version)).await??;

	Ok(HttpResponse::Ok().json(floors))
}

/// Ranked rooms that can host a meeting
pub async fn recommend_rooms(
	state: web::Data<GatewayState>,
	query: web::Query<RecommendQuery>,
) -> Result<HttpResponse, GatewayError> {
	let RecommendQuery {
		version_tag,
		participants,
		last_room_name,
	} = query.into_inner();
	let preferred = last_room_name.filter(|name| !name.is_empty());

	let engine = state.engine.clone();
	let rooms = web::block(move || {
		engine.recommend_rooms(&version_tag, participants, preferred.as_deref())
	})
	.await??;

	Ok(HttpResponse::Ok().json(rooms))
}

/// Book a room by display name
///
/// Every booking outcome is answered with a [`BookingResponse`] body; the
/// status code tells the outcomes apart.
pub async fn book_room(
	state: web::Data<GatewayState>,
	request: web::Json<BookingRequest>,
) -> Result<HttpResponse, GatewayError> {
	let BookingRequest {
		room_name,
		participants,
		version,
	} = request.into_inner();

	let engine = state.engine.clone();
	let name = room_name.clone();
	let outcome = web::block(move || engine.book_room(&name, participants, &version)).await??;

	let (status, body) = booking_response(room_name, outcome);
	info!(target: "server", "Booking of '{}' answered with {:?}", body.room_name, body.status);

	Ok(HttpResponse::build(status).json(body))
}

/// Every entry of a version, newest first
pub async fn history(
	state: web::Data<GatewayState>,
	query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, GatewayError> {
	let HistoryQuery { version } = query.into_inner();

	let engine = state.engine.clone();
	let entries = web::block(move || engine.history(&version)).await??;

	let views: Vec<HistoryEntryView> = entries.into_iter().map(history_view).collect();
	Ok(HttpResponse::Ok().json(views))
}

fn booking_response(requested: String, outcome: BookingOutcome) -> (StatusCode, BookingResponse) {
	let message = outcome.message();

	match outcome {
		BookingOutcome::Booked {
			room_name,
			room_id,
			entry_id,
		} => (
			StatusCode::OK,
			BookingResponse {
				status: BookingStatus::Booked,
				room_name,
				message,
				room_id: Some(room_id),
				entry_id: Some(entry_id),
			},
		),
		BookingOutcome::NotFound(missing) => {
			let room_name = match missing {
				Missing::Room(name) => name,
				Missing::VersionTag(_) => requested,
			};
			(
				StatusCode::NOT_FOUND,
				rejected(BookingStatus::NotFound, room_name, message),
			)
		}
		BookingOutcome::Conflict { room_name, .. } => (
			StatusCode::CONFLICT,
			rejected(BookingStatus::Conflict, room_name, message),
		),
		BookingOutcome::CapacityExceeded { room_name, .. } => (
			StatusCode::BAD_REQUEST,
			rejected(BookingStatus::CapacityExceeded, room_name, message),
		),
	}
}

fn rejected(status: BookingStatus, room_name: String, message: String) -> BookingResponse {
	BookingResponse {
		status,
		room_name,
		message,
		room_id: None,
		entry_id: None,
	}
}

fn history_view(entry: HistoryEntry) -> HistoryEntryView {
	HistoryEntryView {
		id: entry.id,
		version_tag: entry.snapshot.version_tag,
		author: entry.snapshot.author,
		timestamp: entry.snapshot.created_at,
		floors: entry.snapshot.floors,
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use actix_web::{App, test};
	use floorplan_booking::{
		BookingEngine, EngineConfig, HistoryStore, MemoryHistoryStore, PendingRecord,
	};
	use floorplan_sdk::types::{Floor, Room};
	use serde_json::{Value, json};

	use super::*;
	use crate::routes::configure_routes;

	fn test_state() -> (web::Data<GatewayState>, Arc<MemoryHistoryStore>) {
		let store = Arc::new(MemoryHistoryStore::new());
		let engine = BookingEngine::new(EngineConfig::default(), store.clone());
		let state = GatewayState {
			engine: Arc::new(engine),
			admin_username: "admin".to_string(),
		};
		(web::Data::new(state), store)
	}

	fn publish_body(username: &str, version: &str) -> Value {
		json!({
			"username": username,
			"version": version,
			"floorDTOs": [
				{ "floorNumber": 1, "rooms": [
					{ "name": "Alpha", "capacity": 4 },
					{ "name": "Beta", "capacity": 10, "isAvailable": false, "bookingWeightage": 7 }
				]}
			]
		})
	}

	macro_rules! test_app {
		($state:expr) => {
			test::init_service(App::new().app_data($state.clone()).configure(configure_routes)).await
		};
	}

	#[actix_web::test]
	async fn test_health() {
		let (state, _) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::get().uri("/health").to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["status"], "ok");
	}

	#[actix_web::test]
	async fn test_publish_and_read_latest() {
		let (state, _) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::post()
			.uri("/api/floorplan/update")
			.set_json(publish_body("admin", "v1"))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		let body: PublishResponse = test::read_body_json(resp).await;
		assert_eq!(body.version, "v1");
		assert_eq!(body.room_ids.len(), 2);

		let req = test::TestRequest::get()
			.uri("/api/floorplan?username=alice&version=v1")
			.to_request();
		let floors: Vec<Floor> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(floors.len(), 1);
		let beta = &floors[0].rooms[1];
		assert_eq!(beta.room_id, body.room_ids[1]);
		assert!(beta.available);
		assert_eq!(beta.booking_weight, 0);
	}

	#[actix_web::test]
	async fn test_publish_with_null_room_fields_generates_ids() {
		let (state, _) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::post()
			.uri("/api/floorplan/update")
			.set_json(json!({
				"username": "admin",
				"version": "v1",
				"floorDTOs": [
					{ "floorNumber": 3, "rooms": [
						{ "roomId": null, "name": "Alpha", "capacity": 4,
						  "isAvailable": null, "bookingWeightage": null }
					]}
				]
			}))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		let body: PublishResponse = test::read_body_json(resp).await;
		assert_eq!(body.room_ids.len(), 1);
		assert!(body.room_ids[0].starts_with("FL-3-RM-"));
	}

	#[actix_web::test]
	async fn test_publish_requires_admin() {
		let (state, store) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::post()
			.uri("/api/floorplan/update")
			.set_json(publish_body("alice", "v1"))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::FORBIDDEN);
		let body: ErrorResponse = test::read_body_json(resp).await;
		assert_eq!(body.kind, "forbidden");
		assert_eq!(store.record_count(), 0);
	}

	#[actix_web::test]
	async fn test_publish_empty_version_is_bad_request() {
		let (state, _) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::post()
			.uri("/api/floorplan/update")
			.set_json(publish_body("admin", ""))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
		let body: ErrorResponse = test::read_body_json(resp).await;
		assert_eq!(body.kind, "validation");
	}

	#[actix_web::test]
	async fn test_unknown_version_reads_null() {
		let (state, _) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::get()
			.uri("/api/floorplan?username=admin&version=missing")
			.to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(body.as_ref(), b"null");
	}

	#[actix_web::test]
	async fn test_recommend_treats_empty_last_room_as_absent() {
		let (state, _) = test_state();
		state
			.engine
			.publish(
				"admin",
				"v1",
				vec![Floor::new(
					1,
					vec![Room::with_id("a", "Alpha", 4), Room::with_id("b", "Beta", 8)],
				)],
			)
			.unwrap();
		let app = test_app!(state);

		let req = test::TestRequest::get()
			.uri("/api/floorplan/recommend-rooms?versionTag=v1&participants=2&lastRoomName=")
			.to_request();
		let rooms: Vec<Room> = test::call_and_read_body_json(&app, req).await;
		let names: Vec<_> = rooms.iter().map(|r| r.name.as_str()).collect();
		assert_eq!(names, vec!["Alpha", "Beta"]);

		let req = test::TestRequest::get()
			.uri("/api/floorplan/recommend-rooms?versionTag=v1&participants=2&lastRoomName=b")
			.to_request();
		let rooms: Vec<Room> = test::call_and_read_body_json(&app, req).await;
		let names: Vec<_> = rooms.iter().map(|r| r.name.as_str()).collect();
		assert_eq!(names, vec!["Beta", "Alpha"]);
	}

	#[actix_web::test]
	async fn test_booking_status_codes() {
		let (state, _) = test_state();
		state
			.engine
			.publish("admin", "v1", vec![Floor::new(1, vec![Room::new("Alpha", 4)])])
			.unwrap();
		let app = test_app!(state);

		let book = |room: &str, participants: u32, version: &str| {
			test::TestRequest::post()
				.uri("/api/floorplan/book-room")
				.set_json(json!({
					"roomName": room,
					"participants": participants,
					"version": version,
				}))
				.to_request()
		};

		let resp = test::call_service(&app, book("Alpha", 8, "v1")).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
		let body: BookingResponse = test::read_body_json(resp).await;
		assert_eq!(body.status, BookingStatus::CapacityExceeded);

		let resp = test::call_service(&app, book("Alpha", 2, "v1")).await;
		assert_eq!(resp.status(), StatusCode::OK);
		let body: BookingResponse = test::read_body_json(resp).await;
		assert_eq!(body.status, BookingStatus::Booked);
		assert!(body.room_id.is_some());

		let resp = test::call_service(&app, book("Alpha", 2, "v1")).await;
		assert_eq!(resp.status(), StatusCode::CONFLICT);

		let resp = test::call_service(&app, book("Beta", 1, "v1")).await;
		assert_eq!(resp.status(), StatusCode::NOT_FOUND);

		let resp = test::call_service(&app, book("Alpha", 1, "v2")).await;
		assert_eq!(resp.status(), StatusCode::NOT_FOUND);
		let body: BookingResponse = test::read_body_json(resp).await;
		assert_eq!(body.room_name, "Alpha");
	}

	#[actix_web::test]
	async fn test_corrupted_history_is_server_error() {
		let (state, store) = test_state();
		store
			.append(PendingRecord {
				version_tag: "v1".to_string(),
				author: "admin".to_string(),
				encoded_snapshot: "not a snapshot".to_string(),
				timestamp: chrono::Utc::now(),
			})
			.unwrap();
		let app = test_app!(state);

		let req = test::TestRequest::get()
			.uri("/api/floorplan/recommend-rooms?versionTag=v1&participants=1")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
		let body: ErrorResponse = test::read_body_json(resp).await;
		assert_eq!(body.kind, "data_corruption");
	}

	#[actix_web::test]
	async fn test_history_newest_first() {
		let (state, _) = test_state();
		state
			.engine
			.publish("admin", "v1", vec![Floor::new(1, vec![Room::new("Alpha", 4)])])
			.unwrap();
		state.engine.book_room("Alpha", 1, "v1").unwrap();
		let app = test_app!(state);

		let req = test::TestRequest::get()
			.uri("/api/floorplan/history?version=v1")
			.to_request();
		let entries: Vec<HistoryEntryView> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(entries.len(), 2);
		assert!(entries[0].id > entries[1].id);
		assert_eq!(entries[0].version_tag, "v1");
		assert!(!entries[0].floors[0].rooms[0].available);
	}
}
