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

use actix_web::web;

use crate::handlers;

/// Configure API routes for the gateway
///
/// - `/api/floorplan` - floor plan publishing, recommendation and booking
/// - `/health` - Health check endpoint
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.service(
		web::scope("/api/floorplan")
			.route("", web::get().to(handlers::latest_floor_plan))
			.route("/update", web::post().to(handlers::publish_floor_plan))
			.route("/recommend-rooms", web::get().to(handlers::recommend_rooms))
			.route("/book-room", web::post().to(handlers::book_room))
			.route("/history", web::get().to(handlers::history)),
	)
	.route("/health", web::get().to(handlers::health));
}
