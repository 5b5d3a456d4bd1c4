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

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::{
	BookingRequest, BookingResponse, ErrorResponse, Floor, FloorPlanQuery, HistoryEntryView,
	HistoryQuery, PublishRequest, PublishResponse, RecommendQuery, Room,
};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Server error ({status}): {message}")]
	Server { status: u16, message: String },
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
}

/// Client for the floor plan gateway
///
/// This is an async client interface using reqwest for HTTP communication.
pub struct Client {
	base_url: String,
	client: ReqwestClient,
}

impl Client {
	/// Create a new client with the given base URL
	pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
		Self::with_config(base_url, DEFAULT_TIMEOUT)
	}

	/// Create a new client with a custom request timeout
	pub fn with_config(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

		Ok(Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			client,
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}/api/floorplan{}", self.base_url, path)
	}

	/// Fetch the latest layout of a version
	///
	/// Returns `None` when the version tag is unknown.
	pub async fn latest_floor_plan(
		&self,
		username: &str,
		version: &str,
	) -> Result<Option<Vec<Floor>>, ClientError> {
		let query = FloorPlanQuery {
			username: username.to_string(),
			version: version.to_string(),
		};

		let response = self
			.client
			.get(self.url(""))
			.query(&query)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		parse_json(response).await
	}

	/// Publish a new layout version (admin only)
	pub async fn publish(&self, request: &PublishRequest) -> Result<PublishResponse, ClientError> {
		let response = self
			.client
			.post(self.url("/update"))
			.json(request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		parse_json(response).await
	}

	/// Rank available rooms for a meeting
	pub async fn recommend_rooms(&self, query: &RecommendQuery) -> Result<Vec<Room>, ClientError> {
		let response = self
			.client
			.get(self.url("/recommend-rooms"))
			.query(query)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		parse_json(response).await
	}

	/// Book a room by display name
	///
	/// Business rejections (not found, conflict, capacity) come back as
	/// `Ok` with the matching [`crate::BookingStatus`].
	pub async fn book_room(&self, request: &BookingRequest) -> Result<BookingResponse, ClientError> {
		let response = self
			.client
			.post(self.url("/book-room"))
			.json(request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| ClientError::InvalidResponse(format!("Failed to read body: {}", e)))?;

		let business_status = matches!(
			status,
			StatusCode::OK | StatusCode::NOT_FOUND | StatusCode::CONFLICT | StatusCode::BAD_REQUEST
		);
		if business_status && let Ok(booking) = serde_json::from_str::<BookingResponse>(&body) {
			return Ok(booking);
		}

		Err(server_error(status, &body))
	}

	/// Fetch every history entry of a version, newest first
	pub async fn history(&self, version: &str) -> Result<Vec<HistoryEntryView>, ClientError> {
		let query = HistoryQuery {
			version: version.to_string(),
		};

		let response = self
			.client
			.get(self.url("/history"))
			.query(&query)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		parse_json(response).await
	}

	/// Check gateway health
	pub async fn health_check(&self) -> Result<bool, ClientError> {
		let url = format!("{}/health", self.base_url);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Ok(response.status().is_success())
	}
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
	let status = response.status();
	if !status.is_success() {
		let body = response
			.text()
			.await
			.unwrap_or_else(|_| format!("HTTP {}", status));
		return Err(server_error(status, &body));
	}

	response
		.json()
		.await
		.map_err(|e| ClientError::Serialization(format!("Failed to parse response: {}", e)))
}

fn server_error(status: StatusCode, body: &str) -> ClientError {
	let message = serde_json::from_str::<ErrorResponse>(body)
		.map(|e| format!("{} ({})", e.error, e.kind))
		.unwrap_or_else(|_| body.to_string());

	ClientError::Server {
		status: status.as_u16(),
		message,
	}
}

/// Synchronous client wrapper
///
/// Wraps the async client and drives each call to completion on its own
/// tokio runtime. Suited to one-shot callers such as the command line client.
pub struct SyncClient {
	client: Client,
	runtime: tokio::runtime::Runtime,
}

impl SyncClient {
	/// Create a new synchronous client
	pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
		let runtime = tokio::runtime::Runtime::new()
			.map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
		Ok(Self {
			client: Client::new(base_url)?,
			runtime,
		})
	}

	pub fn latest_floor_plan(
		&self,
		username: &str,
		version: &str,
	) -> Result<Option<Vec<Floor>>, ClientError> {
		self.runtime
			.block_on(self.client.latest_floor_plan(username, version))
	}

	pub fn publish(&self, request: &PublishRequest) -> Result<PublishResponse, ClientError> {
		self.runtime.block_on(self.client.publish(request))
	}

	pub fn recommend_rooms(&self, query: &RecommendQuery) -> Result<Vec<Room>, ClientError> {
		self.runtime.block_on(self.client.recommend_rooms(query))
	}

	pub fn book_room(&self, request: &BookingRequest) -> Result<BookingResponse, ClientError> {
		self.runtime.block_on(self.client.book_room(request))
	}

	pub fn history(&self, version: &str) -> Result<Vec<HistoryEntryView>, ClientError> {
		self.runtime.block_on(self.client.history(version))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_client_creation() {
		let client = Client::new("http://localhost:8080/").unwrap();
		assert_eq!(client.base_url, "http://localhost:8080");
		assert_eq!(
			client.url("/book-room"),
			"http://localhost:8080/api/floorplan/book-room"
		);
	}

	#[test]
	fn test_sync_client_creation() {
		let client = SyncClient::new("http://localhost:8080");
		assert!(client.is_ok());
	}

	#[test]
	fn test_server_error_prefers_error_body() {
		let err = server_error(
			StatusCode::FORBIDDEN,
			r#"{"error":"Only admin user can save a new floor plan","kind":"forbidden"}"#,
		);
		match err {
			ClientError::Server { status, message } => {
				assert_eq!(status, 403);
				assert!(message.contains("forbidden"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}
}
