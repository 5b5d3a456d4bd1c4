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

//! Caller identity check for administrative operations
//!
//! The gateway has a single privileged operation (publishing a layout) and a
//! single privileged user, configured by name. There is no authentication
//! beyond comparing the username the caller supplies.

use thiserror::Error;

/// Error types for authorization checks
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
	#[error("Missing username")]
	MissingUsername,
	#[error("User '{0}' is not allowed to publish floor plans")]
	NotAdmin(String),
}

/// Ensure `username` is the configured admin user
pub fn require_admin(username: &str, admin_username: &str) -> Result<(), AuthError> {
	if username.is_empty() {
		return Err(AuthError::MissingUsername);
	}
	if username != admin_username {
		return Err(AuthError::NotAdmin(username.to_string()));
	}
	Ok(())
}
