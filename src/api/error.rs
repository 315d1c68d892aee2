/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Shown when the backend gives no message of its own.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";

/// Everything a call to the backend can fail with. Callers match on this
/// instead of digging through response bodies.
#[derive(Debug, Error)]
pub enum ApiError {
	/// The request never got a response
	#[error("HTTP request failed: {0}")]
	Transport(#[from] reqwest::Error),

	/// Missing or rejected credentials
	#[error("Authentication required")]
	Unauthorized,

	/// The resource already exists. `code` is the backend's machine
	/// readable reason, e.g. a duplicate phone number.
	#[error("Conflict: {}", .message.as_deref().unwrap_or("resource already exists"))]
	Conflict {
		code: Option<String>,
		message: Option<String>,
	},

	/// Any other non-2xx response
	#[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
	Status {
		status: StatusCode,
		message: Option<String>,
	},

	/// A 2xx response whose body was not what we expected
	#[error("Invalid response: {0}")]
	Decode(#[from] serde_json::Error),

	/// The call needs a tenant or client id that was not configured
	#[error("No {0} configured; set it in config or log in again")]
	MissingScope(&'static str),

	#[error("{0}")]
	Io(#[from] std::io::Error),
}

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Shape of the JSON error bodies the backend sends.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
	pub message: Option<String>,
	pub code: Option<String>,
}

impl ApiError {
	/// Builds the error for a non-2xx response from its status and raw
	/// body.
	pub fn from_response(status: StatusCode, body: &str) -> ApiError {
		let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
		let message = parsed.message.filter(|m| !m.trim().is_empty());

		match status {
			StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
			StatusCode::CONFLICT => ApiError::Conflict {
				code: parsed.code,
				message,
			},
			_ => ApiError::Status { status, message },
		}
	}

	/// The message to put in front of a user: whatever the backend said,
	/// or a generic line when it said nothing useful.
	pub fn user_message(&self) -> String {
		match self {
			ApiError::Conflict {
				message: Some(m), ..
			}
			| ApiError::Status {
				message: Some(m), ..
			} => m.clone(),
			ApiError::Unauthorized => "Your session has expired, please log in again".to_string(),
			ApiError::MissingScope(_) => self.to_string(),
			_ => GENERIC_FAILURE.to_string(),
		}
	}

	pub fn is_conflict(&self) -> bool {
		matches!(self, ApiError::Conflict { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_conflict_keeps_code() {
		let err = ApiError::from_response(
			StatusCode::CONFLICT,
			r#"{"message":"Phone already registered","code":"CUSTOMER_PHONE_EXISTS"}"#,
		);
		match &err {
			ApiError::Conflict { code, message } => {
				assert_eq!(code.as_deref(), Some("CUSTOMER_PHONE_EXISTS"));
				assert_eq!(message.as_deref(), Some("Phone already registered"));
			},
			other => panic!("expected conflict, got {:?}", other),
		}
		assert!(err.is_conflict());
		assert_eq!(err.user_message(), "Phone already registered");
	}

	#[test]
	fn test_non_json_body_falls_back_to_generic() {
		let err = ApiError::from_response(
			StatusCode::INTERNAL_SERVER_ERROR,
			"<html>Bad Gateway</html>",
		);
		assert!(matches!(
			err,
			ApiError::Status {
				message: None,
				..
			}
		));
		assert_eq!(err.user_message(), GENERIC_FAILURE);
	}

	#[test]
	fn test_unauthorized() {
		let err = ApiError::from_response(StatusCode::UNAUTHORIZED, "{}");
		assert!(matches!(err, ApiError::Unauthorized));
	}

	#[test]
	fn test_blank_message_is_ignored() {
		let err = ApiError::from_response(
			StatusCode::BAD_REQUEST,
			r#"{"message":"  "}"#,
		);
		assert_eq!(err.user_message(), GENERIC_FAILURE);
		assert_eq!(
			err.to_string(),
			format!("Request failed with status 400 Bad Request: {}", GENERIC_FAILURE)
		);
	}
}
