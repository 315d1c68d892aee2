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
use crate::api::context::Scope;
use crate::api::models::Dish;
use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// State kept between runs: who is logged in, which tenant and client
/// they act on, this machine's device id, and a dish picked by one command
/// for another to use.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	pub token: Option<String>,
	#[serde(default)]
	pub scope: Scope,
	pub device_id: Option<Uuid>,
	pub selected_dish: Option<Dish>,
}

impl Session {
	/// Drops everything tied to the logged-in user, scope included, so the
	/// config's scope applies again. The device id stays.
	pub fn clear_auth(&mut self) {
		self.token = None;
		self.scope = Scope::default();
		self.selected_dish = None;
	}

	/// Hands over the picked dish and forgets it, so it is used once.
	pub fn take_selected_dish(&mut self) -> Option<Dish> {
		self.selected_dish.take()
	}
}

/// Reads and writes the session file.
pub struct SessionStore {
	path: PathBuf,
}

impl SessionStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// The saved session, or an empty one if nothing has been saved yet.
	pub fn load(&self) -> Result<Session, Error> {
		if !self.path.exists() {
			return Ok(Session::default());
		}

		let content = fs::read_to_string(&self.path)?;
		if content.trim().is_empty() {
			return Ok(Session::default());
		}

		serde_json::from_str(&content).map_err(|e| {
			anyhow!("failed to parse session {}: {}", self.path.display(), e)
		})
	}

	/// Loads the session and makes sure it has a device id, saving it if
	/// one had to be generated.
	pub fn load_or_init(&self) -> Result<Session, Error> {
		let mut session = self.load()?;
		if session.device_id.is_none() {
			let id = Uuid::new_v4();
			tracing::debug!("generated device id {}", id);
			session.device_id = Some(id);
			self.save(&session)?;
		}
		Ok(session)
	}

	pub fn save(&self, session: &Session) -> Result<(), Error> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	fn dish() -> Dish {
		serde_json::from_str(r#"{"_id":"d1","name":"Sancocho","price":450}"#)
			.unwrap()
	}

	#[test]
	fn test_missing_file_is_empty_session() {
		let dir = tempdir().unwrap();
		let store = SessionStore::new(dir.path().join("session.json"));
		assert_eq!(store.load().unwrap(), Session::default());
	}

	#[test]
	fn test_device_id_is_stable() {
		let dir = tempdir().unwrap();
		let store = SessionStore::new(dir.path().join("nested/session.json"));

		let first = store.load_or_init().unwrap();
		let second = store.load_or_init().unwrap();
		assert!(first.device_id.is_some());
		assert_eq!(first.device_id, second.device_id);
	}

	#[test]
	fn test_round_trip_and_logout() {
		let dir = tempdir().unwrap();
		let store = SessionStore::new(dir.path().join("session.json"));

		let mut session = store.load_or_init().unwrap();
		session.token = Some("tok".to_string());
		session.scope.tenant_id = Some("t1".to_string());
		session.selected_dish = Some(dish());
		store.save(&session).unwrap();

		let raw = fs::read_to_string(store.path()).unwrap();
		assert!(raw.contains("\"selectedDish\""));
		assert!(raw.contains("\"tenantId\": \"t1\""));

		let mut loaded = store.load().unwrap();
		assert_eq!(loaded, session);

		let device = loaded.device_id;
		loaded.clear_auth();
		assert_eq!(loaded.token, None);
		assert_eq!(loaded.scope, Scope::default());
		assert_eq!(loaded.selected_dish, None);
		assert_eq!(loaded.device_id, device);
	}

	#[test]
	fn test_selected_dish_is_taken_once() {
		let mut session = Session {
			selected_dish: Some(dish()),
			..Default::default()
		};
		assert_eq!(session.take_selected_dish().map(|d| d.name), Some("Sancocho".to_string()));
		assert!(session.take_selected_dish().is_none());
	}

	#[test]
	fn test_corrupt_session_is_an_error() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("session.json");
		fs::write(&path, "{not json").unwrap();
		assert!(SessionStore::new(path).load().is_err());
	}
}
