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
use crate::config::config_file::Config;
use crate::config::session::SessionStore;
use crate::order::model::{validate_orders, Order};
use anyhow::{anyhow, bail, Error};
use dirs::home_dir;
use serde::Deserialize;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

const CONFIG_DIR: &str = ".config/posr";

pub struct Filesystem {
	/// Where config and session live unless overridden
	config_dir: PathBuf,
}

/// An order export is either a bare array or the API's `{"data": [...]}`
/// envelope saved as-is.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderExport {
	Bare(Vec<Order>),
	Wrapped { data: Vec<Order> },
}

impl Filesystem {
	pub fn new() -> Result<Self, Error> {
		let home_dir =
			home_dir().ok_or_else(|| anyhow!("Unable to determine home directory"))?;
		Ok(Self::with_config_dir(home_dir.join(CONFIG_DIR)))
	}

	pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
		Self {
			config_dir: config_dir.into(),
		}
	}

	pub fn session_store(&self) -> SessionStore {
		SessionStore::new(self.config_dir.join("session.json"))
	}

	/// Reads orders from a JSON export.
	pub fn load_orders(&self, file_path: &str) -> Result<Vec<Order>, Error> {
		let content = fs::read_to_string(Path::new(file_path))
			.map_err(|e| anyhow!("failed to read {}: {}", file_path, e))?;
		let export: OrderExport = serde_json::from_str(&content)
			.map_err(|e| anyhow!("failed to parse orders in {}: {}", file_path, e))?;

		let orders = match export {
			OrderExport::Bare(orders) => orders,
			OrderExport::Wrapped { data } => data,
		};
		validate_orders(&orders)
			.map_err(|e| anyhow!("bad order in {}: {}", file_path, e))?;
		tracing::debug!("loaded {} orders from {}", orders.len(), file_path);
		Ok(orders)
	}

	/// Fetches the config from the given path, or default path if none.
	/// The boolean argument indicates whether it is necessary to inspect
	/// the config for authentication, i.e. for talking to the backend.
	pub fn get_config(
		&self,
		custom_config_path: Option<&String>,
		expand_auth: bool,
	) -> Result<Config, Error> {
		let config_path = match &custom_config_path {
			None => self.config_dir.join("config.toml"),
			Some(p) => PathBuf::from(p),
		};

		// create empty config file if it doesn't exist
		if !config_path.exists() && custom_config_path.is_none() {
			if let Some(parent) = config_path.parent() {
				fs::create_dir_all(parent)?;
			}
			File::create(config_path.clone())?;
		}

		let content = fs::read_to_string(config_path)?;
		let mut config: Config = toml::from_str(&content)
			.map_err(|e| anyhow!("failed to parse config: {}", e))?;

		// Execute token_cmd if applicable, and put result in token
		if !expand_auth {
			return Ok(config);
		}

		if let Some(api) = &mut config.api {
			if api.token_cmd.is_some() && api.token.is_some() {
				bail!("Only one of api.token and api.token_cmd may be specified")
			}

			if let Some(token_cmd) = &api.token_cmd {
				api.token = Some(run_token_cmd(token_cmd)?);
			}
		}

		Ok(config)
	}
}

fn run_token_cmd(token_cmd: &str) -> Result<String, Error> {
	let output = Command::new("sh")
		.arg("-c")
		.arg(token_cmd)
		.output()
		.map_err(|e| anyhow!("failed to execute token_cmd: {}", e))?;

	if !output.status.success() {
		bail!(
			"api token_cmd failed with status {}: {}",
			output.status,
			String::from_utf8_lossy(&output.stderr)
		);
	}

	Ok(String::from_utf8(output.stdout)
		.map_err(|e| anyhow!("failed to parse command output: {}", e))?
		.trim()
		.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_default_config_is_created() {
		let dir = tempdir().unwrap();
		let fs_ = Filesystem::with_config_dir(dir.path().join("posr"));
		let config = fs_.get_config(None, true).unwrap();
		assert!(config.api.is_none());
		assert!(dir.path().join("posr/config.toml").exists());
	}

	#[test]
	fn test_token_cmd_is_expanded() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(&path, "[api]\ntoken_cmd = \"echo '  s3cret  '\"\n").unwrap();
		let path = path.to_string_lossy().to_string();

		let fs_ = Filesystem::with_config_dir(dir.path());
		let raw = fs_.get_config(Some(&path), false).unwrap();
		assert_eq!(raw.api.unwrap().token, None);

		let expanded = fs_.get_config(Some(&path), true).unwrap();
		assert_eq!(expanded.api.unwrap().token.as_deref(), Some("s3cret"));
	}

	#[test]
	fn test_token_and_token_cmd_conflict() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(&path, "[api]\ntoken = \"a\"\ntoken_cmd = \"echo b\"\n")
			.unwrap();
		let path = path.to_string_lossy().to_string();

		let fs_ = Filesystem::with_config_dir(dir.path());
		assert!(fs_.get_config(Some(&path), true).is_err());
	}

	#[test]
	fn test_load_orders_accepts_both_shapes() {
		let dir = tempdir().unwrap();
		let bare = dir.path().join("bare.json");
		let wrapped = dir.path().join("wrapped.json");
		fs::write(&bare, r#"[{"_id":"a"},{"_id":"b"}]"#).unwrap();
		fs::write(&wrapped, r#"{"success":true,"data":[{"_id":"c"}]}"#).unwrap();

		let fs_ = Filesystem::with_config_dir(dir.path());
		let bare = fs_.load_orders(&bare.to_string_lossy()).unwrap();
		let wrapped = fs_.load_orders(&wrapped.to_string_lossy()).unwrap();
		assert_eq!(bare.len(), 2);
		assert_eq!(wrapped[0].id, "c");
	}

	#[test]
	fn test_load_orders_rejects_oversized_line() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("orders.json");
		fs::write(
			&path,
			r#"[{"_id":"ok"},{"_id":"huge","items":[{"name":"Langosta",
				"price":1e15,"quantity":1e15}]}]"#,
		)
		.unwrap();

		let fs_ = Filesystem::with_config_dir(dir.path());
		let err = fs_.load_orders(&path.to_string_lossy()).unwrap_err();
		assert!(err.to_string().contains("huge"));
	}

	#[test]
	fn test_session_lives_next_to_config() {
		let fs_ = Filesystem::with_config_dir("/tmp/posr-test");
		assert_eq!(
			fs_.session_store().path(),
			Path::new("/tmp/posr-test/session.json")
		);
	}
}
