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
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
	pub api: Option<Api>,
	pub reports: Option<Reports>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Api {
	/// Backend root, including the `/api` prefix
	pub base_url: Option<String>,
	pub token: Option<String>,
	pub token_cmd: Option<String>,

	/// Tenant and client scope. A scope saved in the session takes
	/// precedence over these.
	pub tenant_id: Option<String>,
	pub client_id: Option<String>,

	pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Reports {
	pub currency_symbol: Option<String>,

	/// How often `watch` refreshes the order board
	pub poll_interval_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_full_config() {
		let config: Config = toml::from_str(
			r#"
			[api]
			base_url = "https://pos.example.com/api"
			token_cmd = "pass show pos"
			tenant_id = "t1"
			client_id = "c1"
			timeout_secs = 15

			[reports]
			currency_symbol = "$"
			poll_interval_secs = 5
			"#,
		)
		.unwrap();

		let api = config.api.unwrap();
		assert_eq!(api.base_url.as_deref(), Some("https://pos.example.com/api"));
		assert_eq!(api.token, None);
		assert_eq!(api.timeout_secs, Some(15));
		let reports = config.reports.unwrap();
		assert_eq!(reports.poll_interval_secs, Some(5));
	}

	#[test]
	fn test_empty_config() {
		let config: Config = toml::from_str("").unwrap();
		assert!(config.api.is_none());
		assert!(config.reports.is_none());
	}
}
