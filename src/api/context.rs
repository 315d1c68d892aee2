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
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const CLIENT_HEADER: &str = "x-client-id";
pub const DEVICE_HEADER: &str = "x-device-id";

/// Which tenant (restaurant group) and client (branch) requests act on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
	pub tenant_id: Option<String>,
	pub client_id: Option<String>,
}

impl Scope {
	/// Fills in whichever ids this scope lacks from `fallback`.
	pub fn or(self, fallback: Scope) -> Scope {
		Scope {
			tenant_id: self.tenant_id.or(fallback.tenant_id),
			client_id: self.client_id.or(fallback.client_id),
		}
	}
}

/// Everything that travels with every request. Built once from config and
/// session and handed to the client, so nothing reads ambient state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	pub token: Option<String>,
	pub scope: Scope,
	pub device_id: Option<Uuid>,
}

impl RequestContext {
	pub fn new(token: Option<String>, scope: Scope) -> Self {
		Self {
			token,
			scope,
			device_id: None,
		}
	}

	pub fn with_device(mut self, device_id: Uuid) -> Self {
		self.device_id = Some(device_id);
		self
	}

	/// Headers to attach to a request, in a fixed order. Ids that are not
	/// set are left off rather than sent empty.
	pub fn headers(&self) -> Vec<(&'static str, String)> {
		let mut out = Vec::with_capacity(4);
		if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
			out.push(("Authorization", format!("Bearer {}", token)));
		}
		if let Some(tenant) = &self.scope.tenant_id {
			out.push((TENANT_HEADER, tenant.clone()));
		}
		if let Some(client) = &self.scope.client_id {
			out.push((CLIENT_HEADER, client.clone()));
		}
		if let Some(device) = self.device_id {
			out.push((DEVICE_HEADER, device.to_string()));
		}
		out
	}
}
