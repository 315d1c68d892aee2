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
use crate::api::error::ApiResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Logical backend resources. Mutations name the resources they touch so
/// the cached reads of those resources are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
	Orders,
	Dishes,
	Tables,
	Employees,
	Reports,
	Customers,
	Categories,
	Suppliers,
	Users,
}

/// A resource plus whatever distinguishes one read of it from another,
/// e.g. the date range of a report.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub resource: Resource,
	pub query: String,
}

impl CacheKey {
	pub fn new(resource: Resource, query: impl Into<String>) -> Self {
		Self {
			resource,
			query: query.into(),
		}
	}
}

impl From<Resource> for CacheKey {
	fn from(resource: Resource) -> Self {
		CacheKey::new(resource, "")
	}
}

/// In-memory cache of decoded reads, shared between clones. Values are
/// kept as JSON so one map can hold every resource type.
#[derive(Clone, Debug, Default)]
pub struct QueryCache {
	entries: Arc<Mutex<HashMap<CacheKey, Value>>>,
}

impl QueryCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached value for `key`, or runs `fetch` and caches what
	/// it returns. Failed fetches are not cached.
	pub async fn get_or_fetch<T, F>(&self, key: CacheKey, fetch: F) -> ApiResult<T>
	where
		T: Serialize + DeserializeOwned,
		F: Future<Output = ApiResult<T>>,
	{
		if let Some(hit) = self.lookup(&key) {
			match serde_json::from_value(hit) {
				Ok(value) => {
					tracing::trace!("cache hit for {:?}", key);
					return Ok(value);
				},
				Err(e) => {
					tracing::debug!("dropping stale cache entry {:?}: {}", key, e);
				},
			}
		}

		let value = fetch.await?;
		self.store(key, serde_json::to_value(&value)?);
		Ok(value)
	}

	/// Drops every entry for the resource, whatever its query.
	pub fn invalidate(&self, resource: Resource) {
		if let Ok(mut entries) = self.entries.lock() {
			entries.retain(|key, _| key.resource != resource);
		}
	}

	pub fn clear(&self) {
		if let Ok(mut entries) = self.entries.lock() {
			entries.clear();
		}
	}

	pub fn contains(&self, key: &CacheKey) -> bool {
		self.lookup(key).is_some()
	}

	fn lookup(&self, key: &CacheKey) -> Option<Value> {
		self.entries.lock().ok()?.get(key).cloned()
	}

	fn store(&self, key: CacheKey, value: Value) {
		if let Ok(mut entries) = self.entries.lock() {
			entries.insert(key, value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::error::ApiError;
	use std::sync::atomic::{AtomicUsize, Ordering};

	async fn counted(calls: &AtomicUsize, value: Vec<u32>) -> ApiResult<Vec<u32>> {
		calls.fetch_add(1, Ordering::SeqCst);
		Ok(value)
	}

	#[tokio::test]
	async fn test_second_read_is_cached() {
		let cache = QueryCache::new();
		let calls = AtomicUsize::new(0);

		let first: Vec<u32> = cache
			.get_or_fetch(Resource::Orders.into(), counted(&calls, vec![1]))
			.await
			.unwrap();
		let second: Vec<u32> = cache
			.get_or_fetch(Resource::Orders.into(), counted(&calls, vec![2]))
			.await
			.unwrap();

		assert_eq!(first, vec![1]);
		assert_eq!(second, vec![1]);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_invalidate_drops_all_queries_of_resource() {
		let cache = QueryCache::new();
		let calls = AtomicUsize::new(0);
		let march = CacheKey::new(Resource::Reports, "2024-03");
		let april = CacheKey::new(Resource::Reports, "2024-04");
		let dishes = CacheKey::from(Resource::Dishes);

		for key in [&march, &april, &dishes] {
			let _: Vec<u32> = cache
				.get_or_fetch(key.clone(), counted(&calls, vec![]))
				.await
				.unwrap();
		}

		cache.invalidate(Resource::Reports);
		assert!(!cache.contains(&march));
		assert!(!cache.contains(&april));
		assert!(cache.contains(&dishes));

		cache.clear();
		assert!(!cache.contains(&dishes));
	}

	#[tokio::test]
	async fn test_errors_are_not_cached() {
		let cache = QueryCache::new();
		let failed: ApiResult<Vec<u32>> = cache
			.get_or_fetch(Resource::Tables.into(), async {
				Err(ApiError::Unauthorized)
			})
			.await;
		assert!(failed.is_err());
		assert!(!cache.contains(&Resource::Tables.into()));
	}
}
