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
use crate::api::cache::{CacheKey, QueryCache, Resource};
use crate::api::error::{ApiError, ApiResult};
use crate::api::http::{unwrap_data, Client, NoParams};
use crate::api::models::*;
use crate::order::model::{Order, OrderUpdate};
use crate::order::status::Transition;
use anyhow::Error;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Inventory resources that share one create/list/update/delete shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Catalog {
	Categories,
	Suppliers,
}

impl Catalog {
	fn path(&self) -> &'static str {
		match self {
			Catalog::Categories => "admin/inventory/categories",
			Catalog::Suppliers => "admin/suppliers",
		}
	}

	fn resource(&self) -> Resource {
		match self {
			Catalog::Categories => Resource::Categories,
			Catalog::Suppliers => Resource::Suppliers,
		}
	}
}

/// Every backend call the tool makes. Reads go through the cache; each
/// mutation drops the cached reads it affects, but only once the backend
/// has accepted it.
#[derive(Clone, Debug)]
pub struct Api {
	client: Client,
	cache: QueryCache,
}

impl Api {
	pub fn new(client: Client) -> Self {
		Self {
			client,
			cache: QueryCache::new(),
		}
	}

	pub fn client(&self) -> &Client {
		&self.client
	}

	pub fn cache(&self) -> &QueryCache {
		&self.cache
	}

	async fn read<Q, T>(&self, endpoint: &str, params: Option<&Q>) -> ApiResult<T>
	where
		Q: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let raw: Value = self.client.get(endpoint, params).await?;
		unwrap_data(raw)
	}

	async fn cached<Q, T>(
		&self,
		key: CacheKey,
		endpoint: &str,
		params: Option<&Q>,
	) -> ApiResult<T>
	where
		Q: Serialize + ?Sized,
		T: Serialize + DeserializeOwned,
	{
		self.cache
			.get_or_fetch(key, self.read(endpoint, params))
			.await
	}

	fn invalidate(&self, resources: &[Resource]) {
		for resource in resources {
			self.cache.invalidate(*resource);
		}
	}

	// ----------
	// -- User --
	// ----------

	pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthSession> {
		let raw: Value = self.client.post("user/login", credentials).await?;
		let session = serde_json::from_value(raw)?;
		self.cache.clear();
		Ok(session)
	}

	pub async fn register(&self, registration: &Registration) -> ApiResult<User> {
		let raw: Value = self.client.post("user/register", registration).await?;
		unwrap_data(raw)
	}

	pub async fn logout(&self) -> ApiResult<()> {
		let _: Value = self.client.post("user/logout", &NoParams {}).await?;
		self.cache.clear();
		Ok(())
	}

	pub async fn current_user(&self) -> ApiResult<User> {
		self.cached(Resource::Users.into(), "user", None::<&NoParams>)
			.await
	}

	// ------------
	// -- Tables --
	// ------------

	pub async fn tables(&self) -> ApiResult<Vec<DiningTable>> {
		self.cached(Resource::Tables.into(), "table", None::<&NoParams>)
			.await
	}

	pub async fn create_table(&self, table: &TableParams) -> ApiResult<Value> {
		let out = self.client.post("table", table).await?;
		self.invalidate(&[Resource::Tables]);
		Ok(out)
	}

	pub async fn update_table(
		&self,
		id: &str,
		table: &TableParams,
	) -> ApiResult<Value> {
		let out = self.client.put(&format!("table/{}", id), table).await?;
		self.invalidate(&[Resource::Tables]);
		Ok(out)
	}

	pub async fn delete_table(&self, id: &str) -> ApiResult<()> {
		let _: Value = self.client.delete(&format!("table/{}", id)).await?;
		self.invalidate(&[Resource::Tables]);
		Ok(())
	}

	// ------------
	// -- Orders --
	// ------------

	pub async fn orders(&self) -> ApiResult<Vec<Order>> {
		self.cached(Resource::Orders.into(), "order", None::<&NoParams>)
			.await
	}

	/// Orders of one tenant. Uncached, since the order board polls this.
	pub async fn orders_for_tenant(&self, tenant_id: &str) -> ApiResult<Vec<Order>> {
		fetch_orders(&self.client, Some(tenant_id)).await
	}

	pub async fn order(&self, id: &str) -> ApiResult<Order> {
		self.read(&format!("order/{}", id), None::<&NoParams>).await
	}

	pub async fn create_order(&self, order: &Value) -> ApiResult<Order> {
		let raw: Value = self.client.post("order", order).await?;
		self.invalidate(&[Resource::Orders, Resource::Tables, Resource::Reports]);
		unwrap_data(raw)
	}

	pub async fn update_order(
		&self,
		id: &str,
		update: &OrderUpdate,
	) -> ApiResult<Order> {
		let raw: Value = self.client.put(&format!("order/{}", id), update).await?;
		self.invalidate(&[Resource::Orders, Resource::Tables, Resource::Reports]);
		unwrap_data(raw)
	}

	pub async fn delete_order(&self, id: &str) -> ApiResult<()> {
		let _: Value = self.client.delete(&format!("order/{}", id)).await?;
		self.invalidate(&[Resource::Orders, Resource::Tables, Resource::Reports]);
		Ok(())
	}

	/// Moves an order one step through the workflow. The order is fetched
	/// fresh so the update carries its current bills; an invalid step is
	/// refused before anything is sent.
	pub async fn transition_order(
		&self,
		id: &str,
		transition: Transition,
	) -> Result<Order, Error> {
		let order = self.order(id).await?;
		order.validate()?;
		let next = order.status.apply(transition)?;
		tracing::info!("order {}: {} -> {}", id, order.status, next);
		Ok(self.update_order(id, &order.status_update(next)).await?)
	}

	pub async fn sales_by_product(
		&self,
		params: &ReportParams,
	) -> ApiResult<Vec<ProductSales>> {
		self.read("order/report/sales-by-product", Some(params)).await
	}

	// ------------
	// -- Dishes --
	// ------------

	pub async fn dishes(&self) -> ApiResult<Vec<Dish>> {
		self.cached(Resource::Dishes.into(), "dishes", None::<&NoParams>)
			.await
	}

	pub async fn dish(&self, id: &str) -> ApiResult<Dish> {
		let dishes = self.dishes().await?;
		dishes.into_iter().find(|d| d.id == id).ok_or_else(|| {
			ApiError::Status {
				status: reqwest::StatusCode::NOT_FOUND,
				message: Some(format!("No dish with id {}", id)),
			}
		})
	}

	pub async fn create_dish(
		&self,
		fields: &Value,
		image: Option<&Path>,
	) -> ApiResult<Dish> {
		let form = dish_form(fields, image).await?;
		let raw: Value =
			self.client.multipart(Method::POST, "dishes", form).await?;
		self.invalidate(&[Resource::Dishes]);
		unwrap_data(raw)
	}

	pub async fn update_dish(
		&self,
		id: &str,
		fields: &Value,
		image: Option<&Path>,
	) -> ApiResult<Dish> {
		let form = dish_form(fields, image).await?;
		let raw: Value = self
			.client
			.multipart(Method::PUT, &format!("dishes/{}", id), form)
			.await?;
		self.invalidate(&[Resource::Dishes]);
		unwrap_data(raw)
	}

	pub async fn delete_dish(&self, id: &str) -> ApiResult<()> {
		let _: Value = self.client.delete(&format!("dishes/{}", id)).await?;
		self.invalidate(&[Resource::Dishes]);
		Ok(())
	}

	pub async fn recipe(&self, dish_id: &str) -> ApiResult<Value> {
		self.read(&format!("dishes/{}/recipe", dish_id), None::<&NoParams>)
			.await
	}

	/// Recipe changes move the dish's cost, so reports are dropped too.
	pub async fn update_recipe(
		&self,
		dish_id: &str,
		recipe: &Value,
	) -> ApiResult<Value> {
		let out = self
			.client
			.put(&format!("dishes/{}/recipe", dish_id), recipe)
			.await?;
		self.invalidate(&[Resource::Dishes, Resource::Reports]);
		Ok(out)
	}

	// ---------------
	// -- Customers --
	// ---------------

	pub async fn search_customers(
		&self,
		query: &str,
		limit: u32,
	) -> ApiResult<Vec<CustomerRecord>> {
		let params = CustomerSearchParams {
			q: query.to_string(),
			limit,
		};
		self.read("customer", Some(&params)).await
	}

	pub async fn create_customer(
		&self,
		customer: &NewCustomer,
	) -> ApiResult<CustomerRecord> {
		let raw: Value = self.client.post("customer", customer).await?;
		self.invalidate(&[Resource::Customers]);
		unwrap_data(raw)
	}

	/// Creates the customer, or returns the one already registered under
	/// the same phone number. Any other failure is passed on.
	pub async fn create_or_reuse_customer(
		&self,
		customer: &NewCustomer,
	) -> ApiResult<CustomerRecord> {
		let err = match self.create_customer(customer).await {
			Ok(created) => return Ok(created),
			Err(err) if is_duplicate_phone(&err) => err,
			Err(err) => return Err(err),
		};

		tracing::debug!("customer phone {} already registered", customer.phone);
		let found = self.search_customers(&customer.phone, 5).await?;
		let wanted = digits(&customer.phone);
		found
			.into_iter()
			.find(|c| digits(&c.phone) == wanted)
			.ok_or(err)
	}

	// -----------
	// -- Admin --
	// -----------

	pub async fn tenant(&self, id: &str) -> ApiResult<Value> {
		self.read(&format!("tenant/{}", id), None::<&NoParams>).await
	}

	pub async fn usage(&self) -> ApiResult<Value> {
		self.read("admin/usage", None::<&NoParams>).await
	}

	pub async fn employees(&self) -> ApiResult<Vec<EmployeeRecord>> {
		self.cached(
			Resource::Employees.into(),
			"admin/employees",
			None::<&NoParams>,
		)
		.await
	}

	pub async fn update_employee(
		&self,
		id: &str,
		changes: &Value,
	) -> ApiResult<EmployeeRecord> {
		let raw: Value = self
			.client
			.patch(&format!("admin/employees/{}", id), changes)
			.await?;
		self.invalidate(&[Resource::Employees]);
		unwrap_data(raw)
	}

	pub async fn reports(&self, params: &ReportParams) -> ApiResult<Value> {
		let key = CacheKey::new(
			Resource::Reports,
			format!(
				"{}..{}:{}",
				params.from.as_deref().unwrap_or(""),
				params.to.as_deref().unwrap_or(""),
				params.filter.as_deref().unwrap_or("")
			),
		);
		self.cached(key, "admin/reports", Some(params)).await
	}

	pub async fn fiscal_config(&self) -> ApiResult<Value> {
		self.read("admin/fiscal-config", None::<&NoParams>).await
	}

	pub async fn update_fiscal_config(&self, changes: &Value) -> ApiResult<Value> {
		let raw: Value = self.client.patch("admin/fiscal-config", changes).await?;
		unwrap_data(raw)
	}

	pub async fn catalog(&self, catalog: Catalog) -> ApiResult<Vec<Value>> {
		self.cached(catalog.resource().into(), catalog.path(), None::<&NoParams>)
			.await
	}

	pub async fn create_catalog_entry(
		&self,
		catalog: Catalog,
		entry: &Value,
	) -> ApiResult<Value> {
		let raw: Value = self.client.post(catalog.path(), entry).await?;
		self.invalidate(&[catalog.resource()]);
		unwrap_data(raw)
	}

	pub async fn update_catalog_entry(
		&self,
		catalog: Catalog,
		id: &str,
		entry: &Value,
	) -> ApiResult<Value> {
		let endpoint = format!("{}/{}", catalog.path(), id);
		let raw: Value = self.client.put(&endpoint, entry).await?;
		self.invalidate(&[catalog.resource()]);
		unwrap_data(raw)
	}

	pub async fn delete_catalog_entry(
		&self,
		catalog: Catalog,
		id: &str,
	) -> ApiResult<()> {
		let endpoint = format!("{}/{}", catalog.path(), id);
		let _: Value = self.client.delete(&endpoint).await?;
		self.invalidate(&[catalog.resource()]);
		Ok(())
	}

	// --------------
	// -- Payments --
	// --------------

	pub async fn create_payment(&self, request: &PaymentRequest) -> ApiResult<Value> {
		self.client.post("payment/create-order", request).await
	}

	pub async fn verify_payment(&self, proof: &Value) -> ApiResult<Value> {
		let out = self.client.post("payment/verify-payment", proof).await?;
		self.invalidate(&[Resource::Orders, Resource::Reports]);
		Ok(out)
	}

	pub async fn invoice(&self, order_id: &str) -> ApiResult<InvoiceLink> {
		self.read(&format!("invoice/{}", order_id), None::<&NoParams>)
			.await
	}
}

/// Lists orders, narrowed to one tenant when given. Free-standing so the
/// poller can run it on a cloned client.
pub async fn fetch_orders(
	client: &Client,
	tenant_id: Option<&str>,
) -> ApiResult<Vec<Order>> {
	let raw: Value = match tenant_id {
		Some(tenant_id) => {
			client.get("order", Some(&[("tenantId", tenant_id)])).await?
		},
		None => client.get("order", None::<&NoParams>).await?,
	};
	unwrap_data(raw)
}

/// Only conflicts about the phone number can be resolved by looking the
/// customer up. A conflict without a code is assumed to be one.
fn is_duplicate_phone(err: &ApiError) -> bool {
	match err {
		ApiError::Conflict { code, .. } => code
			.as_deref()
			.map_or(true, |c| c.to_lowercase().contains("phone")),
		_ => false,
	}
}

fn digits(phone: &str) -> String {
	phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Text parts for each field of the dish, plus the image when one is
/// given.
async fn dish_form(fields: &Value, image: Option<&Path>) -> ApiResult<Form> {
	let mut form = Form::new();
	if let Value::Object(map) = fields {
		for (name, value) in map {
			let text = match value {
				Value::String(s) => s.clone(),
				Value::Null => continue,
				other => other.to_string(),
			};
			form = form.text(name.clone(), text);
		}
	}

	if let Some(path) = image {
		let bytes = tokio::fs::read(path).await?;
		let file_name = path
			.file_name()
			.map(|n| n.to_string_lossy().to_string())
			.unwrap_or_else(|| "image".to_string());
		form = form.part("image", Part::bytes(bytes).file_name(file_name));
	}

	Ok(form)
}
