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
use crate::api::context::RequestContext;
use crate::api::error::{ApiError, ApiResult};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper over reqwest that knows the backend root and attaches the
/// request context to every call. Cheap to clone; clones share one
/// connection pool.
#[derive(Clone, Debug)]
pub struct Client {
	http: reqwest::Client,
	base_url: String,
	context: RequestContext,
}

/// Query type for calls that take no parameters.
#[derive(Debug, Serialize)]
pub struct NoParams {}

impl Client {
	pub fn new(
		base_url: &str,
		context: RequestContext,
		timeout: Option<Duration>,
	) -> ApiResult<Self> {
		let http = reqwest::Client::builder()
			.timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
			.build()?;

		Ok(Client {
			http,
			base_url: base_url.trim_end_matches('/').to_string(),
			context,
		})
	}

	pub fn context(&self) -> &RequestContext {
		&self.context
	}

	pub fn set_token(&mut self, token: Option<String>) {
		self.context.token = token;
	}

	pub fn url(&self, endpoint: &str) -> String {
		format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
	}

	fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
		let mut request = self.http.request(method, self.url(endpoint));
		for (name, value) in self.context.headers() {
			request = request.header(name, value);
		}
		request
	}

	/// Sends a GET and decodes the response. Errors on non-2xx codes.
	pub async fn get<Q, R>(
		&self,
		endpoint: &str,
		query_params: Option<&Q>,
	) -> ApiResult<R>
	where
		Q: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let mut request = self.request(Method::GET, endpoint);
		if let Some(query_params) = query_params {
			request = request.query(query_params);
		}
		self.send(Method::GET, endpoint, request).await
	}

	pub async fn post<B, R>(&self, endpoint: &str, body: &B) -> ApiResult<R>
	where
		B: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let request = self.request(Method::POST, endpoint).json(body);
		self.send(Method::POST, endpoint, request).await
	}

	pub async fn put<B, R>(&self, endpoint: &str, body: &B) -> ApiResult<R>
	where
		B: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let request = self.request(Method::PUT, endpoint).json(body);
		self.send(Method::PUT, endpoint, request).await
	}

	pub async fn patch<B, R>(&self, endpoint: &str, body: &B) -> ApiResult<R>
	where
		B: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let request = self.request(Method::PATCH, endpoint).json(body);
		self.send(Method::PATCH, endpoint, request).await
	}

	pub async fn delete<R>(&self, endpoint: &str) -> ApiResult<R>
	where
		R: DeserializeOwned,
	{
		let request = self.request(Method::DELETE, endpoint);
		self.send(Method::DELETE, endpoint, request).await
	}

	/// Sends a multipart form, for uploads that carry an image.
	pub async fn multipart<R>(
		&self,
		method: Method,
		endpoint: &str,
		form: Form,
	) -> ApiResult<R>
	where
		R: DeserializeOwned,
	{
		let request = self.request(method.clone(), endpoint).multipart(form);
		self.send(method, endpoint, request).await
	}

	async fn send<R>(
		&self,
		method: Method,
		endpoint: &str,
		request: RequestBuilder,
	) -> ApiResult<R>
	where
		R: DeserializeOwned,
	{
		tracing::debug!("Sending {} to {}", method, self.url(endpoint));
		let response = request.send().await?;
		let status = response.status();
		let body = response.text().await?;

		// Handle non-2xx response codes
		if !status.is_success() {
			tracing::debug!("{} {} failed with status {}", method, endpoint, status);
			return Err(ApiError::from_response(status, &body));
		}

		// Deletes and logouts often answer with an empty body
		if body.trim().is_empty() {
			return Ok(serde_json::from_value(serde_json::Value::Null)?);
		}

		Ok(serde_json::from_str(&body)?)
	}
}

/// Many endpoints wrap their payload as `{"success": true, "data": ...}`
/// and some do not. Takes `data` out of the envelope when there is one.
pub fn unwrap_data<T>(value: serde_json::Value) -> ApiResult<T>
where
	T: DeserializeOwned,
{
	let inner = match value {
		serde_json::Value::Object(mut map) if map.contains_key("data") => {
			map.remove("data").unwrap_or_default()
		},
		other => other,
	};
	Ok(serde_json::from_value(inner)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::context::Scope;
	use axum::http::HeaderMap;
	use axum::routing::get;
	use axum::{Json, Router};
	use serde_json::{json, Value};

	/// Serves `router` on an ephemeral local port and returns its root.
	async fn serve(router: Router) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, router).await.unwrap();
		});
		format!("http://{}/api", addr)
	}

	fn context() -> RequestContext {
		RequestContext::new(
			Some("secret".to_string()),
			Scope {
				tenant_id: Some("t1".to_string()),
				client_id: Some("c1".to_string()),
			},
		)
	}

	#[test]
	fn test_url_joins_cleanly() {
		let client =
			Client::new("http://host/api/", RequestContext::default(), None)
				.unwrap();
		assert_eq!(client.url("/order"), "http://host/api/order");
		assert_eq!(client.url("order/1"), "http://host/api/order/1");
	}

	#[test]
	fn test_unwrap_data() {
		let wrapped: Vec<u32> =
			unwrap_data(json!({"success": true, "data": [1, 2]})).unwrap();
		assert_eq!(wrapped, vec![1, 2]);
		let bare: Vec<u32> = unwrap_data(json!([3])).unwrap();
		assert_eq!(bare, vec![3]);
	}

	#[tokio::test]
	async fn test_headers_are_attached() {
		let router = Router::new().route(
			"/api/echo",
			get(|headers: HeaderMap| async move {
				let h = |name: &str| {
					headers
						.get(name)
						.and_then(|v| v.to_str().ok())
						.unwrap_or("")
						.to_string()
				};
				Json(json!({
					"auth": h("authorization"),
					"tenant": h("x-tenant-id"),
					"client": h("x-client-id"),
				}))
			}),
		);
		let base = serve(router).await;
		let client = Client::new(&base, context(), None).unwrap();

		let echoed: Value = client.get("echo", None::<&NoParams>).await.unwrap();
		assert_eq!(echoed["auth"], "Bearer secret");
		assert_eq!(echoed["tenant"], "t1");
		assert_eq!(echoed["client"], "c1");
	}

	#[tokio::test]
	async fn test_error_status_becomes_typed_error() {
		let router = Router::new().route(
			"/api/boom",
			get(|| async {
				(
					axum::http::StatusCode::BAD_REQUEST,
					Json(json!({"message": "Table number is taken"})),
				)
			}),
		);
		let base = serve(router).await;
		let client = Client::new(&base, context(), None).unwrap();

		let err = client
			.get::<NoParams, Value>("boom", None)
			.await
			.unwrap_err();
		assert_eq!(err.user_message(), "Table number is taken");
		match err {
			ApiError::Status { status, .. } => assert_eq!(status.as_u16(), 400),
			other => panic!("unexpected error {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_empty_body_decodes_as_unit() {
		let router = Router::new().route("/api/nothing", get(|| async { "" }));
		let base = serve(router).await;
		let client = Client::new(&base, context(), None).unwrap();
		let _: () = client.get("nothing", None::<&NoParams>).await.unwrap();
	}
}
