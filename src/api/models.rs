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
use crate::util::date::DateWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -------------
// -- SENDING --
// -------------

#[derive(Debug, Serialize)]
pub struct Credentials {
	pub email: String,
	pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
	pub name: String,
	pub email: String,
	pub phone: String,
	pub password: String,
	pub role: String,
}

/// Date range for the admin reports listing. Bounds are sent as plain
/// dates; an unbounded window sends neither.
#[derive(Debug, Default, Serialize)]
pub struct ReportParams {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter: Option<String>,
}

impl ReportParams {
	/// `to` is the last day inside the window, since the backend treats it
	/// as inclusive.
	pub fn for_window(window: &DateWindow) -> Self {
		match window.date_span() {
			Some((from, last)) => ReportParams {
				from: Some(iso(from)),
				to: Some(iso(last)),
				filter: None,
			},
			None => ReportParams::default(),
		}
	}
}

fn iso(date: NaiveDate) -> String {
	date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Serialize)]
pub struct CustomerSearchParams {
	pub q: String,
	pub limit: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
	pub name: String,
	pub phone: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableParams {
	pub table_no: u32,
	pub seats: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
	pub amount: f64,
	pub order_id: String,
}

// ---------------
// -- RECEIVING --
// ---------------

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	#[serde(alias = "_id", default)]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub email: String,
	pub role: Option<String>,
	pub tenant_id: Option<String>,
	pub client_id: Option<String>,
}

impl User {
	pub fn scope(&self) -> Scope {
		Scope {
			tenant_id: self.tenant_id.clone(),
			client_id: self.client_id.clone(),
		}
	}
}

/// What login hands back. The token may come in the body or, with some
/// deployments, only as a cookie, in which case it is absent here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
	#[serde(alias = "accessToken")]
	pub token: Option<String>,
	#[serde(alias = "data")]
	pub user: User,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiningTable {
	#[serde(alias = "_id", default)]
	pub id: String,
	pub table_no: u32,
	#[serde(default)]
	pub seats: u32,
	pub status: Option<String>,
}

/// A menu item. Kept whole in the session when a dish is picked, so every
/// field the backend sends is preserved.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
	#[serde(alias = "_id", default)]
	pub id: String,
	#[serde(default)]
	pub name: String,
	pub category: Option<String>,
	#[serde(default)]
	pub price: f64,
	pub cost: Option<f64>,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
	#[serde(alias = "_id", default)]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub phone: String,
	pub address: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
	#[serde(alias = "_id", default)]
	pub id: String,
	#[serde(default)]
	pub name: String,
	pub role: Option<String>,
	pub active: Option<bool>,
}

/// One row of the backend's own sales-by-product report.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
	#[serde(alias = "_id", default)]
	pub name: String,
	#[serde(default)]
	pub quantity: f64,
	#[serde(alias = "revenue", default)]
	pub total: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLink {
	#[serde(alias = "invoiceUrl")]
	pub url: String,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::date::parse_date;

	#[test]
	fn test_report_params_use_last_day() {
		let day = parse_date("2024-03-10").unwrap();
		let window = DateWindow::from_dates(
			Some(parse_date("2024-03-01").unwrap()),
			Some(day),
			day,
		);
		let params = ReportParams::for_window(&window);
		assert_eq!(params.from.as_deref(), Some("2024-03-01"));
		assert_eq!(params.to.as_deref(), Some("2024-03-10"));

		let json = serde_json::to_value(ReportParams::default()).unwrap();
		assert_eq!(json, serde_json::json!({}));
	}

	#[test]
	fn test_dish_keeps_unknown_fields() {
		let raw = r#"{"_id":"d1","name":"Tostones","price":150,"image":"t.png"}"#;
		let dish: Dish = serde_json::from_str(raw).unwrap();
		assert_eq!(dish.id, "d1");
		assert_eq!(dish.extra["image"], "t.png");

		let back = serde_json::to_value(&dish).unwrap();
		assert_eq!(back["image"], "t.png");
	}

	#[test]
	fn test_user_scope() {
		let user: User = serde_json::from_str(
			r#"{"_id":"u1","name":"Ana","email":"a@b.c","tenantId":"t1"}"#,
		)
		.unwrap();
		let scope = user.scope();
		assert_eq!(scope.tenant_id.as_deref(), Some("t1"));
		assert_eq!(scope.client_id, None);
	}
}
