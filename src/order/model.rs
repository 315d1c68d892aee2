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
use crate::order::status::OrderStatus;
use crate::util::date::parse_timestamp;
use crate::util::money::{dec, float};
use anyhow::{anyhow, bail, Error};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest price, cost or bill figure accepted from an export or the
/// backend. Keeps every sum the reports build well inside `Decimal` range.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Largest quantity on a single line.
pub const MAX_QUANTITY: f64 = 100_000.0;

/// An order as the backend stores it. Read-only as far as reporting is
/// concerned; the customer and employee fields are snapshots taken when the
/// order was placed, not references.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "OrderRecord")]
pub struct Order {
	pub id: String,
	pub created_at: String,
	#[serde(rename = "orderStatus")]
	pub status: OrderStatus,
	pub customer_details: Customer,
	pub items: Vec<LineItem>,
	pub bills: Bills,
	pub payment_method: Option<String>,
	pub order_source: Option<OrderSource>,
	pub user: Option<Employee>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
	#[serde(default)]
	pub name: String,
	pub guests: Option<u32>,
	pub phone: Option<String>,
	pub address: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
	#[serde(default)]
	pub name: String,
}

/// One line of an order. Quantity may be fractional for items sold by
/// weight.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "LineItemRecord")]
pub struct LineItem {
	pub name: String,
	pub category: Option<String>,
	pub quantity: f64,
	pub unit_price: f64,
	pub line_total: Option<f64>,

	/// Unit cost, when the menu item has a recipe costed out.
	pub cost: Option<f64>,

	pub tax: Option<f64>,

	/// Size or presentation the item was sold in, e.g. "Half" or "1 lb".
	pub presentation: Option<String>,
}

/// Order-level totals. Tips and discounts are applied to the order as a
/// whole, so these are stored rather than derived from the items.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "BillsRecord")]
pub struct Bills {
	pub subtotal: f64,
	pub tax: f64,
	pub tip: f64,
	pub discount: f64,
	pub total_with_tax: f64,
}

/// Where the order came in: dining room, counter, or a delivery platform.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "OrderSourceRecord")]
pub struct OrderSource {
	pub channel: String,

	/// Percent of the order total the platform keeps.
	pub commission_rate: Option<f64>,
}

/// Body of a status update. The backend replaces the bills sub-document
/// on every update, so a full snapshot always goes along with the status.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
	pub order_status: OrderStatus,
	pub bills: Bills,
}

/// Checks every order with `Order::validate`, naming the first one that
/// fails.
pub fn validate_orders(orders: &[Order]) -> Result<(), Error> {
	for order in orders {
		order
			.validate()
			.map_err(|e| anyhow!("order {}: {}", order.id, e))?;
	}
	Ok(())
}

impl Order {
	/// Local creation time, or `None` if the backend sent something
	/// unreadable.
	pub fn created(&self) -> Option<NaiveDateTime> {
		parse_timestamp(&self.created_at)
	}

	pub fn payment_method(&self) -> &str {
		self.payment_method.as_deref().unwrap_or("").trim()
	}

	pub fn channel(&self) -> Option<&str> {
		self.order_source
			.as_ref()
			.map(|s| s.channel.trim())
			.filter(|c| !c.is_empty())
	}

	pub fn employee_name(&self) -> &str {
		self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("")
	}

	/// Revenue this order contributes to order-level reports.
	pub fn revenue(&self) -> Decimal {
		dec(self.bills.total_with_tax)
	}

	/// Platform commission owed on this order, if it came through a channel
	/// that charges one.
	pub fn commission(&self) -> Decimal {
		match self.order_source.as_ref().and_then(|s| s.commission_rate) {
			Some(rate) if rate > 0.0 => {
				self.revenue() * dec(rate) / Decimal::ONE_HUNDRED
			},
			_ => Decimal::ZERO,
		}
	}

	/// Rejects figures too large to report on. Negative amounts are allowed,
	/// refunds and comps show up that way.
	pub fn validate(&self) -> Result<(), Error> {
		for item in &self.items {
			check_quantity(item.quantity, &item.name)?;
			check_amount(item.unit_price, "price", &item.name)?;
			for (value, field) in [
				(item.line_total, "lineTotal"),
				(item.cost, "cost"),
				(item.tax, "tax"),
			] {
				if let Some(v) = value {
					check_amount(v, field, &item.name)?;
				}
			}
		}

		for (value, field) in [
			(self.bills.subtotal, "subtotal"),
			(self.bills.tax, "tax"),
			(self.bills.tip, "tip"),
			(self.bills.discount, "discount"),
			(self.bills.total_with_tax, "totalWithTax"),
		] {
			check_amount(value, field, "bills")?;
		}

		let rate = self.order_source.as_ref().and_then(|s| s.commission_rate);
		if let Some(rate) = rate {
			if !(0.0..=100.0).contains(&rate) {
				bail!("commission rate must be between 0 and 100, got {}", rate);
			}
		}

		Ok(())
	}

	/// Builds the full update the backend expects when moving this order to
	/// a new status.
	pub fn status_update(&self, status: OrderStatus) -> OrderUpdate {
		OrderUpdate {
			order_status: status,
			bills: self.bills.reconstructed(&self.items),
		}
	}
}

impl LineItem {
	/// `lineTotal` when the backend computed one, else price times quantity.
	pub fn revenue(&self) -> Decimal {
		match self.line_total {
			Some(total) => dec(total),
			None => dec(self.unit_price) * dec(self.quantity),
		}
	}

	/// Unit cost times quantity, if the unit cost is known.
	pub fn cost_total(&self) -> Option<Decimal> {
		self.cost.map(|c| dec(c) * dec(self.quantity))
	}

	pub fn category(&self) -> &str {
		match self.category.as_deref().map(str::trim) {
			Some(c) if !c.is_empty() => c,
			_ => "Uncategorized",
		}
	}
}

impl Bills {
	/// Fills in whatever an older order is missing. Stored figures always
	/// win; a zero subtotal is recomputed from the items and a zero total
	/// from the other figures.
	pub fn reconstructed(&self, items: &[LineItem]) -> Bills {
		let subtotal = if self.subtotal > 0.0 {
			dec(self.subtotal)
		} else {
			items.iter().map(LineItem::revenue).sum()
		};

		let total_with_tax = if self.total_with_tax > 0.0 {
			dec(self.total_with_tax)
		} else {
			subtotal + dec(self.tax) + dec(self.tip) - dec(self.discount)
		};

		Bills {
			subtotal: float(subtotal),
			tax: self.tax,
			tip: self.tip,
			discount: self.discount,
			total_with_tax: float(total_with_tax),
		}
	}
}

fn check_amount(value: f64, field: &str, owner: &str) -> Result<(), Error> {
	if !value.is_finite() || value.abs() > MAX_AMOUNT {
		bail!(
			"{} of {} must be within {}, got {}",
			field,
			owner,
			MAX_AMOUNT,
			value
		);
	}
	Ok(())
}

fn check_quantity(value: f64, owner: &str) -> Result<(), Error> {
	if !value.is_finite() || value.abs() > MAX_QUANTITY {
		bail!(
			"quantity of {} must be within {}, got {}",
			owner,
			MAX_QUANTITY,
			value
		);
	}
	Ok(())
}

// Wire shapes. Older orders and some delivery platforms use other names
// for the same fields, and a payload may carry both spellings at once, so
// each spelling gets its own slot and the canonical one wins.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord {
	id: Option<String>,
	#[serde(rename = "_id")]
	object_id: Option<String>,
	#[serde(default)]
	created_at: String,
	order_status: Option<OrderStatus>,
	status: Option<OrderStatus>,
	customer_details: Option<Customer>,
	customer: Option<Customer>,
	#[serde(default)]
	items: Vec<LineItem>,
	#[serde(default)]
	bills: Bills,
	payment_method: Option<String>,
	#[serde(default, deserialize_with = "deserialize_source")]
	order_source: Option<OrderSource>,
	#[serde(default, deserialize_with = "deserialize_source")]
	channel: Option<OrderSource>,
	user: Option<Employee>,
	employee: Option<Employee>,
}

impl From<OrderRecord> for Order {
	fn from(r: OrderRecord) -> Self {
		Order {
			id: r.object_id.or(r.id).unwrap_or_default(),
			created_at: r.created_at,
			status: r.order_status.or(r.status).unwrap_or_default(),
			customer_details: r
				.customer_details
				.or(r.customer)
				.unwrap_or_default(),
			items: r.items,
			bills: r.bills,
			payment_method: r.payment_method,
			order_source: r.order_source.or(r.channel),
			user: r.user.or(r.employee),
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineItemRecord {
	#[serde(default)]
	name: String,
	category: Option<String>,
	quantity: Option<f64>,
	unit_price: Option<f64>,
	price: Option<f64>,
	line_total: Option<f64>,
	cost: Option<f64>,
	unit_cost: Option<f64>,
	tax: Option<f64>,
	presentation: Option<String>,
}

impl From<LineItemRecord> for LineItem {
	fn from(r: LineItemRecord) -> Self {
		LineItem {
			name: r.name,
			category: r.category,
			quantity: r.quantity.unwrap_or(1.0),
			unit_price: r.unit_price.or(r.price).unwrap_or_default(),
			line_total: r.line_total,
			cost: r.cost.or(r.unit_cost),
			tax: r.tax,
			presentation: r.presentation,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BillsRecord {
	subtotal: Option<f64>,
	total: Option<f64>,
	tax: Option<f64>,
	tip: Option<f64>,
	discount: Option<f64>,
	total_with_tax: Option<f64>,
}

impl From<BillsRecord> for Bills {
	fn from(r: BillsRecord) -> Self {
		Bills {
			subtotal: r.subtotal.or(r.total).unwrap_or_default(),
			tax: r.tax.unwrap_or_default(),
			tip: r.tip.unwrap_or_default(),
			discount: r.discount.unwrap_or_default(),
			total_with_tax: r.total_with_tax.unwrap_or_default(),
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderSourceRecord {
	channel: Option<String>,
	name: Option<String>,
	commission_rate: Option<f64>,
}

impl From<OrderSourceRecord> for OrderSource {
	fn from(r: OrderSourceRecord) -> Self {
		OrderSource {
			channel: r.channel.or(r.name).unwrap_or_default(),
			commission_rate: r.commission_rate,
		}
	}
}

/// Delivery platforms send the channel as a bare string on some orders and
/// as an object on others.
fn deserialize_source<'de, D>(
	deserializer: D,
) -> Result<Option<OrderSource>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let value = serde_json::Value::deserialize(deserializer)?;
	match value {
		serde_json::Value::Null => Ok(None),
		serde_json::Value::String(channel) => Ok(Some(OrderSource {
			channel,
			commission_rate: None,
		})),
		obj @ serde_json::Value::Object(_) => serde_json::from_value(obj)
			.map(Some)
			.map_err(serde::de::Error::custom),
		_ => Err(serde::de::Error::custom(
			"expected a string or an object for the order source",
		)),
	}
}
