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
use crate::order::model::Order;
use crate::order::status::OrderStatus;
use crate::util::date::DateWindow;
use anyhow::Error;
use regex::Regex;

/// Pass these into `OrderSelector::select()` to narrow a set of orders.
/// Text filters match case-insensitively anywhere in the field; empty text
/// matches everything.
#[derive(Clone, Debug)]
pub enum OrderFilter {
	Window(DateWindow),
	Client(String),
	User(String),
	Method(String),
	Status(OrderStatus),
}

/// Slices a fetched set of orders. Holds the compiled patterns used to tell
/// delivery platforms apart from other payment text.
pub struct OrderSelector {
	/// Names of delivery platforms and the generic words for delivery
	delivery: Regex,
	/// Only the generic words, which match any delivery platform
	generic_delivery: Regex,
}

impl OrderSelector {
	pub fn new() -> Result<Self, Error> {
		Ok(Self {
			delivery: Regex::new(
				r"(?i)deliver|domicilio|uber|rappi|pedidos\s*ya|didi|glovo|just\s*eat|ifood",
			)?,
			generic_delivery: Regex::new(r"(?i)deliver|domicilio")?,
		})
	}

	/// Applies every filter in turn and returns the orders that pass them
	/// all, in their original order.
	pub fn select<'a, 'b>(
		&'b self,
		orders: &'a [Order],
		filters: &'b [OrderFilter],
	) -> Vec<&'a Order>
	where
		'a: 'b,
	{
		let mut orders_iter: Box<dyn Iterator<Item = &'a Order> + 'b> =
			Box::new(orders.iter());

		for filter in filters {
			orders_iter = Box::new(
				orders_iter.filter(move |order| self.matches(order, filter)),
			);
		}

		orders_iter.collect()
	}

	pub fn matches(&self, order: &Order, filter: &OrderFilter) -> bool {
		match filter {
			OrderFilter::Window(window) => window.contains(order.created()),
			OrderFilter::Client(text) => {
				contains(&order.customer_details.name, text)
			},
			OrderFilter::User(text) => contains(order.employee_name(), text),
			OrderFilter::Method(text) => self.matches_method(order, text),
			OrderFilter::Status(status) => order.status == *status,
		}
	}

	/// Whether the text names a delivery platform or delivery in general.
	pub fn is_delivery(&self, text: &str) -> bool {
		self.delivery.is_match(text)
	}

	/// Payment method text matches as usual. Delivery orders often carry no
	/// payment method at all, so delivery-like filter text is also tried
	/// against the order's channel: a platform name matches that platform,
	/// and the generic words match every delivery platform.
	fn matches_method(&self, order: &Order, text: &str) -> bool {
		if contains(order.payment_method(), text) {
			return true;
		}

		if !self.is_delivery(text) {
			return false;
		}

		match order.channel() {
			Some(channel) => {
				contains(channel, text)
					|| (self.generic_delivery.is_match(text)
						&& self.is_delivery(channel))
			},
			None => false,
		}
	}
}

fn contains(haystack: &str, needle: &str) -> bool {
	let needle = needle.trim();
	needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::order::model::{Customer, Employee, OrderSource};
	use crate::util::date::{parse_date, Period};

	fn order(id: &str, created_at: &str) -> Order {
		Order {
			id: id.to_string(),
			created_at: created_at.to_string(),
			..Default::default()
		}
	}

	fn ids(orders: Vec<&Order>) -> Vec<&str> {
		orders.into_iter().map(|o| o.id.as_str()).collect()
	}

	#[test]
	fn test_window_filter() {
		let selector = OrderSelector::new().unwrap();
		let orders = vec![
			order("a", "2024-01-01T00:00:00"),
			order("b", "2024-01-01T23:59:59"),
			order("c", "2024-01-02T00:00:00"),
			order("d", "garbage"),
		];
		let day = parse_date("2024-01-01").unwrap();
		let window = DateWindow::from_dates(Some(day), Some(day), day);

		let filters = [OrderFilter::Window(window)];
		assert_eq!(ids(selector.select(&orders, &filters)), vec!["a", "b"]);

		let all = [OrderFilter::Window(DateWindow::for_period(Period::All, day))];
		assert_eq!(
			ids(selector.select(&orders, &all)),
			vec!["a", "b", "c", "d"]
		);
	}

	#[test]
	fn test_text_filters_are_case_insensitive_substrings() {
		let selector = OrderSelector::new().unwrap();
		let mut a = order("a", "2024-01-01");
		a.customer_details = Customer {
			name: "María Pérez".to_string(),
			..Default::default()
		};
		a.user = Some(Employee {
			name: "Luis".to_string(),
		});
		let b = order("b", "2024-01-01");
		let orders = vec![a, b];

		let by_client = [OrderFilter::Client("maría".to_string())];
		assert_eq!(ids(selector.select(&orders, &by_client)), vec!["a"]);

		let by_user = [OrderFilter::User("LU".to_string())];
		assert_eq!(ids(selector.select(&orders, &by_user)), vec!["a"]);

		let empty = [OrderFilter::Client("  ".to_string())];
		assert_eq!(ids(selector.select(&orders, &empty)), vec!["a", "b"]);
	}

	#[test]
	fn test_delivery_method_matches_channel() {
		let selector = OrderSelector::new().unwrap();

		let mut cash = order("cash", "2024-01-01");
		cash.payment_method = Some("Efectivo".to_string());

		let mut uber = order("uber", "2024-01-01");
		uber.order_source = Some(OrderSource {
			channel: "Uber Eats".to_string(),
			commission_rate: Some(30.0),
		});

		let mut rappi = order("rappi", "2024-01-01");
		rappi.payment_method = Some("".to_string());
		rappi.order_source = Some(OrderSource {
			channel: "Rappi".to_string(),
			commission_rate: None,
		});

		let mut dine_in = order("dine", "2024-01-01");
		dine_in.order_source = Some(OrderSource {
			channel: "Dine In".to_string(),
			commission_rate: None,
		});

		let orders = vec![cash, uber, rappi, dine_in];

		let delivery = [OrderFilter::Method("delivery".to_string())];
		assert_eq!(
			ids(selector.select(&orders, &delivery)),
			vec!["uber", "rappi"]
		);

		let only_uber = [OrderFilter::Method("uber".to_string())];
		assert_eq!(ids(selector.select(&orders, &only_uber)), vec!["uber"]);

		let efectivo = [OrderFilter::Method("efec".to_string())];
		assert_eq!(ids(selector.select(&orders, &efectivo)), vec!["cash"]);
	}

	#[test]
	fn test_filters_compose() {
		let selector = OrderSelector::new().unwrap();
		let mut a = order("a", "2024-01-01T10:00:00");
		a.status = OrderStatus::Completed;
		let mut b = order("b", "2024-01-01T11:00:00");
		b.status = OrderStatus::Cancelled;
		let c = order("c", "2024-02-01T11:00:00");
		let orders = vec![a, b, c];

		let day = parse_date("2024-01-01").unwrap();
		let filters = [
			OrderFilter::Window(DateWindow::from_dates(Some(day), None, day)),
			OrderFilter::Status(OrderStatus::Completed),
		];
		assert_eq!(ids(selector.select(&orders, &filters)), vec!["a"]);
	}
}
