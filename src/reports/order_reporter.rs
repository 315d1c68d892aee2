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
use crate::reports::table::Table;
use crate::sales::aggregate::method_label;
use crate::util::format::{currency, short_id};

/// The order board: one line per order, newest first.
pub struct OrderReporter<'a> {
	orders: Vec<&'a Order>,
	symbol: String,
}

impl<'a> OrderReporter<'a> {
	pub fn new(orders: &[&'a Order], limit: Option<usize>, symbol: &str) -> Self {
		let mut orders = orders.to_vec();
		// Unreadable timestamps sink to the bottom
		orders.sort_by(|a, b| b.created().cmp(&a.created()));
		if let Some(n) = limit {
			orders.truncate(n);
		}

		Self {
			orders,
			symbol: symbol.to_string(),
		}
	}

	pub fn render(&self) -> String {
		if self.orders.is_empty() {
			return "No data\n".to_string();
		}

		let mut table = Table::new(7);
		table.add_header(vec![
			"Order", "Placed", "Status", "Client", "Items", "Method", "Total",
		]);
		table.add_separator();
		table.right_align(vec![4, 6]);

		for order in &self.orders {
			table.add_row(vec![
				short_id(&order.id),
				order
					.created()
					.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
					.unwrap_or_else(|| "?".to_string()),
				order.status.to_string(),
				order.customer_details.name.clone(),
				order.items.len().to_string(),
				method_label(order),
				currency(order.bills.total_with_tax, &self.symbol),
			]);
		}
		table.render()
	}

	pub fn print(&self) {
		println!("{}", self.render().trim_end());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_board_is_newest_first() {
		let orders: Vec<Order> = vec![
			serde_json::from_value(json!({
				"_id": "aaaaaa111111",
				"createdAt": "2024-03-01T08:00:00",
				"orderStatus": "Completado",
				"customerDetails": {"name": "Ana"},
				"paymentMethod": "Tarjeta",
				"bills": {"totalWithTax": 1250.5}
			}))
			.unwrap(),
			serde_json::from_value(json!({
				"_id": "bbbbbb222222",
				"createdAt": "2024-03-02T19:30:00",
				"orderStatus": "Listo",
				"customerDetails": {"name": "Luis"},
				"bills": {"totalWithTax": 80}
			}))
			.unwrap(),
		];
		let refs: Vec<&Order> = orders.iter().collect();
		let out = OrderReporter::new(&refs, None, "RD$").render();
		let lines: Vec<&str> = out.lines().collect();

		assert!(lines[2].starts_with("#222222"));
		assert!(lines[2].contains("Ready"));
		assert!(lines[3].starts_with("#111111"));
		assert!(lines[3].contains("Completed"));
		assert!(lines[3].contains("RD$1,250.50"));
		assert!(lines[3].contains("2024-03-01 08:00"));

		let limited = OrderReporter::new(&refs, Some(1), "RD$").render();
		assert!(!limited.contains("#111111"));
	}
}
