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
use crate::sales::aggregate::{
	aggregate_by, method_label, order_totals, order_totals_by, sum_buckets,
	top_n, AggregateBucket, GroupKey, OrderTotals,
};
use crate::util::format::{currency, optional_currency, percent, quantity};
use crate::util::money::{dec, float, percent_of};

const NO_DATA: &str = "No data";

/// Item-level sales grouped by category or by product, with cost and margin
/// where every line in the group is costed.
pub struct SalesReporter {
	title: &'static str,
	rows: Vec<(String, AggregateBucket)>,
	total: AggregateBucket,
	symbol: String,
}

impl SalesReporter {
	pub fn new(
		orders: &[&Order],
		key: GroupKey,
		limit: Option<usize>,
		symbol: &str,
	) -> Self {
		let buckets = aggregate_by(orders, key);
		let total = sum_buckets(buckets.values());

		Self {
			title: match key {
				GroupKey::Category => "Category",
				GroupKey::PaymentMethod => "Method",
				GroupKey::Product => "Product",
			},
			rows: top_n(buckets, limit),
			total,
			symbol: symbol.to_string(),
		}
	}

	pub fn render(&self) -> String {
		if self.rows.is_empty() {
			return format!("{}\n", NO_DATA);
		}

		let mut table = Table::new(8);
		table.add_header(vec![
			self.title,
			"Qty",
			"Item revenue",
			"Tax",
			"Cost",
			"Profit",
			"Cost %",
			"Margin %",
		]);
		table.add_separator();
		table.right_align(vec![1, 2, 3, 4, 5, 6, 7]);

		for (name, bucket) in &self.rows {
			table.add_row(self.cells(name, bucket));
		}

		table.add_separator();
		table.add_row(self.cells("Total", &self.total));
		table.render()
	}

	pub fn print(&self) {
		println!("{}", self.render().trim_end());
	}

	fn cells(&self, name: &str, b: &AggregateBucket) -> Vec<String> {
		vec![
			name.to_string(),
			quantity(b.quantity),
			currency(b.revenue, &self.symbol),
			currency(b.tax_total, &self.symbol),
			optional_currency(b.cost_total, &self.symbol),
			optional_currency(b.profit, &self.symbol),
			percent(b.cost_pct),
			percent(b.profit_pct),
		]
	}
}

/// Order-level sales by payment method. Orders with no method are filed
/// under their channel, and delivery platforms show the commission they
/// keep. The total covers every method, including any cut by the limit.
pub struct PaymentReporter {
	rows: Vec<PaymentRow>,
	total: OrderTotals,
	symbol: String,
}

struct PaymentRow {
	method: String,
	orders: usize,
	revenue: f64,
	share: Option<f64>,
	commission: f64,
}

impl PaymentReporter {
	pub fn new(orders: &[&Order], limit: Option<usize>, symbol: &str) -> Self {
		let total = order_totals(orders);
		let grand_total = dec(total.revenue);
		let grouped = order_totals_by(orders, |o| Some(method_label(o)));

		let mut rows: Vec<PaymentRow> = grouped
			.into_iter()
			.map(|(method, totals)| PaymentRow {
				method,
				orders: totals.count,
				revenue: totals.revenue,
				share: percent_of(dec(totals.revenue), grand_total).map(float),
				commission: totals.commission,
			})
			.collect();
		rows.sort_by(|a, b| {
			b.revenue
				.total_cmp(&a.revenue)
				.then_with(|| a.method.cmp(&b.method))
		});
		if let Some(n) = limit {
			rows.truncate(n);
		}

		Self {
			rows,
			total,
			symbol: symbol.to_string(),
		}
	}

	pub fn render(&self) -> String {
		if self.rows.is_empty() {
			return format!("{}\n", NO_DATA);
		}

		let mut table = Table::new(6);
		table.add_header(vec![
			"Method",
			"Orders",
			"Order revenue",
			"Share",
			"Commission",
			"Net",
		]);
		table.add_separator();
		table.right_align(vec![1, 2, 3, 4, 5]);

		for row in &self.rows {
			table.add_row(vec![
				row.method.clone(),
				row.orders.to_string(),
				currency(row.revenue, &self.symbol),
				percent(row.share),
				currency(row.commission, &self.symbol),
				self.net(row.revenue, row.commission),
			]);
		}

		table.add_separator();
		table.add_row(vec![
			"Total".to_string(),
			self.total.count.to_string(),
			currency(self.total.revenue, &self.symbol),
			String::new(),
			currency(self.total.commission, &self.symbol),
			self.net(self.total.revenue, self.total.commission),
		]);
		table.render()
	}

	fn net(&self, revenue: f64, commission: f64) -> String {
		currency(float(dec(revenue) - dec(commission)), &self.symbol)
	}

	pub fn print(&self) {
		println!("{}", self.render().trim_end());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn orders() -> Vec<Order> {
		vec![
			serde_json::from_value(json!({
				"_id": "1",
				"paymentMethod": "Efectivo",
				"items": [
					{"name": "Pollo", "category": "Mains", "price": 10, "cost": 4},
					{"name": "Pollo", "category": "Mains", "price": 10, "cost": 4}
				],
				"bills": {"totalWithTax": 23.6}
			}))
			.unwrap(),
			serde_json::from_value(json!({
				"_id": "2",
				"orderSource": {"name": "Uber Eats", "commissionRate": 25},
				"items": [
					{"name": "Jugo", "category": "Drinks", "price": 5, "cost": 0},
					{"name": "Jugo", "category": "Drinks", "price": 5, "cost": 5}
				],
				"bills": {"totalWithTax": 200}
			}))
			.unwrap(),
		]
	}

	#[test]
	fn test_category_report_margins() {
		let orders = orders();
		let refs: Vec<&Order> = orders.iter().collect();
		let out =
			SalesReporter::new(&refs, GroupKey::Category, None, "$").render();

		let mains = out.lines().find(|l| l.starts_with("Mains")).unwrap();
		assert!(mains.contains("$20.00"));
		assert!(mains.contains("$8.00"));
		assert!(mains.contains("$12.00"));
		assert!(mains.contains("40.0%"));
		assert!(mains.contains("60.0%"));

		let drinks = out.lines().find(|l| l.starts_with("Drinks")).unwrap();
		assert!(drinks.contains("$10.00"));
		assert_eq!(drinks.matches("N/A").count(), 4);

		// Partial cost data in one group leaves the total uncosted too
		let total = out.lines().find(|l| l.starts_with("Total")).unwrap();
		assert!(total.contains("$30.00"));
		assert!(total.contains("N/A"));
	}

	#[test]
	fn test_limit_keeps_top_revenue() {
		let orders = orders();
		let refs: Vec<&Order> = orders.iter().collect();
		let out =
			SalesReporter::new(&refs, GroupKey::Product, Some(1), "$").render();
		assert!(out.contains("Pollo / Efectivo"));
		assert!(!out.contains("Jugo"));
	}

	#[test]
	fn test_payment_report_commission() {
		let orders = orders();
		let refs: Vec<&Order> = orders.iter().collect();
		let out = PaymentReporter::new(&refs, None, "$").render();

		let uber = out.lines().find(|l| l.starts_with("Uber Eats")).unwrap();
		assert!(uber.contains("$200.00"));
		assert!(uber.contains("$50.00"));
		assert!(uber.contains("$150.00"));

		let cash = out.lines().find(|l| l.starts_with("Efectivo")).unwrap();
		assert!(cash.contains("$23.60"));
		assert!(cash.contains("$0.00"));
	}

	#[test]
	fn test_totals_ignore_limit() {
		let orders = orders();
		let refs: Vec<&Order> = orders.iter().collect();

		let out = PaymentReporter::new(&refs, Some(1), "$").render();
		assert!(!out.contains("Efectivo"));
		let total = out.lines().find(|l| l.starts_with("Total")).unwrap();
		let cells: Vec<&str> = total.split_whitespace().collect();
		assert_eq!(cells, vec!["Total", "2", "$223.60", "$50.00", "$173.60"]);

		let out =
			SalesReporter::new(&refs, GroupKey::Category, Some(1), "$").render();
		assert!(!out.contains("Drinks"));
		let total = out.lines().find(|l| l.starts_with("Total")).unwrap();
		assert!(total.contains("$30.00"));
	}

	#[test]
	fn test_empty_reports_say_no_data() {
		assert_eq!(
			SalesReporter::new(&[], GroupKey::Category, None, "$").render(),
			"No data\n"
		);
		assert_eq!(PaymentReporter::new(&[], None, "$").render(), "No data\n");
	}
}
