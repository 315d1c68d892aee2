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
	aggregate_by, guest_count, order_totals, sum_buckets, GroupKey,
	OrderTotals,
};
use crate::sales::delta::delta;
use crate::util::date::DateWindow;
use crate::util::format::currency;

/// Everything the dashboard shows for one window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
	pub totals: OrderTotals,
	pub item_revenue: f64,
	pub guests: u32,
}

impl Snapshot {
	pub fn of(orders: &[&Order]) -> Self {
		let buckets = aggregate_by(orders, GroupKey::Category);
		Self {
			totals: order_totals(orders),
			item_revenue: sum_buckets(buckets.values()).revenue,
			guests: guest_count(orders),
		}
	}
}

/// Headline metrics for a window, each compared against the window of the
/// same length right before it.
pub struct DashboardReporter {
	window: DateWindow,
	current: Snapshot,
	previous: Option<Snapshot>,
	symbol: String,
}

enum Metric {
	Count(f64),
	Money(f64),
}

impl DashboardReporter {
	pub fn new(
		window: DateWindow,
		current: Snapshot,
		previous: Option<Snapshot>,
		symbol: &str,
	) -> Self {
		Self {
			window,
			current,
			previous,
			symbol: symbol.to_string(),
		}
	}

	pub fn render(&self) -> String {
		let mut out = format!("Dashboard: {}\n", self.window);
		if let Some(previous) = self.window.preceding() {
			out.push_str(&format!("Compared with: {}\n", previous));
		}

		let mut table = Table::new(4);
		table.add_header(vec!["Metric", "Current", "Previous", "Change"]);
		table.add_separator();
		table.right_align(vec![1, 2, 3]);

		let pick = |s: &Snapshot| -> Vec<(&'static str, Metric)> {
			vec![
				("Orders", Metric::Count(s.totals.count as f64)),
				("Order revenue", Metric::Money(s.totals.revenue)),
				("Item revenue", Metric::Money(s.item_revenue)),
				("Average ticket", Metric::Money(s.totals.average_ticket())),
				("Tips", Metric::Money(s.totals.tip)),
				("Guests", Metric::Count(s.guests as f64)),
			]
		};

		let current = pick(&self.current);
		let previous = self.previous.as_ref().map(pick);

		for (i, (label, metric)) in current.iter().enumerate() {
			let (prev_text, change) = match &previous {
				Some(p) => {
					let prev = &p[i].1;
					(
						self.show(prev),
						delta(value(metric), value(prev)).text,
					)
				},
				None => ("-".to_string(), "-".to_string()),
			};
			table.add_row(vec![
				label.to_string(),
				self.show(metric),
				prev_text,
				change,
			]);
		}

		out.push('\n');
		out.push_str(&table.render());
		out
	}

	pub fn print(&self) {
		println!("{}", self.render().trim_end());
	}

	fn show(&self, metric: &Metric) -> String {
		match metric {
			Metric::Count(v) => format!("{}", v),
			Metric::Money(v) => currency(*v, &self.symbol),
		}
	}
}

fn value(metric: &Metric) -> f64 {
	match metric {
		Metric::Count(v) | Metric::Money(v) => *v,
	}
}
