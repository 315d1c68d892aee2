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
use crate::sales::aggregate::{by_date, by_hour, by_weekday, OrderTotals};
use crate::util::format::{currency, weekday_name};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeBucket {
	Hour,
	Date,
	Weekday,
}

/// Order revenue split by time of day, calendar day, or day of the week.
pub struct TimeReporter {
	bucket: TimeBucket,
	rows: Vec<(String, OrderTotals)>,
	symbol: String,
}

impl TimeReporter {
	pub fn new(orders: &[&Order], bucket: TimeBucket, symbol: &str) -> Self {
		let rows = match bucket {
			TimeBucket::Hour => by_hour(orders)
				.into_iter()
				.map(|(h, t)| (format!("{:02}:00", h), t))
				.collect(),
			TimeBucket::Date => by_date(orders)
				.into_iter()
				.map(|(d, t)| (d.format("%Y-%m-%d %a").to_string(), t))
				.collect(),
			TimeBucket::Weekday => by_weekday(orders)
				.into_iter()
				.map(|(d, t)| (weekday_name(d).to_string(), t))
				.collect(),
		};

		Self {
			bucket,
			rows,
			symbol: symbol.to_string(),
		}
	}

	pub fn render(&self) -> String {
		// Hour and weekday rows exist even when empty
		if self.rows.iter().all(|(_, t)| t.count == 0) {
			return "No data\n".to_string();
		}

		let mut table = Table::new(4);
		table.add_header(vec![
			match self.bucket {
				TimeBucket::Hour => "Hour",
				TimeBucket::Date => "Date",
				TimeBucket::Weekday => "Weekday",
			},
			"Orders",
			"Order revenue",
			"Avg ticket",
		]);
		table.add_separator();
		table.right_align(vec![1, 2, 3]);

		for (label, totals) in &self.rows {
			table.add_row(vec![
				label.clone(),
				totals.count.to_string(),
				currency(totals.revenue, &self.symbol),
				currency(totals.average_ticket(), &self.symbol),
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

	fn orders() -> Vec<Order> {
		[
			("2024-03-04T09:15:00", 30.0),
			("2024-03-04T09:45:00", 10.0),
			("2024-03-09T20:00:00", 60.0),
		]
		.iter()
		.map(|(t, total)| {
			serde_json::from_value(json!({
				"createdAt": t,
				"bills": {"totalWithTax": total}
			}))
			.unwrap()
		})
		.collect()
	}

	#[test]
	fn test_hours() {
		let orders = orders();
		let refs: Vec<&Order> = orders.iter().collect();
		let out = TimeReporter::new(&refs, TimeBucket::Hour, "$").render();
		let nine = out.lines().find(|l| l.starts_with("09:00")).unwrap();
		assert!(nine.contains("$40.00"));
		assert!(nine.contains("$20.00"));
		assert!(out.lines().any(|l| l.starts_with("23:00")));
	}

	#[test]
	fn test_weekdays_start_on_monday() {
		let orders = orders();
		let refs: Vec<&Order> = orders.iter().collect();
		let out = TimeReporter::new(&refs, TimeBucket::Weekday, "$").render();
		let days: Vec<&str> = out
			.lines()
			.skip(2)
			.map(|l| l.split_whitespace().next().unwrap())
			.collect();
		assert_eq!(days[0], "Monday");
		assert_eq!(days[6], "Sunday");
		let saturday = out.lines().find(|l| l.starts_with("Saturday")).unwrap();
		assert!(saturday.contains("$60.00"));
	}

	#[test]
	fn test_dates_and_empty() {
		let orders = orders();
		let refs: Vec<&Order> = orders.iter().collect();
		let out = TimeReporter::new(&refs, TimeBucket::Date, "$").render();
		assert!(out.contains("2024-03-04 Mon"));
		assert!(out.contains("2024-03-09 Sat"));

		assert_eq!(
			TimeReporter::new(&[], TimeBucket::Hour, "$").render(),
			"No data\n"
		);
	}
}
