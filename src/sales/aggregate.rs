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
use crate::order::model::{LineItem, Order};
use crate::util::money::{dec, float, percent_of};
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// How line items are grouped in item-level reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKey {
	Category,
	PaymentMethod,
	/// Product name, presentation and payment method together
	Product,
}

impl GroupKey {
	pub fn key_for(&self, order: &Order, item: &LineItem) -> String {
		match self {
			GroupKey::Category => item.category().to_string(),
			GroupKey::PaymentMethod => method_label(order),
			GroupKey::Product => {
				let mut key = item.name.trim().to_string();
				if let Some(p) = item.presentation.as_deref().map(str::trim) {
					if !p.is_empty() {
						key = format!("{} ({})", key, p);
					}
				}
				format!("{} / {}", key, method_label(order))
			},
		}
	}
}

/// The label an order is filed under in payment reports. Orders without a
/// payment method are filed under their channel when they have one.
pub fn method_label(order: &Order) -> String {
	match (order.payment_method(), order.channel()) {
		("", Some(channel)) => channel.to_string(),
		("", None) => "Unspecified".to_string(),
		(method, _) => method.to_string(),
	}
}

/// Item-level totals for one group. The cost-derived fields are only
/// present when every line in the group had a positive unit cost; a group
/// with partial cost data reports none of them rather than understating
/// cost.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateBucket {
	pub lines: usize,
	pub quantity: f64,
	pub revenue: f64,
	pub tax_total: f64,
	pub cost_total: Option<f64>,
	pub profit: Option<f64>,
	pub cost_pct: Option<f64>,
	pub profit_pct: Option<f64>,
}

/// Running sums for a bucket while folding.
struct BucketAccumulator {
	lines: usize,
	quantity: Decimal,
	revenue: Decimal,
	tax: Decimal,
	cost: Decimal,
	any_cost: bool,
	all_cost: bool,
}

impl BucketAccumulator {
	fn new() -> Self {
		Self {
			lines: 0,
			quantity: Decimal::ZERO,
			revenue: Decimal::ZERO,
			tax: Decimal::ZERO,
			cost: Decimal::ZERO,
			any_cost: false,
			all_cost: true,
		}
	}

	fn add(&mut self, item: &LineItem) {
		self.lines += 1;
		self.quantity += dec(item.quantity);
		self.revenue += item.revenue();
		self.tax += dec(item.tax.unwrap_or_default());

		let unit_cost = item.cost.map(dec).unwrap_or_default();
		let line_cost = item.cost_total().unwrap_or_default();
		if unit_cost > Decimal::ZERO && line_cost > Decimal::ZERO {
			self.any_cost = true;
			self.cost += line_cost;
		} else {
			self.all_cost = false;
		}
	}

	fn finish(self) -> AggregateBucket {
		let mut bucket = AggregateBucket {
			lines: self.lines,
			quantity: float(self.quantity),
			revenue: float(self.revenue),
			tax_total: float(self.tax),
			..Default::default()
		};

		if self.any_cost && self.all_cost {
			let profit = self.revenue - self.cost;
			bucket.cost_total = Some(float(self.cost));
			bucket.profit = Some(float(profit));
			bucket.cost_pct = percent_of(self.cost, self.revenue).map(float);
			bucket.profit_pct = percent_of(profit, self.revenue).map(float);
		}

		bucket
	}
}

/// Folds every line item of every order into buckets chosen by `key_fn`.
pub fn aggregate<F>(
	orders: &[&Order],
	key_fn: F,
) -> BTreeMap<String, AggregateBucket>
where
	F: Fn(&Order, &LineItem) -> String,
{
	let mut accumulators: BTreeMap<String, BucketAccumulator> =
		BTreeMap::new();

	for &order in orders {
		for item in &order.items {
			accumulators
				.entry(key_fn(order, item))
				.or_insert_with(BucketAccumulator::new)
				.add(item);
		}
	}

	accumulators
		.into_iter()
		.map(|(k, acc)| (k, acc.finish()))
		.collect()
}

pub fn aggregate_by(
	orders: &[&Order],
	key: GroupKey,
) -> BTreeMap<String, AggregateBucket> {
	aggregate(orders, |order, item| key.key_for(order, item))
}

/// Sums the whole-group figures across buckets. Cost figures are carried
/// only when every bucket has them, by the same rule as a single bucket.
pub fn sum_buckets<'a>(
	buckets: impl IntoIterator<Item = &'a AggregateBucket>,
) -> AggregateBucket {
	let mut lines = 0;
	let (mut quantity, mut revenue, mut tax, mut cost) =
		(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
	let mut all_cost = true;

	for b in buckets {
		lines += b.lines;
		quantity += dec(b.quantity);
		revenue += dec(b.revenue);
		tax += dec(b.tax_total);
		match b.cost_total {
			Some(c) => cost += dec(c),
			None => all_cost = false,
		}
	}

	let mut total = AggregateBucket {
		lines,
		quantity: float(quantity),
		revenue: float(revenue),
		tax_total: float(tax),
		..Default::default()
	};

	if lines > 0 && all_cost {
		let profit = revenue - cost;
		total.cost_total = Some(float(cost));
		total.profit = Some(float(profit));
		total.cost_pct = percent_of(cost, revenue).map(float);
		total.profit_pct = percent_of(profit, revenue).map(float);
	}

	total
}

/// Highest revenue first, ties broken by key. Keeps the first `limit` if
/// one is given.
pub fn top_n(
	buckets: BTreeMap<String, AggregateBucket>,
	limit: Option<usize>,
) -> Vec<(String, AggregateBucket)> {
	let mut out: Vec<(String, AggregateBucket)> = buckets.into_iter().collect();
	out.sort_by(|(ka, a), (kb, b)| {
		b.revenue.total_cmp(&a.revenue).then_with(|| ka.cmp(kb))
	});
	if let Some(n) = limit {
		out.truncate(n);
	}
	out
}

/// Order-level figures, taken from each order's bills rather than its
/// items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderTotals {
	pub count: usize,
	pub revenue: f64,
	pub tax: f64,
	pub tip: f64,
	pub discount: f64,
	pub commission: f64,
}

impl OrderTotals {
	pub fn average_ticket(&self) -> f64 {
		if self.count == 0 {
			return 0.0;
		}
		float(dec(self.revenue) / Decimal::from(self.count))
	}
}

/// Guests served, from the customer snapshots that recorded a count.
pub fn guest_count(orders: &[&Order]) -> u32 {
	orders
		.iter()
		.filter_map(|o| o.customer_details.guests)
		.sum()
}

#[derive(Default)]
struct TotalsAccumulator {
	count: usize,
	revenue: Decimal,
	tax: Decimal,
	tip: Decimal,
	discount: Decimal,
	commission: Decimal,
}

impl TotalsAccumulator {
	fn add(&mut self, order: &Order) {
		self.count += 1;
		self.revenue += order.revenue();
		self.tax += dec(order.bills.tax);
		self.tip += dec(order.bills.tip);
		self.discount += dec(order.bills.discount);
		self.commission += order.commission();
	}

	fn finish(&self) -> OrderTotals {
		OrderTotals {
			count: self.count,
			revenue: float(self.revenue),
			tax: float(self.tax),
			tip: float(self.tip),
			discount: float(self.discount),
			commission: float(self.commission),
		}
	}
}

pub fn order_totals(orders: &[&Order]) -> OrderTotals {
	let mut acc = TotalsAccumulator::default();
	for &order in orders {
		acc.add(order);
	}
	acc.finish()
}

/// Order-level totals grouped by `key_fn`.
pub fn order_totals_by<K, F>(
	orders: &[&Order],
	key_fn: F,
) -> BTreeMap<K, OrderTotals>
where
	K: Ord,
	F: Fn(&Order) -> Option<K>,
{
	let mut groups: BTreeMap<K, TotalsAccumulator> = BTreeMap::new();
	for &order in orders {
		if let Some(key) = key_fn(order) {
			groups.entry(key).or_default().add(order);
		}
	}

	groups.into_iter().map(|(k, acc)| (k, acc.finish())).collect()
}

/// Totals for each local hour of the day, 0 through 23, including empty
/// hours. Orders without a readable timestamp are left out.
pub fn by_hour(orders: &[&Order]) -> Vec<(u32, OrderTotals)> {
	let grouped = order_totals_by(orders, |o| o.created().map(|t| t.hour()));
	(0..24)
		.map(|h| (h, grouped.get(&h).cloned().unwrap_or_default()))
		.collect()
}

/// Totals for each calendar day that has orders.
pub fn by_date(orders: &[&Order]) -> BTreeMap<NaiveDate, OrderTotals> {
	order_totals_by(orders, |o| o.created().map(|t| t.date()))
}

/// Totals for each day of the week, Monday first, including empty days.
pub fn by_weekday(orders: &[&Order]) -> Vec<(Weekday, OrderTotals)> {
	let grouped = order_totals_by(orders, |o| {
		o.created().map(|t| t.weekday().num_days_from_monday())
	});

	let mut day = Weekday::Mon;
	let mut out = Vec::with_capacity(7);
	for n in 0..7 {
		out.push((day, grouped.get(&n).cloned().unwrap_or_default()));
		day = day.succ();
	}
	out
}
