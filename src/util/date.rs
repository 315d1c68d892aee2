/* Copyright © 2024-2025 Adam Train <adam@adamtrain.net>
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

use anyhow::{bail, Error};
use chrono::{
	DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime,
};
use std::fmt;

/// Named reporting periods offered by the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
	All,
	Today,
	Last7,
	ThisMonth,
	LastMonth,
}

impl Period {
	pub fn from_str(s: &str) -> Result<Self, Error> {
		match s {
			"all" => Ok(Period::All),
			"today" => Ok(Period::Today),
			"last7" => Ok(Period::Last7),
			"this-month" | "thisMonth" => Ok(Period::ThisMonth),
			"last-month" | "lastMonth" => Ok(Period::LastMonth),
			_ => bail!("unknown period: {}", s),
		}
	}
}

/// A span of local time used to select orders. Bounded windows are always
/// half-open, `[start, end)`, and always have `end > start`; every window
/// this module resolves is aligned to midnight on both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateWindow {
	Unbounded,
	Bounded {
		start: NaiveDateTime,
		end: NaiveDateTime,
	},
}

impl DateWindow {
	/// Resolves a named period as seen on the given local date.
	pub fn for_period(period: Period, today: NaiveDate) -> DateWindow {
		let tomorrow = next_day(today);
		match period {
			Period::All => DateWindow::Unbounded,
			Period::Today => DateWindow::days(today, tomorrow),
			// seven calendar days, today included
			Period::Last7 => DateWindow::days(today - Days::new(6), tomorrow),
			Period::ThisMonth => {
				DateWindow::days(first_of_month(today), tomorrow)
			},
			Period::LastMonth => {
				let end = first_of_month(today);
				let start = first_of_month(end - Days::new(1));
				DateWindow::days(start, end)
			},
		}
	}

	/// Resolves user-picked calendar dates. The `to` day is covered in full.
	/// Reversed dates are swapped, a single date means that one day, and no
	/// dates at all means today.
	pub fn from_dates(
		from: Option<NaiveDate>,
		to: Option<NaiveDate>,
		today: NaiveDate,
	) -> DateWindow {
		let (from, to) = match (from, to) {
			(Some(f), Some(t)) => (f.min(t), f.max(t)),
			(Some(f), None) => (f, f),
			(None, Some(t)) => (t, t),
			(None, None) => (today, today),
		};

		DateWindow::days(from, next_day(to))
	}

	/// Midnight of `from` up to, not including, midnight of `until`.
	fn days(from: NaiveDate, until: NaiveDate) -> DateWindow {
		DateWindow::Bounded {
			start: midnight(from),
			end: midnight(until),
		}
	}

	/// The window of identical length that ends where this one starts.
	/// Unbounded windows have nothing before them.
	pub fn preceding(&self) -> Option<DateWindow> {
		match self {
			DateWindow::Unbounded => None,
			DateWindow::Bounded { start, end } => {
				let length = *end - *start;
				Some(DateWindow::Bounded {
					start: *start - length,
					end: *start,
				})
			},
		}
	}

	/// Whether a timestamp falls inside the window. A missing timestamp
	/// (one that could not be parsed) only matches the unbounded window.
	pub fn contains(&self, t: Option<NaiveDateTime>) -> bool {
		match (self, t) {
			(DateWindow::Unbounded, _) => true,
			(DateWindow::Bounded { start, end }, Some(t)) => {
				*start <= t && t < *end
			},
			(DateWindow::Bounded { .. }, None) => false,
		}
	}

	/// First and last calendar day covered, for APIs that take inclusive
	/// date parameters.
	pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
		match self {
			DateWindow::Unbounded => None,
			DateWindow::Bounded { start, end } => Some((
				start.date(),
				(*end - chrono::Duration::milliseconds(1)).date(),
			)),
		}
	}
}

impl fmt::Display for DateWindow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.date_span() {
			None => write!(f, "all time"),
			Some((first, last)) if first == last => write!(f, "{}", first),
			Some((first, last)) => write!(f, "{} to {}", first, last),
		}
	}
}

/// Parses a calendar date given as "YYYY-MM-DD".
pub fn parse_date(date_str: &str) -> Result<NaiveDate, Error> {
	match NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") {
		Ok(d) => Ok(d),
		Err(_) => bail!("Date format must be YYYY-MM-DD: {}", date_str),
	}
}

/// Reads an order timestamp as a local wall-clock time. Accepts RFC 3339
/// with an offset (converted to local time), naive date-times (taken as
/// already local) and bare dates (midnight). Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
	let raw = raw.trim();
	if raw.is_empty() {
		return None;
	}

	if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
		return Some(dt.with_timezone(&Local).naive_local());
	}

	for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
		if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
			return Some(dt);
		}
	}

	NaiveDate::parse_from_str(raw, "%Y-%m-%d")
		.ok()
		.map(midnight)
}

pub fn today() -> NaiveDate {
	Local::now().date_naive()
}

fn midnight(d: NaiveDate) -> NaiveDateTime {
	d.and_time(NaiveTime::MIN)
}

fn next_day(d: NaiveDate) -> NaiveDate {
	d.succ_opt().unwrap_or(NaiveDate::MAX)
}

fn first_of_month(d: NaiveDate) -> NaiveDate {
	d - Days::new(u64::from(d.day0()))
}
