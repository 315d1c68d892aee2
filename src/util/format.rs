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
use crate::util::money::dec;
use chrono::Weekday;
use rust_decimal::RoundingStrategy;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "RD$";

/// Renders a money value with two decimals and comma-grouped thousands,
/// e.g. `RD$1,234.50` or `-RD$12.00`. Halves round away from zero.
pub fn currency(value: f64, symbol: &str) -> String {
	let rounded = dec(value)
		.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
	let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
		"-"
	} else {
		""
	};

	let digits = format!("{:.2}", rounded.abs());
	let (whole, fraction) =
		digits.split_once('.').unwrap_or((digits.as_str(), "00"));

	format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

/// One decimal place and a percent sign. `None` means the figure does not
/// apply, e.g. a margin with incomplete cost data.
pub fn percent(value: Option<f64>) -> String {
	match value {
		Some(v) => format!("{:.1}%", v),
		None => "N/A".to_string(),
	}
}

/// Same as `currency` but for optional figures.
pub fn optional_currency(value: Option<f64>, symbol: &str) -> String {
	match value {
		Some(v) => currency(v, symbol),
		None => "N/A".to_string(),
	}
}

/// The last six characters of an id, upper-cased, as shown on tickets.
pub fn short_id(id: &str) -> String {
	let chars: Vec<char> = id.chars().collect();
	let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
	format!("#{}", tail.to_uppercase())
}

/// Whole quantities print bare; items sold by weight keep up to three
/// decimals.
pub fn quantity(value: f64) -> String {
	if value.fract() == 0.0 {
		return format!("{:.0}", value);
	}

	let out = format!("{:.3}", value);
	out.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn weekday_name(day: Weekday) -> &'static str {
	match day {
		Weekday::Mon => "Monday",
		Weekday::Tue => "Tuesday",
		Weekday::Wed => "Wednesday",
		Weekday::Thu => "Thursday",
		Weekday::Fri => "Friday",
		Weekday::Sat => "Saturday",
		Weekday::Sun => "Sunday",
	}
}

fn group_thousands(digits: &str) -> String {
	let mut out = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, c) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			out.push(',');
		}
		out.push(c);
	}
	out
}
