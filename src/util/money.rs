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
//! Conversions between the `f64` values the backend sends and the `Decimal`
//! values every sum is carried out in. Nothing is accumulated as a float.

use rust_decimal::prelude::*;

/// Converts a wire value into a decimal. Non-finite values become zero.
pub fn dec(value: f64) -> Decimal {
	Decimal::from_f64(value).unwrap_or_default()
}

/// Converts a decimal back into a wire value.
pub fn float(value: Decimal) -> f64 {
	value.to_f64().unwrap_or_default()
}

/// `part / whole * 100`, or zero when there is no whole to speak of.
/// `None` when the ratio is too large to represent, e.g. a real cost over
/// a revenue of a fraction of a cent.
pub fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
	if whole.is_zero() {
		return Some(Decimal::ZERO);
	}
	part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_dec_rejects_non_finite() {
		assert_eq!(dec(f64::NAN), Decimal::ZERO);
		assert_eq!(dec(f64::INFINITY), Decimal::ZERO);
	}

	#[test]
	fn test_decimal_sums_do_not_drift() {
		let total: Decimal = (0..10).map(|_| dec(0.1)).sum();
		assert_eq!(float(total), 1.0);
	}

	#[test]
	fn test_percent_of_zero_whole() {
		assert_eq!(percent_of(dec(5.0), Decimal::ZERO), Some(Decimal::ZERO));
		assert_eq!(percent_of(dec(8.0), dec(20.0)).map(float), Some(40.0));
	}

	#[test]
	fn test_percent_of_tiny_whole_does_not_overflow() {
		let tiny = Decimal::new(1, 28);
		assert_eq!(percent_of(dec(1_000_000.0), tiny), None);
	}
}
