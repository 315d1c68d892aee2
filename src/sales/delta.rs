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

/// Period-over-period change, ready to print next to a metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta {
	pub text: String,
	pub up: bool,
}

/// Anything closer to zero than this is treated as zero.
const EPSILON: f64 = 1e-9;

/// Percent change from `previous` to `current`, one decimal place, always
/// signed. Growth from nothing is reported as +100% rather than dividing by
/// zero.
pub fn delta(current: f64, previous: f64) -> Delta {
	let current_zero = current.abs() < EPSILON;
	let previous_zero = previous.abs() < EPSILON;

	if current_zero && previous_zero {
		return Delta {
			text: "0%".to_string(),
			up: true,
		};
	}

	if previous_zero {
		return Delta {
			text: "+100%".to_string(),
			up: true,
		};
	}

	let pct = (current - previous) / previous * 100.0;
	let up = pct >= 0.0;
	let text = if up {
		format!("+{:.1}%", pct)
	} else {
		format!("-{:.1}%", pct.abs())
	};

	Delta { text, up }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_both_zero() {
		assert_eq!(
			delta(0.0, 0.0),
			Delta {
				text: "0%".to_string(),
				up: true
			}
		);
	}

	#[test]
	fn test_growth_from_zero() {
		assert_eq!(
			delta(50.0, 0.0),
			Delta {
				text: "+100%".to_string(),
				up: true
			}
		);
	}

	#[test]
	fn test_growth() {
		let d = delta(150.0, 100.0);
		assert_eq!(d.text, "+50.0%");
		assert!(d.up);
	}

	#[test]
	fn test_decline() {
		let d = delta(50.0, 100.0);
		assert_eq!(d.text, "-50.0%");
		assert!(!d.up);

		let gone = delta(0.0, 80.0);
		assert_eq!(gone.text, "-100.0%");
		assert!(!gone.up);
	}

	#[test]
	fn test_flat_is_up_with_plus_sign() {
		let d = delta(42.0, 42.0);
		assert_eq!(d.text, "+0.0%");
		assert!(d.up);
	}

	#[test]
	fn test_rounds_to_one_decimal() {
		assert_eq!(delta(2.0, 3.0).text, "-33.3%");
		assert_eq!(delta(4.0, 3.0).text, "+33.3%");
	}
}
