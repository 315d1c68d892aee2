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
use anyhow::{bail, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Where an order sits in the kitchen workflow. Orders move forward along
/// In Progress -> Ready -> Completed, and may be cancelled from any state
/// that is not terminal.
///
/// The backend and the various screens of the dashboard spell these
/// several ways, in English and Spanish; `parse` is the only place that
/// knows about those spellings and `label` is the only place that decides
/// how a status is shown.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderStatus {
	#[default]
	InProgress,
	Ready,
	Completed,
	Cancelled,
}

/// A step a user can request on an order's status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
	Advance,
	Back,
	Cancel,
}

impl Transition {
	pub fn from_str(s: &str) -> Result<Self, Error> {
		match s.trim().to_lowercase().as_str() {
			"advance" | "next" => Ok(Transition::Advance),
			"back" | "prev" => Ok(Transition::Back),
			"cancel" => Ok(Transition::Cancel),
			_ => bail!("unknown status action: {}", s),
		}
	}
}

impl OrderStatus {
	pub const ALL: [OrderStatus; 4] = [
		OrderStatus::InProgress,
		OrderStatus::Ready,
		OrderStatus::Completed,
		OrderStatus::Cancelled,
	];

	/// Accepts every spelling of a status seen from the backend or typed by
	/// a user. Matching ignores case, surrounding whitespace, underscores,
	/// hyphens and accents on the Spanish forms.
	pub fn parse(s: &str) -> Result<Self, Error> {
		let normalized: String = s
			.trim()
			.to_lowercase()
			.chars()
			.map(|c| match c {
				'_' | '-' => ' ',
				'á' => 'a',
				'é' => 'e',
				'í' => 'i',
				'ó' => 'o',
				'ú' => 'u',
				c => c,
			})
			.collect();

		match normalized.as_str() {
			"in progress" | "inprogress" | "en progreso" | "pending"
			| "pendiente" | "preparing" | "en preparacion" => {
				Ok(OrderStatus::InProgress)
			},
			"ready" | "listo" | "lista" => Ok(OrderStatus::Ready),
			"completed" | "complete" | "completado" | "completada"
			| "entregado" | "delivered" => Ok(OrderStatus::Completed),
			"cancelled" | "canceled" | "cancelado" | "cancelada"
			| "anulado" => Ok(OrderStatus::Cancelled),
			_ => bail!("unknown order status: {}", s),
		}
	}

	/// Canonical label, which is also the spelling the backend expects on
	/// updates.
	pub fn label(&self) -> &'static str {
		match self {
			OrderStatus::InProgress => "In Progress",
			OrderStatus::Ready => "Ready",
			OrderStatus::Completed => "Completed",
			OrderStatus::Cancelled => "Cancelled",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
	}

	pub fn advance(self) -> Result<Self, Error> {
		match self {
			OrderStatus::InProgress => Ok(OrderStatus::Ready),
			OrderStatus::Ready => Ok(OrderStatus::Completed),
			_ => bail!("cannot advance an order that is {}", self),
		}
	}

	pub fn back(self) -> Result<Self, Error> {
		match self {
			OrderStatus::Ready => Ok(OrderStatus::InProgress),
			_ => bail!("cannot move an order that is {} back", self),
		}
	}

	/// Cancelled is one-way; there is no transition out of it.
	pub fn cancel(self) -> Result<Self, Error> {
		if self.is_terminal() {
			bail!("cannot cancel an order that is {}", self);
		}
		Ok(OrderStatus::Cancelled)
	}

	pub fn apply(self, transition: Transition) -> Result<Self, Error> {
		match transition {
			Transition::Advance => self.advance(),
			Transition::Back => self.back(),
			Transition::Cancel => self.cancel(),
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.label())
	}
}

impl Serialize for OrderStatus {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.label())
	}
}

impl<'de> Deserialize<'de> for OrderStatus {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		OrderStatus::parse(&raw).map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_aliases() {
		assert_eq!(
			OrderStatus::parse("En Progreso").unwrap(),
			OrderStatus::InProgress
		);
		assert_eq!(
			OrderStatus::parse("in_progress").unwrap(),
			OrderStatus::InProgress
		);
		assert_eq!(OrderStatus::parse(" Listo ").unwrap(), OrderStatus::Ready);
		assert_eq!(
			OrderStatus::parse("Completado").unwrap(),
			OrderStatus::Completed
		);
		assert_eq!(
			OrderStatus::parse("canceled").unwrap(),
			OrderStatus::Cancelled
		);
		assert_eq!(
			OrderStatus::parse("En preparación").unwrap(),
			OrderStatus::InProgress
		);
		assert!(OrderStatus::parse("Lost").is_err());
	}

	#[test]
	fn test_label_round_trips_through_parse() {
		for status in OrderStatus::ALL {
			assert_eq!(OrderStatus::parse(status.label()).unwrap(), status);
		}
	}

	#[test]
	fn test_forward_sequence() {
		let ready = OrderStatus::InProgress.advance().unwrap();
		assert_eq!(ready, OrderStatus::Ready);
		let done = ready.advance().unwrap();
		assert_eq!(done, OrderStatus::Completed);
		assert!(done.advance().is_err());
	}

	#[test]
	fn test_back_only_from_ready() {
		assert_eq!(OrderStatus::Ready.back().unwrap(), OrderStatus::InProgress);
		assert!(OrderStatus::InProgress.back().is_err());
		assert!(OrderStatus::Completed.back().is_err());
	}

	#[test]
	fn test_cancel_is_terminal() {
		let cancelled = OrderStatus::Ready.cancel().unwrap();
		assert_eq!(cancelled, OrderStatus::Cancelled);
		for t in [Transition::Advance, Transition::Back, Transition::Cancel] {
			assert!(cancelled.apply(t).is_err());
		}
		assert!(OrderStatus::Completed.cancel().is_err());
	}

	#[test]
	fn test_serde_uses_canonical_label() {
		let json = serde_json::to_string(&OrderStatus::Ready).unwrap();
		assert_eq!(json, "\"Ready\"");
		let parsed: OrderStatus = serde_json::from_str("\"Cancelado\"").unwrap();
		assert_eq!(parsed, OrderStatus::Cancelled);
	}

	#[test]
	fn test_transition_from_str() {
		assert_eq!(Transition::from_str("Advance").unwrap(), Transition::Advance);
		assert_eq!(Transition::from_str("back").unwrap(), Transition::Back);
		assert!(Transition::from_str("resurrect").is_err());
	}
}
