//! Work breakdown structure items and their totals.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, digits::parse_number, entity::de};

/// One line of a contract's work breakdown structure.
///
/// `total_price` is never stored on the client; it is always
/// `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbsItem {
  #[serde(default)]
  pub description: String,
  #[serde(default, deserialize_with = "de::number")]
  pub quantity:    f64,
  #[serde(default)]
  pub unit:        String,
  #[serde(default, deserialize_with = "de::number")]
  pub unit_price:  f64,
}

impl WbsItem {
  pub fn total_price(&self) -> f64 { self.quantity * self.unit_price }

  /// Every field filled in and both amounts strictly positive.
  pub fn is_complete(&self) -> bool {
    !self.description.trim().is_empty()
      && !self.unit.trim().is_empty()
      && self.quantity > 0.0
      && self.unit_price > 0.0
  }
}

impl FromStr for WbsItem {
  type Err = Error;

  /// Parses `description;quantity;unit;unit_price`. Numbers may use any
  /// digit script and grouping separators.
  fn from_str(s: &str) -> Result<Self> {
    let malformed = || Error::MalformedWbsItem(s.to_string());
    let parts: Vec<&str> = s.split(';').map(str::trim).collect();
    let [description, quantity, unit, unit_price] = parts.as_slice() else {
      return Err(malformed());
    };
    Ok(WbsItem {
      description: description.to_string(),
      quantity:    parse_number(quantity).ok_or_else(malformed)?,
      unit:        unit.to_string(),
      unit_price:  parse_number(unit_price).ok_or_else(malformed)?,
    })
  }
}

/// Running totals shown under the item table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WbsTotals {
  pub items:          usize,
  pub total_quantity: f64,
  pub total_amount:   f64,
  /// Plain mean of the unit prices, zero without items.
  pub avg_unit_price: f64,
}

impl WbsTotals {
  pub fn compute(items: &[WbsItem]) -> Self {
    let mut totals = Self {
      items: items.len(),
      ..Self::default()
    };
    let mut prices = 0.0;
    for item in items {
      totals.total_quantity += item.quantity;
      totals.total_amount += item.total_price();
      prices += item.unit_price;
    }
    if !items.is_empty() {
      totals.avg_unit_price = prices / items.len() as f64;
    }
    totals
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn item(description: &str, quantity: f64, unit: &str, unit_price: f64) -> WbsItem {
    WbsItem {
      description: description.into(),
      quantity,
      unit: unit.into(),
      unit_price,
    }
  }

  #[test]
  fn totals() {
    let items = vec![item("بتن", 10.0, "m3", 500.0), item("میلگرد", 2.0, "ton", 1500.0)];
    let totals = WbsTotals::compute(&items);
    assert_eq!(totals.items, 2);
    assert_eq!(totals.total_quantity, 12.0);
    assert_eq!(totals.total_amount, 8000.0);
    assert_eq!(totals.avg_unit_price, 1000.0);
    assert_eq!(WbsTotals::compute(&[]), WbsTotals::default());
  }

  #[test]
  fn parses_cli_item() {
    let parsed: WbsItem = "خاکبرداری; ۱۲۰ ; m3 ; 45,000".parse().unwrap();
    assert_eq!(parsed, item("خاکبرداری", 120.0, "m3", 45_000.0));
    assert_eq!(parsed.total_price(), 5_400_000.0);

    assert!(matches!("a;1;m".parse::<WbsItem>(), Err(Error::MalformedWbsItem(_))));
    assert!("a;x;m;1".parse::<WbsItem>().is_err());
  }

  #[test]
  fn completeness() {
    assert!(item("a", 1.0, "m", 1.0).is_complete());
    assert!(!item(" ", 1.0, "m", 1.0).is_complete());
    assert!(!item("a", 0.0, "m", 1.0).is_complete());
    assert!(!item("a", 1.0, "", 1.0).is_complete());
    assert!(!item("a", 1.0, "m", -3.0).is_complete());
  }

  #[test]
  fn decimal_strings_from_the_backend() {
    let parsed: WbsItem = serde_json::from_value(json!({
      "description": "قالب‌بندی",
      "unit": "m2",
      "quantity": "12.5000",
      "unit_price": "800.0000",
      "total_price": "10000.00"
    }))
    .unwrap();
    assert_eq!(parsed.total_price(), 10_000.0);
  }
}
