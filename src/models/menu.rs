//! Menu item model and fixed-point prices.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Total digits allowed in a price (`DECIMAL(10, 2)`).
const MAX_DIGITS: usize = 10;
const DECIMAL_PLACES: usize = 2;

/// A non-negative amount with two decimal places, stored in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// Parse a price from a JSON string or number.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::String(s) => s.parse(),
            serde_json::Value::Number(n) => n.to_string().parse(),
            _ => Err("A valid number is required.".to_string()),
        }
    }
}

impl FromStr for Price {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || "A valid number is required.".to_string();
        let s = raw.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        if s.starts_with('-') {
            return Err("Ensure this value is greater than or equal to 0.".to_string());
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if (whole.is_empty() && frac.is_empty())
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole = whole.trim_start_matches('0');
        if frac.len() > DECIMAL_PLACES {
            return Err(format!(
                "Ensure that there are no more than {} decimal places.",
                DECIMAL_PLACES
            ));
        }
        if whole.len() > MAX_DIGITS - DECIMAL_PLACES {
            return Err(format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                MAX_DIGITS - DECIMAL_PLACES
            ));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut frac_cents: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| invalid())?
        };
        if frac.len() == 1 {
            frac_cents *= 10;
        }

        Ok(Self(whole * 100 + frac_cents))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Price::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// A dish on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct MenuItem {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub price: Price,
    pub inventory: i32,
}

/// Fields needed to create a menu item.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub title: String,
    pub price: Price,
    pub inventory: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_prices() {
        assert_eq!("12.50".parse::<Price>().unwrap().cents(), 1250);
        assert_eq!("12.5".parse::<Price>().unwrap().cents(), 1250);
        assert_eq!("7".parse::<Price>().unwrap().cents(), 700);
        assert_eq!(".99".parse::<Price>().unwrap().cents(), 99);
        assert_eq!("0007.05".parse::<Price>().unwrap().cents(), 705);
        assert_eq!("99999999.99".parse::<Price>().unwrap().cents(), 9_999_999_999);
    }

    #[test]
    fn test_reject_bad_prices() {
        assert!("".parse::<Price>().is_err());
        assert!(".".parse::<Price>().is_err());
        assert!("abc".parse::<Price>().is_err());
        assert!("1e3".parse::<Price>().is_err());
        assert!("-1.00".parse::<Price>().unwrap_err().contains("greater than or equal to 0"));
        assert!("1.999".parse::<Price>().unwrap_err().contains("2 decimal places"));
        assert!("123456789".parse::<Price>().unwrap_err().contains("8 digits"));
    }

    #[test]
    fn test_display_and_json() {
        assert_eq!(Price::from_cents(1250).to_string(), "12.50");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert_eq!(Price::from_json(&json!(8.5)).unwrap(), Price::from_cents(850));
        assert_eq!(Price::from_json(&json!("3.10")).unwrap(), Price::from_cents(310));
        assert!(Price::from_json(&json!(null)).is_err());

        let item = MenuItem {
            id: 1,
            title: "Greek Salad".to_string(),
            price: Price::from_cents(1250),
            inventory: 10,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"id": 1, "title": "Greek Salad", "price": "12.50", "inventory": 10})
        );
    }
}
