use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// --- Search request ---

/// Body of `POST /api/rooms/search`. Dates are epoch milliseconds (UTC midnight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    pub check_in: i64,
    pub check_out: i64,
    pub adults: u32,
    pub children: u32,
}

const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

impl BookingQuery {
    /// Whole nights between check-in and check-out (floor division).
    /// `None` when the span does not fit in an i64.
    pub fn nights(&self) -> Option<i64> {
        self.check_out
            .checked_sub(self.check_in)
            .map(|span| span.div_euclid(MS_PER_DAY))
    }
}

// --- Search response ---
//
// One odd record must not sink the whole response, so everything except the
// price amount is decoded leniently: a value of the wrong shape reads as absent.

/// Decode a field, falling back to its default when the JSON has another shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// JSON truthiness: null, false, 0, "" and empty containers are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| is_truthy(&v))
}

/// Text for an optional display-only detail; `None` when absent or falsy.
pub fn detail_text(value: Option<&Value>) -> Option<String> {
    value.filter(|v| is_truthy(v)).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// One entry of the search response array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(PartialEq))]
pub struct RoomAvailability {
    #[serde(default, deserialize_with = "truthy")]
    pub sold_out: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub room: Room,
}

impl RoomAvailability {
    pub fn name(&self) -> &str {
        &self.room.name
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(PartialEq))]
pub struct Room {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<Price>,
    #[serde(default)]
    pub max_persons: Option<Value>,
    #[serde(default)]
    pub size: Option<Value>,
    #[serde(default)]
    pub room_id: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Price {
    pub amount: PriceAmount,
    #[serde(default, deserialize_with = "lenient")]
    pub currency: String,
}

/// The provider sends the nightly amount either as a JSON string or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[cfg_attr(test, derive(PartialEq))]
pub enum PriceAmount {
    Number(serde_json::Number),
    Text(String),
}

impl PriceAmount {
    /// Whole-unit amount, if the value reads as an integer.
    /// Strings must be a plain (optionally signed) integer; numbers are truncated toward zero.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PriceAmount::Text(s) => s.trim().parse::<i64>().ok(),
            PriceAmount::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
        }
    }
}

impl fmt::Display for PriceAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceAmount::Number(n) => write!(f, "{}", n),
            PriceAmount::Text(s) => write!(f, "{}", s),
        }
    }
}
