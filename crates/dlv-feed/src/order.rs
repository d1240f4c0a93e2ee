//! Canonical order record.
//!
//! An [`Order`] is only ever materialized from upstream JSON through
//! [`Order::from_value`]; the parser and the normalizer are its only callers.
//! Upstream sources disagree on casing, numeric encoding and field naming, so
//! materialization is lenient about shape and strict about values.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Status label
// ---------------------------------------------------------------------------

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_IN_TRANSIT: &str = "in_transit";
pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

/// Lifecycle label as emitted upstream.
///
/// The label set is open: unknown labels are carried through untouched.
/// Casing is preserved for display; [`StatusLabel::same_as`] is
/// the comparison reconciliation uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusLabel(String);

impl StatusLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// ASCII case-insensitive equality (`"Pending"` == `"pending"`).
    pub fn same_as(&self, other: &StatusLabel) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }

    pub fn tier(&self) -> StatusTier {
        match self.0.trim().to_ascii_lowercase().as_str() {
            STATUS_PENDING => StatusTier::Warning,
            STATUS_DELIVERED | STATUS_COMPLETED => StatusTier::Success,
            STATUS_CANCELLED => StatusTier::Error,
            STATUS_IN_TRANSIT | STATUS_PROCESSING => StatusTier::Info,
            _ => StatusTier::Neutral,
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatusLabel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Display severity derived from a [`StatusLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    Warning,
    Success,
    Error,
    Info,
    Neutral,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a JSON value could not be materialized as an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    NotAnObject,
    InvalidField { field: &'static str, raw: String },
    InvalidPrice { raw: String },
    NegativePrice { raw: String },
    NegativeQuantity(i64),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::NotAnObject => write!(f, "order payload is not a JSON object"),
            OrderError::InvalidField { field, raw } => {
                write!(f, "order field '{field}' has an invalid value: {raw}")
            }
            OrderError::InvalidPrice { raw } => {
                write!(f, "total_price could not be parsed: '{raw}'")
            }
            OrderError::NegativePrice { raw } => {
                write!(f, "total_price must be >= 0, got '{raw}'")
            }
            OrderError::NegativeQuantity(q) => write!(f, "quantity must be >= 0, got {q}"),
        }
    }
}

impl std::error::Error for OrderError {}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Canonical order record. Two orders are the same entity iff `id` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    id: i64,
    client_id: i64,
    product_id: i64,
    quantity: i64,
    #[serde(rename = "total_price", serialize_with = "price::serialize")]
    total_price_micros: i64,
    status: StatusLabel,
}

impl Order {
    /// Materialize an order from an upstream JSON object.
    ///
    /// - snake_case keys are canonical; camelCase aliases are accepted
    /// - integers may arrive as numbers or numeric strings
    /// - `total_price` may be a number or a decimal string
    /// - a missing `id` yields the sentinel `0`; callers decide whether to keep it
    /// - other missing fields default to `0` / empty status
    pub fn from_value(v: &Value) -> Result<Order, OrderError> {
        let obj = v.as_object().ok_or(OrderError::NotAnObject)?;

        let quantity = int_field(obj, "quantity", "quantity")?;
        if quantity < 0 {
            return Err(OrderError::NegativeQuantity(quantity));
        }

        Ok(Order {
            id: int_field(obj, "id", "id")?,
            client_id: int_field(obj, "client_id", "clientId")?,
            product_id: int_field(obj, "product_id", "productId")?,
            quantity,
            total_price_micros: price_field(obj)?,
            status: status_field(obj)?,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn client_id(&self) -> i64 {
        self.client_id
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn total_price_micros(&self) -> i64 {
        self.total_price_micros
    }

    pub fn status(&self) -> &StatusLabel {
        &self.status
    }

    /// `true` for the `id == 0` record the feed uses as a placeholder.
    pub fn is_sentinel(&self) -> bool {
        self.id == 0
    }

    /// Copy of this order carrying a different status label.
    pub fn with_status(&self, status: StatusLabel) -> Order {
        Order {
            status,
            ..self.clone()
        }
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, snake: &str, camel: &str) -> Option<&'a Value> {
    obj.get(snake)
        .or_else(|| obj.get(camel))
        .filter(|v| !v.is_null())
}

fn int_field(
    obj: &Map<String, Value>,
    snake: &'static str,
    camel: &str,
) -> Result<i64, OrderError> {
    let invalid = |v: &Value| OrderError::InvalidField {
        field: snake,
        raw: v.to_string(),
    };
    match lookup(obj, snake, camel) {
        None => Ok(0),
        Some(v @ Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

fn price_field(obj: &Map<String, Value>) -> Result<i64, OrderError> {
    match lookup(obj, "total_price", "totalPrice") {
        None => Ok(0),
        Some(Value::Number(n)) => price::number_to_micros(n),
        Some(Value::String(s)) => price::to_micros(s),
        Some(v) => Err(OrderError::InvalidPrice { raw: v.to_string() }),
    }
}

fn status_field(obj: &Map<String, Value>) -> Result<StatusLabel, OrderError> {
    match lookup(obj, "status", "status") {
        None => Ok(StatusLabel::new("")),
        Some(Value::String(s)) => Ok(StatusLabel::new(s.as_str())),
        Some(v) => Err(OrderError::InvalidField {
            field: "status",
            raw: v.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Price conversion
// ---------------------------------------------------------------------------

/// Decimal prices as integer micros (1 unit = 1_000_000 micros).
pub mod price {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::{Number, Value};

    use super::OrderError;

    pub const MICROS_SCALE: i64 = 1_000_000;

    /// Convert a non-negative decimal string to micros without floating point.
    ///
    /// Accepts an optional leading `+` and an optional fractional part. Digits
    /// past the sixth decimal place are rounded half away from zero.
    pub fn to_micros(raw: &str) -> Result<i64, OrderError> {
        let s = raw.trim();
        let invalid = || OrderError::InvalidPrice { raw: s.to_string() };

        if s.starts_with('-') {
            return Err(OrderError::NegativePrice { raw: s.to_string() });
        }
        let digits = s.strip_prefix('+').unwrap_or(s);
        if digits.is_empty() {
            return Err(invalid());
        }

        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(invalid());
        }

        let (kept, rest) = frac_part.split_at(frac_part.len().min(6));
        let round_up = rest.as_bytes().first().is_some_and(|d| *d >= b'5');

        let int_val: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac_val: i64 = format!("{kept:0<6}").parse().map_err(|_| invalid())?;

        int_val
            .checked_mul(MICROS_SCALE)
            .and_then(|v| v.checked_add(frac_val))
            .and_then(|v| v.checked_add(i64::from(round_up)))
            .ok_or_else(invalid)
    }

    /// Convert a JSON number to micros.
    ///
    /// Integers convert exactly. Floats are scaled and rounded half away from
    /// zero, so float-arithmetic totals such as `0.30000000000000004` land on
    /// the nearest micro instead of being rejected.
    pub fn number_to_micros(n: &Number) -> Result<i64, OrderError> {
        let invalid = || OrderError::InvalidPrice { raw: n.to_string() };

        if let Some(i) = n.as_i64() {
            if i < 0 {
                return Err(OrderError::NegativePrice { raw: n.to_string() });
            }
            return i.checked_mul(MICROS_SCALE).ok_or_else(invalid);
        }

        let f = n.as_f64().ok_or_else(invalid)?;
        if !f.is_finite() {
            return Err(invalid());
        }
        if f < 0.0 {
            return Err(OrderError::NegativePrice { raw: n.to_string() });
        }
        let scaled = (f * MICROS_SCALE as f64).round();
        if scaled >= i64::MAX as f64 {
            return Err(invalid());
        }
        Ok(scaled as i64)
    }

    pub fn serialize<S: Serializer>(micros: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(*micros as f64 / MICROS_SCALE as f64)
    }

    /// Accepts a JSON number or a decimal string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => number_to_micros(&n).map_err(de::Error::custom),
            Value::String(s) => to_micros(&s).map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "total_price must be a number or decimal string, got {other}"
            ))),
        }
    }
}
