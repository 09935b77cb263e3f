//! Property declarations for node and relationship types
//!
//! A [`Property`] is a kind plus two flags (`nullable`, `array`), giving the
//! 9 × 2 × 2 = 36 declarable variants. It also validates and coerces values
//! of its kind, both on the way into the store and on the way back out.

use super::value::{Duration, Point, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scalar kind of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Duration,
    LocalTime,
    Date,
    LocalDateTime,
    DateTime,
    Point,
}

impl PropertyType {
    pub const ALL: [PropertyType; 9] = [
        PropertyType::String,
        PropertyType::Number,
        PropertyType::Boolean,
        PropertyType::Duration,
        PropertyType::LocalTime,
        PropertyType::Date,
        PropertyType::LocalDateTime,
        PropertyType::DateTime,
        PropertyType::Point,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Duration => "duration",
            PropertyType::LocalTime => "localTime",
            PropertyType::Date => "date",
            PropertyType::LocalDateTime => "localDateTime",
            PropertyType::DateTime => "dateTime",
            PropertyType::Point => "point",
        }
    }

    /// Kinds that support `<`, `>`, `<=`, `>=`. Neo4j compares durations to null.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, PropertyType::Boolean | PropertyType::Point | PropertyType::Duration)
    }

    fn coerce_scalar(&self, value: Value) -> Result<Value, String> {
        let mismatch = |v: &Value| format!("expected {}, got {}", self.name(), v.type_name());
        match (self, value) {
            (PropertyType::String, v @ Value::String(_)) => Ok(v),
            (PropertyType::Number, v @ (Value::Integer(_) | Value::Float(_))) => Ok(v),
            (PropertyType::Number, v) => integer_like(&v).map(Value::Integer).ok_or_else(|| mismatch(&v)),
            (PropertyType::Boolean, v @ Value::Boolean(_)) => Ok(v),
            (PropertyType::Duration, v @ Value::Duration(_)) => Ok(v),
            (PropertyType::Duration, Value::String(s)) => Duration::parse_iso8601(&s)
                .map(Value::Duration)
                .ok_or_else(|| format!("invalid duration '{}'", s)),
            (PropertyType::LocalTime, v @ Value::LocalTime(_)) => Ok(v),
            (PropertyType::LocalTime, Value::String(s)) => NaiveTime::from_str(&s)
                .map(Value::LocalTime)
                .map_err(|e| format!("invalid localTime '{}': {}", s, e)),
            (PropertyType::Date, v @ Value::Date(_)) => Ok(v),
            (PropertyType::Date, Value::String(s)) => NaiveDate::from_str(&s)
                .map(Value::Date)
                .map_err(|e| format!("invalid date '{}': {}", s, e)),
            (PropertyType::LocalDateTime, v @ Value::LocalDateTime(_)) => Ok(v),
            (PropertyType::LocalDateTime, Value::String(s)) => NaiveDateTime::from_str(&s)
                .map(Value::LocalDateTime)
                .map_err(|e| format!("invalid localDateTime '{}': {}", s, e)),
            (PropertyType::DateTime, v @ Value::DateTime(_)) => Ok(v),
            (PropertyType::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(&s)
                .map(Value::DateTime)
                .map_err(|e| format!("invalid dateTime '{}': {}", s, e)),
            (PropertyType::Point, v @ Value::Point(_)) => Ok(v),
            (PropertyType::Point, Value::Map(map)) => {
                let coord = |key: &str| map.get(key).and_then(Value::as_float);
                match (coord("x"), coord("y")) {
                    (Some(x), Some(y)) => Ok(Value::Point(Point {
                        srid: map.get("srid").and_then(integer_like).unwrap_or(7203),
                        x,
                        y,
                        z: coord("z"),
                    })),
                    _ => Err("point maps need numeric 'x' and 'y'".to_string()),
                }
            }
            (_, v) => Err(mismatch(&v)),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown property type '{}'", s))
    }
}

/// Read an integer out of the shapes drivers use for wide integers:
/// native integers, integral floats and `{low, high}` 32-bit halves.
pub fn integer_like(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() && f.abs() < 9.007_199_254_740_992e15 => {
            Some(*f as i64)
        }
        Value::Map(map) if map.len() == 2 => {
            let low = map.get("low")?.as_integer()?;
            let high = map.get("high")?.as_integer()?;
            Some((high << 32) | (low as u32 as i64))
        }
        _ => None,
    }
}

/// Declared property of a node or relationship type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PropertySpec", into = "PropertySpec")]
pub struct Property {
    pub property_type: PropertyType,
    pub nullable: bool,
    pub array: bool,
}

impl Property {
    pub fn new(property_type: PropertyType) -> Self {
        Self { property_type, nullable: false, array: false }
    }

    pub fn string() -> Self {
        Self::new(PropertyType::String)
    }

    pub fn number() -> Self {
        Self::new(PropertyType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(PropertyType::Boolean)
    }

    pub fn duration() -> Self {
        Self::new(PropertyType::Duration)
    }

    pub fn local_time() -> Self {
        Self::new(PropertyType::LocalTime)
    }

    pub fn date() -> Self {
        Self::new(PropertyType::Date)
    }

    pub fn local_date_time() -> Self {
        Self::new(PropertyType::LocalDateTime)
    }

    pub fn date_time() -> Self {
        Self::new(PropertyType::DateTime)
    }

    pub fn point() -> Self {
        Self::new(PropertyType::Point)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Check `value` against this declaration, returning it in canonical form.
    ///
    /// ISO-8601 strings are accepted for temporal kinds, `{x, y}` maps for
    /// points, and wide-integer encodings for numbers.
    pub fn coerce(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::Null if self.nullable => Ok(Value::Null),
            Value::Null => Err(format!("null is not allowed for non-nullable {}", self)),
            Value::List(items) if self.array => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    self.property_type
                        .coerce_scalar(item)
                        .map_err(|e| format!("element {}: {}", i, e))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other if self.array => Err(format!("expected {}, got {}", self, other.type_name())),
            other => self.property_type.coerce_scalar(other),
        }
    }

    /// Coerce one element of an array property (used for membership tests).
    pub fn coerce_element(&self, value: Value) -> Result<Value, String> {
        self.property_type.coerce_scalar(value)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.property_type)?;
        if self.array {
            write!(f, "[]")?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Shorthand: `string`, `number?`, `string[]`, `date[]?`
impl FromStr for Property {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (s, nullable) = match s.strip_suffix('?') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let (s, array) = match s.strip_suffix("[]") {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        Ok(Property { property_type: s.parse()?, nullable, array })
    }
}

/// Document form of a property: either the shorthand string or a table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertySpec {
    Short(String),
    Full {
        #[serde(rename = "type")]
        property_type: PropertyType,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        array: bool,
    },
}

impl TryFrom<PropertySpec> for Property {
    type Error = String;

    fn try_from(spec: PropertySpec) -> Result<Self, Self::Error> {
        match spec {
            PropertySpec::Short(s) => s.parse(),
            PropertySpec::Full { property_type, nullable, array } => {
                Ok(Property { property_type, nullable, array })
            }
        }
    }
}

impl From<Property> for PropertySpec {
    fn from(p: Property) -> Self {
        PropertySpec::Short(p.to_string())
    }
}
