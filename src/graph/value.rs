//! Runtime values for properties, query parameters and decoded rows
//!
//! One value tree flows in both directions: callers put values into conditions
//! and commands, and the driver hands decoded rows back in the same form.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Ordered property map; entry order is the order the caller provided.
pub type PropertyMap = IndexMap<String, Value>;

/// Duration with the same components the store keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i32,
}

impl Duration {
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i32) -> Self {
        Self { months, days, seconds, nanoseconds }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, ..Self::default() }
    }

    /// Parse an ISO-8601 duration such as `P1M2DT3H4M5.5S`.
    ///
    /// Returns `None` for malformed input and for components that overflow.
    pub fn parse_iso8601(input: &str) -> Option<Self> {
        let rest = input.strip_prefix('P')?;
        let (date_part, time_part) = match rest.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (rest, None),
        };

        let mut duration = Duration::default();
        let mut number = String::new();
        for c in date_part.chars() {
            match c {
                '0'..='9' | '-' => number.push(c),
                'Y' => duration.months = add_scaled(duration.months, &number, 12)?,
                'M' => duration.months = add_scaled(duration.months, &number, 1)?,
                'W' => duration.days = add_scaled(duration.days, &number, 7)?,
                'D' => duration.days = add_scaled(duration.days, &number, 1)?,
                _ => return None,
            }
            if c.is_ascii_alphabetic() {
                number.clear();
            }
        }
        if !number.is_empty() {
            return None;
        }

        if let Some(time_part) = time_part {
            for c in time_part.chars() {
                match c {
                    '0'..='9' | '-' | '.' => number.push(c),
                    'H' => duration.seconds = add_scaled(duration.seconds, &number, 3600)?,
                    'M' => duration.seconds = add_scaled(duration.seconds, &number, 60)?,
                    'S' => {
                        let secs: f64 = number.parse().ok()?;
                        if !secs.is_finite() || secs.abs() >= i64::MAX as f64 {
                            return None;
                        }
                        duration.seconds = duration.seconds.checked_add(secs.trunc() as i64)?;
                        duration.nanoseconds = (secs.fract() * 1e9).round() as i32;
                    }
                    _ => return None,
                }
                if c.is_ascii_alphabetic() {
                    number.clear();
                }
            }
            if !number.is_empty() {
                return None;
            }
        }
        Some(duration)
    }
}

/// `total + number * scale`, or `None` on a bad number or overflow
fn add_scaled(total: i64, number: &str, scale: i64) -> Option<i64> {
    number.parse::<i64>().ok()?.checked_mul(scale)?.checked_add(total)
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}M{}DT", self.months, self.days)?;
        if self.nanoseconds == 0 {
            write!(f, "{}S", self.seconds)
        } else {
            write!(f, "{}.{:09}S", self.seconds, self.nanoseconds.unsigned_abs())
        }
    }
}

/// Spatial point; `z` is present for 3D points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub srid: i64,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Point {
    pub fn cartesian(x: f64, y: f64) -> Self {
        Self { srid: 7203, x, y, z: None }
    }

    pub fn wgs84(longitude: f64, latitude: f64) -> Self {
        Self { srid: 4326, x: longitude, y: latitude, z: None }
    }
}

/// Value tree shared by parameters, properties and results
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Duration(Duration),
    Date(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
    DateTime(DateTime<FixedOffset>),
    Point(Point),
    List(Vec<Value>),
    Map(PropertyMap),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Field lookup on a map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Duration(_) => "Duration",
            Value::Date(_) => "Date",
            Value::LocalTime(_) => "LocalTime",
            Value::LocalDateTime(_) => "LocalDateTime",
            Value::DateTime(_) => "DateTime",
            Value::Point(_) => "Point",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// Build a value from JSON. Integral numbers become `Integer`, everything
    /// else keeps its JSON kind; temporal strings are typed later against the
    /// schema.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON for display; temporal values become ISO-8601 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Duration(d) => serde_json::Value::String(d.to_string()),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::LocalTime(t) => serde_json::Value::String(t.to_string()),
            Value::LocalDateTime(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Point(p) => {
                let mut map = serde_json::Map::new();
                map.insert("srid".to_string(), serde_json::Value::from(p.srid));
                map.insert("x".to_string(), serde_json::Value::from(p.x));
                map.insert("y".to_string(), serde_json::Value::from(p.y));
                if let Some(z) = p.z {
                    map.insert("z".to_string(), serde_json::Value::from(z));
                }
                serde_json::Value::Object(map)
            }
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Duration(d) => write!(f, "duration('{}')", d),
            Value::Date(d) => write!(f, "date('{}')", d),
            Value::LocalTime(t) => write!(f, "localtime('{}')", t),
            Value::LocalDateTime(dt) => write!(f, "localdatetime('{}')", dt),
            Value::DateTime(dt) => write!(f, "datetime('{}')", dt.to_rfc3339()),
            Value::Point(p) => match p.z {
                Some(z) => write!(f, "point({{srid: {}, x: {}, y: {}, z: {}}})", p.srid, p.x, p.y, z),
                None => write!(f, "point({{srid: {}, x: {}, y: {}}})", p.srid, p.x, p.y),
            },
            Value::List(items) => {
                write!(f, "[")?;
                for (i, val) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, val)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, val)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenience conversions
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::LocalTime(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::LocalDateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Value::Point(p)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<PropertyMap> for Value {
    fn from(map: PropertyMap) -> Self {
        Value::Map(map)
    }
}

/// Build a [`PropertyMap`] from `key => value` pairs.
#[macro_export]
macro_rules! props {
    () => { $crate::graph::PropertyMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::graph::PropertyMap::new();
        $( map.insert(::std::string::String::from($key), $crate::graph::Value::from($value)); )+
        map
    }};
}
