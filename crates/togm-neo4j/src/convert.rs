//! Conversion between togm values and Bolt values

use crate::error::{Neo4jError, Neo4jResult};
use neo4rs::{
    BoltBoolean, BoltDuration, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltPoint2D,
    BoltPoint3D, BoltString, BoltType,
};
use togm::graph::{Duration, Point, PropertyMap, Value};

/// Encode a parameter value
pub fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Boolean(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Integer(i) => BoltType::Integer(BoltInteger::new(*i)),
        Value::Float(f) => BoltType::Float(BoltFloat::new(*f)),
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::Duration(d) => BoltType::Duration(BoltDuration::new(
            BoltInteger::new(d.months),
            BoltInteger::new(d.days),
            BoltInteger::new(d.seconds),
            BoltInteger::new(i64::from(d.nanoseconds)),
        )),
        Value::Date(d) => BoltType::from(*d),
        Value::LocalTime(t) => BoltType::from(*t),
        Value::LocalDateTime(dt) => BoltType::from(*dt),
        Value::DateTime(dt) => BoltType::from(*dt),
        Value::Point(p) => match p.z {
            None => BoltType::Point2D(BoltPoint2D {
                sr_id: BoltInteger::new(p.srid),
                x: BoltFloat::new(p.x),
                y: BoltFloat::new(p.y),
            }),
            Some(z) => BoltType::Point3D(BoltPoint3D {
                sr_id: BoltInteger::new(p.srid),
                x: BoltFloat::new(p.x),
                y: BoltFloat::new(p.y),
                z: BoltFloat::new(z),
            }),
        },
        Value::List(items) => BoltType::List(BoltList { value: items.iter().map(to_bolt).collect() }),
        Value::Map(map) => BoltType::Map(to_bolt_map(map)),
    }
}

pub fn to_bolt_map(map: &PropertyMap) -> BoltMap {
    let mut bolt = BoltMap::new();
    for (key, value) in map {
        bolt.put(BoltString::new(key), to_bolt(value));
    }
    bolt
}

/// Decode a result value
///
/// Bolt maps are unordered, so decoded map keys come back sorted. Result
/// validation reorders objects to their shape anyway.
pub fn from_bolt(bolt: &BoltType) -> Neo4jResult<Value> {
    let value = match bolt {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Boolean(b.value),
        BoltType::Integer(i) => Value::Integer(i.value),
        BoltType::Float(f) => Value::Float(f.value),
        BoltType::String(s) => Value::String(s.value.clone()),
        BoltType::List(list) => {
            Value::List(list.value.iter().map(from_bolt).collect::<Neo4jResult<_>>()?)
        }
        BoltType::Map(map) => Value::Map(from_bolt_map(map)?),
        BoltType::Node(node) => Value::Map(from_bolt_map(&node.properties)?),
        BoltType::Relation(relation) => Value::Map(from_bolt_map(&relation.properties)?),
        BoltType::Point2D(p) => Value::Point(Point { srid: p.sr_id.value, x: p.x.value, y: p.y.value, z: None }),
        BoltType::Point3D(p) => Value::Point(Point {
            srid: p.sr_id.value,
            x: p.x.value,
            y: p.y.value,
            z: Some(p.z.value),
        }),
        BoltType::Duration(_) => {
            let elapsed: std::time::Duration = decode_as(bolt)?;
            let seconds = i64::try_from(elapsed.as_secs())
                .map_err(|_| Neo4jError::Conversion("duration out of range".to_string()))?;
            Value::Duration(Duration::new(0, 0, seconds, elapsed.subsec_nanos() as i32))
        }
        BoltType::Date(_) => Value::Date(decode_as(bolt)?),
        BoltType::LocalTime(_) => Value::LocalTime(decode_as(bolt)?),
        BoltType::LocalDateTime(_) => Value::LocalDateTime(decode_as(bolt)?),
        BoltType::DateTime(_) => Value::DateTime(decode_as(bolt)?),
        other => {
            return Err(Neo4jError::Conversion(format!("unsupported Bolt value {:?}", other)));
        }
    };
    Ok(value)
}

pub fn from_bolt_map(map: &BoltMap) -> Neo4jResult<PropertyMap> {
    let mut entries = map
        .value
        .iter()
        .map(|(key, value)| Ok((key.value.clone(), from_bolt(value)?)))
        .collect::<Neo4jResult<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries.into_iter().collect())
}

fn decode_as<'a, T: serde::Deserialize<'a>>(bolt: &'a BoltType) -> Neo4jResult<T> {
    bolt.to::<T>().map_err(|e| Neo4jError::Conversion(e.to_string()))
}
