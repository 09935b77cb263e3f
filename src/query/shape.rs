//! Runtime validators for selection results
//!
//! A [`ResultShape`] is built alongside the selection fragment and checks
//! every returned row exactly: unknown fields, missing fields and mistyped
//! values are all errors. Valid rows come back normalized, with wrapped or
//! float-encoded integers turned into [`Value::Integer`].

use crate::graph::{integer_like, Property, PropertyMap, Value};
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Row failed validation at `path` (e.g. `result.actors[2].$rid`)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("at {path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self { path: path.to_string(), message: message.into() }
    }
}

/// Expected shape of one selected value
#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape {
    /// Declared property value
    Property(Property),
    /// `$id` / `$rid`
    Identity,
    /// Closed map: exactly these fields
    Object(IndexMap<String, ResultShape>),
    /// Value or null
    Optional(Box<ResultShape>),
    List(Box<ResultShape>),
}

impl ResultShape {
    pub fn optional(inner: ResultShape) -> Self {
        ResultShape::Optional(Box::new(inner))
    }

    pub fn list(inner: ResultShape) -> Self {
        ResultShape::List(Box::new(inner))
    }

    /// Validate `value` and return its normalized form.
    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        self.validate_at("result", value)
    }

    fn validate_at(&self, path: &str, value: Value) -> Result<Value, ValidationError> {
        match self {
            ResultShape::Property(property) => property
                .coerce(value)
                .map_err(|message| ValidationError::new(path, message)),
            ResultShape::Identity => integer_like(&value)
                .map(Value::Integer)
                .ok_or_else(|| ValidationError::new(path, format!("expected an id, got {}", value.type_name()))),
            ResultShape::Optional(inner) => match value {
                Value::Null => Ok(Value::Null),
                other => inner.validate_at(path, other),
            },
            ResultShape::List(inner) => match value {
                Value::List(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| inner.validate_at(&format!("{}[{}]", path, i), item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                other => Err(ValidationError::new(path, format!("expected List, got {}", other.type_name()))),
            },
            ResultShape::Object(fields) => {
                let mut map = match value {
                    Value::Map(map) => map,
                    other => {
                        return Err(ValidationError::new(path, format!("expected Map, got {}", other.type_name())))
                    }
                };
                if let Some(extra) = map.keys().find(|key| !fields.contains_key(key.as_str())) {
                    return Err(ValidationError::new(path, format!("unexpected field '{}'", extra)));
                }
                let mut validated = PropertyMap::with_capacity(fields.len());
                for (name, shape) in fields {
                    let field_path = format!("{}.{}", path, name);
                    let field = map
                        .shift_remove(name)
                        .ok_or_else(|| ValidationError::new(&field_path, "missing field"))?;
                    validated.insert(name.clone(), shape.validate_at(&field_path, field)?);
                }
                Ok(Value::Map(validated))
            }
        }
    }
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultShape::Property(property) => write!(f, "{}", property),
            ResultShape::Identity => write!(f, "id"),
            ResultShape::Optional(inner) => write!(f, "{}?", inner),
            ResultShape::List(inner) => write!(f, "[{}]", inner),
            ResultShape::Object(fields) => {
                write!(f, "{{")?;
                for (i, (name, shape)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, shape)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;

    fn movie_shape() -> ResultShape {
        let mut actor = IndexMap::new();
        actor.insert("roles".to_string(), ResultShape::Property(Property::string().array()));
        actor.insert("name".to_string(), ResultShape::Property(Property::string()));
        actor.insert("$id".to_string(), ResultShape::Identity);
        actor.insert("$rid".to_string(), ResultShape::Identity);

        let mut movie = IndexMap::new();
        movie.insert("title".to_string(), ResultShape::Property(Property::string()));
        movie.insert("tagline".to_string(), ResultShape::Property(Property::string().nullable()));
        movie.insert("actors".to_string(), ResultShape::list(ResultShape::Object(actor)));
        movie.insert("$id".to_string(), ResultShape::Identity);
        ResultShape::Object(movie)
    }

    #[test]
    fn test_valid_row_is_normalized() {
        let row = Value::Map(props! {
            "$id" => Value::Map(props! { "low" => 12i64, "high" => 0i64 }),
            "actors" => vec![Value::Map(props! {
                "name" => "Keanu Reeves",
                "roles" => vec!["Neo"],
                "$id" => 1.0,
                "$rid" => 7i64,
            })],
            "title" => "The Matrix",
            "tagline" => Value::Null,
        });

        let validated = movie_shape().validate(row).unwrap();
        let map = validated.as_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "tagline", "actors", "$id"]);
        assert_eq!(map.get("$id"), Some(&Value::Integer(12)));
        let actor = &map.get("actors").unwrap().as_list().unwrap()[0];
        assert_eq!(actor.get("$id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_extra_field_rejected() {
        let row = Value::Map(props! {
            "title" => "Top Gun",
            "tagline" => "I feel the need",
            "actors" => Vec::<Value>::new(),
            "$id" => 3i64,
            "budget" => 15_000_000i64,
        });
        let err = movie_shape().validate(row).unwrap_err();
        assert_eq!(err.path, "result");
        assert!(err.message.contains("budget"));
    }

    #[test]
    fn test_missing_and_mistyped_fields() {
        let row = Value::Map(props! { "title" => "Top Gun", "tagline" => Value::Null, "$id" => 3i64 });
        let err = movie_shape().validate(row).unwrap_err();
        assert_eq!(err.path, "result.actors");

        let row = Value::Map(props! {
            "title" => "Top Gun",
            "tagline" => Value::Null,
            "actors" => vec![Value::Map(props! {
                "name" => "Tom Cruise",
                "roles" => vec![Value::Integer(1)],
                "$id" => 1i64,
                "$rid" => 2i64,
            })],
            "$id" => 3i64,
        });
        let err = movie_shape().validate(row).unwrap_err();
        assert_eq!(err.path, "result.actors[0].roles");
        assert_eq!(err.to_string(), "at result.actors[0].roles: element 0: expected string, got Integer");
    }

    #[test]
    fn test_optional_and_identity() {
        let shape = ResultShape::optional(ResultShape::Identity);
        assert_eq!(shape.validate(Value::Null).unwrap(), Value::Null);
        assert_eq!(shape.validate(Value::Float(4.0)).unwrap(), Value::Integer(4));
        assert!(shape.validate(Value::Float(4.5)).is_err());
        assert!(ResultShape::Identity.validate(Value::Null).is_err());
    }

    #[test]
    fn test_display() {
        let shape = ResultShape::list(ResultShape::optional(ResultShape::Property(Property::number())));
        assert_eq!(shape.to_string(), "[number?]");
    }
}
