//! Integration tests for loading graph schemas from files

use std::io::Write;
use togm::graph::{Direction, Multiplicity, PropertyType, SchemaError};
use togm::GraphDefinition;

fn write_schema(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_yaml_and_json_files_agree() {
    let yaml = write_schema(
        ".yaml",
        r#"
nodes:
  Movie:
    properties:
      title: string
      keywords: { type: string, array: true, nullable: true }
      premiere: { type: dateTime, nullable: true }
    references:
      director: { type: DIRECTED, label: Person, direction: incoming, multiplicity: optional }
  Person:
    properties:
      name: string
relationships:
  DIRECTED: {}
"#,
    );
    let json = write_schema(
        ".json",
        r#"{
  "nodes": {
    "Movie": {
      "properties": {
        "title": "string",
        "keywords": {"type": "string", "array": true, "nullable": true},
        "premiere": {"type": "dateTime", "nullable": true}
      },
      "references": {
        "director": {"type": "DIRECTED", "label": "Person", "direction": "incoming", "multiplicity": "optional"}
      }
    },
    "Person": {"properties": {"name": "string"}}
  },
  "relationships": {"DIRECTED": {}}
}"#,
    );

    let from_yaml = GraphDefinition::from_path(yaml.path()).unwrap();
    let from_json = GraphDefinition::from_path(json.path()).unwrap();
    assert_eq!(from_yaml, from_json);

    let movie = from_yaml.node("Movie").unwrap();
    let keywords = movie.get_property("keywords").unwrap();
    assert_eq!(keywords.property_type, PropertyType::String);
    assert!(keywords.array && keywords.nullable);

    let director = movie.get_reference("director").unwrap();
    assert_eq!(director.direction, Direction::Incoming);
    assert_eq!(director.multiplicity, Multiplicity::Optional);
}

#[test]
fn test_dangling_reference_in_file_is_rejected() {
    let file = write_schema(
        ".yml",
        r#"
nodes:
  Movie:
    references:
      studio: { type: PRODUCED_BY, label: Studio, multiplicity: one }
relationships:
  PRODUCED_BY: {}
"#,
    );
    let err = GraphDefinition::from_path(file.path()).unwrap_err();
    assert!(matches!(err, SchemaError::Document(ref message) if message.contains("Studio")));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = GraphDefinition::from_path(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, SchemaError::Document(_)));
}
