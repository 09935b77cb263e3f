//! Find queries
//!
//! `find` compiles a label, a [`Selection`] and a [`Condition`] into
//!
//! ```text
//! MATCH (root:Label) [WHERE <condition>] RETURN <selection map> AS result
//! ```
//!
//! runs it in the current (or given) transaction and validates every row
//! against the [`ResultShape`] built with the selection map.

pub mod condition;
pub mod model;
pub mod selection;
pub mod shape;

use crate::cypher::{kw, Fragment, Identifier, Statement};
use crate::error::{OgmError, OgmResult};
use crate::graph::{GraphDefinition, Value};
use crate::session::{current_transaction, Row, TransactionHandle};
use serde::de::DeserializeOwned;

pub use condition::{
    compile_condition, Comparison, Condition, IdMatch, Mode, PropertyCondition, PropertyPredicate, Scope,
    Term,
};
pub use model::{Model, RelationshipModel};
pub use selection::{compile_selection, ReferenceSelection, Selection, ID_FIELD, RELATIONSHIP_ID_FIELD};
pub use shape::{ResultShape, ValidationError};

/// Column holding the selection map
pub const RESULT_COLUMN: &str = "result";

/// Compiled find query, ready to run any number of times
#[derive(Debug, Clone)]
pub struct FindQuery {
    label: String,
    fragment: Fragment,
    shape: ResultShape,
    limited: bool,
}

impl FindQuery {
    pub fn new(
        graph: &GraphDefinition,
        label: &str,
        selection: &Selection,
        condition: &Condition,
    ) -> OgmResult<Self> {
        let definition = graph
            .node(label)
            .ok_or_else(|| OgmError::UnknownLabel(label.to_string()))?;
        let root = Identifier::new();
        let (map, shape) = compile_selection(graph, label, selection, &root)?;
        let filter = compile_condition(Mode::All, condition, &Scope::node(&root, definition))?;

        let mut parts = vec![
            kw("MATCH"),
            crate::cypher!["(", &root, ":", Fragment::name(label), ")"],
        ];
        if let Some(filter) = filter {
            parts.push(kw("WHERE"));
            parts.push(filter);
        }
        parts.extend([kw("RETURN"), map, kw("AS"), Fragment::text(RESULT_COLUMN)]);

        Ok(Self { label: label.to_string(), fragment: Fragment::Seq(parts), shape, limited: false })
    }

    /// Restrict to the first row (`LIMIT 1`)
    pub fn first(mut self) -> Self {
        if !self.limited {
            self.fragment = crate::cypher![self.fragment, kw("LIMIT"), "1"];
            self.limited = true;
        }
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn shape(&self) -> &ResultShape {
        &self.shape
    }

    pub fn statement(&self) -> Statement {
        Statement::build(&self.fragment)
    }

    /// Validate one returned row and extract its `result` value
    pub fn decode_row(&self, mut row: Row) -> OgmResult<Value> {
        let value = row.shift_remove(RESULT_COLUMN).ok_or_else(|| ValidationError {
            path: RESULT_COLUMN.to_string(),
            message: "missing column".to_string(),
        })?;
        Ok(self.shape.validate(value)?)
    }

    /// Run in `transaction`, or in the current transaction when `None`
    pub async fn fetch(&self, transaction: Option<&TransactionHandle>) -> OgmResult<Vec<Value>> {
        let handle = match transaction {
            Some(handle) => handle.clone(),
            None => current_transaction()?,
        };
        let rows = handle.run(&self.statement()).await?;
        rows.into_iter().map(|row| self.decode_row(row)).collect()
    }
}

/// All `label` nodes matching `condition`, shaped by `selection`
pub async fn find(
    graph: &GraphDefinition,
    label: &str,
    selection: &Selection,
    condition: &Condition,
    transaction: Option<&TransactionHandle>,
) -> OgmResult<Vec<Value>> {
    FindQuery::new(graph, label, selection, condition)?.fetch(transaction).await
}

/// First matching node in database order, if any
pub async fn find_one(
    graph: &GraphDefinition,
    label: &str,
    selection: &Selection,
    condition: &Condition,
    transaction: Option<&TransactionHandle>,
) -> OgmResult<Option<Value>> {
    let query = FindQuery::new(graph, label, selection, condition)?.first();
    Ok(query.fetch(transaction).await?.into_iter().next())
}

/// Deserialize a validated result into a caller type.
///
/// Synthetic fields keep their names, so use `#[serde(rename = "$id")]`.
pub fn decode<T: DeserializeOwned>(value: &Value) -> OgmResult<T> {
    serde_json::from_value(value.to_json()).map_err(|e| OgmError::InvalidValue(e.to_string()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::graph::{GraphDefinition, NodeDefinition, Property, Reference, RelationshipDefinition};

    /// Movies graph used across unit tests
    pub fn movie_graph() -> GraphDefinition {
        GraphDefinition::builder()
            .node(
                "Movie",
                NodeDefinition::new()
                    .property("title", Property::string())
                    .property("released", Property::number())
                    .property("tagline", Property::string().nullable())
                    .reference("actors", Reference::many("ACTED_IN", "Person").incoming())
                    .reference("director", Reference::optional("DIRECTED", "Person").incoming()),
            )
            .node(
                "Person",
                NodeDefinition::new()
                    .property("name", Property::string())
                    .property("born", Property::number().nullable())
                    .reference("moviesActedIn", Reference::many("ACTED_IN", "Movie"))
                    .reference("moviesDirected", Reference::many("DIRECTED", "Movie"))
                    .reference("follows", Reference::many("FOLLOWS", "Person").undirected()),
            )
            .relationship("ACTED_IN", RelationshipDefinition::new().property("roles", Property::string().array()))
            .relationship("DIRECTED", RelationshipDefinition::new())
            .relationship("FOLLOWS", RelationshipDefinition::new())
            .build()
            .expect("movie graph is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::session::{read_transaction, RecordingDriver};
    use fixtures::movie_graph;
    use serde::Deserialize;

    #[test]
    fn test_find_statement() {
        let graph = movie_graph();
        let query = FindQuery::new(
            &graph,
            "Movie",
            &Selection::new(),
            &Condition::new().eq("title", "The Matrix"),
        )
        .unwrap();
        let statement = query.statement();
        assert_eq!(
            statement.text,
            "MATCH (`v0`:`Movie`) WHERE `v0`.`title` = $p0 RETURN \
             {`title`: `v0`.`title`, `released`: `v0`.`released`, `tagline`: `v0`.`tagline`, `$id`: id(`v0`)} AS result"
        );
        assert_eq!(statement.parameter("p0"), Some(&Value::from("The Matrix")));
    }

    #[test]
    fn test_empty_condition_has_no_where() {
        let graph = movie_graph();
        let query = FindQuery::new(&graph, "Person", &Selection::new(), &Condition::new()).unwrap().first();
        let text = query.statement().text;
        assert!(text.starts_with("MATCH (`v0`:`Person`) RETURN {"));
        assert!(text.ends_with(" AS result LIMIT 1"));
        assert_eq!(query.clone().first().statement().text, text);
    }

    #[test]
    fn test_root_condition_cannot_use_rid() {
        let graph = movie_graph();
        let err = FindQuery::new(&graph, "Movie", &Selection::new(), &Condition::new().relationship_id(1))
            .unwrap_err();
        assert!(matches!(err, OgmError::InvalidCondition(_)));
    }

    #[tokio::test]
    async fn test_find_validates_rows() {
        let graph = movie_graph();
        let driver = RecordingDriver::new();
        driver.respond(vec![
            props! { "result" => Value::Map(props! {
                "title" => "The Matrix", "released" => 1999i64, "tagline" => Value::Null,
                "$id" => Value::Map(props! { "low" => 7i64, "high" => 0i64 }),
            }) },
        ]);

        let movies = read_transaction(&driver, |_tx| async {
            find(&graph, "Movie", &Selection::new(), &Condition::new(), None).await
        })
        .await
        .unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].get("$id"), Some(&Value::Integer(7)));

        #[derive(Deserialize)]
        struct Movie {
            #[serde(rename = "$id")]
            id: i64,
            title: String,
            tagline: Option<String>,
        }
        let movie: Movie = decode(&movies[0]).unwrap();
        assert_eq!((movie.id, movie.title.as_str(), movie.tagline), (7, "The Matrix", None));
    }

    #[tokio::test]
    async fn test_find_one_and_invalid_rows() {
        let graph = movie_graph();
        let driver = RecordingDriver::new();
        driver.respond(vec![]);
        driver.respond(vec![props! { "result" => Value::Map(props! { "name" => "Keanu" }) }]);

        let (none, err) = read_transaction(&driver, |tx| async move {
            let none = find_one(&graph, "Person", &Selection::new(), &Condition::new(), Some(&tx)).await?;
            let err = find_one(&graph, "Person", &Selection::new(), &Condition::new(), Some(&tx))
                .await
                .unwrap_err();
            Ok((none, err))
        })
        .await
        .unwrap();

        assert!(none.is_none());
        assert!(matches!(err, OgmError::Validation(ref e) if e.path == "result.born"));
        assert!(driver.statements()[0].text.ends_with("LIMIT 1"));
    }

    #[tokio::test]
    async fn test_find_outside_transaction() {
        let graph = movie_graph();
        let err = find(&graph, "Movie", &Selection::new(), &Condition::new(), None).await.unwrap_err();
        assert!(matches!(err, OgmError::NotInTransaction));
    }
}
