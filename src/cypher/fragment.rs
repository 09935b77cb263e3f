//! Fragment tree for Cypher text
//!
//! Compilers build fragments; [`Statement::build`](super::Statement::build)
//! flattens them. Identifiers and parameters are shared handles: cloning one
//! and placing it twice in a tree renders the same name both times.

use crate::graph::Value;
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct IdentifierInner {
    pub(crate) name: Option<String>,
}

/// Query variable; unnamed variables are numbered when the tree is flattened
#[derive(Debug, Clone)]
pub struct Identifier(pub(crate) Arc<IdentifierInner>);

impl Identifier {
    pub fn new() -> Self {
        Identifier(Arc::new(IdentifierInner { name: None }))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Identifier(Arc::new(IdentifierInner { name: Some(name.into()) }))
    }

    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct ParameterInner {
    pub(crate) name: Option<String>,
    pub(crate) value: Value,
}

/// Query parameter; its value travels in the parameter map, never in the text
#[derive(Debug, Clone)]
pub struct Parameter(pub(crate) Arc<ParameterInner>);

impl Parameter {
    pub fn new(value: impl Into<Value>) -> Self {
        Parameter(Arc::new(ParameterInner { name: None, value: value.into() }))
    }

    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Parameter(Arc::new(ParameterInner { name: Some(name.into()), value: value.into() }))
    }

    pub fn value(&self) -> &Value {
        &self.0.value
    }

    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

/// Node of the fragment tree
#[derive(Debug, Clone)]
pub enum Fragment {
    /// Verbatim text
    Text(Cow<'static, str>),
    /// Reserved word; spaced on both sides
    Keyword(Cow<'static, str>),
    /// Label, relationship type or property key; backtick-escaped
    Name(String),
    Identifier(Identifier),
    Parameter(Parameter),
    /// `{key: value, ...}` in the given order
    Map(Vec<(String, Fragment)>),
    /// `[a, b, ...]`
    List(Vec<Fragment>),
    /// Concatenation
    Seq(Vec<Fragment>),
}

impl Fragment {
    pub fn text(text: &'static str) -> Self {
        Fragment::Text(Cow::Borrowed(text))
    }

    pub fn keyword(keyword: &'static str) -> Self {
        Fragment::Keyword(Cow::Borrowed(keyword))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Fragment::Name(name.into())
    }

    pub fn empty() -> Self {
        Fragment::Seq(Vec::new())
    }

    /// `var.key`
    pub fn property(variable: &Identifier, key: impl Into<String>) -> Self {
        Fragment::Seq(vec![
            Fragment::Identifier(variable.clone()),
            Fragment::text("."),
            Fragment::Name(key.into()),
        ])
    }

    /// `function(argument)`
    pub fn call(function: &'static str, argument: impl Into<Fragment>) -> Self {
        Fragment::Seq(vec![
            Fragment::text(function),
            Fragment::text("("),
            argument.into(),
            Fragment::text(")"),
        ])
    }

    /// `(inner)`
    pub fn parenthesized(inner: impl Into<Fragment>) -> Self {
        Fragment::Seq(vec![Fragment::text("("), inner.into(), Fragment::text(")")])
    }

    /// Items separated by `separator`
    pub fn join(items: impl IntoIterator<Item = Fragment>, separator: Fragment) -> Self {
        let mut seq = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                seq.push(separator.clone());
            }
            seq.push(item);
        }
        Fragment::Seq(seq)
    }
}

impl From<&'static str> for Fragment {
    fn from(text: &'static str) -> Self {
        Fragment::text(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::Text(Cow::Owned(text))
    }
}

impl From<Identifier> for Fragment {
    fn from(identifier: Identifier) -> Self {
        Fragment::Identifier(identifier)
    }
}

impl From<&Identifier> for Fragment {
    fn from(identifier: &Identifier) -> Self {
        Fragment::Identifier(identifier.clone())
    }
}

impl From<Parameter> for Fragment {
    fn from(parameter: Parameter) -> Self {
        Fragment::Parameter(parameter)
    }
}

impl From<&Parameter> for Fragment {
    fn from(parameter: &Parameter) -> Self {
        Fragment::Parameter(parameter.clone())
    }
}

impl From<Vec<Fragment>> for Fragment {
    fn from(seq: Vec<Fragment>) -> Self {
        Fragment::Seq(seq)
    }
}

/// Shorthand for a keyword fragment
pub fn kw(keyword: &'static str) -> Fragment {
    Fragment::keyword(keyword)
}

/// Concatenate anything convertible into a [`Fragment`].
///
/// ```
/// use togm::cypher::{kw, Fragment, Identifier, Statement};
/// use togm::cypher;
///
/// let n = Identifier::new();
/// let q = cypher![kw("MATCH"), "(", &n, ":", Fragment::name("Movie"), ")", kw("RETURN"), &n];
/// assert_eq!(Statement::build(&q).text, "MATCH (`v0`:`Movie`) RETURN `v0`");
/// ```
#[macro_export]
macro_rules! cypher {
    ($($item:expr),* $(,)?) => {
        $crate::cypher::Fragment::Seq(vec![$($crate::cypher::Fragment::from($item)),*])
    };
}
