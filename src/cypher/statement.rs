//! Flattening fragment trees into query text and parameters

use super::fragment::{Fragment, Identifier, Parameter};
use crate::graph::{PropertyMap, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Final query: text plus the parameter table it refers to
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub parameters: PropertyMap,
}

impl Statement {
    /// Flatten `fragment` into text and parameters.
    ///
    /// Unnamed identifiers become `v0`, `v1`, ... and unnamed parameters `p0`,
    /// `p1`, ... in first-visited order; a handle visited twice keeps its name.
    /// Automatic names skip explicit ones. A second named parameter reusing a
    /// taken name with a different value is renamed `name_1`, `name_2`, ...
    pub fn build(fragment: &Fragment) -> Statement {
        let mut renderer = Renderer::default();
        renderer.reserve(fragment);
        renderer.render(fragment);
        Statement { text: renderer.text, parameters: renderer.parameters }
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

impl From<&Fragment> for Statement {
    fn from(fragment: &Fragment) -> Self {
        Statement::build(fragment)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Backtick-quote a name, doubling embedded backticks
pub fn escape_name(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[derive(Default)]
struct Renderer {
    text: String,
    parameters: PropertyMap,
    identifiers: HashMap<usize, String>,
    parameter_names: HashMap<usize, String>,
    reserved_identifiers: HashSet<String>,
    reserved_parameters: HashSet<String>,
    next_identifier: usize,
    next_parameter: usize,
    pending_space: bool,
}

impl Renderer {
    fn reserve(&mut self, fragment: &Fragment) {
        match fragment {
            Fragment::Identifier(identifier) => {
                if let Some(name) = &identifier.0.name {
                    self.reserved_identifiers.insert(name.clone());
                }
            }
            Fragment::Parameter(parameter) => {
                if let Some(name) = &parameter.0.name {
                    self.reserved_parameters.insert(name.clone());
                }
            }
            Fragment::Map(entries) => entries.iter().for_each(|(_, value)| self.reserve(value)),
            Fragment::List(items) | Fragment::Seq(items) => items.iter().for_each(|item| self.reserve(item)),
            Fragment::Text(_) | Fragment::Keyword(_) | Fragment::Name(_) => {}
        }
    }

    fn render(&mut self, fragment: &Fragment) {
        match fragment {
            Fragment::Text(text) => self.push(text),
            Fragment::Keyword(keyword) => self.push_keyword(keyword),
            Fragment::Name(name) => self.push(&escape_name(name)),
            Fragment::Identifier(identifier) => {
                let name = self.identifier_name(identifier);
                self.push(&escape_name(&name));
            }
            Fragment::Parameter(parameter) => {
                let name = self.parameter_name(parameter);
                self.push(&format!("${}", name));
            }
            Fragment::Map(entries) => {
                self.push("{");
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(&escape_name(key));
                    self.push(": ");
                    self.render(value);
                }
                self.push("}");
            }
            Fragment::List(items) => {
                self.push("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.render(item);
                }
                self.push("]");
            }
            Fragment::Seq(items) => {
                for item in items {
                    self.render(item);
                }
            }
        }
    }

    fn push(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.pending_space {
            if !s.starts_with(|c: char| matches!(c, ' ' | ')' | ']' | '}' | ','))
                && !self.text.ends_with(' ')
            {
                self.text.push(' ');
            }
            self.pending_space = false;
        }
        self.text.push_str(s);
    }

    fn push_keyword(&mut self, keyword: &str) {
        if !self.text.is_empty() && !self.text.ends_with(|c: char| matches!(c, ' ' | '(' | '[' | '{')) {
            self.text.push(' ');
        }
        self.pending_space = false;
        self.text.push_str(keyword);
        self.pending_space = true;
    }

    fn identifier_name(&mut self, identifier: &Identifier) -> String {
        if let Some(name) = self.identifiers.get(&identifier.key()) {
            return name.clone();
        }
        let name = match &identifier.0.name {
            Some(name) => name.clone(),
            None => loop {
                let name = format!("v{}", self.next_identifier);
                self.next_identifier += 1;
                if !self.reserved_identifiers.contains(&name) {
                    break name;
                }
            },
        };
        self.identifiers.insert(identifier.key(), name.clone());
        name
    }

    fn parameter_name(&mut self, parameter: &Parameter) -> String {
        if let Some(name) = self.parameter_names.get(&parameter.key()) {
            return name.clone();
        }
        let name = match &parameter.0.name {
            Some(name) => match self.parameters.get(name) {
                None => name.clone(),
                Some(existing) if existing == parameter.value() => name.clone(),
                Some(_) => (1..)
                    .map(|n| format!("{}_{}", name, n))
                    .find(|candidate| self.is_free_parameter(candidate))
                    .unwrap_or_else(|| name.clone()),
            },
            None => loop {
                let name = format!("p{}", self.next_parameter);
                self.next_parameter += 1;
                if self.is_free_parameter(&name) {
                    break name;
                }
            },
        };
        self.parameters.insert(name.clone(), parameter.value().clone());
        self.parameter_names.insert(parameter.key(), name.clone());
        name
    }

    fn is_free_parameter(&self, name: &str) -> bool {
        !self.reserved_parameters.contains(name) && !self.parameters.contains_key(name)
    }
}
