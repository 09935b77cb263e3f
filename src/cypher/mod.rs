//! Cypher intermediate representation
//!
//! Query text is assembled as a [`Fragment`] tree and flattened once into a
//! [`Statement`]: text with `$name` placeholders plus a separate parameter
//! map. Values never enter the text.

pub mod fragment;
pub mod statement;

pub use fragment::{kw, Fragment, Identifier, Parameter};
pub use statement::{escape_name, Statement};
