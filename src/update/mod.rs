//! Bulk create / update / delete
//!
//! Build a [`CommandBatch`], then hand it to [`run_commands`]. Creations
//! return [`CommandId`]s that later commands in the same batch can use as
//! endpoints or targets before any database id exists.

pub mod command;
pub mod executor;

pub use command::{Command, CommandBatch, CommandId, EntityKind, EntityRef};
pub use executor::{run_commands, Phase, RunSummary};
