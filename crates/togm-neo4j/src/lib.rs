//! # togm-neo4j
//!
//! Neo4j driver for togm, speaking Bolt through neo4rs.
//!
//! ```rust,no_run
//! use togm::session::write_transaction;
//! use togm_neo4j::{Neo4jConfig, Neo4jDriver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let driver = Neo4jDriver::connect(&Neo4jConfig::from_env()?).await?;
//!     let rows = write_transaction(&driver, |tx| async move {
//!         let statement = togm::Statement { text: "RETURN 1 AS one".into(), parameters: Default::default() };
//!         tx.run(&statement).await
//!     })
//!     .await?;
//!     println!("{:?}", rows);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod convert;
pub mod driver;
pub mod error;

pub use config::Neo4jConfig;
pub use driver::Neo4jDriver;
pub use error::{Neo4jError, Neo4jResult};
