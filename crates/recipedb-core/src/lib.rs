#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Recipe corpus preparation for retrieval.
//!
//! Loads markdown recipes, enriches them with path/content derived metadata,
//! splits each into heading-scoped sections linked back to their parent, and
//! rebuilds ranked parent documents from matched sections.

pub mod aggregate;
pub mod config;
pub mod enrich;
pub mod error;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod splitter;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use pipeline::DataPreparation;
