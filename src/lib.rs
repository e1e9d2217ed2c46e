//! Assessment recommender library

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;

pub use catalog::{Catalog, Item};
pub use config::Config;
pub use error::{RecommenderError, Result};
pub use processing::ranker::Recommender;
