//! Query input: literal text or a job description file

pub mod query;

pub use query::QuerySource;
