//! Rendering recommendation results

pub mod formatter;
pub mod report;
