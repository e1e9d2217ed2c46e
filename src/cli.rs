//! CLI interface for the assessment recommender

use crate::config::OutputFormat;
use crate::input::QuerySource;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assessment-recommender")]
#[command(about = "Recommend assessments for a job description or free-text query")]
#[command(long_about = "Rank an assessment catalog against a job description, natural-language request or URL using semantic embeddings plus job level, industry, language, job family and duration cues found in the query")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend assessments for a query
    Recommend {
        #[command(flatten)]
        query: QueryArgs,

        /// Number of recommendations to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Catalog JSON file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Embedding model to use
        #[arg(short, long)]
        embedding: Option<String>,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show score breakdown and run metadata
        #[arg(short, long)]
        detailed: bool,
    },

    /// Show the constraints detected in a query
    Extract {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show catalog statistics
    Catalog {
        /// Catalog JSON file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Embedding model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct QueryArgs {
    /// Job description, natural-language request or URL
    #[arg(short, long)]
    pub query: Option<String>,

    /// Read the query from a file (TXT, MD, PDF)
    #[arg(short = 'f', long)]
    pub query_file: Option<PathBuf>,
}

impl QueryArgs {
    pub fn source(&self) -> QuerySource {
        match (&self.query, &self.query_file) {
            (_, Some(path)) => QuerySource::File(path.clone()),
            (Some(text), None) => QuerySource::Text(text.clone()),
            (None, None) => QuerySource::Text(String::new()),
        }
    }
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List configured and downloaded models
    List,

    /// Download a model
    Download {
        /// Model name or HuggingFace repo ID
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model name to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset configuration to defaults
    Reset,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown, html",
            format
        )),
    }
}
