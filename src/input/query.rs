//! Reading query text from the command line or from files

use crate::error::{RecommenderError, Result};
use log::info;
use pulldown_cmark::{Event, Parser, Tag};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Where a query comes from. URLs are plain text here; they are not fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySource {
    Text(String),
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileType {
    Pdf,
    Text,
    Markdown,
    Unknown,
}

impl FileType {
    fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => FileType::Pdf,
            "txt" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            _ => FileType::Unknown,
        }
    }
}

impl QuerySource {
    pub fn describe(&self) -> String {
        match self {
            QuerySource::Text(_) => "text".to_string(),
            QuerySource::File(path) => path.display().to_string(),
        }
    }

    pub async fn read(&self) -> Result<String> {
        match self {
            QuerySource::Text(text) => Ok(text.clone()),
            QuerySource::File(path) => read_query_file(path).await,
        }
    }
}

async fn read_query_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(RecommenderError::InvalidRequest(format!(
            "Query file does not exist: {}",
            path.display()
        )));
    }

    match FileType::from_path(path) {
        FileType::Text => {
            info!("Reading plain text query: {}", path.display());
            Ok(fs::read_to_string(path).await?)
        }
        FileType::Markdown => {
            info!("Reading markdown query: {}", path.display());
            let content = fs::read_to_string(path).await?;
            Ok(markdown_to_text(&content))
        }
        FileType::Pdf => {
            info!("Extracting query text from PDF: {}", path.display());
            let bytes = fs::read(path).await?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                RecommenderError::PdfExtraction(format!(
                    "Failed to extract text from PDF '{}': {}",
                    path.display(),
                    e
                ))
            })
        }
        FileType::Unknown => Err(RecommenderError::UnsupportedFormat(format!(
            "Unsupported query file (expected .txt, .md or .pdf): {}",
            path.display()
        ))),
    }
}

/// Plain text of a markdown document, one block per line.
fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(Tag::Paragraph) | Event::End(Tag::Heading(..)) | Event::End(Tag::Item) => {
                text.push('\n')
            }
            _ => {}
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
