//! Output formatters for recommendation reports

use crate::config::OutputFormat;
use crate::error::{RecommenderError, Result};
use crate::output::report::{RecommendationReport, ScoreDetail};
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for rendering recommendation reports
pub trait OutputFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter; emits the response wire shape unless detailed
pub struct JsonFormatter {
    pretty: bool,
    detailed: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct HtmlFormatter {
    include_styles: bool,
}

/// Dispatches a report to the formatter for the requested format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Assessment Recommendations</title>
    {% if include_styles %}
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 1000px; margin: 0 auto; padding: 20px; color: #333; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border-bottom: 1px solid #e9ecef; padding: 8px; text-align: left; }
        th { color: #007acc; }
        .excluded { color: #999; }
        .metadata { margin-top: 30px; font-size: 0.9em; color: #666; }
    </style>
    {% endif %}
</head>
<body>
    <h1>Assessment Recommendations</h1>
    <p><strong>Query:</strong> {{ query }}</p>
    {% if has_constraints %}<p><strong>Detected:</strong> {{ constraints }}</p>{% endif %}
    <table>
        <tr><th>#</th><th>Assessment</th><th>Remote Testing</th><th>Adaptive/IRT</th><th>Duration</th><th>Test Type</th><th>Score</th></tr>
        {% for row in rows %}
        <tr{% if row.excluded %} class="excluded"{% endif %}>
            <td>{{ row.rank }}</td>
            <td><a href="{{ row.url }}">{{ row.name }}</a></td>
            <td>{{ row.remote_testing }}</td>
            <td>{{ row.adaptive_irt }}</td>
            <td>{{ row.duration }}</td>
            <td>{{ row.test_type }}</td>
            <td>{{ row.score }}</td>
        </tr>
        {% endfor %}
    </table>
    <div class="metadata">
        <p>Generated {{ generated_at }} by Assessment Recommender v{{ version }} | Model: {{ embedding_model }} | Catalog: {{ catalog_size }} assessments | {{ processing_time }}ms</p>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    query: String,
    has_constraints: bool,
    constraints: String,
    rows: Vec<HtmlRow>,
    generated_at: String,
    version: String,
    embedding_model: String,
    catalog_size: usize,
    processing_time: u64,
}

struct HtmlRow {
    rank: usize,
    name: String,
    url: String,
    remote_testing: String,
    adaptive_irt: String,
    duration: String,
    test_type: String,
    score: String,
    excluded: bool,
}

/// Human-readable summary of detected constraints, empty when none.
fn describe_constraints(report: &RecommendationReport) -> String {
    let c = &report.constraints;
    let mut parts = Vec::new();
    if let Some(level) = &c.job_level {
        parts.push(format!("job level: {}", level));
    }
    if let Some(industry) = &c.industry {
        parts.push(format!("industry: {}", industry));
    }
    if let Some(language) = &c.language {
        parts.push(format!("language: {}", language));
    }
    if let Some(family) = &c.job_family {
        parts.push(format!("job family: {}", family));
    }
    if let Some(minutes) = c.max_duration_minutes {
        parts.push(format!("max duration: {} min", minutes));
    }
    parts.join(", ")
}

fn format_timestamp(report: &RecommendationReport) -> String {
    chrono::DateTime::<chrono::Utc>::from(report.metadata.generated_at)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

fn format_score(score: f32, detail: Option<&ScoreDetail>) -> String {
    match detail {
        Some(d) if d.excluded => "excluded".to_string(),
        _ => format!("{:.4}", score),
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "█".color(Color::Blue).bold(), title.color(Color::Blue).bold())
        } else {
            format!("\n█ {}\n", title)
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header(&format!(
            "TOP {} ASSESSMENT RECOMMENDATIONS",
            report.recommendations.len()
        )));

        let constraints = describe_constraints(report);
        if !constraints.is_empty() {
            output.push_str(&format!("Detected {}\n", self.colorize(&constraints, Color::Cyan)));
        }
        if report.excluded_count > 0 {
            output.push_str(&format!(
                "{}\n",
                self.colorize(
                    &format!("{} assessments exceed the requested duration", report.excluded_count),
                    Color::Yellow
                )
            ));
        }
        output.push('\n');

        for (i, rec) in report.recommendations.iter().enumerate() {
            let detail = report.details.get(i);
            output.push_str(&format!(
                "{:>2}. {} {}\n",
                i + 1,
                self.colorize(&rec.name, Color::Green),
                self.colorize(&format!("(Score: {})", format_score(rec.score, detail)), Color::White)
            ));
            output.push_str(&format!("    URL: {}\n", rec.url));
            output.push_str(&format!(
                "    Remote Testing: {}, Adaptive/IRT: {}, Duration: {}, Test Type: {}\n",
                rec.remote_testing, rec.adaptive_irt, rec.duration, rec.test_type
            ));

            if self.detailed {
                if let Some(d) = detail {
                    output.push_str(&format!(
                        "    Semantic: {:.4} | Boost: +{:.2} | Catalog position: {}\n",
                        d.semantic_score, d.boost, d.catalog_index
                    ));
                }
            }
        }

        if self.detailed {
            output.push_str(&format!(
                "\nGenerated {} | Model: {} ({:?} fields) | Catalog: {} | {}ms\n",
                format_timestamp(report),
                report.metadata.embedding_model,
                report.metadata.embedding_fields,
                report.metadata.catalog_size,
                report.metadata.processing_time_ms
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool, detailed: bool) -> Self {
        Self { pretty, detailed }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String> {
        let value = if self.detailed {
            serde_json::to_value(report)?
        } else {
            serde_json::to_value(report.response())?
        };

        if self.pretty {
            Ok(serde_json::to_string_pretty(&value)?)
        } else {
            Ok(serde_json::to_string(&value)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# Assessment Recommendations\n\n");
        output.push_str(&format!("**Query:** {}\n\n", Self::escape_cell(&report.query)));

        let constraints = describe_constraints(report);
        if !constraints.is_empty() {
            output.push_str(&format!("**Detected:** {}\n\n", constraints));
        }

        output.push_str("| # | Assessment | Remote Testing | Adaptive/IRT | Duration | Test Type | Score |\n");
        output.push_str("|---|---|---|---|---|---|---|\n");
        for (i, rec) in report.recommendations.iter().enumerate() {
            output.push_str(&format!(
                "| {} | [{}]({}) | {} | {} | {} | {} | {} |\n",
                i + 1,
                Self::escape_cell(&rec.name),
                Self::escape_cell(&rec.url),
                Self::escape_cell(&rec.remote_testing),
                Self::escape_cell(&rec.adaptive_irt),
                Self::escape_cell(&rec.duration),
                Self::escape_cell(&rec.test_type),
                format_score(rec.score, report.details.get(i))
            ));
        }

        if self.include_metadata {
            output.push_str(&format!(
                "\n---\n*Generated {} by Assessment Recommender v{} | Model: `{}` | Catalog: {} assessments | {}ms*\n",
                format_timestamp(report),
                report.metadata.recommender_version,
                report.metadata.embedding_model,
                report.metadata.catalog_size,
                report.metadata.processing_time_ms
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }

    fn create_template_data(&self, report: &RecommendationReport) -> HtmlTemplate {
        let constraints = describe_constraints(report);
        let rows = report
            .recommendations
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let detail = report.details.get(i);
                HtmlRow {
                    rank: i + 1,
                    name: rec.name.clone(),
                    url: rec.url.clone(),
                    remote_testing: rec.remote_testing.clone(),
                    adaptive_irt: rec.adaptive_irt.clone(),
                    duration: rec.duration.clone(),
                    test_type: rec.test_type.clone(),
                    score: format_score(rec.score, detail),
                    excluded: detail.map(|d| d.excluded).unwrap_or(false),
                }
            })
            .collect();

        HtmlTemplate {
            include_styles: self.include_styles,
            query: report.query.clone(),
            has_constraints: !constraints.is_empty(),
            constraints,
            rows,
            generated_at: format_timestamp(report),
            version: report.metadata.recommender_version.clone(),
            embedding_model: report.metadata.embedding_model.clone(),
            catalog_size: report.metadata.catalog_size,
            processing_time: report.metadata.processing_time_ms,
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| RecommenderError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    pub fn with_options(use_colors: bool, detailed: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(true, detailed),
            markdown_formatter: MarkdownFormatter::new(detailed),
            html_formatter: HtmlFormatter::new(true),
        }
    }

    pub fn generate_report(&self, report: &RecommendationReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
            OutputFormat::Html => self.html_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, timestamp: bool) -> String {
    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("recommendations{}.txt", timestamp_suffix),
        OutputFormat::Json => format!("recommendations{}.json", timestamp_suffix),
        OutputFormat::Markdown => format!("recommendations{}.md", timestamp_suffix),
        OutputFormat::Html => format!("recommendations{}.html", timestamp_suffix),
    }
}
