//! Report generation.
//!
//! Renders a [`Report`] as a Markdown document, as JSON, or as a compact
//! plain-text summary for the terminal. Every format carries the same
//! pieces: the two headline metrics, a confidence chart and the table.

use crate::analysis::label_color;
use crate::models::{Report, ReportMetadata, SentimentRecord};
use anyhow::{Context, Result};
use std::path::Path;

/// Width of a full-confidence bar in the text chart.
const BAR_WIDTH: usize = 30;

/// Colour name shown for labels outside the colour map.
const DEFAULT_COLOR: &str = "default";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# FinSight Report: {}\n\n",
        report.metadata.ticker
    ));
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_metrics_section(report));
    output.push_str(&generate_chart_section(&report.records));
    output.push_str(&generate_table_section(&report.records));
    output.push_str(&generate_diagnostics_section(report));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(report: &Report) -> String {
    let metadata: &ReportMetadata = &report.metadata;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Ticker:** {}\n", metadata.ticker));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Endpoint:** `{}`\n", metadata.endpoint));
    section.push_str(&format!(
        "- **Headlines:** {} analyzed of {} fetched\n",
        metadata.headlines_analyzed, metadata.headlines_fetched
    ));
    section.push_str(&format!("- **Status:** {}\n", report.status));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the metrics section.
fn generate_metrics_section(report: &Report) -> String {
    let summary = &report.summary;
    let mut section = String::new();

    section.push_str("## AI Analysis Results\n\n");
    section.push_str("| Top Sentiment | Avg Confidence |\n");
    section.push_str("|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} |\n\n",
        summary.top_sentiment_text(),
        summary.average_confidence_text()
    ));

    if !summary.by_label.is_empty() {
        section.push_str("| Sentiment | Headlines |\n");
        section.push_str("|:---|:---:|\n");
        for (label, count) in &summary.by_label {
            section.push_str(&format!("| {} | {} |\n", label, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the confidence chart section.
fn generate_chart_section(records: &[SentimentRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Model Confidence Levels\n\n");
    section.push_str("```text\n");
    section.push_str(&render_chart(records));
    section.push_str("```\n\n");
    section
}

/// Generate the results table.
fn generate_table_section(records: &[SentimentRecord]) -> String {
    let mut section = String::new();

    section.push_str("## Headlines\n\n");

    if records.is_empty() {
        section.push_str("No headlines were classified.\n\n");
        return section;
    }

    section.push_str("| Sentiment | Confidence | Title |\n");
    section.push_str("|:---|:---:|:---|\n");
    for record in records {
        let title = escape_cell(&record.title);
        let title = if record.url == crate::models::DEFAULT_URL {
            title
        } else {
            format!("[{}]({})", title, link_target(&record.url))
        };
        section.push_str(&format!(
            "| {} | {:.2} | {} |\n",
            escape_cell(&record.label),
            record.score,
            title
        ));
    }
    section.push('\n');

    section
}

/// Generate the diagnostics section.
fn generate_diagnostics_section(report: &Report) -> String {
    if report.diagnostics.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Diagnostics\n\n");
    for diagnostic in &report.diagnostics {
        section.push_str(&format!("- {} {}\n", diagnostic.emoji(), diagnostic));
    }
    section.push('\n');
    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "---\n\n*Generated by FinSight v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Render one bar per record, scaled to [`BAR_WIDTH`].
fn render_chart(records: &[SentimentRecord]) -> String {
    let label_width = records
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut chart = String::new();
    for record in records {
        let filled = (record.score * BAR_WIDTH as f64).round() as usize;
        let color = label_color(&record.label).unwrap_or(DEFAULT_COLOR);
        chart.push_str(&format!(
            "{:<width$} |{:<bar$}| {:.2} ({})\n",
            record.label,
            "█".repeat(filled.min(BAR_WIDTH)),
            record.score,
            color,
            width = label_width,
            bar = BAR_WIDTH,
        ));
    }
    chart
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Angle-bracketed link destination, so spaces and parentheses survive.
fn link_target(url: &str) -> String {
    let url = url
        .replace('<', "%3C")
        .replace('>', "%3E")
        .replace('|', "%7C")
        .replace('\n', "");
    format!("<{}>", url)
}

/// Generate a plain-text summary for the terminal.
pub fn generate_terminal_summary(report: &Report) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    out.push_str(&format!("📊 AI Analysis Results for {}\n", report.metadata.ticker));
    out.push_str(&format!("   Top Sentiment:  {}\n", summary.top_sentiment_text()));
    out.push_str(&format!(
        "   Avg Confidence: {}\n",
        summary.average_confidence_text()
    ));

    if report.records.is_empty() {
        return out;
    }

    out.push_str("\n📈 Model Confidence Levels\n");
    for line in render_chart(&report.records).lines() {
        out.push_str(&format!("   {}\n", line));
    }

    let label_width = report
        .records
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Sentiment".len());

    out.push('\n');
    out.push_str(&format!(
        "   {:<width$}  {:>10}  {}\n",
        "Sentiment",
        "Confidence",
        "Title",
        width = label_width
    ));
    for record in &report.records {
        out.push_str(&format!(
            "   {:<width$}  {:>10.2}  {}\n",
            record.label,
            record.score,
            record.title,
            width = label_width
        ));
    }

    out
}

/// Generate the report as pretty-printed JSON.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}

/// Write already rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
