//! Text and JSON rendering of command output
//!
//! Commands build a payload implementing both `Serialize` and [`Render`]
//! and hand it to [`OutputWriter`], which picks the format.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::report::{ImpactSummary, Outcome, ReportRow};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> crate::error::Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> crate::error::Result<()> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable rendering
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Flattened findings of one report
#[derive(Debug, Serialize)]
pub struct ReportView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub outcome: Outcome,
    pub summary: ImpactSummary,
    pub rows: Vec<ReportRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_folder: Option<String>,
}

impl ReportView {
    pub fn new(title: Option<String>, outcome: Outcome, rows: Vec<ReportRow>) -> Self {
        Self {
            title,
            outcome,
            summary: ImpactSummary::from_rows(&rows),
            rows,
            report_folder: None,
        }
    }

    pub fn with_report_folder(mut self, folder: impl Into<String>) -> Self {
        self.report_folder = Some(folder.into());
        self
    }
}

fn location(row: &ReportRow) -> String {
    match (row.line, row.cfi.as_deref()) {
        (Some(line), _) => format!("{}:{}", row.file, line),
        (None, Some(cfi)) => format!("{} {}", row.file, cfi),
        (None, None) => row.file.clone(),
    }
}

impl Render for ReportView {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if let Some(ref title) = self.title {
            writeln!(w, "{}", title)?;
        }

        if self.rows.is_empty() {
            match self.outcome {
                Outcome::Pass => writeln!(w, "Ace found no accessibility issues.")?,
                Outcome::Fail | Outcome::Other => {
                    writeln!(w, "No issues at the selected impact level.")?
                }
            }
        } else {
            let locations: Vec<String> = self.rows.iter().map(location).collect();
            let width = locations.iter().map(String::len).max().unwrap_or(0);

            for (row, location) in self.rows.iter().zip(&locations) {
                let message = row.message.lines().next().unwrap_or_default();
                writeln!(
                    w,
                    "{:<8}  {:<width$}  {} [{}]",
                    row.impact.as_str(),
                    location,
                    message,
                    row.rule,
                    width = width
                )?;
                if let Some(ref role) = row.suggested_role {
                    writeln!(w, "{:<8}  {:<width$}  suggested: role=\"{}\"", "", "", role, width = width)?;
                }
            }

            writeln!(w)?;
            writeln!(
                w,
                "{} issues: {} critical, {} serious, {} moderate, {} minor",
                self.summary.total(),
                self.summary.critical,
                self.summary.serious,
                self.summary.moderate,
                self.summary.minor
            )?;
        }

        if let Some(ref folder) = self.report_folder {
            writeln!(w, "The report was saved to: '{}'", folder)?;
        }
        Ok(())
    }
}

/// Result of resolving a single CFI
#[derive(Debug, Serialize)]
pub struct LocateView {
    pub file: String,
    pub cfi: String,
    pub line: Option<u32>,
}

impl Render for LocateView {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match self.line {
            Some(line) => writeln!(w, "{}:{}", self.file, line),
            None => writeln!(w, "{}: location unavailable for {}", self.file, self.cfi),
        }
    }
}
