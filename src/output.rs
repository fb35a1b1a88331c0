//! Report formatting for generation runs.

use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::error::SitemapError;
use crate::generator::{GenerationReport, WrittenFile};
use crate::planner::Layout;

/// Output formatter for generation reports and errors
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Force colors on or off regardless of the terminal
    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_report(&self, report: &GenerationReport) -> String {
        match self.format {
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Summary => self.format_summary_line(report),
            OutputFormat::Human => self.format_human(report),
        }
    }

    fn format_json(&self, report: &GenerationReport) -> String {
        match serde_json::to_string_pretty(report) {
            Ok(json) => format!("{}\n", json),
            Err(e) => format!("{{\"error\": \"{}\"}}\n", e),
        }
    }

    fn format_summary_line(&self, report: &GenerationReport) -> String {
        if self.verbosity == VerbosityLevel::Quiet {
            return String::new();
        }
        format!(
            "{} URLs in {} file{} ({}, {}) {}\n",
            report.total_urls,
            report.files.len(),
            if report.files.len() == 1 { "" } else { "s" },
            layout_name(report.layout),
            validation_label(report),
            format_duration(report.duration)
        )
    }

    fn format_human(&self, report: &GenerationReport) -> String {
        let mut output = String::new();

        if self.verbosity == VerbosityLevel::Quiet {
            // Only oversized files are worth reporting in quiet mode
            for file in report.oversized_files() {
                output.push_str(&self.format_file(file));
                output.push('\n');
            }
            return output;
        }

        output.push_str("Sitemap Summary:\n");
        output.push_str(&format!("  Output directory: {}\n", report.output_dir.display()));
        output.push_str(&format!("  Layout: {}\n", layout_name(report.layout)));
        output.push_str(&format!("  URLs: {}\n", report.total_urls));
        output.push_str(&format!("  Files written: {}\n", report.files.len()));
        output.push_str(&format!("  Total size: {}\n", format_bytes(report.total_bytes())));

        let validation = validation_label(report);
        let validation = if report.validated {
            self.colorize(validation, "32")
        } else {
            self.colorize(validation, "36")
        };
        output.push_str(&format!("  Validation: {}\n", validation));

        let oversized = report.oversized_files().count();
        if oversized > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Over size limit:", "33"),
                oversized
            ));
        }

        output.push_str(&format!("  Generated on: {}\n", report.generated_on));
        output.push_str(&format!("  Duration: {}\n", format_duration(report.duration)));

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str("\nFiles:\n");
            for file in &report.files {
                output.push_str("  ");
                output.push_str(&self.format_file(file));
                output.push('\n');
            }
        }

        output
    }

    pub fn format_file(&self, file: &WrittenFile) -> String {
        let marker = if file.over_size_limit {
            self.colorize("⚠ OVERSIZE", "33")
        } else {
            self.colorize("✓ WRITTEN", "32")
        };
        format!(
            "{}  {} ({} {}, {})",
            marker,
            file.path.display(),
            file.url_count,
            match file.kind {
                crate::schema::SchemaKind::UrlSet => "urls",
                crate::schema::SchemaKind::SitemapIndex => "sitemaps",
            },
            format_bytes(file.bytes)
        )
    }

    pub fn format_error(&self, error: &SitemapError) -> String {
        let label = if error.is_schema_violation() {
            self.colorize("✗ INVALID", "31")
        } else {
            self.colorize("⚠ ERROR", "33")
        };
        format!("{}  {}", label, error)
    }
}

fn layout_name(layout: Layout) -> &'static str {
    match layout {
        Layout::Single => "single",
        Layout::Indexed => "indexed",
    }
}

fn validation_label(report: &GenerationReport) -> &'static str {
    if report.validated { "passed" } else { "skipped" }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let value = bytes as f64;
    if value < KIB {
        format!("{} B", bytes)
    } else if value < MIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{:.1} MiB", value / MIB)
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
