//! @ai:module:intent Format the conversion report for the terminal (text, JSON)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_report, Report
//! @ai:module:depends_on converter, diagnostic
//! @ai:module:stateless true

use crate::converter::{Conversion, ConversionSummary};
use crate::diagnostic::{Diagnostic, Severity};
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// @ai:intent Serializable view of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub output: Option<String>,
    pub summary: &'a ConversionSummary,
    pub diagnostics: &'a [Diagnostic],
}

/// @ai:intent Format a conversion report as a string
/// @ai:effects pure
pub fn format_report(conversion: &Conversion, output: Option<&str>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let report = Report {
                output: output.map(str::to_string),
                summary: &conversion.summary,
                diagnostics: &conversion.diagnostics,
            };
            serde_json::to_string_pretty(&report).unwrap_or_default()
        }
        OutputFormat::Text => format_report_text(conversion, output),
    }
}

/// @ai:intent Format a conversion report as human-readable text
/// @ai:effects pure
fn format_report_text(conversion: &Conversion, output: Option<&str>) -> String {
    let mut text = String::new();

    for diagnostic in &conversion.diagnostics {
        let severity = match diagnostic.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warning => "WARN".yellow().bold(),
            Severity::Info => "INFO".blue(),
        };

        text.push_str(&format!(
            "{} {} - {} ({})\n",
            severity,
            diagnostic.location.to_string().dimmed(),
            diagnostic.message,
            diagnostic.code.as_str().dimmed()
        ));
    }

    if !conversion.diagnostics.is_empty() {
        text.push('\n');
    }

    let summary = &conversion.summary;
    text.push_str(&format!(
        "{} trace items from {} entities ({} requirement, {} justified, {} unspecified)\n",
        summary.items.to_string().bold(),
        summary.entities,
        summary.requirement.to_string().green(),
        summary.justified.to_string().cyan(),
        summary.unspecified.to_string().yellow()
    ));

    if summary.suppressed > 0 {
        text.push_str(&format!(
            "{} declaration/definition duplicates merged\n",
            summary.suppressed
        ));
    }

    match output {
        Some(path) => text.push_str(&format!("Written to {}\n", path.bold())),
        None => text.push_str(&format!("{}\n", "Check only, nothing written".dimmed())),
    }

    if summary.errors > 0 {
        text.push_str(&format!(
            "{} errors, {} warnings\n",
            summary.errors.to_string().red().bold(),
            summary.warnings.to_string().yellow()
        ));
    } else if summary.warnings > 0 {
        text.push_str(&format!(
            "{} {} warnings\n",
            "OK".green().bold(),
            summary.warnings.to_string().yellow()
        ));
    } else {
        text.push_str(&format!("{} No issues found\n", "OK".green().bold()));
    }

    text
}
