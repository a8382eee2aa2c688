//! @ai:module:intent Run the full Doxygen to LOBSTER conversion pipeline
//! @ai:module:layer application
//! @ai:module:public_api convert, convert_path, Conversion, ConversionSummary
//! @ai:module:depends_on doxygen, builder, reconcile, resolver, rules, emitter, config
//! @ai:module:stateless true

use crate::builder::build_tree;
use crate::config::Config;
use crate::diagnostic::{Diagnostic, Severity};
use crate::doxygen::{load_document, DoxygenDocument};
use crate::emitter::{emit, write_document, LobsterDocument};
use crate::error::{Error, Result};
use crate::reconcile::reconcile;
use crate::resolver::{resolve_tree, TraceItem, TraceStatus};
use crate::rules::check_rules;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent Everything produced by one conversion run
#[derive(Debug, Clone)]
pub struct Conversion {
    pub items: Vec<TraceItem>,
    pub diagnostics: Vec<Diagnostic>,
    pub document: LobsterDocument,
    pub summary: ConversionSummary,
}

/// @ai:intent Counts reported to the user after a run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionSummary {
    pub entities: usize,
    pub items: usize,
    pub requirement: usize,
    pub justified: usize,
    pub unspecified: usize,
    pub suppressed: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl ConversionSummary {
    fn count_items(&mut self, items: &[TraceItem]) {
        for item in items {
            match item.status {
                TraceStatus::Requirement => self.requirement += 1,
                TraceStatus::Justified => self.justified += 1,
                TraceStatus::Unspecified => self.unspecified += 1,
            }
        }
        self.items = items.len();
    }

    fn count_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        self.errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        self.warnings = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
    }
}

/// @ai:intent Convert an in-memory Doxygen document
/// @ai:post on success the document holds one record per emitted item
/// @ai:effects log
pub fn convert(document: &DoxygenDocument, config: &Config) -> Result<Conversion> {
    let built = build_tree(document, &config.input);
    let reconciliation = reconcile(&built.tree, &config.input);
    let resolved = resolve_tree(&built.tree, &reconciliation);
    let report = check_rules(&built.tree, &resolved.items, &config.rules);

    let mut diagnostics = built.diagnostics;
    diagnostics.extend(reconciliation.diagnostics);
    diagnostics.extend(resolved.diagnostics);
    diagnostics.extend(report.issues.iter().cloned());

    for diagnostic in &diagnostics {
        diagnostic.log();
    }

    if !report.passed() {
        return Err(Error::RuleViolation {
            count: report.errors,
        });
    }

    let lobster = emit(&resolved.items, &built.tree, &config.output)?;

    let mut summary = ConversionSummary {
        entities: built.tree.len(),
        suppressed: resolved.suppressed.len(),
        ..Default::default()
    };
    summary.count_items(&resolved.items);
    summary.count_diagnostics(&diagnostics);

    Ok(Conversion {
        items: resolved.items,
        diagnostics,
        document: lobster,
        summary,
    })
}

/// @ai:intent Load a Doxygen tree from a file or directory and convert it
/// @ai:effects fs:read, log
pub fn convert_path(input: &Path, config: &Config) -> Result<Conversion> {
    let document = load_document(input)?;
    tracing::info!(
        "Loaded {} compounds from {}",
        document.compounds.len(),
        input.display()
    );
    convert(&document, config)
}

impl Conversion {
    /// @ai:intent Write the LOBSTER document
    /// @ai:effects fs:write
    pub fn write(&self, path: &Path) -> Result<()> {
        write_document(&self.document, path)
    }
}
