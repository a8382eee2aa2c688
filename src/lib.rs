//! @ai:module:intent Convert Doxygen documentation trees into LOBSTER implementation traces
//! @ai:module:layer infrastructure
//! @ai:module:public_api doxygen, builder, reconcile, scanner, resolver, rules, emitter, converter, output, config, error
//! @ai:module:stateless true
//!
//! # lobster-doxygen
//!
//! Walks a parsed Doxygen tree, reads the `@implements{...}` and
//! `@justification{...}` tags of every file, group, namespace, type and
//! function, and writes one LOBSTER trace record per entity.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lobster_doxygen::{converter, output, Config};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let conversion = converter::convert_path(Path::new("doxygen.json"), &config).unwrap();
//! conversion.write(Path::new("lobster.json")).unwrap();
//! println!("{}", output::format_report(&conversion, Some("lobster.json"), output::OutputFormat::Text));
//! ```

pub mod builder;
pub mod config;
pub mod converter;
pub mod diagnostic;
pub mod doxygen;
pub mod emitter;
pub mod entity;
pub mod error;
pub mod output;
pub mod reconcile;
pub mod resolver;
pub mod rules;
pub mod scanner;

pub use builder::{build_tree, BuildOutput};
pub use config::{Config, InputConfig, OutputConfig, RuleConfig, RuleLevel};
pub use converter::{convert, convert_path, Conversion, ConversionSummary};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use doxygen::{load_document, DoxygenDocument};
pub use emitter::{emit, to_json, LobsterDocument, LobsterItem};
pub use entity::{Entity, EntityId, EntityKind, EntityTree, SourceLocation};
pub use error::{Error, Result};
pub use output::{format_report, OutputFormat};
pub use reconcile::{reconcile, DeclDefPair, Reconciliation};
pub use resolver::{resolve, resolve_tree, TraceItem, TraceStatus};
pub use rules::{check_rules, RuleReport};
pub use scanner::{scan, RequirementRef, TagScan};
