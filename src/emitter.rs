//! @ai:module:intent Serialize resolved trace items as a LOBSTER implementation trace
//! @ai:module:layer infrastructure
//! @ai:module:public_api emit, to_json, write_document, trace_tag, file_scoped_tag, language_prefix, LobsterDocument, LobsterItem
//! @ai:module:depends_on resolver, entity, config, error
//! @ai:module:stateless true

use crate::config::OutputConfig;
use crate::entity::{Entity, EntityKind, EntityTree};
use crate::error::{Error, Result};
use crate::resolver::{TraceItem, TraceStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const SCHEMA: &str = "lobster-imp-trace";
pub const VERSION: u32 = 3;

/// @ai:intent Top-level LOBSTER document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LobsterDocument {
    pub data: Vec<LobsterItem>,
    pub generator: String,
    pub schema: String,
    pub version: u32,
}

/// @ai:intent One `lobster-imp-trace` record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LobsterItem {
    pub tag: String,
    pub location: LobsterLocation,
    pub name: String,
    pub messages: Vec<String>,
    pub just_up: Vec<String>,
    pub just_down: Vec<String>,
    pub just_global: Vec<String>,
    pub refs: Vec<String>,
    pub language: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TraceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LobsterLocation {
    pub kind: String,
    pub file: String,
    pub line: usize,
    pub column: Option<usize>,
}

/// @ai:intent Map a Doxygen language name to the LOBSTER tag prefix
/// @ai:example ("C++") -> "cpp"
/// @ai:example ("Fortran") -> "unknown"
/// @ai:effects pure
pub fn language_prefix(language: &str) -> &'static str {
    match language {
        "C" => "c",
        "C++" => "cpp",
        "C#" => "cs",
        "Java" => "java",
        "Python" => "python",
        _ => "unknown",
    }
}

/// @ai:intent Stable tag of an entity, unique within one document
/// @ai:example (Function foo1 with "()") -> "cpp function:foo1()"
/// @ai:effects pure
pub fn trace_tag(entity: &Entity) -> String {
    let name = if entity.kind.is_function_like() {
        entity.display_name()
    } else {
        entity.qualified_name.clone()
    };
    format!(
        "{} {}:{}",
        language_prefix(&entity.language),
        entity.kind.slug(),
        name
    )
}

/// @ai:intent Tag of a function that is only unique together with its file
/// @ai:example (Function helper in a.c) -> "c function:a.c:helper()"
/// @ai:effects pure
pub fn file_scoped_tag(entity: &Entity) -> String {
    format!(
        "{} {}:{}:{}",
        language_prefix(&entity.language),
        entity.kind.slug(),
        entity.location.file.display(),
        entity.display_name()
    )
}

impl LobsterItem {
    fn from_item(item: &TraceItem, config: &OutputConfig) -> Self {
        Self {
            tag: item.tag.clone(),
            location: LobsterLocation {
                kind: "file".to_string(),
                file: item.location.file.display().to_string(),
                line: item.location.line,
                column: item.location.column,
            },
            name: item.name.clone(),
            messages: item.messages.clone(),
            just_up: item.justification.iter().cloned().collect(),
            just_down: Vec::new(),
            just_global: Vec::new(),
            refs: item
                .requirements
                .iter()
                .map(|r| format!("req {}", r))
                .collect(),
            language: item.language.clone(),
            kind: item.kind.name().to_string(),
            status: config.include_status.then_some(item.status),
            groups: config.include_groups.then(|| item.groups.clone()),
        }
    }
}

/// @ai:intent Build the LOBSTER document for a set of resolved items
/// @ai:pre items are in emission order
/// @ai:post record order equals item order minus omitted containers
/// @ai:effects pure
pub fn emit(items: &[TraceItem], tree: &EntityTree, config: &OutputConfig) -> Result<LobsterDocument> {
    let mut seen: HashMap<&str, &TraceItem> = HashMap::new();
    for item in items {
        if let Some(first) = seen.insert(item.tag.as_str(), item) {
            return Err(Error::TagCollision {
                tag: item.tag.clone(),
                first: first.location.to_string(),
                second: item.location.to_string(),
            });
        }
    }

    let data = items
        .iter()
        .filter(|item| !(config.omit_untagged_containers && is_omitted_container(item, tree)))
        .map(|item| LobsterItem::from_item(item, config))
        .collect();

    Ok(LobsterDocument {
        data,
        generator: config.generator.clone(),
        schema: SCHEMA.to_string(),
        version: VERSION,
    })
}

/// Files are always left out; other containers only when untagged and non-empty.
fn is_omitted_container(item: &TraceItem, tree: &EntityTree) -> bool {
    if item.kind == EntityKind::File {
        return true;
    }
    item.kind.is_container()
        && !item.status.is_tagged()
        && !tree.get(item.entity).children.is_empty()
}

/// @ai:intent Render a document as four-space indented JSON with a trailing newline
/// @ai:effects pure
pub fn to_json(document: &LobsterDocument) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser)?;

    let mut json = String::from_utf8_lossy(&buf).into_owned();
    json.push('\n');
    Ok(json)
}

/// @ai:intent Write a document to disk
/// @ai:effects fs:write
pub fn write_document(document: &LobsterDocument, path: &Path) -> Result<()> {
    std::fs::write(path, to_json(document)?)?;
    tracing::info!("Wrote {} items to {}", document.data.len(), path.display());
    Ok(())
}
