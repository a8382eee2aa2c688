//! @ai:module:intent Model the parsed Doxygen tree handed over by the upstream XML parser
//! @ai:module:layer infrastructure
//! @ai:module:public_api DoxygenDocument, CompoundDef, MemberDef, RawLocation, Param, load_document
//! @ai:module:depends_on error
//! @ai:module:stateless true
//!
//! The shape follows Doxygen's own compound/member split so that a dump of
//! `compounddef`/`memberdef` elements maps onto it field by field.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent A complete parsed Doxygen output, compounds in index order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DoxygenDocument {
    #[serde(default)]
    pub compounds: Vec<CompoundDef>,
}

/// @ai:intent One `compounddef` element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompoundDef {
    pub id: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub comment: Option<RawComment>,
    #[serde(default)]
    pub members: Vec<MemberDef>,
    /// Ids of inner classes, namespaces and groups.
    #[serde(default)]
    pub inner: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// @ai:intent One `memberdef` element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberDef {
    pub id: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub qualified_name: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub location: Option<RawLocation>,
    /// Location of the body; absent for pure declarations.
    #[serde(default)]
    pub body: Option<RawLocation>,
    #[serde(default)]
    pub comment: Option<RawComment>,
    #[serde(default)]
    pub pure_virtual: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// @ai:intent A file position as reported by Doxygen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawLocation {
    pub file: PathBuf,
    pub line: usize,
    #[serde(default)]
    pub column: Option<usize>,
}

/// @ai:intent Raw documentation text, optionally with its own position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawComment {
    Text(String),
    Located {
        text: String,
        #[serde(default)]
        location: Option<RawLocation>,
    },
}

/// @ai:intent One function parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Param {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl RawComment {
    /// @ai:intent Get the comment text
    pub fn text(&self) -> &str {
        match self {
            RawComment::Text(text) => text,
            RawComment::Located { text, .. } => text,
        }
    }

    /// @ai:intent Get the comment's own location, if Doxygen reported one
    pub fn location(&self) -> Option<&RawLocation> {
        match self {
            RawComment::Text(_) => None,
            RawComment::Located { location, .. } => location.as_ref(),
        }
    }
}

impl RawLocation {
    /// @ai:intent Create a new location without column
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
        }
    }
}

impl DoxygenDocument {
    /// @ai:intent Parse a document from a JSON string
    /// @ai:effects pure
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// @ai:intent Append the compounds of another document, keeping order
    pub fn extend(&mut self, other: DoxygenDocument) {
        self.compounds.extend(other.compounds);
    }
}

/// @ai:intent Load a parsed tree from a JSON file or a directory of JSON files
/// @ai:pre path exists
/// @ai:post directory entries are concatenated in file-name order
/// @ai:effects fs:read
pub fn load_document(path: &Path) -> Result<DoxygenDocument> {
    if path.is_file() {
        return read_document_file(path);
    }

    if !path.is_dir() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    let files = find_document_files(path);
    if files.is_empty() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    let mut document = DoxygenDocument::default();
    for file in files {
        tracing::debug!("Reading doxygen tree fragment {}", file.display());
        document.extend(read_document_file(&file)?);
    }

    Ok(document)
}

/// @ai:intent Read a single JSON tree file
/// @ai:effects fs:read
fn read_document_file(path: &Path) -> Result<DoxygenDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    DoxygenDocument::from_json(&content).map_err(|e| Error::InvalidInput {
        path: path.to_path_buf(),
        source: e,
    })
}

/// @ai:intent Find all JSON files below a directory in a stable order
/// @ai:effects fs:read
fn find_document_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "json")
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}
