//! @ai:module:intent Extract requirement references and justifications from comment text
//! @ai:module:layer domain
//! @ai:module:public_api scan, scan_comment, TagScan, RequirementRef, ParseError
//! @ai:module:depends_on entity
//! @ai:module:stateless true

use crate::entity::{DocComment, SourceLocation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// @ai:intent Dotted requirement identifier such as `SwRequirements.sw_req_foo`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementRef(String);

impl RequirementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequirementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// @ai:intent Tags found in one comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagScan {
    pub justification: Option<String>,
    /// Deduplicated, first-seen order.
    pub requirements: Vec<RequirementRef>,
    /// Justifications after the first one; they are not used.
    pub extra_justifications: Vec<String>,
}

impl TagScan {
    pub fn is_empty(&self) -> bool {
        self.justification.is_none() && self.requirements.is_empty()
    }

    fn push_requirement(&mut self, id: &str) {
        let req = RequirementRef::new(id);
        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }
    }

    fn push_justification(&mut self, text: String) {
        if self.justification.is_none() {
            self.justification = Some(text);
        } else {
            self.extra_justifications.push(text);
        }
    }
}

/// @ai:intent Malformed tag syntax, relative to the start of the comment text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSyntaxError {
    pub line_offset: usize,
    pub message: String,
}

/// @ai:intent Malformed tag syntax, attributed to a file position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub location: SourceLocation,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Implements,
    Justification,
}

impl TagKind {
    fn name(&self) -> &'static str {
        match self {
            TagKind::Implements => "@implements",
            TagKind::Justification => "@justification",
        }
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[@\\](implements|justification)\b").expect("Invalid regex"))
}

/// A tag followed by its opening brace; a bare tag name inside braces is prose.
fn opening_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[@\\](implements|justification)[ \t]*\{").expect("Invalid regex")
    })
}

/// Matches the paragraphs Doxygen emits when it expands the tag aliases.
fn expanded_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\*?\s*(Requirement|Justification):\s+(.*?)\s*$").expect("Invalid regex")
    })
}

/// @ai:intent Scan a comment and attribute syntax errors to its location
/// @ai:effects pure
pub fn scan_comment(comment: &DocComment) -> Result<TagScan, ParseError> {
    scan(&comment.text).map_err(|e| ParseError {
        location: comment.location.offset_lines(e.line_offset),
        message: e.message,
    })
}

/// @ai:intent Extract justification and requirement references from raw comment text
/// @ai:post requirements contain no duplicates and keep first-seen order
/// @ai:example ("@implements{A.x} @implements{A.x}") -> requirements [A.x]
/// @ai:example ("plain text") -> empty scan
/// @ai:effects pure
pub fn scan(text: &str) -> Result<TagScan, TagSyntaxError> {
    let mut result = TagScan::default();
    let mut cursor = 0;

    while let Some(m) = tag_regex().find_at(text, cursor) {
        let kind = match &text[m.start() + 1..m.end()] {
            "implements" => TagKind::Implements,
            _ => TagKind::Justification,
        };
        let line_offset = text[..m.start()].matches('\n').count();

        let (content, end) = capture_braced(text, m.end(), kind).map_err(|message| {
            TagSyntaxError {
                line_offset,
                message,
            }
        })?;

        match kind {
            TagKind::Implements => {
                let ids: Vec<&str> = content
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .collect();

                if ids.is_empty() {
                    return Err(TagSyntaxError {
                        line_offset,
                        message: "@implements without a requirement reference".to_string(),
                    });
                }

                for id in ids {
                    result.push_requirement(id);
                }
            }
            TagKind::Justification => {
                let justification = collapse_whitespace(content);
                if justification.is_empty() {
                    return Err(TagSyntaxError {
                        line_offset,
                        message: "@justification without text".to_string(),
                    });
                }
                result.push_justification(justification);
            }
        }

        cursor = end;
    }

    scan_expanded(text, &mut result);

    Ok(result)
}

/// @ai:intent Capture the flat `{...}` argument following a tag
/// @ai:post returns the content and the byte index just past the closing brace
/// @ai:effects pure
fn capture_braced(text: &str, start: usize, kind: TagKind) -> Result<(&str, usize), String> {
    let rest = &text[start..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    let open = start + (rest.len() - trimmed.len());

    if !trimmed.starts_with('{') {
        return Err(format!("expected '{{' after {}", kind.name()));
    }

    let body_start = open + 1;
    let close = text[body_start..]
        .find('}')
        .map(|idx| body_start + idx)
        .ok_or_else(|| format!("unterminated {} tag, missing '}}'", kind.name()))?;

    let content = &text[body_start..close];
    if opening_tag_regex().is_match(content) {
        return Err(format!("unterminated {} tag, missing '}}'", kind.name()));
    }

    Ok((content, close + 1))
}

/// @ai:intent Pick up the `Requirement: x` / `Justification: y` paragraphs of expanded aliases
/// @ai:effects pure
fn scan_expanded(text: &str, result: &mut TagScan) {
    for line in text.lines() {
        let Some(captures) = expanded_regex().captures(line) else {
            continue;
        };
        let value = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

        match captures.get(1).map(|m| m.as_str()) {
            // Doxygen keeps same-line remarks in the paragraph; only the first token is the id.
            Some("Requirement") => {
                if let Some(id) = value.split_whitespace().next() {
                    result.push_requirement(id);
                }
            }
            Some("Justification") if !value.is_empty() => {
                result.push_justification(value.to_string());
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.trim_start_matches('*'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
