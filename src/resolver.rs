//! @ai:module:intent Decide the traceability status of every entity from its own comment
//! @ai:module:layer domain
//! @ai:module:public_api resolve, resolve_tree, TraceItem, TraceStatus, Resolution, ResolvedItems
//! @ai:module:depends_on entity, scanner, reconcile, diagnostic, emitter
//! @ai:module:stateless true
//!
//! Resolution never looks at parents or children: a justified class does not
//! justify its methods, and a tagged method says nothing about its class.

use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::emitter::{file_scoped_tag, trace_tag};
use crate::entity::{Entity, EntityId, EntityKind, EntityTree, SourceLocation};
use crate::reconcile::Reconciliation;
use crate::scanner::{scan_comment, RequirementRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// @ai:intent Final traceability status of an entity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Requirement,
    Justified,
    Unspecified,
}

impl TraceStatus {
    pub fn is_tagged(&self) -> bool {
        !matches!(self, TraceStatus::Unspecified)
    }
}

impl fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceStatus::Requirement => "requirement",
            TraceStatus::Justified => "justified",
            TraceStatus::Unspecified => "unspecified",
        };
        f.write_str(s)
    }
}

/// @ai:intent One resolved entity, ready to be emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceItem {
    pub entity: EntityId,
    pub tag: String,
    pub name: String,
    pub kind: EntityKind,
    pub language: String,
    pub location: SourceLocation,
    pub status: TraceStatus,
    /// Non-empty iff status is Requirement.
    pub requirements: Vec<RequirementRef>,
    /// Present iff status is Justified.
    pub justification: Option<String>,
    pub groups: Vec<String>,
    /// Warnings and errors attached to this entity, as `<code> <message>`.
    pub messages: Vec<String>,
}

impl TraceItem {
    fn attach(&mut self, diagnostic: &Diagnostic) {
        self.messages
            .push(format!("{} {}", diagnostic.code, diagnostic.message));
    }
}

/// @ai:intent Item for one entity plus the findings raised while resolving it
#[derive(Debug, Clone)]
pub struct Resolution {
    pub item: TraceItem,
    pub diagnostics: Vec<Diagnostic>,
}

/// @ai:intent Resolved items of a whole tree in emission order
#[derive(Debug, Clone, Default)]
pub struct ResolvedItems {
    pub items: Vec<TraceItem>,
    pub diagnostics: Vec<Diagnostic>,
    /// Non-authoritative halves of declaration/definition pairs.
    pub suppressed: Vec<EntityId>,
}

/// @ai:intent Resolve one entity from its own comment only
/// @ai:post requirements non-empty iff status is Requirement
/// @ai:post justification present iff status is Justified
/// @ai:effects pure
pub fn resolve(entity: &Entity) -> Resolution {
    let mut item = TraceItem {
        entity: entity.id,
        tag: trace_tag(entity),
        name: entity.display_name(),
        kind: entity.kind,
        language: entity.language.clone(),
        location: entity.location.clone(),
        status: TraceStatus::Unspecified,
        requirements: Vec::new(),
        justification: None,
        groups: entity.groups.clone(),
        messages: Vec::new(),
    };
    let mut diagnostics = Vec::new();

    let Some(comment) = &entity.comment else {
        return Resolution { item, diagnostics };
    };

    let scan = match scan_comment(comment) {
        Ok(scan) => scan,
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                DiagnosticCode::ParseError,
                format!("{} in comment of {}", e.message, entity.display_name()),
                e.location,
            ));
            for d in &diagnostics {
                item.attach(d);
            }
            return Resolution { item, diagnostics };
        }
    };

    for extra in &scan.extra_justifications {
        diagnostics.push(Diagnostic::warning(
            DiagnosticCode::DuplicateJustification,
            format!("additional @justification ignored: {}", extra),
            comment.location.clone(),
        ));
    }

    if !scan.requirements.is_empty() {
        if scan.justification.is_some() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ConflictingTags,
                format!(
                    "{} has both @implements and @justification, justification ignored",
                    entity.display_name()
                ),
                comment.location.clone(),
            ));
        }
        item.status = TraceStatus::Requirement;
        item.requirements = scan.requirements;
    } else if let Some(justification) = scan.justification {
        item.status = TraceStatus::Justified;
        item.justification = Some(justification);
    }

    for d in &diagnostics {
        item.attach(d);
    }

    Resolution { item, diagnostics }
}

/// @ai:intent Resolve every entity and drop the non-authoritative side of each pair
/// @ai:post items follow pre-order traversal of the tree
/// @ai:post each paired entity either yields the single item of its pair or nothing
/// @ai:effects pure
pub fn resolve_tree(tree: &EntityTree, reconciliation: &Reconciliation) -> ResolvedItems {
    let mut resolutions: Vec<Option<Resolution>> = tree
        .iter()
        .map(|e| {
            let mut resolution = resolve(e);
            if reconciliation.file_scoped.contains(&e.id) {
                resolution.item.tag = file_scoped_tag(e);
            }
            Some(resolution)
        })
        .collect();

    let mut suppressed = HashSet::new();
    let mut result = ResolvedItems::default();

    for pair in &reconciliation.pairs {
        let (Some(decl), Some(def)) = (
            resolutions[pair.declaration.0].as_ref(),
            resolutions[pair.definition.0].as_ref(),
        ) else {
            continue;
        };

        let decl_tagged = decl.item.status.is_tagged();
        let def_tagged = def.item.status.is_tagged();
        let (winner, loser) = if def_tagged && !decl_tagged {
            (pair.definition, pair.declaration)
        } else {
            (pair.declaration, pair.definition)
        };

        if decl_tagged && def_tagged {
            let location = tree.get(pair.definition).location.clone();
            let diagnostic = Diagnostic::warning(
                DiagnosticCode::DuplicateDeclDefTags,
                format!(
                    "tags on the definition of {} are ignored, the declaration at {} takes precedence",
                    tree.get(pair.declaration).display_name(),
                    tree.get(pair.declaration).location
                ),
                location,
            );
            if let Some(resolution) = resolutions[winner.0].as_mut() {
                resolution.item.attach(&diagnostic);
                resolution.diagnostics.push(diagnostic);
            }
        }

        tracing::debug!(
            "{} at {} represented by {}",
            tree.get(loser).display_name(),
            tree.get(loser).location,
            tree.get(winner).location
        );
        suppressed.insert(loser);
    }

    for id in tree.preorder() {
        let Some(resolution) = resolutions[id.0].take() else {
            continue;
        };
        result.diagnostics.extend(resolution.diagnostics);

        if suppressed.contains(&id) {
            result.suppressed.push(id);
        } else {
            result.items.push(resolution.item);
        }
    }

    tracing::info!(
        "Resolved {} trace items ({} suppressed)",
        result.items.len(),
        result.suppressed.len()
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::entity;
    use crate::entity::DocComment;
    use crate::reconcile::DeclDefPair;
    use pretty_assertions::assert_eq;

    fn documented(kind: EntityKind, name: &str, text: &str) -> Entity {
        let mut e = entity(kind, name);
        e.comment = Some(DocComment {
            text: text.to_string(),
            location: SourceLocation::new("main.cpp", 1),
        });
        e
    }

    fn reqs(item: &TraceItem) -> Vec<&str> {
        item.requirements.iter().map(|r| r.as_str()).collect()
    }

    #[test]
    fn test_no_comment_is_unspecified() {
        let r = resolve(&entity(EntityKind::Function, "foo"));
        assert_eq!(r.item.status, TraceStatus::Unspecified);
        assert!(r.item.requirements.is_empty());
        assert_eq!(r.item.justification, None);
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn test_plain_comment_is_unspecified() {
        let r = resolve(&documented(EntityKind::Struct, "Point", "@brief A 2D point"));
        assert_eq!(r.item.status, TraceStatus::Unspecified);
    }

    #[test]
    fn test_requirement() {
        let r = resolve(&documented(
            EntityKind::Function,
            "foo1",
            "@implements{SwRequirements.sw_req_foo1}",
        ));
        assert_eq!(r.item.status, TraceStatus::Requirement);
        assert_eq!(reqs(&r.item), vec!["SwRequirements.sw_req_foo1"]);
    }

    #[test]
    fn test_justified() {
        let r = resolve(&documented(
            EntityKind::Function,
            "foo2",
            "@justification{foo2 justification}",
        ));
        assert_eq!(r.item.status, TraceStatus::Justified);
        assert_eq!(r.item.justification.as_deref(), Some("foo2 justification"));
    }

    #[test]
    fn test_conflicting_tags_keep_requirement_and_warn() {
        let r = resolve(&documented(
            EntityKind::Function,
            "foo",
            "@implements{A.b}\n@justification{not needed}",
        ));
        assert_eq!(r.item.status, TraceStatus::Requirement);
        assert_eq!(r.item.justification, None);
        assert_eq!(r.diagnostics.len(), 1);
        assert_eq!(r.diagnostics[0].code, DiagnosticCode::ConflictingTags);
        assert_eq!(r.item.messages.len(), 1);
        assert!(r.item.messages[0].starts_with("W100 "));
    }

    #[test]
    fn test_parse_error_is_unspecified_with_diagnostic() {
        let r = resolve(&documented(EntityKind::Method, "run", "@implements{A.b"));
        assert_eq!(r.item.status, TraceStatus::Unspecified);
        assert_eq!(r.diagnostics[0].code, DiagnosticCode::ParseError);
        assert!(!r.item.messages.is_empty());
    }

    #[test]
    fn test_class_and_method_resolve_independently() {
        let mut tree = EntityTree::new();
        let class = tree.insert(
            documented(EntityKind::Class, "Game", "@justification{UI glue}"),
            None,
        );
        tree.insert(
            documented(EntityKind::Method, "Game::run", "@implements{SwRequirements.sw_req_run}"),
            Some(class),
        );
        tree.insert(entity(EntityKind::Method, "Game::stop"), Some(class));

        let resolved = resolve_tree(&tree, &Reconciliation::default());
        let statuses: Vec<TraceStatus> = resolved.items.iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![
                TraceStatus::Justified,
                TraceStatus::Requirement,
                TraceStatus::Unspecified
            ]
        );
    }

    #[test]
    fn test_group_membership_does_not_change_status() {
        let text = "@implements{SwRequirements.sw_req_grouped}";
        let plain = resolve(&documented(EntityKind::Function, "a", text));
        let mut in_group = documented(EntityKind::Function, "b", text);
        in_group.groups = vec!["Board".to_string()];
        let grouped = resolve(&in_group);

        assert_eq!(plain.item.status, grouped.item.status);
        assert_eq!(plain.item.requirements, grouped.item.requirements);
        assert_eq!(grouped.item.groups, vec!["Board".to_string()]);
    }

    fn paired_tree(decl_text: Option<&str>, def_text: Option<&str>) -> (EntityTree, Reconciliation) {
        let mut tree = EntityTree::new();
        let h = tree.insert(entity(EntityKind::File, "FunctionPrototype.h"), None);
        let mut decl = match decl_text {
            Some(text) => documented(EntityKind::FunctionPrototype, "foo", text),
            None => entity(EntityKind::FunctionPrototype, "foo"),
        };
        decl.signature = Some("()".to_string());
        decl.location = SourceLocation::new("FunctionPrototype.h", 36);
        let declaration = tree.insert(decl, Some(h));

        let c = tree.insert(entity(EntityKind::File, "FunctionPrototype.cpp"), None);
        let mut def = match def_text {
            Some(text) => documented(EntityKind::Function, "foo", text),
            None => entity(EntityKind::Function, "foo"),
        };
        def.signature = Some("()".to_string());
        def.location = SourceLocation::new("FunctionPrototype.cpp", 40);
        def.has_body = true;
        let definition = tree.insert(def, Some(c));

        let reconciliation = Reconciliation {
            pairs: vec![DeclDefPair {
                declaration,
                definition,
            }],
            ..Default::default()
        };
        (tree, reconciliation)
    }

    #[test]
    fn test_file_scoped_entities_get_file_tags() {
        let mut tree = EntityTree::new();
        let mut a = entity(EntityKind::Function, "helper");
        a.signature = Some("()".to_string());
        a.location = SourceLocation::new("a.c", 5);
        let first = tree.insert(a, None);
        let mut b = entity(EntityKind::Function, "helper");
        b.signature = Some("()".to_string());
        b.location = SourceLocation::new("b.c", 7);
        let second = tree.insert(b, None);

        let reconciliation = Reconciliation {
            file_scoped: HashSet::from([first, second]),
            ..Default::default()
        };
        let resolved = resolve_tree(&tree, &reconciliation);
        let tags: Vec<&str> = resolved.items.iter().map(|i| i.tag.as_str()).collect();
        assert_eq!(tags, vec!["cpp function:a.c:helper()", "cpp function:b.c:helper()"]);
        assert_eq!(resolved.items[0].name, "helper()");
    }

    fn functions(resolved: &ResolvedItems) -> Vec<&TraceItem> {
        resolved
            .items
            .iter()
            .filter(|i| i.kind.is_function_like())
            .collect()
    }

    #[test]
    fn test_tagged_prototype_wins_over_untagged_body() {
        let (tree, rec) = paired_tree(Some("@implements{SwRequirements.sw_req_prototype}"), None);
        let resolved = resolve_tree(&tree, &rec);

        let items = functions(&resolved);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, TraceStatus::Requirement);
        assert_eq!(items[0].location, SourceLocation::new("FunctionPrototype.h", 36));
        assert_eq!(resolved.suppressed.len(), 1);
    }

    #[test]
    fn test_tagged_body_wins_over_untagged_prototype() {
        let (tree, rec) = paired_tree(None, Some("@justification{Prototype justification}"));
        let resolved = resolve_tree(&tree, &rec);

        let items = functions(&resolved);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, TraceStatus::Justified);
        assert_eq!(items[0].kind, EntityKind::Function);
    }

    #[test]
    fn test_untagged_pair_emits_prototype() {
        let (tree, rec) = paired_tree(None, None);
        let resolved = resolve_tree(&tree, &rec);

        let items = functions(&resolved);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, EntityKind::FunctionPrototype);
        assert_eq!(items[0].status, TraceStatus::Unspecified);
    }

    #[test]
    fn test_both_sides_tagged_keeps_prototype_and_warns() {
        let (tree, rec) = paired_tree(Some("@implements{A.x}"), Some("@implements{A.y}"));
        let resolved = resolve_tree(&tree, &rec);

        let items = functions(&resolved);
        assert_eq!(items.len(), 1);
        assert_eq!(reqs(items[0]), vec!["A.x"]);
        assert!(resolved
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::DuplicateDeclDefTags));
        assert!(items[0].messages.iter().any(|m| m.starts_with("W200")));
    }
}
