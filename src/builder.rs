//! @ai:module:intent Build the entity graph from a parsed Doxygen document
//! @ai:module:layer application
//! @ai:module:public_api build_tree, BuildOutput, normalize_signature
//! @ai:module:depends_on doxygen, entity, diagnostic, config
//! @ai:module:stateless true

use crate::config::InputConfig;
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::doxygen::{CompoundDef, DoxygenDocument, MemberDef, Param, RawComment, RawLocation};
use crate::entity::{DocComment, Entity, EntityId, EntityKind, EntityTree, SourceLocation};
use std::collections::{HashMap, HashSet};

/// @ai:intent Result of building the entity graph
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub tree: EntityTree,
    pub diagnostics: Vec<Diagnostic>,
}

const FUNCTION_LIKE_MEMBER_KINDS: [&str; 4] = ["function", "prototype", "signal", "slot"];

/// @ai:intent Map a Doxygen compound kind to an entity kind, None when not trace-eligible
/// @ai:example ("struct") -> Some(Struct)
/// @ai:example ("dir") -> None
/// @ai:effects pure
pub fn compound_kind(kind: &str) -> Option<EntityKind> {
    match kind {
        "file" => Some(EntityKind::File),
        "group" => Some(EntityKind::Group),
        "namespace" => Some(EntityKind::Namespace),
        "class" => Some(EntityKind::Class),
        "struct" => Some(EntityKind::Struct),
        "union" => Some(EntityKind::Union),
        "interface" => Some(EntityKind::InterfaceType),
        _ => None,
    }
}

fn is_function_like_member(kind: &str) -> bool {
    FUNCTION_LIKE_MEMBER_KINDS.contains(&kind)
}

/// Parent preference when a compound is listed as inner by several compounds.
fn nesting_priority(kind: EntityKind) -> u8 {
    match kind {
        k if k.is_class_like() => 3,
        EntityKind::Namespace => 2,
        EntityKind::File => 1,
        _ => 0,
    }
}

/// @ai:intent Normalise a parameter list into a comparable signature
/// @ai:example ([void], false) -> "()"
/// @ai:example (["const char *", "int"], true) -> "(const char*, int) const"
/// @ai:effects pure
pub fn normalize_signature(params: &[Param], is_const: bool) -> String {
    let types: Vec<String> = params
        .iter()
        .map(|p| {
            p.type_name
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .replace(" *", "*")
                .replace(" &", "&")
        })
        .filter(|t| !t.is_empty())
        .collect();

    let list = if types.len() == 1 && types[0] == "void" {
        String::new()
    } else {
        types.join(", ")
    };

    if is_const {
        format!("({}) const", list)
    } else {
        format!("({})", list)
    }
}

/// Eligible compounds of the document with their resolved nesting.
struct CompoundIndex<'a> {
    compounds: Vec<(&'a CompoundDef, EntityKind)>,
    by_id: HashMap<&'a str, usize>,
    parent: Vec<Option<usize>>,
    /// Groups that list a compound without being its parent.
    group_refs: Vec<Vec<String>>,
}

/// @ai:intent Build the entity graph from a parsed Doxygen document
/// @ai:post every eligible compound and function-like member appears exactly once
/// @ai:post interface classification is applied after all children are attached
/// @ai:effects pure
pub fn build_tree(document: &DoxygenDocument, config: &InputConfig) -> BuildOutput {
    let mut diagnostics = Vec::new();
    let index = index_compounds(document, &mut diagnostics);
    let members = assign_members(&index);

    let mut builder = TreeBuilder {
        index: &index,
        members: &members,
        config,
        tree: EntityTree::new(),
    };

    for (idx, parent) in index.parent.iter().enumerate() {
        if parent.is_none() {
            builder.insert_compound(idx, None);
        }
    }

    let mut tree = builder.tree;
    classify_out_of_line_methods(&mut tree);
    classify_interfaces(&mut tree);

    tracing::info!("Built entity tree with {} entities", tree.len());

    BuildOutput { tree, diagnostics }
}

/// @ai:intent Index eligible compounds and choose one parent for each
/// @ai:effects pure
fn index_compounds<'a>(
    document: &'a DoxygenDocument,
    diagnostics: &mut Vec<Diagnostic>,
) -> CompoundIndex<'a> {
    let mut compounds = Vec::new();
    let mut by_id = HashMap::new();
    let all_ids: HashSet<&str> = document.compounds.iter().map(|c| c.id.as_str()).collect();

    for compound in &document.compounds {
        let Some(kind) = compound_kind(&compound.kind) else {
            tracing::debug!("compound: {} kind: {} (skipped)", compound.name, compound.kind);
            continue;
        };

        if by_id.contains_key(compound.id.as_str()) {
            tracing::debug!("compound: {} listed twice, keeping the first", compound.id);
            continue;
        }

        by_id.insert(compound.id.as_str(), compounds.len());
        compounds.push((compound, kind));
    }

    let mut referrers: Vec<Vec<usize>> = vec![Vec::new(); compounds.len()];
    for (idx, (compound, _)) in compounds.iter().enumerate() {
        for inner in &compound.inner {
            match by_id.get(inner.as_str()) {
                Some(&target) if target != idx => {
                    if !referrers[target].contains(&idx) {
                        referrers[target].push(idx);
                    }
                }
                Some(_) => {
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::ReferenceCycle,
                        format!("{} lists itself as inner compound", compound.name),
                        raw_location(compound.location.as_ref()),
                    ));
                }
                None if all_ids.contains(inner.as_str()) => {}
                None => {
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::DanglingReference,
                        format!("{} references unknown compound '{}'", compound.name, inner),
                        raw_location(compound.location.as_ref()),
                    ));
                }
            }
        }
    }

    let mut parent = vec![None; compounds.len()];
    let mut group_refs = vec![Vec::new(); compounds.len()];

    for (idx, refs) in referrers.iter().enumerate() {
        let best = refs
            .iter()
            .copied()
            .fold(None, |best: Option<usize>, candidate| match best {
                Some(b)
                    if nesting_priority(compounds[b].1)
                        >= nesting_priority(compounds[candidate].1) =>
                {
                    Some(b)
                }
                _ => Some(candidate),
            });
        parent[idx] = best;

        for &r in refs {
            if Some(r) != best && compounds[r].1 == EntityKind::Group {
                group_refs[idx].push(compounds[r].0.name.clone());
            }
        }
    }

    break_cycles(&compounds, &mut parent, diagnostics);

    CompoundIndex {
        compounds,
        by_id,
        parent,
        group_refs,
    }
}

/// @ai:intent Turn compounds that are their own ancestor into roots
/// @ai:post following parent links from any compound terminates
/// @ai:effects pure
fn break_cycles(
    compounds: &[(&CompoundDef, EntityKind)],
    parent: &mut [Option<usize>],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for start in 0..parent.len() {
        let mut seen = HashSet::new();
        let mut current = parent[start];

        while let Some(node) = current {
            if node == start {
                let compound = compounds[start].0;
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::ReferenceCycle,
                    format!("{} is nested inside itself, treating it as top level", compound.name),
                    raw_location(compound.location.as_ref()),
                ));
                parent[start] = None;
                break;
            }
            if !seen.insert(node) {
                break;
            }
            current = parent[node];
        }
    }
}

/// Owning compound and extra group listings of a member.
struct MemberSlot {
    owner: usize,
    groups: Vec<String>,
}

/// @ai:intent Decide which compound owns each function-like member
/// @ai:post members listed by several compounds are owned by the first non-group listing
/// @ai:effects pure
fn assign_members(index: &CompoundIndex<'_>) -> HashMap<String, MemberSlot> {
    let mut slots: HashMap<String, MemberSlot> = HashMap::new();

    for (idx, (compound, kind)) in index.compounds.iter().enumerate() {
        for member in compound.members.iter().filter(|m| is_function_like_member(&m.kind)) {
            match slots.get_mut(&member.id) {
                None => {
                    slots.insert(
                        member.id.clone(),
                        MemberSlot {
                            owner: idx,
                            groups: Vec::new(),
                        },
                    );
                }
                Some(slot) => {
                    let owner_is_group = index.compounds[slot.owner].1 == EntityKind::Group;
                    if owner_is_group && *kind != EntityKind::Group {
                        slot.groups.push(index.compounds[slot.owner].0.name.clone());
                        slot.owner = idx;
                    } else if *kind == EntityKind::Group {
                        slot.groups.push(compound.name.clone());
                    }
                }
            }
        }
    }

    slots
}

struct TreeBuilder<'a, 'd> {
    index: &'a CompoundIndex<'d>,
    members: &'a HashMap<String, MemberSlot>,
    config: &'a InputConfig,
    tree: EntityTree,
}

impl TreeBuilder<'_, '_> {
    /// @ai:intent Insert a compound, its inner compounds and its members
    fn insert_compound(&mut self, idx: usize, parent: Option<EntityId>) {
        let index = self.index;
        let members = self.members;
        let (compound, kind) = index.compounds[idx];
        tracing::debug!("compound: {} kind: {}", compound.name, compound.kind);

        let language = compound
            .language
            .clone()
            .or_else(|| parent.map(|p| self.tree.get(p).language.clone()))
            .unwrap_or_else(|| self.config.default_language.clone());

        let location = raw_location(compound.location.as_ref());
        let qualified_name = match (kind, &compound.location) {
            (EntityKind::File, Some(loc)) => loc.file.display().to_string(),
            _ => compound.name.clone(),
        };

        let mut groups = compound.groups.clone();
        groups.extend(index.group_refs[idx].iter().cloned());
        if let Some(p) = parent {
            let parent_entity = self.tree.get(p);
            if parent_entity.kind == EntityKind::Group {
                groups.push(parent_entity.name.clone());
            }
        }
        dedup_in_order(&mut groups);

        let entity = Entity {
            id: EntityId(0),
            source_id: compound.id.clone(),
            kind,
            name: compound.name.clone(),
            qualified_name,
            signature: None,
            language,
            comment: doc_comment(compound.comment.as_ref(), &location),
            location,
            children: Vec::new(),
            parent: None,
            groups,
            has_body: false,
            pure_virtual: false,
        };
        let id = self.tree.insert(entity, parent);

        for inner in &compound.inner {
            if let Some(&child) = index.by_id.get(inner.as_str()) {
                if index.parent[child] == Some(idx) {
                    self.insert_compound(child, Some(id));
                }
            }
        }

        for member in &compound.members {
            if !is_function_like_member(&member.kind) {
                tracing::debug!("  member: {} kind: {} (skipped)", member.name, member.kind);
                continue;
            }
            let owned = members
                .get(&member.id)
                .map(|slot| slot.owner == idx)
                .unwrap_or(false);
            if owned {
                self.insert_member(member, id);
            }
        }
    }

    /// @ai:intent Insert one function-like member under its owning compound
    fn insert_member(&mut self, member: &MemberDef, owner: EntityId) {
        let owner_entity = self.tree.get(owner);
        tracing::debug!("  member: {} kind: {}", member.name, member.kind);

        let kind = if owner_entity.kind.is_class_like() {
            EntityKind::Method
        } else if member.kind == "prototype" || member.body.is_none() {
            EntityKind::FunctionPrototype
        } else {
            EntityKind::Function
        };

        let qualified_name = member.qualified_name.clone().unwrap_or_else(|| {
            let is_scope = |e: &Entity| e.kind.is_class_like() || e.kind == EntityKind::Namespace;
            let scope = if is_scope(owner_entity) {
                Some(owner_entity)
            } else {
                self.tree.find_ancestor(owner, is_scope)
            };
            match scope {
                Some(scope) => format!("{}::{}", scope.qualified_name, member.name),
                None => member.name.clone(),
            }
        });

        let location = member
            .location
            .as_ref()
            .or(member.body.as_ref())
            .map(|l| raw_location(Some(l)))
            .unwrap_or_else(|| owner_entity.location.clone());

        let mut groups = member.groups.clone();
        if let Some(slot) = self.members.get(&member.id) {
            groups.extend(slot.groups.iter().cloned());
        }
        if owner_entity.kind == EntityKind::Group {
            groups.push(owner_entity.name.clone());
        }
        dedup_in_order(&mut groups);

        let entity = Entity {
            id: EntityId(0),
            source_id: member.id.clone(),
            kind,
            name: member.name.clone(),
            qualified_name,
            signature: Some(normalize_signature(&member.params, member.is_const)),
            language: owner_entity.language.clone(),
            comment: doc_comment(member.comment.as_ref(), &location),
            location,
            children: Vec::new(),
            parent: None,
            groups,
            has_body: member.body.is_some(),
            pure_virtual: member.pure_virtual,
        };

        self.tree.insert(entity, Some(owner));
    }
}

/// @ai:intent Relabel out-of-line member function bodies listed under a file or namespace as methods
/// @ai:pre the tree is fully built
/// @ai:post a Function whose qualified scope names a class-like entity is a Method
/// @ai:effects pure
fn classify_out_of_line_methods(tree: &mut EntityTree) {
    let classes: HashSet<&str> = tree
        .iter()
        .filter(|e| e.kind.is_class_like())
        .map(|e| e.qualified_name.as_str())
        .collect();

    let relabels: Vec<EntityId> = tree
        .iter()
        .filter(|e| e.kind == EntityKind::Function)
        .filter(|e| {
            e.qualified_name
                .rsplit_once("::")
                .is_some_and(|(scope, _)| classes.contains(scope))
        })
        .map(|e| e.id)
        .collect();

    for id in relabels {
        tracing::debug!("{} reclassified as {}", tree.get(id).qualified_name, EntityKind::Method);
        tree.get_mut(id).kind = EntityKind::Method;
    }
}

/// @ai:intent Relabel classes with pure virtual methods as interfaces
/// @ai:pre the tree is fully built
/// @ai:post a Class/Struct becomes InterfaceType iff it has a pure virtual method
/// @ai:post pure virtual methods of any class-like or interface compound become InterfaceMethod
/// @ai:effects pure
fn classify_interfaces(tree: &mut EntityTree) {
    let relabels: Vec<(EntityId, EntityKind)> = tree
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EntityKind::Class | EntityKind::Struct | EntityKind::InterfaceType
            )
        })
        .flat_map(|class| {
            let pure: Vec<EntityId> = tree
                .children(class.id)
                .filter(|c| c.kind == EntityKind::Method && c.pure_virtual)
                .map(|c| c.id)
                .collect();

            let class_relabel = (!pure.is_empty() && class.kind != EntityKind::InterfaceType)
                .then_some((class.id, EntityKind::InterfaceType));
            class_relabel
                .into_iter()
                .chain(pure.into_iter().map(|m| (m, EntityKind::InterfaceMethod)))
        })
        .collect();

    for (id, kind) in relabels {
        tracing::debug!("{} reclassified as {}", tree.get(id).qualified_name, kind);
        tree.get_mut(id).kind = kind;
    }
}

fn raw_location(location: Option<&RawLocation>) -> SourceLocation {
    location
        .map(|l| SourceLocation {
            file: l.file.clone(),
            line: l.line,
            column: l.column,
        })
        .unwrap_or_default()
}

fn doc_comment(comment: Option<&RawComment>, fallback: &SourceLocation) -> Option<DocComment> {
    let comment = comment?;
    if comment.text().trim().is_empty() {
        return None;
    }

    Some(DocComment {
        text: comment.text().to_string(),
        location: comment
            .location()
            .map(|l| raw_location(Some(l)))
            .unwrap_or_else(|| fallback.clone()),
    })
}

fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}
