//! @ai:module:intent Pair function declarations with their out-of-line definitions
//! @ai:module:layer application
//! @ai:module:public_api reconcile, DeclDefPair, Reconciliation
//! @ai:module:depends_on entity, diagnostic, config
//! @ai:module:stateless true

use crate::config::InputConfig;
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::entity::{Entity, EntityId, EntityKind, EntityTree};
use std::collections::{HashMap, HashSet};

/// @ai:intent Association between a declaration and the definition implementing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclDefPair {
    pub declaration: EntityId,
    pub definition: EntityId,
}

/// @ai:intent All pairs found in a tree plus ambiguity reports
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub pairs: Vec<DeclDefPair>,
    pub diagnostics: Vec<Diagnostic>,
    /// Functions whose tag carries their file: file-local functions and
    /// every side of an ambiguous match.
    pub file_scoped: HashSet<EntityId>,
}

impl Reconciliation {
    /// @ai:intent Find the pair an entity belongs to, if any
    pub fn pair_of(&self, id: EntityId) -> Option<&DeclDefPair> {
        self.pairs
            .iter()
            .find(|p| p.declaration == id || p.definition == id)
    }
}

/// @ai:intent Key used to match declarations and definitions; return type is not part of it
/// @ai:example (Counter::Counter, "()") -> "Counter::Counter()"
/// @ai:effects pure
pub fn match_key(entity: &Entity) -> String {
    format!(
        "{}{}",
        entity.qualified_name,
        entity.signature.as_deref().unwrap_or("()")
    )
}

fn is_declaration(entity: &Entity) -> bool {
    match entity.kind {
        EntityKind::FunctionPrototype => true,
        EntityKind::Method => !entity.has_body,
        _ => false,
    }
}

fn is_definition(entity: &Entity) -> bool {
    matches!(entity.kind, EntityKind::Function | EntityKind::Method) && entity.has_body
}

#[derive(Default)]
struct Candidates {
    declarations: Vec<EntityId>,
    definitions: Vec<EntityId>,
}

/// @ai:intent Build declaration/definition pairs for a whole tree
/// @ai:post every entity appears in at most one pair
/// @ai:post ambiguous signatures are reported and left unpaired
/// @ai:effects pure
pub fn reconcile(tree: &EntityTree, config: &InputConfig) -> Reconciliation {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, Candidates> = HashMap::new();

    for id in tree.preorder() {
        let entity = tree.get(id);
        let declaration = is_declaration(entity);
        if !declaration && !is_definition(entity) {
            continue;
        }

        let key = match_key(entity);
        let slot = by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Candidates::default()
        });

        if declaration {
            slot.declarations.push(id);
        } else {
            slot.definitions.push(id);
        }
    }

    let mut result = Reconciliation::default();
    for key in order {
        let Some(candidates) = by_key.get(&key) else {
            continue;
        };
        if candidates.declarations.is_empty() || candidates.definitions.is_empty() {
            continue;
        }
        pair_candidates(tree, config, &key, candidates, &mut result);
    }

    for id in tree.preorder() {
        if is_file_local(tree, config, id, &result) {
            result.file_scoped.insert(id);
        }
    }

    tracing::info!(
        "Paired {} declaration(s) with their definitions",
        result.pairs.len()
    );

    result
}

/// @ai:intent Whether a free function is only visible in its own translation unit
/// @ai:post false for methods, namespace members and anything paired with a header declaration
/// @ai:effects pure
fn is_file_local(tree: &EntityTree, config: &InputConfig, id: EntityId, result: &Reconciliation) -> bool {
    let entity = tree.get(id);
    if !matches!(entity.kind, EntityKind::Function | EntityKind::FunctionPrototype) {
        return false;
    }

    let file = &entity.location.file;
    if file.as_os_str().is_empty() || config.is_header(file) {
        return false;
    }

    let scoped = |e: &Entity| e.kind.is_class_like() || e.kind == EntityKind::Namespace;
    if tree.find_ancestor(id, scoped).is_some() {
        return false;
    }

    match result.pair_of(id) {
        Some(pair) => !config.is_header(&tree.get(pair.declaration).location.file),
        None => true,
    }
}

/// @ai:intent Pair the declarations and definitions sharing one key
/// @ai:effects pure
fn pair_candidates(
    tree: &EntityTree,
    config: &InputConfig,
    key: &str,
    candidates: &Candidates,
    result: &mut Reconciliation,
) {
    // A declaration outside a header is file local and only sees its own file.
    let reachable = |decl: EntityId, def: EntityId| {
        let decl_file = &tree.get(decl).location.file;
        config.is_header(decl_file) || *decl_file == tree.get(def).location.file
    };

    let matches: Vec<(EntityId, Vec<EntityId>)> = candidates
        .declarations
        .iter()
        .map(|&decl| {
            let defs = candidates
                .definitions
                .iter()
                .copied()
                .filter(|&def| reachable(decl, def))
                .collect();
            (decl, defs)
        })
        .collect();

    let claims = |def: EntityId| matches.iter().filter(|(_, defs)| defs.contains(&def)).count();

    let mut ambiguous = Vec::new();
    for (decl, defs) in &matches {
        match defs.as_slice() {
            [] => {}
            [def] if claims(*def) == 1 => {
                tracing::debug!(
                    "{} declared at {} is defined at {}",
                    key,
                    tree.get(*decl).location,
                    tree.get(*def).location
                );
                result.pairs.push(DeclDefPair {
                    declaration: *decl,
                    definition: *def,
                });
            }
            _ => {
                ambiguous.push(*decl);
                for def in defs {
                    if !ambiguous.contains(def) {
                        ambiguous.push(*def);
                    }
                }
            }
        }
    }

    if ambiguous.is_empty() {
        return;
    }

    let locations: Vec<String> = ambiguous
        .iter()
        .map(|id| tree.get(*id).location.to_string())
        .collect();
    result.diagnostics.push(Diagnostic::error(
        DiagnosticCode::AmbiguousDeclDef,
        format!(
            "ambiguous declaration/definition match for {} ({}), processing each independently",
            key,
            locations.join(", ")
        ),
        tree.get(ambiguous[0]).location.clone(),
    ));
    result.file_scoped.extend(ambiguous);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SourceLocation;
    use crate::entity::tests::entity;

    fn function(name: &str, kind: EntityKind, file: &str, line: usize, body: bool) -> Entity {
        let mut e = entity(kind, name);
        e.signature = Some("()".to_string());
        e.location = SourceLocation::new(file, line);
        e.has_body = body;
        e
    }

    #[test]
    fn test_header_prototype_pairs_with_source_definition() {
        let mut tree = EntityTree::new();
        let h = tree.insert(entity(EntityKind::File, "FunctionPrototype.h"), None);
        let decl = tree.insert(
            function("FunctionPrototype_foo", EntityKind::FunctionPrototype, "src/FunctionPrototype.h", 36, false),
            Some(h),
        );
        let c = tree.insert(entity(EntityKind::File, "FunctionPrototype.cpp"), None);
        let def = tree.insert(
            function("FunctionPrototype_foo", EntityKind::Function, "src/FunctionPrototype.cpp", 40, true),
            Some(c),
        );

        let result = reconcile(&tree, &InputConfig::default());
        assert_eq!(
            result.pairs,
            vec![DeclDefPair {
                declaration: decl,
                definition: def
            }]
        );
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.pair_of(def).map(|p| p.declaration), Some(decl));
    }

    #[test]
    fn test_static_forward_declaration_pairs_in_same_file() {
        let mut tree = EntityTree::new();
        let c = tree.insert(entity(EntityKind::File, "FunctionPrototype.cpp"), None);
        let decl = tree.insert(
            function("foo3", EntityKind::FunctionPrototype, "src/FunctionPrototype.cpp", 27, false),
            Some(c),
        );
        let def = tree.insert(
            function("foo3", EntityKind::Function, "src/FunctionPrototype.cpp", 70, true),
            Some(c),
        );
        let other = tree.insert(entity(EntityKind::File, "Other.cpp"), None);
        tree.insert(function("foo3", EntityKind::Function, "src/Other.cpp", 5, true), Some(other));

        let result = reconcile(&tree, &InputConfig::default());
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].declaration, decl);
        assert_eq!(result.pairs[0].definition, def);
    }

    #[test]
    fn test_unmatched_entities_stay_unpaired() {
        let mut tree = EntityTree::new();
        let c = tree.insert(entity(EntityKind::File, "main.cpp"), None);
        tree.insert(function("main", EntityKind::Function, "main.cpp", 1, true), Some(c));
        tree.insert(function("unused", EntityKind::FunctionPrototype, "main.h", 1, false), Some(c));

        let result = reconcile(&tree, &InputConfig::default());
        assert!(result.pairs.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_two_definitions_for_one_header_prototype_is_ambiguous() {
        let mut tree = EntityTree::new();
        let h = tree.insert(entity(EntityKind::File, "api.h"), None);
        tree.insert(function("init", EntityKind::FunctionPrototype, "api.h", 3, false), Some(h));
        let a = tree.insert(entity(EntityKind::File, "a.cpp"), None);
        tree.insert(function("init", EntityKind::Function, "a.cpp", 1, true), Some(a));
        let b = tree.insert(entity(EntityKind::File, "b.cpp"), None);
        tree.insert(function("init", EntityKind::Function, "b.cpp", 1, true), Some(b));

        let result = reconcile(&tree, &InputConfig::default());
        assert!(result.pairs.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::AmbiguousDeclDef);
    }

    #[test]
    fn test_one_definition_for_two_header_prototypes_is_ambiguous() {
        let mut tree = EntityTree::new();
        let a = tree.insert(entity(EntityKind::File, "a.h"), None);
        let first = tree.insert(function("init", EntityKind::FunctionPrototype, "a.h", 2, false), Some(a));
        let b = tree.insert(entity(EntityKind::File, "b.h"), None);
        let second = tree.insert(function("init", EntityKind::FunctionPrototype, "b.h", 4, false), Some(b));
        let c = tree.insert(entity(EntityKind::File, "init.cpp"), None);
        let def = tree.insert(function("init", EntityKind::Function, "init.cpp", 7, true), Some(c));

        let result = reconcile(&tree, &InputConfig::default());
        assert!(result.pairs.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::AmbiguousDeclDef);
        for location in ["a.h:2", "b.h:4", "init.cpp:7"] {
            assert!(result.diagnostics[0].message.contains(location));
        }
        assert_eq!(result.file_scoped, HashSet::from([first, second, def]));
    }

    #[test]
    fn test_file_local_functions_are_file_scoped() {
        let mut tree = EntityTree::new();
        let h = tree.insert(entity(EntityKind::File, "api.h"), None);
        let api_decl = tree.insert(function("api", EntityKind::FunctionPrototype, "api.h", 1, false), Some(h));
        let a = tree.insert(entity(EntityKind::File, "a.c"), None);
        let api_def = tree.insert(function("api", EntityKind::Function, "a.c", 3, true), Some(a));
        let helper_a = tree.insert(function("helper", EntityKind::Function, "a.c", 5, true), Some(a));
        let ns = tree.insert(entity(EntityKind::Namespace, "util"), Some(a));
        let mut scoped = function("util::helper", EntityKind::Function, "a.c", 9, true);
        scoped.qualified_name = "util::helper".to_string();
        let ns_helper = tree.insert(scoped, Some(ns));
        let b = tree.insert(entity(EntityKind::File, "b.c"), None);
        let helper_b = tree.insert(function("helper", EntityKind::Function, "b.c", 7, true), Some(b));

        let result = reconcile(&tree, &InputConfig::default());
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.file_scoped, HashSet::from([helper_a, helper_b]));
        assert!(!result.file_scoped.contains(&api_decl));
        assert!(!result.file_scoped.contains(&api_def));
        assert!(!result.file_scoped.contains(&ns_helper));
    }

    #[test]
    fn test_method_declaration_pairs_with_out_of_line_definition() {
        let mut tree = EntityTree::new();
        let class = tree.insert(entity(EntityKind::Class, "Counter"), None);
        let mut ctor = function("Counter::Counter", EntityKind::Method, "Counter.h", 8, false);
        ctor.qualified_name = "Counter::Counter".to_string();
        let decl = tree.insert(ctor, Some(class));

        let file = tree.insert(entity(EntityKind::File, "Counter.cpp"), None);
        let mut body = function("Counter::Counter", EntityKind::Function, "Counter.cpp", 20, true);
        body.qualified_name = "Counter::Counter".to_string();
        let def = tree.insert(body, Some(file));

        let result = reconcile(&tree, &InputConfig::default());
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].declaration, decl);
        assert_eq!(result.pairs[0].definition, def);
    }

    #[test]
    fn test_overloads_do_not_match() {
        let mut tree = EntityTree::new();
        let c = tree.insert(entity(EntityKind::File, "math.h"), None);
        let mut decl = function("add", EntityKind::FunctionPrototype, "math.h", 1, false);
        decl.signature = Some("(int, int)".to_string());
        tree.insert(decl, Some(c));
        let mut def = function("add", EntityKind::Function, "math.cpp", 1, true);
        def.signature = Some("(double, double)".to_string());
        tree.insert(def, Some(c));

        let result = reconcile(&tree, &InputConfig::default());
        assert!(result.pairs.is_empty());
    }
}
