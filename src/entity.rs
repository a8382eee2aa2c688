//! @ai:module:intent Define the internal entity graph built from a Doxygen tree
//! @ai:module:layer domain
//! @ai:module:public_api Entity, EntityId, EntityKind, EntityTree, SourceLocation, DocComment
//! @ai:module:stateless true
//!
//! Entities live in an arena owned by [`EntityTree`]. Children are ordered id
//! lists; the parent link is a plain id used for upward lookups only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// @ai:intent Represents a source code location
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: Option<usize>,
}

impl SourceLocation {
    /// @ai:intent Create a new SourceLocation
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
        }
    }

    /// @ai:intent Return a copy moved down by a number of lines
    pub fn offset_lines(&self, lines: usize) -> Self {
        Self {
            file: self.file.clone(),
            line: self.line + lines,
            column: if lines == 0 { self.column } else { None },
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.as_os_str().is_empty() {
            return write!(f, "<no location>");
        }
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// @ai:intent Documentation text attached to exactly one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocComment {
    pub text: String,
    pub location: SourceLocation,
}

/// @ai:intent Trace-eligible entity kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    File,
    Group,
    Namespace,
    Class,
    Struct,
    Union,
    InterfaceType,
    Function,
    Method,
    FunctionPrototype,
    InterfaceMethod,
}

impl EntityKind {
    /// @ai:intent Kind name written to the LOBSTER `kind` field
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::File => "File",
            EntityKind::Group => "Group",
            EntityKind::Namespace => "Namespace",
            EntityKind::Class => "Class",
            EntityKind::Struct => "Struct",
            EntityKind::Union => "Union",
            EntityKind::InterfaceType => "Interface",
            EntityKind::Function => "Function",
            EntityKind::Method => "Method",
            EntityKind::FunctionPrototype => "Prototype",
            EntityKind::InterfaceMethod => "InterfaceMethod",
        }
    }

    /// @ai:intent Short lowercase form used inside trace tags
    /// @ai:effects pure
    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::File => "file",
            EntityKind::Group => "group",
            EntityKind::Namespace => "namespace",
            EntityKind::Class => "class",
            EntityKind::Struct => "struct",
            EntityKind::Union => "union",
            EntityKind::InterfaceType => "interface",
            EntityKind::Function => "function",
            EntityKind::Method => "method",
            EntityKind::FunctionPrototype => "prototype",
            EntityKind::InterfaceMethod => "interface-method",
        }
    }

    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            EntityKind::Function
                | EntityKind::Method
                | EntityKind::FunctionPrototype
                | EntityKind::InterfaceMethod
        )
    }

    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            EntityKind::Class | EntityKind::Struct | EntityKind::Union | EntityKind::InterfaceType
        )
    }

    /// @ai:intent Kinds that may own child entities
    pub fn is_container(&self) -> bool {
        !self.is_function_like()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// @ai:intent Index of an entity inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

/// @ai:intent One node of the entity graph
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Doxygen id of the compound or member this entity was built from.
    pub source_id: String,
    pub kind: EntityKind,
    pub name: String,
    pub qualified_name: String,
    /// Normalised parameter list for function-like kinds.
    pub signature: Option<String>,
    pub language: String,
    pub location: SourceLocation,
    pub comment: Option<DocComment>,
    pub children: Vec<EntityId>,
    pub parent: Option<EntityId>,
    pub groups: Vec<String>,
    pub has_body: bool,
    pub pure_virtual: bool,
}

impl Entity {
    /// @ai:intent Qualified name with signature, as shown in reports
    pub fn display_name(&self) -> String {
        match &self.signature {
            Some(signature) => format!("{}{}", self.qualified_name, signature),
            None => self.qualified_name.clone(),
        }
    }
}

/// @ai:intent Arena-backed entity graph with ordered roots
#[derive(Debug, Clone, Default)]
pub struct EntityTree {
    entities: Vec<Entity>,
    roots: Vec<EntityId>,
}

impl EntityTree {
    /// @ai:intent Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Insert an entity under a parent, or as a root when parent is None
    /// @ai:post the returned id addresses the new entity
    pub fn insert(&mut self, mut entity: Entity, parent: Option<EntityId>) -> EntityId {
        let id = EntityId(self.entities.len());
        entity.id = id;
        entity.parent = parent;
        self.entities.push(entity);

        match parent {
            Some(parent_id) => self.entities[parent_id.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    pub fn parent(&self, id: EntityId) -> Option<&Entity> {
        self.get(id).parent.map(|p| self.get(p))
    }

    pub fn children(&self, id: EntityId) -> impl Iterator<Item = &Entity> {
        self.get(id).children.iter().map(|c| self.get(*c))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// @ai:intent All entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// @ai:intent Ids in depth-first pre-order, roots in insertion order
    /// @ai:post every entity appears exactly once
    /// @ai:effects pure
    pub fn preorder(&self) -> Vec<EntityId> {
        let mut order = Vec::with_capacity(self.entities.len());
        let mut stack: Vec<EntityId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.get(id).children.iter().rev().copied());
        }

        order
    }

    /// @ai:intent Nearest ancestor satisfying a predicate
    pub fn find_ancestor(&self, id: EntityId, pred: impl Fn(&Entity) -> bool) -> Option<&Entity> {
        let mut current = self.parent(id);
        while let Some(entity) = current {
            if pred(entity) {
                return Some(entity);
            }
            current = self.parent(entity.id);
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entity(kind: EntityKind, name: &str) -> Entity {
        Entity {
            id: EntityId(0),
            source_id: name.to_string(),
            kind,
            name: name.to_string(),
            qualified_name: name.to_string(),
            signature: None,
            language: "C++".to_string(),
            location: SourceLocation::new("main.cpp", 1),
            comment: None,
            children: Vec::new(),
            parent: None,
            groups: Vec::new(),
            has_body: false,
            pure_virtual: false,
        }
    }

    #[test]
    fn test_preorder_visits_parent_before_children() {
        let mut tree = EntityTree::new();
        let file = tree.insert(entity(EntityKind::File, "main.cpp"), None);
        let class = tree.insert(entity(EntityKind::Class, "Counter"), Some(file));
        let method = tree.insert(entity(EntityKind::Method, "count"), Some(class));
        let func = tree.insert(entity(EntityKind::Function, "main"), Some(file));
        let other = tree.insert(entity(EntityKind::File, "other.cpp"), None);

        assert_eq!(tree.preorder(), vec![file, class, method, func, other]);
    }

    #[test]
    fn test_parent_is_lookup_only() {
        let mut tree = EntityTree::new();
        let ns = tree.insert(entity(EntityKind::Namespace, "math"), None);
        let func = tree.insert(entity(EntityKind::Function, "add"), Some(ns));

        assert_eq!(tree.parent(func).map(|p| p.id), Some(ns));
        assert!(tree.parent(ns).is_none());
        assert_eq!(tree.children(ns).count(), 1);
    }

    #[test]
    fn test_find_ancestor_skips_non_matching() {
        let mut tree = EntityTree::new();
        let ns = tree.insert(entity(EntityKind::Namespace, "app"), None);
        let class = tree.insert(entity(EntityKind::Class, "Game"), Some(ns));
        let method = tree.insert(entity(EntityKind::Method, "run"), Some(class));

        let found = tree.find_ancestor(method, |e| e.kind == EntityKind::Namespace);
        assert_eq!(found.map(|e| e.id), Some(ns));
    }

    #[test]
    fn test_location_display_without_file() {
        assert_eq!(SourceLocation::default().to_string(), "<no location>");
        assert_eq!(SourceLocation::new("a.h", 3).to_string(), "a.h:3");
    }
}
