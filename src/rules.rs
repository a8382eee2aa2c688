//! @ai:module:intent Optional structural checks on where trace tags are placed
//! @ai:module:layer application
//! @ai:module:public_api check_rules, RuleReport
//! @ai:module:depends_on resolver, entity, diagnostic, config
//! @ai:module:stateless true

use crate::config::{RuleConfig, RuleLevel};
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::entity::{EntityId, EntityKind, EntityTree};
use crate::resolver::TraceItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// @ai:intent Findings of one rule pass
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuleReport {
    pub items_checked: usize,
    pub issues: Vec<Diagnostic>,
    pub errors: usize,
    pub warnings: usize,
}

impl RuleReport {
    /// @ai:intent Check if no rule is violated at error level
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    fn push(&mut self, level: RuleLevel, code: DiagnosticCode, message: String, item: &TraceItem) {
        let diagnostic = match level {
            RuleLevel::Off => return,
            RuleLevel::Warn => {
                self.warnings += 1;
                Diagnostic::warning(code, message, item.location.clone())
            }
            RuleLevel::Error => {
                self.errors += 1;
                Diagnostic::error(code, message, item.location.clone())
            }
        };
        self.issues.push(diagnostic);
    }
}

/// @ai:intent Apply the configured rules to resolved items
/// @ai:post issues are ordered like the items they refer to
/// @ai:effects pure
pub fn check_rules(tree: &EntityTree, items: &[TraceItem], config: &RuleConfig) -> RuleReport {
    let mut report = RuleReport {
        items_checked: items.len(),
        ..Default::default()
    };

    if config.file_level_tags == RuleLevel::Off && config.nested_tags == RuleLevel::Off {
        return report;
    }

    let by_entity: HashMap<EntityId, &TraceItem> = items.iter().map(|i| (i.entity, i)).collect();

    for item in items.iter().filter(|i| i.status.is_tagged()) {
        if item.kind == EntityKind::File {
            report.push(
                config.file_level_tags,
                DiagnosticCode::FileLevelTags,
                format!("file {} carries trace tags, tag its entities instead", item.name),
                item,
            );
        }

        if !item.kind.is_container() {
            continue;
        }

        let tagged_child = tree
            .get(item.entity)
            .children
            .iter()
            .filter_map(|c| by_entity.get(c))
            .find(|child| child.status.is_tagged());

        if let Some(child) = tagged_child {
            report.push(
                config.nested_tags,
                DiagnosticCode::NestedTags,
                format!(
                    "{} {} and its child {} are both tagged",
                    item.kind, item.name, child.name
                ),
                item,
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::entity;
    use crate::resolver::{resolve, TraceStatus};

    fn tagged(tree: &EntityTree, id: EntityId) -> TraceItem {
        let mut item = resolve(tree.get(id)).item;
        item.status = TraceStatus::Justified;
        item.justification = Some("reason".to_string());
        item
    }

    fn untagged(tree: &EntityTree, id: EntityId) -> TraceItem {
        resolve(tree.get(id)).item
    }

    #[test]
    fn test_rules_off_by_default() {
        let mut tree = EntityTree::new();
        let file = tree.insert(entity(EntityKind::File, "main.cpp"), None);
        let items = vec![tagged(&tree, file)];

        let report = check_rules(&tree, &items, &RuleConfig::default());
        assert!(report.passed());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_file_level_tags() {
        let mut tree = EntityTree::new();
        let file = tree.insert(entity(EntityKind::File, "main.cpp"), None);
        let items = vec![tagged(&tree, file)];

        let config = RuleConfig {
            file_level_tags: RuleLevel::Warn,
            ..Default::default()
        };
        let report = check_rules(&tree, &items, &config);
        assert!(report.passed());
        assert_eq!(report.warnings, 1);
        assert_eq!(report.issues[0].code, DiagnosticCode::FileLevelTags);
    }

    #[test]
    fn test_nested_tags_strict() {
        let mut tree = EntityTree::new();
        let class = tree.insert(entity(EntityKind::Class, "Game"), None);
        let run = tree.insert(entity(EntityKind::Method, "Game::run"), Some(class));
        let items = vec![tagged(&tree, class), tagged(&tree, run)];

        let report = check_rules(&tree, &items, &RuleConfig::strict());
        assert!(!report.passed());
        assert_eq!(report.errors, 1);
        assert_eq!(report.issues[0].code, DiagnosticCode::NestedTags);
    }

    #[test]
    fn test_untagged_child_is_fine() {
        let mut tree = EntityTree::new();
        let class = tree.insert(entity(EntityKind::Class, "Game"), None);
        let run = tree.insert(entity(EntityKind::Method, "Game::run"), Some(class));
        let items = vec![tagged(&tree, class), untagged(&tree, run)];

        let report = check_rules(&tree, &items, &RuleConfig::strict());
        assert!(report.passed());
        assert_eq!(report.items_checked, 2);
    }
}
