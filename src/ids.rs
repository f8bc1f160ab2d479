//! Identifier Resolution
//!
//! Flattens the nested item tree of a plan into one namespace of
//! fully-qualified IDs (`phase1.task2`). Both walks in this module use an
//! explicit work stack, so arbitrarily deep `subItems` nesting cannot exhaust
//! the call stack.

use serde_json::Value;
use std::collections::HashMap;

use crate::model::{display_value, field};

/// Key holding an item's children
pub const SUB_ITEMS_KEY: &str = "subItems";

// =============================================================================
// Item Walk
// =============================================================================

/// An item visited during a tree walk, with its document path
#[derive(Debug, Clone)]
pub struct ItemRef<'a> {
    pub item: &'a Value,
    /// `items[1].subItems[0]`
    pub path: String,
}

/// Visit every item under `items` in declaration (pre-order) order.
///
/// Unlike [`resolve_ids`], items without an `id` are still visited along with
/// their children. Non-array `items`/`subItems` values contribute nothing.
pub fn walk_items(items: &Value) -> Vec<ItemRef<'_>> {
    let mut visited = Vec::new();
    let mut stack: Vec<ItemRef<'_>> = Vec::new();
    push_children(&mut stack, items, None);

    while let Some(current) = stack.pop() {
        if let Some(children) = current.item.get(SUB_ITEMS_KEY) {
            push_children(&mut stack, children, Some(&current.path));
        }
        visited.push(current);
    }

    visited
}

fn push_children<'a>(stack: &mut Vec<ItemRef<'a>>, children: &'a Value, parent: Option<&str>) {
    let Some(children) = children.as_array() else {
        return;
    };
    // Reverse so the first child is popped first
    for (i, item) in children.iter().enumerate().rev() {
        let path = match parent {
            Some(parent) => format!("{}.{}[{}]", parent, SUB_ITEMS_KEY, i),
            None => format!("items[{}]", i),
        };
        stack.push(ItemRef { item, path });
    }
}

// =============================================================================
// Fully-Qualified IDs
// =============================================================================

/// Two items that resolved to the same fully-qualified ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    pub id: String,
    /// Path of the first item declared with this ID
    pub first_path: String,
    /// Path of the later item that overwrote it
    pub path: String,
}

/// All fully-qualified IDs of a plan
#[derive(Debug, Default)]
pub struct IdIndex<'a> {
    /// Unique IDs in first-declaration order, with the declaring path
    order: Vec<(String, String)>,
    /// ID → item, last writer wins
    items: HashMap<String, &'a Value>,
    duplicates: Vec<DuplicateId>,
}

impl<'a> IdIndex<'a> {
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Item registered under `id` (the last one declared, on duplicates)
    pub fn get(&self, id: &str) -> Option<&'a Value> {
        self.items.get(id).copied()
    }

    /// Unique IDs in declaration order
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(|(id, _)| id.as_str())
    }

    /// Path of the first item declared with `id`
    pub fn path_of(&self, id: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, path)| path.as_str())
    }

    /// ID → item map, suitable for diagram labelling
    pub fn items(&self) -> &HashMap<String, &'a Value> {
        &self.items
    }

    pub fn duplicates(&self) -> &[DuplicateId] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, id: String, path: String, item: &'a Value) {
        if self.items.insert(id.clone(), item).is_some() {
            let first_path = self
                .order
                .iter()
                .find(|(known, _)| *known == id)
                .map(|(_, p)| p.clone())
                .unwrap_or_default();
            self.duplicates.push(DuplicateId { id, first_path, path });
        } else {
            self.order.push((id, path));
        }
    }
}

/// Resolve every fully-qualified ID under a plan's `items`.
///
/// Items with a missing or empty `id` are skipped together with their
/// subtree, which has no addressable prefix.
pub fn resolve_ids(items: &Value) -> IdIndex<'_> {
    let mut index = IdIndex::default();

    // (item, parent fully-qualified ID, path)
    let mut stack: Vec<(&Value, Option<String>, String)> = Vec::new();
    push_resolvable(&mut stack, items, None, None);

    while let Some((item, prefix, path)) = stack.pop() {
        let Some(local) = field(item, "id") else {
            continue;
        };
        let local = display_value(local);
        let full_id = match prefix {
            Some(prefix) => format!("{}.{}", prefix, local),
            None => local,
        };

        if let Some(children) = item.get(SUB_ITEMS_KEY) {
            push_resolvable(&mut stack, children, Some(&full_id), Some(&path));
        }
        index.insert(full_id, path, item);
    }

    tracing::debug!(
        ids = index.len(),
        duplicates = index.duplicates.len(),
        "resolved item ids"
    );
    index
}

fn push_resolvable<'a>(
    stack: &mut Vec<(&'a Value, Option<String>, String)>,
    children: &'a Value,
    prefix: Option<&str>,
    parent_path: Option<&str>,
) {
    let Some(children) = children.as_array() else {
        return;
    };
    for (i, item) in children.iter().enumerate().rev() {
        let path = match parent_path {
            Some(parent) => format!("{}.{}[{}]", parent, SUB_ITEMS_KEY, i),
            None => format!("items[{}]", i),
        };
        stack.push((item, prefix.map(str::to_string), path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_resolves_nested_ids() {
        let items = json!([{
            "id": "p1",
            "subItems": [
                {"id": "t1"},
                {"id": "t2", "subItems": [{"id": "t3"}]}
            ]
        }]);
        let index = resolve_ids(&items);
        let ids: Vec<_> = index.ids().collect();
        assert_eq!(ids, vec!["p1", "p1.t1", "p1.t2", "p1.t2.t3"]);
        assert_eq!(index.path_of("p1.t2.t3"), Some("items[0].subItems[1].subItems[0]"));
    }

    #[test]
    fn test_skips_items_without_id() {
        let items = json!([
            {"title": "anonymous", "subItems": [{"id": "orphan"}]},
            {"id": ""},
            {"id": "kept"}
        ]);
        let index = resolve_ids(&items);
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["kept"]);
        assert!(!index.contains("orphan"));
    }

    #[test]
    fn test_duplicate_last_writer_wins() {
        let items = json!([
            {"id": "a", "title": "first"},
            {"id": "a", "title": "second"}
        ]);
        let index = resolve_ids(&items);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").unwrap()["title"], "second");
        assert_eq!(
            index.duplicates(),
            &[DuplicateId {
                id: "a".to_string(),
                first_path: "items[0]".to_string(),
                path: "items[1]".to_string(),
            }]
        );
    }

    #[test]
    fn test_non_array_items() {
        assert!(resolve_ids(&json!({"id": "x"})).is_empty());
        assert!(resolve_ids(&Value::Null).is_empty());
    }

    #[test]
    fn test_walk_visits_every_item_in_order() {
        let items = json!([
            {"title": "no id", "subItems": [{"id": "child"}]},
            {"id": "b"}
        ]);
        let paths: Vec<_> = walk_items(&items).into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["items[0]", "items[0].subItems[0]", "items[1]"]);
    }

    /// Nest `depth` items under a leaf by moving values, never serializing them
    fn nested_items(depth: usize) -> Value {
        let mut item = json!({"id": "leaf"});
        for level in 0..depth {
            let mut parent = Map::new();
            parent.insert("id".to_string(), Value::String(format!("n{}", level)));
            parent.insert(SUB_ITEMS_KEY.to_string(), Value::Array(vec![item]));
            item = Value::Object(parent);
        }
        Value::Array(vec![item])
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let items = nested_items(1_000);
        assert_eq!(resolve_ids(&items).len(), 1_001);
        assert_eq!(walk_items(&items).len(), 1_001);

        let index = resolve_ids(&items);
        assert_eq!(index.path_of("n999"), Some("items[0]"));
        assert!(index.contains("n999.n998.n997"));
        drop(index);

        // Dropping a Value recurses once per level
        std::mem::forget(items);
    }
}
