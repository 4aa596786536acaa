/*!
 * Relation hierarchies.
 *
 * A flat list of relation paths (`"countries"`, `"countries.cities"`,
 * `"countries__cities"`) becomes a tree of relation names. A node is
 * `included` when its path was requested itself, and traversal-only when it
 * is merely an ancestor of a requested path.
 */

use indexmap::IndexMap;

use crate::errors::{Result, TranslationError};
use crate::model::meta::split_path;
use crate::model::Registry;

/// A relation in the hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyNode {
    /// Whether the relation itself was requested
    pub included: bool,
    /// Deeper relations
    pub relations: Hierarchy,
}

/// Tree of relation names; children keep insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    nodes: IndexMap<String, HierarchyNode>,
}

impl Hierarchy {
    /// Build the tree from relation paths
    pub fn build<S: AsRef<str>>(paths: &[S]) -> Result<Self> {
        let mut hierarchy = Self::default();
        for path in paths {
            hierarchy.insert(path.as_ref())?;
        }
        Ok(hierarchy)
    }

    /// Add one path, marking only its last segment as included
    pub fn insert(&mut self, path: &str) -> Result<()> {
        let segments = split_path(path);
        if let Some(empty) = segments.iter().find(|s| s.trim().is_empty()) {
            return Err(TranslationError::InvalidRelation {
                model: String::new(),
                path: path.to_string(),
                segment: empty.to_string(),
            });
        }

        let last = segments.len() - 1;
        let mut level = self;
        for (index, segment) in segments.into_iter().enumerate() {
            let node = level.nodes.entry(segment.to_string()).or_default();
            if index == last {
                node.included = true;
            }
            level = &mut node.relations;
        }
        Ok(())
    }

    /// Whether the tree has no relations
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a direct child
    pub fn get(&self, relation: &str) -> Option<&HierarchyNode> {
        self.nodes.get(relation)
    }

    /// Direct children in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HierarchyNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Check every node against the relation graph of `model`
    pub fn validate(&self, registry: &Registry, model: &str) -> Result<()> {
        self.validate_from(registry, model, model, "")
    }

    fn validate_from(&self, registry: &Registry, root: &str, model: &str, prefix: &str) -> Result<()> {
        let registered = registry.get(model)?;

        for (name, node) in self.iter() {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", prefix, name)
            };

            let relation = registered.meta.get_relation(name).ok_or_else(|| {
                TranslationError::InvalidRelation {
                    model: root.to_string(),
                    path: path.clone(),
                    segment: name.to_string(),
                }
            })?;

            node.relations
                .validate_from(registry, root, &relation.target, &path)?;
        }

        Ok(())
    }

    /// Every included path, dotted, depth-first
    pub fn included_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths("", &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: &str, paths: &mut Vec<String>) {
        for (name, node) in self.iter() {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", prefix, name)
            };
            if node.included {
                paths.push(path.clone());
            }
            node.relations.collect_paths(&path, paths);
        }
    }
}
