/*!
 * Purview construction.
 *
 * The purview of an operation is every instance it touches, keyed by model
 * and identity, plus the `Scope` that selects exactly their translation rows
 * in one query. Every instance walked must be translatable, including those
 * reached only on the way to an included relation.
 */

use indexmap::IndexMap;
use log::trace;

use super::hierarchy::Hierarchy;
use crate::database::Scope;
use crate::errors::{Result, TranslationError};
use crate::model::{Entity, Instance, Registry};

/// Instances of an operation and the scope of their translations
#[derive(Debug, Clone, Default)]
pub struct Purview {
    instances: IndexMap<String, IndexMap<String, Instance>>,
    order: Vec<(String, String)>,
    scope: Scope,
}

impl Purview {
    /// Walk `entity` along `hierarchy` and collect the purview
    ///
    /// A lazy entity is evaluated here. Instances reached through
    /// traversal-only relations are checked and walked, but not registered.
    pub fn build(registry: &Registry, entity: &mut Entity<'_>, hierarchy: &Hierarchy) -> Result<Self> {
        let roots = entity.roots()?;
        let mut purview = Self::default();
        purview.fill(registry, roots, hierarchy, true)?;

        trace!(
            "Built purview of {} instances over {} models",
            purview.len(),
            purview.instances.len()
        );
        Ok(purview)
    }

    fn fill(
        &mut self,
        registry: &Registry,
        instances: Vec<Instance>,
        hierarchy: &Hierarchy,
        included: bool,
    ) -> Result<()> {
        for instance in &instances {
            if included {
                self.register(registry, instance)?;
            } else {
                registry.translatable_fields(instance.borrow().model_name())?;
            }
        }

        if hierarchy.is_empty() {
            return Ok(());
        }

        for instance in &instances {
            for (name, node) in hierarchy.iter() {
                let related = {
                    let borrowed = instance.borrow();
                    borrowed.related(name).ok_or_else(|| TranslationError::InvalidRelation {
                        model: borrowed.model_name().to_string(),
                        path: name.to_string(),
                        segment: name.to_string(),
                    })?
                };
                self.fill(registry, related.into_vec(), &node.relations, node.included)?;
            }
        }

        Ok(())
    }

    fn register(&mut self, registry: &Registry, instance: &Instance) -> Result<()> {
        let (model, object_id) = {
            let borrowed = instance.borrow();
            (borrowed.model_name().to_string(), borrowed.object_id())
        };

        let fields = registry.translatable_fields(&model)?;

        let per_model = self.instances.entry(model.clone()).or_default();
        if per_model.contains_key(&object_id) {
            return Ok(());
        }
        per_model.insert(object_id.clone(), instance.clone());

        if !fields.is_empty() {
            self.scope.add(&model, &object_id);
        }
        self.order.push((model, object_id));
        Ok(())
    }

    /// Every instance as `(model, object_id, instance)`, in registration order
    ///
    /// Roots come first, then each relation level depth-first, so models may
    /// interleave.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Instance)> {
        self.order.iter().filter_map(|(model, id)| {
            self.get(model, id)
                .map(|instance| (model.as_str(), id.as_str(), instance))
        })
    }

    /// Instances of one model, by identity
    pub fn instances_of(&self, model: &str) -> Option<&IndexMap<String, Instance>> {
        self.instances.get(model)
    }

    /// Look up an instance
    pub fn get(&self, model: &str, object_id: &str) -> Option<&Instance> {
        self.instances.get(model).and_then(|objects| objects.get(object_id))
    }

    /// Whether an instance is part of the purview
    pub fn contains(&self, model: &str, object_id: &str) -> bool {
        self.get(model, object_id).is_some()
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no instances
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Models present, in order of first registration
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    /// Scope selecting the translation rows of the instances
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}
