/*!
 * Translation contexts.
 *
 * A `Context` binds one entity and one set of relations to the
 * create/read/update/delete/reset operations. Every operation rebuilds the
 * purview, because the instances it covers may have changed since the last
 * call. Values overwritten by `read` are remembered so that `reset` can put
 * them back. Dropping the context releases the snapshot and the purview.
 */

use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::HashMap;

use super::hierarchy::Hierarchy;
use super::purview::Purview;
use crate::database::{TranslationKey, TranslationStore};
use crate::errors::{Result, TranslationError};
use crate::language_utils::{LanguageFilter, Languages};
use crate::model::{Entity, Instance, ObjectKey, Registry};

/// Original values of one instance, captured on first overwrite
#[derive(Debug)]
struct Snapshot {
    instance: Instance,
    fields: IndexMap<String, Option<String>>,
}

/// Scoped handle applying translation operations to an entity
pub struct Context<'a, S: TranslationStore + ?Sized> {
    registry: &'a Registry,
    languages: &'a Languages,
    store: &'a S,
    entity: Entity<'a>,
    hierarchy: Hierarchy,
    purview: Option<Purview>,
    snapshot: IndexMap<ObjectKey, Snapshot>,
}

impl<'a, S: TranslationStore + ?Sized> Context<'a, S> {
    /// Bind an entity and its relations
    ///
    /// Relation paths are validated against the entity's model here, before
    /// anything is queried.
    pub fn new<R: AsRef<str>>(
        registry: &'a Registry,
        languages: &'a Languages,
        store: &'a S,
        entity: impl Into<Entity<'a>>,
        relations: &[R],
    ) -> Result<Self> {
        let entity = entity.into();
        let hierarchy = Hierarchy::build(relations)?;

        if let Some(model) = entity.model_name() {
            if !registry.is_translatable(&model) {
                return Err(TranslationError::type_mismatch(
                    &model,
                    "the model has no translatable fields declared",
                ));
            }
            hierarchy.validate(registry, &model)?;
        }

        trace!("Bound context over {:?}", hierarchy.included_paths());

        Ok(Self {
            registry,
            languages,
            store,
            entity,
            hierarchy,
            purview: None,
            snapshot: IndexMap::new(),
        })
    }

    /// The relation hierarchy of the context
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// The purview built by the last operation
    pub fn purview(&self) -> Option<&Purview> {
        self.purview.as_ref()
    }

    /// Number of fields that `reset` would restore
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.values().map(|s| s.fields.len()).sum()
    }

    fn build_purview(&mut self) -> Result<&Purview> {
        let purview = Purview::build(self.registry, &mut self.entity, &self.hierarchy)?;
        Ok(self.purview.insert(purview))
    }

    /// Store every non-empty translatable field in `lang`
    ///
    /// Returns the number of rows written. Existing rows are overwritten.
    pub fn create(&mut self, lang: Option<&str>) -> Result<usize> {
        let language = self.languages.resolve_or_active(lang)?;
        let written = self.write(&language)?;
        debug!("Created {} translations in `{}`", written, language);
        Ok(written)
    }

    /// Overlay the stored `lang` translations on the instances
    ///
    /// Fields without a stored translation keep their current value. Returns
    /// the number of fields overwritten.
    pub fn read(&mut self, lang: Option<&str>) -> Result<usize> {
        let language = self.languages.resolve_or_active(lang)?;
        let registry = self.registry;
        let store = self.store;

        let purview = Purview::build(registry, &mut self.entity, &self.hierarchy)?;
        let purview = self.purview.insert(purview);
        if purview.scope().is_empty() {
            return Ok(0);
        }

        let records = store.fetch(purview.scope(), &LanguageFilter::One(language.clone()))?;
        let index: HashMap<(&str, &str, &str), &str> = records
            .iter()
            .map(|r| {
                (
                    (r.model.as_str(), r.object_id.as_str(), r.field.as_str()),
                    r.text.as_str(),
                )
            })
            .collect();

        let mut applied = 0;
        for (model, object_id, instance) in purview.iter() {
            for field in registry.translatable_fields(model)? {
                let Some(text) = index.get(&(model, object_id, field.as_str())) else {
                    continue;
                };

                let mut borrowed = instance.borrow_mut();
                let previous = borrowed.get_field(field);
                self.snapshot
                    .entry(ObjectKey {
                        model: model.to_string(),
                        object_id: object_id.to_string(),
                    })
                    .or_insert_with(|| Snapshot {
                        instance: instance.clone(),
                        fields: IndexMap::new(),
                    })
                    .fields
                    .entry(field.clone())
                    .or_insert(previous);
                borrowed.set_field(field, Some(text.to_string()));
                applied += 1;
            }
        }

        debug!(
            "Read {} translations in `{}` onto {} instances",
            applied,
            language,
            purview.len()
        );
        Ok(applied)
    }

    /// Store every non-empty translatable field in `lang`, overwriting
    ///
    /// Behaves like `create`; rows are updated in place, never deleted first.
    pub fn update(&mut self, lang: Option<&str>) -> Result<usize> {
        let language = self.languages.resolve_or_active(lang)?;
        let written = self.write(&language)?;
        debug!("Updated {} translations in `{}`", written, language);
        Ok(written)
    }

    /// Remove the stored `lang` translations of the purview
    ///
    /// In-memory values are left alone. Returns the number of rows removed.
    pub fn delete(&mut self, lang: Option<&str>) -> Result<usize> {
        let language = self.languages.resolve_or_active(lang)?;
        let store = self.store;

        let purview = self.build_purview()?;
        if purview.scope().is_empty() {
            return Ok(0);
        }

        let deleted = store.delete(purview.scope(), &LanguageFilter::One(language.clone()))?;
        debug!("Deleted {} translations in `{}`", deleted, language);
        Ok(deleted)
    }

    /// Put back every value overwritten by `read` since the last reset
    ///
    /// Returns the number of fields restored; zero when nothing was read.
    pub fn reset(&mut self) -> usize {
        let mut restored = 0;
        for (_, snapshot) in self.snapshot.drain(..) {
            let mut borrowed = snapshot.instance.borrow_mut();
            for (field, value) in snapshot.fields {
                borrowed.set_field(&field, value);
                restored += 1;
            }
        }

        if restored > 0 {
            debug!("Reset {} fields to their original values", restored);
        }
        restored
    }

    fn write(&mut self, language: &str) -> Result<usize> {
        let registry = self.registry;
        let store = self.store;
        let purview = self.build_purview()?;

        let mut written = 0;
        for (model, object_id, instance) in purview.iter() {
            for field in registry.translatable_fields(model)? {
                let value = instance.borrow().get_field(field);
                let Some(text) = value.filter(|text| !text.is_empty()) else {
                    continue;
                };

                store.upsert(&TranslationKey::new(model, object_id, field, language), &text)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

impl<S: TranslationStore + ?Sized> Drop for Context<'_, S> {
    fn drop(&mut self) {
        if !self.snapshot.is_empty() {
            trace!(
                "Releasing context with {} unrestored fields",
                self.snapshot_len()
            );
        }
    }
}
