use log::{debug, info};

use crate::app_config::Config;
use crate::database::{DatabaseConnection, Repository, TranslationStore};
use crate::errors::Result;
use crate::forms::{translation_form_schema, FormSchema};
use crate::language_utils::Languages;
use crate::model::{Entity, Instance, Registry};
use crate::source::DataSource;
use crate::translation::{Context, TranslatableQuery};

// @module: Entry point tying registry, languages and store together

/// Owns the model registry, the language settings and the translation store
///
/// Contexts and queries borrow from the service, so they cannot outlive it.
pub struct TranslationService<S: TranslationStore = Repository> {
    registry: Registry,
    languages: Languages,
    store: S,
}

impl TranslationService<Repository> {
    // @creates: Service from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let registry = config.build_registry()?;
        let languages = config.build_languages()?;
        let connection = match &config.database_path {
            Some(path) => DatabaseConnection::new(path)?,
            None => DatabaseConnection::new_default()?,
        };

        info!(
            "Translation service ready: {} models, {} languages, default `{}`",
            registry.models().count(),
            languages.supported().len(),
            languages.default_language()
        );

        Ok(Self::new(registry, languages, Repository::new(connection)))
    }

    // @creates: Service over an in-memory database
    pub fn in_memory(registry: Registry, languages: Languages) -> Result<Self> {
        Ok(Self::new(registry, languages, Repository::new_in_memory()?))
    }
}

impl<S: TranslationStore> TranslationService<S> {
    // @creates: Service over any store
    pub fn new(registry: Registry, languages: Languages, store: S) -> Self {
        Self {
            registry,
            languages,
            store,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open a context over an entity and its relations
    pub fn context<'a, R: AsRef<str>>(
        &'a self,
        entity: impl Into<Entity<'a>>,
        relations: &[R],
    ) -> Result<Context<'a, S>> {
        Context::new(&self.registry, &self.languages, &self.store, entity, relations)
    }

    /// Run `f` with a context that is released when `f` returns, even on error
    pub fn with_context<'a, R, T, F>(
        &'a self,
        entity: impl Into<Entity<'a>>,
        relations: &[R],
        f: F,
    ) -> Result<T>
    where
        R: AsRef<str>,
        F: FnOnce(&mut Context<'a, S>) -> Result<T>,
    {
        let mut context = self.context(entity, relations)?;
        f(&mut context)
    }

    /// Start a query over `model` records held by `source`
    pub fn query<'a>(&'a self, source: &'a dyn DataSource, model: &str) -> Result<TranslatableQuery<'a>>
    where
        S: 'a,
    {
        TranslatableQuery::new(&self.registry, &self.languages, &self.store, source, model)
    }

    /// Remove every translation of a record that is being deleted
    pub fn forget(&self, instance: &Instance) -> Result<usize> {
        let (model, object_id) = {
            let borrowed = instance.borrow();
            (borrowed.model_name().to_string(), borrowed.object_id())
        };

        let deleted = self.store.delete_object(&model, &object_id)?;
        debug!("Forgot {} translations of {}#{}", deleted, model, object_id);
        Ok(deleted)
    }

    /// Choice lists for a translation editing form of `model`
    pub fn form_schema(&self, model: &str) -> Result<FormSchema> {
        translation_form_schema(&self.registry, &self.languages, model)
    }
}
