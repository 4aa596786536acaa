/*!
 * Translatable queries.
 *
 * A `TranslatableQuery` is an immutable description of a selection over a
 * `DataSource`. Every chaining method returns a new query and carries the
 * translation settings along, so `translate` may be called before or after
 * `filter`. A query is evaluated at most once; derived queries evaluate
 * again from the source and apply their translation settings afresh.
 */

use log::debug;
use once_cell::unsync::OnceCell;

use super::context::Context;
use super::filter::Q;
use super::hierarchy::Hierarchy;
use crate::database::TranslationStore;
use crate::errors::Result;
use crate::language_utils::{LanguageFilter, LanguageSelection, Languages};
use crate::model::{Instance, Materialize, Registry};
use crate::source::DataSource;

/// Translation settings propagated through chained queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySettings {
    /// Language the results are translated into after evaluation
    pub translate: Option<String>,
    /// Relations translated along with the results
    pub related: Vec<String>,
    /// Languages searched by filters on translatable fields
    pub probe: Option<LanguageFilter>,
}

/// A lazily evaluated, translation-aware selection of one model
pub struct TranslatableQuery<'a> {
    registry: &'a Registry,
    languages: &'a Languages,
    store: &'a dyn TranslationStore,
    source: &'a dyn DataSource,
    model: String,
    settings: QuerySettings,
    filter: Option<Q>,
    distinct: bool,
    offset: usize,
    limit: Option<usize>,
    results: OnceCell<Vec<Instance>>,
}

impl<'a> TranslatableQuery<'a> {
    /// Select every record of `model`
    pub fn new(
        registry: &'a Registry,
        languages: &'a Languages,
        store: &'a dyn TranslationStore,
        source: &'a dyn DataSource,
        model: &str,
    ) -> Result<Self> {
        registry.get(model)?;
        Ok(Self {
            registry,
            languages,
            store,
            source,
            model: model.to_string(),
            settings: QuerySettings::default(),
            filter: None,
            distinct: false,
            offset: 0,
            limit: None,
            results: OnceCell::new(),
        })
    }

    /// An unevaluated copy of this query
    fn derive(&self) -> Self {
        Self {
            registry: self.registry,
            languages: self.languages,
            store: self.store,
            source: self.source,
            model: self.model.clone(),
            settings: self.settings.clone(),
            filter: self.filter.clone(),
            distinct: self.distinct,
            offset: self.offset,
            limit: self.limit,
            results: OnceCell::new(),
        }
    }

    /// Model selected by the query
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Current translation settings
    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// The combined filter, after any probe rewriting
    pub fn filter_expr(&self) -> Option<&Q> {
        self.filter.as_ref()
    }

    /// Whether the query has been evaluated
    pub fn is_evaluated(&self) -> bool {
        self.results.get().is_some()
    }

    /// Translate the results into `lang`; `None` means the active language
    pub fn translate(&self, lang: Option<&str>) -> Result<Self> {
        let language = self.languages.resolve_or_active(lang)?;
        let mut query = self.derive();
        query.settings.translate = Some(language);
        Ok(query)
    }

    /// Translate these relations along with the results
    ///
    /// Paths are checked against the model graph immediately.
    pub fn translate_related<R: AsRef<str>>(&self, relations: &[R]) -> Result<Self> {
        Hierarchy::build(relations)?.validate(self.registry, &self.model)?;

        let mut query = self.derive();
        query.settings.related = relations.iter().map(|r| r.as_ref().to_string()).collect();
        Ok(query)
    }

    /// Search translatable fields in these languages when filtering
    ///
    /// Only filters added after this call are affected.
    pub fn probe(&self, languages: impl Into<LanguageSelection>) -> Result<Self> {
        let filter = self.languages.resolve_many(languages)?;
        let mut query = self.derive();
        query.settings.probe = Some(filter);
        Ok(query)
    }

    /// Keep the records satisfying `q`
    pub fn filter(&self, q: Q) -> Result<Self> {
        let q = self.prepare(&q)?;
        let mut query = self.derive();
        query.filter = Some(match query.filter.take() {
            Some(existing) => existing & q,
            None => q,
        });
        Ok(query)
    }

    /// Drop the records satisfying `q`
    pub fn exclude(&self, q: Q) -> Result<Self> {
        self.filter(!q)
    }

    /// Return each record at most once
    pub fn distinct(&self) -> Self {
        let mut query = self.derive();
        query.distinct = true;
        query
    }

    /// Skip `offset` results and keep at most `limit`
    ///
    /// Slicing an already sliced query narrows the previous window.
    pub fn slice(&self, offset: usize, limit: Option<usize>) -> Self {
        let mut query = self.derive();
        query.offset = self.offset + offset;
        query.limit = match (self.limit, limit) {
            (Some(outer), Some(inner)) => Some(inner.min(outer.saturating_sub(offset))),
            (Some(outer), None) => Some(outer.saturating_sub(offset)),
            (None, inner) => inner,
        };
        query
    }

    /// Validate the paths of `q`, then rewrite it for the probe languages
    fn prepare(&self, q: &Q) -> Result<Q> {
        let default = self.languages.default_language();
        let probe = self.settings.probe.as_ref();

        q.try_map_fields(&mut |leaf| -> Result<Q> {
            let Q::Field {
                path,
                lookup,
                value,
            } = leaf
            else {
                return Ok(leaf.clone());
            };

            let resolved = self.registry.resolve_field_path(&self.model, &path.join("__"))?;
            let Some(probe) = probe.filter(|_| resolved.translatable) else {
                return Ok(leaf.clone());
            };

            let languages: Vec<String> = probe
                .codes()
                .into_iter()
                .filter(|code| *code != default)
                .map(str::to_string)
                .collect();
            if languages.is_empty() {
                return Ok(leaf.clone());
            }

            let translated = Q::Translated {
                relations: resolved.relations,
                field: resolved.field,
                languages,
                lookup: *lookup,
                value: value.clone(),
            };

            if probe.contains(default) {
                Ok(leaf.clone() | translated)
            } else {
                Ok(translated)
            }
        })
    }

    /// Evaluate once and return the results
    ///
    /// Later calls on the same query return the same instances.
    pub fn fetch(&self) -> Result<Vec<Instance>> {
        let results = self.results.get_or_try_init(|| self.evaluate())?;
        Ok(results.clone())
    }

    /// Number of results
    pub fn len(&self) -> Result<usize> {
        Ok(self.fetch()?.len())
    }

    /// Whether there are no results
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The first result, if any
    pub fn first(&self) -> Result<Option<Instance>> {
        Ok(self.fetch()?.into_iter().next())
    }

    fn evaluate(&self) -> Result<Vec<Instance>> {
        let selected = self
            .source
            .select(&self.model, self.filter.as_ref(), self.distinct, self.store)?;

        let results: Vec<Instance> = selected
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        if let Some(language) = &self.settings.translate {
            let mut context = Context::new(
                self.registry,
                self.languages,
                self.store,
                results.clone(),
                self.settings.related.as_slice(),
            )?;
            context.read(Some(language))?;
        }

        debug!(
            "Evaluated `{}` query to {} results (translate: {:?})",
            self.model,
            results.len(),
            self.settings.translate
        );
        Ok(results)
    }
}

impl Clone for TranslatableQuery<'_> {
    fn clone(&self) -> Self {
        self.derive()
    }
}

impl Materialize for TranslatableQuery<'_> {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn materialize(&self) -> Result<Vec<Instance>> {
        self.fetch()
    }
}

impl std::fmt::Debug for TranslatableQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatableQuery")
            .field("model", &self.model)
            .field("settings", &self.settings)
            .field("filter", &self.filter)
            .field("distinct", &self.distinct)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("evaluated", &self.is_evaluated())
            .finish()
    }
}
