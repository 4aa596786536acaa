/*!
 * Data sources for translatable queries.
 *
 * A `DataSource` plays the part of the main database: it holds the records
 * themselves and evaluates filters against them. Every evaluation hands out
 * fresh copies, so in-memory translations applied to one result never leak
 * into the next.
 *
 * Filters on a model's own translations behave like a join with the
 * translation table: a record is returned once per matching translation row,
 * unless the query asks for distinct results. Negated ones behave like
 * `NOT EXISTS` and return a record at most once.
 */

use indexmap::IndexMap;
use log::trace;

use crate::database::{TranslationRecord, TranslationStore};
use crate::errors::Result;
use crate::model::{Instance, Model};
use crate::translation::filter::Q;

/// Backend that selects records of a model
pub trait DataSource {
    /// Records of `model` satisfying `filter`, in storage order
    ///
    /// `store` is consulted for predicates on translated text.
    fn select(
        &self,
        model: &str,
        filter: Option<&Q>,
        distinct: bool,
        store: &dyn TranslationStore,
    ) -> Result<Vec<Instance>>;
}

/// Records kept in memory, one table per model
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: IndexMap<String, Vec<Instance>>,
}

impl MemorySource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record in the table of its model
    pub fn insert(&mut self, instance: Instance) {
        let model = instance.borrow().model_name().to_string();
        self.tables.entry(model).or_default().push(instance);
    }

    /// Store several records
    pub fn extend(&mut self, instances: impl IntoIterator<Item = Instance>) {
        for instance in instances {
            self.insert(instance);
        }
    }

    /// Number of records of a model
    pub fn len(&self, model: &str) -> usize {
        self.tables.get(model).map_or(0, Vec::len)
    }

    /// Whether the source holds no records at all
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }

    /// Number of times `row` appears in the result
    fn multiplicity(
        row: &dyn Model,
        filter: &Q,
        distinct: bool,
        store: &dyn TranslationStore,
    ) -> Result<usize> {
        if !filter.joins_own_translations() {
            return Ok(usize::from(evaluate(row, filter, None, &[], store)?));
        }

        let joined = store.fetch_object(row.model_name(), &row.object_id())?;
        if joined.is_empty() || !filter.repeats_per_translation() {
            return Ok(usize::from(evaluate(row, filter, None, &joined, store)?));
        }

        let mut count = 0;
        for record in &joined {
            if evaluate(row, filter, Some(record), &joined, store)? {
                count += 1;
                if distinct {
                    break;
                }
            }
        }
        Ok(count)
    }
}

impl DataSource for MemorySource {
    fn select(
        &self,
        model: &str,
        filter: Option<&Q>,
        distinct: bool,
        store: &dyn TranslationStore,
    ) -> Result<Vec<Instance>> {
        let Some(table) = self.tables.get(model) else {
            return Ok(Vec::new());
        };

        let mut selected = Vec::new();
        for stored in table {
            let row = stored.borrow();
            let count = match filter {
                Some(filter) => Self::multiplicity(&*row, filter, distinct, store)?,
                None => 1,
            };
            for _ in 0..count {
                selected.push(row.duplicate());
            }
        }

        trace!("Selected {} `{}` rows", selected.len(), model);
        Ok(selected)
    }
}

/// Instances reached from `row` through `relations`
fn walk(row: &dyn Model, relations: &[String]) -> Vec<Instance> {
    let Some((first, rest)) = relations.split_first() else {
        return Vec::new();
    };

    let reached = row.related(first).map(|r| r.into_vec()).unwrap_or_default();
    if rest.is_empty() {
        return reached;
    }

    reached
        .iter()
        .flat_map(|instance| walk(&*instance.borrow(), rest))
        .collect()
}

/// Evaluate `filter` on one row, joined with at most one of its translation rows
///
/// `all` holds every translation row of `row`. A negated predicate on the
/// row's own translations holds only when none of them matches.
fn evaluate(
    row: &dyn Model,
    filter: &Q,
    joined: Option<&TranslationRecord>,
    all: &[TranslationRecord],
    store: &dyn TranslationStore,
) -> Result<bool> {
    match filter {
        Q::Field {
            path,
            lookup,
            value,
        } => {
            let Some((field, relations)) = path.split_last() else {
                return Ok(false);
            };
            if relations.is_empty() {
                return Ok(row
                    .get_field(field)
                    .is_some_and(|stored| lookup.matches(&stored, value)));
            }
            Ok(walk(row, relations).iter().any(|instance| {
                instance
                    .borrow()
                    .get_field(field)
                    .is_some_and(|stored| lookup.matches(&stored, value))
            }))
        }
        Q::Translated {
            relations,
            field,
            languages,
            lookup,
            value,
        } => {
            if relations.is_empty() {
                return Ok(joined
                    .is_some_and(|record| Q::row_matches(record, field, languages, *lookup, value)));
            }
            for instance in walk(row, relations) {
                let (model, object_id) = {
                    let borrowed = instance.borrow();
                    (borrowed.model_name().to_string(), borrowed.object_id())
                };
                let records = store.fetch_object(&model, &object_id)?;
                if records
                    .iter()
                    .any(|record| Q::row_matches(record, field, languages, *lookup, value))
                {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Q::And(children) => {
            for child in children {
                if !evaluate(row, child, joined, all, store)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Q::Or(children) => {
            for child in children {
                if evaluate(row, child, joined, all, store)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Q::Not(child) if child.joins_own_translations() && !all.is_empty() => {
            for record in all {
                if evaluate(row, child, Some(record), all, store)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Q::Not(child) => Ok(!evaluate(row, child, joined, all, store)?),
    }
}
