/*!
 * Live model instances and the entities the engine operates on.
 */

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::errors::{Result, TranslationError};

/// A model instance as seen by the translation engine
///
/// Host models implement this to expose their type tag, identity, text field
/// values and loaded relations. Relations are read from memory only: loading
/// them up front is the caller's job.
pub trait Model: fmt::Debug {
    /// Type tag of the model, matching its `ModelMeta` name
    fn model_name(&self) -> &str;

    /// Identity of the instance, stored as text in translation rows
    fn object_id(&self) -> String;

    /// Current value of a text field; `None` when null or unknown
    fn get_field(&self, field: &str) -> Option<String>;

    /// Overwrite a text field in memory
    fn set_field(&mut self, field: &str, value: Option<String>);

    /// Loaded instances of a relation; `None` when the model has no such relation
    fn related(&self, relation: &str) -> Option<Related>;

    /// A fresh copy of the instance and its loaded relations
    fn duplicate(&self) -> Instance;
}

/// Shared handle to a live instance
pub type Instance = Rc<RefCell<dyn Model>>;

/// Wrap a model value into an instance handle
pub fn instance<M: Model + 'static>(model: M) -> Instance {
    Rc::new(RefCell::new(model))
}

/// Instances behind a relation
#[derive(Debug, Clone)]
pub enum Related {
    /// Single-valued relation, possibly empty
    One(Option<Instance>),
    /// Multi-valued relation
    Many(Vec<Instance>),
}

impl Related {
    /// The related instances as a list
    pub fn into_vec(self) -> Vec<Instance> {
        match self {
            Self::One(one) => one.into_iter().collect(),
            Self::Many(many) => many,
        }
    }
}

/// `(model, object_id)` identity of an instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    /// Type tag
    pub model: String,
    /// Identity
    pub object_id: String,
}

impl ObjectKey {
    /// Identity of a live instance
    pub fn of(instance: &Instance) -> Self {
        let borrowed = instance.borrow();
        Self {
            model: borrowed.model_name().to_string(),
            object_id: borrowed.object_id(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.model, self.object_id)
    }
}

/// Something that produces instances when evaluated
pub trait Materialize {
    /// Model of the produced instances
    fn model_name(&self) -> &str;

    /// Evaluate and return the instances
    fn materialize(&self) -> Result<Vec<Instance>>;
}

/// What a translation operation applies to
pub enum Entity<'a> {
    /// A single instance
    One(Instance),
    /// A collection of instances of one model
    Many(Vec<Instance>),
    /// A query evaluated once, on first use
    Lazy {
        /// The query
        query: Box<dyn Materialize + 'a>,
        /// Result of the evaluation
        cache: Option<Vec<Instance>>,
    },
}

impl<'a> Entity<'a> {
    /// Wrap an unevaluated query
    pub fn lazy(query: impl Materialize + 'a) -> Self {
        Self::Lazy {
            query: Box::new(query),
            cache: None,
        }
    }

    /// Model of the entity, when it can be told without evaluation
    pub fn model_name(&self) -> Option<String> {
        match self {
            Self::One(one) => Some(one.borrow().model_name().to_string()),
            Self::Many(many) => many.first().map(|i| i.borrow().model_name().to_string()),
            Self::Lazy { query, .. } => Some(query.model_name().to_string()),
        }
    }

    /// Root instances, evaluating a lazy entity on first call
    pub fn roots(&mut self) -> Result<Vec<Instance>> {
        let roots = match self {
            Self::One(one) => vec![one.clone()],
            Self::Many(many) => many.clone(),
            Self::Lazy { query, cache } => {
                if cache.is_none() {
                    *cache = Some(query.materialize()?);
                }
                cache.clone().unwrap_or_default()
            }
        };

        if let Some(first) = roots.first() {
            let model = first.borrow().model_name().to_string();
            if let Some(other) = roots.iter().find(|i| i.borrow().model_name() != model) {
                return Err(TranslationError::type_mismatch(
                    other.borrow().model_name(),
                    format!("collection mixes it with `{}` instances", model),
                ));
            }
        }

        Ok(roots)
    }
}

impl From<Instance> for Entity<'_> {
    fn from(instance: Instance) -> Self {
        Self::One(instance)
    }
}

impl From<Vec<Instance>> for Entity<'_> {
    fn from(instances: Vec<Instance>) -> Self {
        Self::Many(instances)
    }
}

impl From<&[Instance]> for Entity<'_> {
    fn from(instances: &[Instance]) -> Self {
        Self::Many(instances.to_vec())
    }
}

impl fmt::Debug for Entity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(one) => f.debug_tuple("One").field(one).finish(),
            Self::Many(many) => f.debug_tuple("Many").field(many).finish(),
            Self::Lazy { query, cache } => f
                .debug_struct("Lazy")
                .field("model", &query.model_name())
                .field("evaluated", &cache.is_some())
                .finish(),
        }
    }
}
