/*!
 * Model metadata and the model registry.
 *
 * Every model taking part in translation, or traversed on the way to one,
 * is described by a `ModelMeta`: its fields, its relations and whether (and
 * which) fields are translatable. The `Registry` resolves the translatable
 * field list once per model and answers relation-graph questions for the
 * hierarchy builder, the purview builder and the query layer.
 */

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TranslationError};

/// Storage kind of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Short text
    Char,
    /// Long text
    Text,
    /// Text holding an email address
    Email,
    /// Text holding a URL
    Url,
    /// Text holding a slug
    Slug,
    /// Integer value
    Integer,
    /// Boolean value
    Boolean,
    /// Anything else
    Other,
}

impl FieldKind {
    /// Free text kinds; formatted text kinds (email, url, slug) are excluded
    pub fn is_free_text(&self) -> bool {
        matches!(self, Self::Char | Self::Text)
    }

    /// Whether values of this kind are strings
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            Self::Char | Self::Text | Self::Email | Self::Url | Self::Slug
        )
    }
}

/// A field of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Field name
    pub name: String,
    /// Storage kind
    pub kind: FieldKind,
    /// Enumerated choices, if the field is restricted to them
    #[serde(default)]
    pub choices: Vec<String>,
    /// Whether the field is editable
    #[serde(default = "default_true")]
    pub editable: bool,
}

fn default_true() -> bool {
    true
}

impl FieldMeta {
    /// Create a field of the given kind
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            choices: Vec::new(),
            editable: true,
        }
    }

    /// Short text field
    pub fn char(name: &str) -> Self {
        Self::new(name, FieldKind::Char)
    }

    /// Long text field
    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Restrict the field to enumerated choices
    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Mark the field as not editable
    pub fn not_editable(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Whether the field qualifies for automatic translation
    pub fn is_auto_translatable(&self) -> bool {
        self.kind.is_free_text() && self.choices.is_empty() && self.editable
    }
}

/// Cardinality of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Foreign key or one-to-one
    ToOne,
    /// Reverse foreign key or many-to-many
    ToMany,
}

/// A relation from one model to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMeta {
    /// Relation name on the owning model
    pub name: String,
    /// Name of the target model
    pub target: String,
    /// Cardinality
    pub kind: RelationKind,
}

impl RelationMeta {
    /// Single-valued relation
    pub fn to_one(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            kind: RelationKind::ToOne,
        }
    }

    /// Multi-valued relation
    pub fn to_many(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            kind: RelationKind::ToMany,
        }
    }
}

/// Translatable field declaration of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslatableFields {
    /// Every free text field without choices
    Auto,
    /// Exactly these fields
    Explicit(Vec<String>),
}

/// Declaration of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Model name, used as the type tag of translation rows
    pub name: String,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
    /// Declared relations
    #[serde(default)]
    pub relations: Vec<RelationMeta>,
    /// Translatable fields; `None` for plain models
    #[serde(default)]
    pub translatable: Option<TranslatableFields>,
}

impl ModelMeta {
    /// Declare a plain model
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            relations: Vec::new(),
            translatable: None,
        }
    }

    /// Add a field
    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a relation
    pub fn relation(mut self, relation: RelationMeta) -> Self {
        self.relations.push(relation);
        self
    }

    /// Translate every eligible field
    pub fn translatable_auto(mut self) -> Self {
        self.translatable = Some(TranslatableFields::Auto);
        self
    }

    /// Translate exactly the given fields
    pub fn translatable(mut self, fields: &[&str]) -> Self {
        self.translatable = Some(TranslatableFields::Explicit(
            fields.iter().map(|f| f.to_string()).collect(),
        ));
        self
    }

    /// Look up a declared field
    pub fn get_field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a declared relation
    pub fn get_relation(&self, name: &str) -> Option<&RelationMeta> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// A registered model with its resolved translatable field names
#[derive(Debug, Clone)]
pub struct RegisteredModel {
    /// The declaration
    pub meta: ModelMeta,
    translatable_fields: Option<Vec<String>>,
}

impl RegisteredModel {
    /// Resolved translatable field names, `None` for plain models
    pub fn translatable_fields(&self) -> Option<&[String]> {
        self.translatable_fields.as_deref()
    }

    /// Whether the model opted into translation
    pub fn is_translatable(&self) -> bool {
        self.translatable_fields.is_some()
    }
}

/// A filter path resolved against the model graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Relations walked before the field
    pub relations: Vec<String>,
    /// Model declaring the field
    pub owner: String,
    /// Field name
    pub field: String,
    /// Whether the owner translates this field
    pub translatable: bool,
}

/// Split a relation or lookup path on `.` and `__`
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split("__").flat_map(|part| part.split('.')).collect()
}

/// All known models, with translatable fields resolved once
#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: IndexMap<String, RegisteredModel>,
}

impl Registry {
    /// Build a registry, validating declarations and relation targets
    pub fn new(models: Vec<ModelMeta>) -> Result<Self> {
        let mut registered: IndexMap<String, RegisteredModel> = IndexMap::new();

        for meta in models {
            if registered.contains_key(&meta.name) {
                return Err(TranslationError::Config(format!(
                    "Model `{}` is registered twice",
                    meta.name
                )));
            }

            let translatable_fields = match &meta.translatable {
                None => None,
                Some(TranslatableFields::Auto) => Some(
                    meta.fields
                        .iter()
                        .filter(|f| f.is_auto_translatable())
                        .map(|f| f.name.clone())
                        .collect(),
                ),
                Some(TranslatableFields::Explicit(names)) => {
                    for name in names {
                        match meta.get_field(name) {
                            Some(field) if field.kind.is_text_like() => {}
                            Some(_) => {
                                return Err(TranslationError::Config(format!(
                                    "Field `{}` of model `{}` is not a text field",
                                    name, meta.name
                                )));
                            }
                            None => {
                                return Err(TranslationError::UnknownField {
                                    model: meta.name.clone(),
                                    field: name.clone(),
                                });
                            }
                        }
                    }
                    Some(names.clone())
                }
            };

            registered.insert(
                meta.name.clone(),
                RegisteredModel {
                    meta,
                    translatable_fields,
                },
            );
        }

        for model in registered.values() {
            for relation in &model.meta.relations {
                if !registered.contains_key(&relation.target) {
                    return Err(TranslationError::Config(format!(
                        "Relation `{}` of model `{}` targets unknown model `{}`",
                        relation.name, model.meta.name, relation.target
                    )));
                }
            }
        }

        Ok(Self { models: registered })
    }

    /// Look up a model
    pub fn get(&self, model: &str) -> Result<&RegisteredModel> {
        self.models
            .get(model)
            .ok_or_else(|| TranslationError::UnknownModel(model.to_string()))
    }

    /// All models, in registration order
    pub fn models(&self) -> impl Iterator<Item = &RegisteredModel> {
        self.models.values()
    }

    /// Whether the model is registered and translatable
    pub fn is_translatable(&self, model: &str) -> bool {
        self.models
            .get(model)
            .is_some_and(RegisteredModel::is_translatable)
    }

    /// Translatable fields of a model; fails for plain or unknown models
    pub fn translatable_fields(&self, model: &str) -> Result<&[String]> {
        let registered = self.models.get(model).ok_or_else(|| {
            TranslationError::type_mismatch(model, "the model is not registered")
        })?;
        registered.translatable_fields().ok_or_else(|| {
            TranslationError::type_mismatch(model, "the model has no translatable fields declared")
        })
    }

    /// Walk a relation path from `model`, returning each relation on the way
    pub fn resolve_relation_path(&self, model: &str, path: &str) -> Result<Vec<&RelationMeta>> {
        let mut current = self.get(model)?;
        let mut chain = Vec::new();

        for segment in split_path(path) {
            let relation = current.meta.get_relation(segment).ok_or_else(|| {
                TranslationError::InvalidRelation {
                    model: model.to_string(),
                    path: path.to_string(),
                    segment: segment.to_string(),
                }
            })?;
            chain.push(relation);
            current = self.get(&relation.target)?;
        }

        Ok(chain)
    }

    /// Resolve a lookup path such as `countries__name` to its terminal field
    pub fn resolve_field_path(&self, model: &str, path: &str) -> Result<ResolvedField> {
        let segments = split_path(path);
        let (field, relations) = segments.split_last().ok_or_else(|| {
            TranslationError::UnknownField {
                model: model.to_string(),
                field: path.to_string(),
            }
        })?;

        let mut owner = self.get(model)?;
        for segment in relations {
            let relation = owner.meta.get_relation(segment).ok_or_else(|| {
                TranslationError::InvalidRelation {
                    model: model.to_string(),
                    path: path.to_string(),
                    segment: segment.to_string(),
                }
            })?;
            owner = self.get(&relation.target)?;
        }

        if owner.meta.get_field(field).is_none() {
            return Err(TranslationError::UnknownField {
                model: owner.meta.name.clone(),
                field: field.to_string(),
            });
        }

        let translatable = owner
            .translatable_fields()
            .is_some_and(|fields| fields.iter().any(|f| f == field));

        Ok(ResolvedField {
            relations: relations.iter().map(|s| s.to_string()).collect(),
            owner: owner.meta.name.clone(),
            field: field.to_string(),
            translatable,
        })
    }
}
