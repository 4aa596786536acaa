/*!
 * Choice lists for translation editing forms.
 *
 * An admin form that edits translation rows needs two dropdowns: the
 * translatable fields of the model and the languages a translation can be
 * written in. The default language is left out, since its text lives in the
 * record itself.
 */

use serde::Serialize;

use crate::errors::Result;
use crate::language_utils::Languages;
use crate::model::Registry;

/// One entry of a dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Stored value
    pub value: String,
    /// Human readable label
    pub label: String,
}

impl Choice {
    fn new(value: &str, label: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            label: label.into(),
        }
    }
}

/// Dropdowns for editing the translations of one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSchema {
    /// Model the translations belong to
    pub model: String,
    /// Translatable fields
    pub field_choices: Vec<Choice>,
    /// Supported languages except the default one
    pub language_choices: Vec<Choice>,
}

/// `short_name` becomes `Short name`
fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the form schema of a translatable model
pub fn translation_form_schema(registry: &Registry, languages: &Languages, model: &str) -> Result<FormSchema> {
    let fields = registry.translatable_fields(model)?;

    let field_choices = fields
        .iter()
        .map(|field| Choice::new(field, humanize(field)))
        .collect();

    let language_choices = languages
        .translation_languages()
        .into_iter()
        .map(|language| Choice::new(&language.code, language.name.clone()))
        .collect();

    Ok(FormSchema {
        model: model.to_string(),
        field_choices,
        language_choices,
    })
}
