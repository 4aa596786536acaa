/*!
 * The translation store seam.
 *
 * The engine talks to translation storage only through `TranslationStore`,
 * so the SQLite repository can be swapped for another backend.
 */

use crate::errors::Result;
use crate::language_utils::LanguageFilter;

use super::models::{Scope, TranslationKey, TranslationRecord};

/// Generic `(model, object_id, field, language) -> text` storage
pub trait TranslationStore {
    /// Rows inside `scope` whose language matches `languages`
    ///
    /// The language filter is always ANDed with the scope.
    fn fetch(&self, scope: &Scope, languages: &LanguageFilter) -> Result<Vec<TranslationRecord>>;

    /// Create the row for `key`, or overwrite its text if it exists
    fn upsert(&self, key: &TranslationKey, text: &str) -> Result<()>;

    /// Remove the rows inside `scope` for `languages`, returning how many went
    fn delete(&self, scope: &Scope, languages: &LanguageFilter) -> Result<usize>;

    /// Every row of one record, in all languages
    fn fetch_object(&self, model: &str, object_id: &str) -> Result<Vec<TranslationRecord>> {
        let mut scope = Scope::new();
        scope.add(model, object_id);
        self.fetch_all_languages(&scope)
    }

    /// Rows inside `scope`, whatever their language
    fn fetch_all_languages(&self, scope: &Scope) -> Result<Vec<TranslationRecord>>;

    /// Remove every row of one record, as when the record itself goes away
    fn delete_object(&self, model: &str, object_id: &str) -> Result<usize> {
        let mut languages: Vec<String> = Vec::new();
        for record in self.fetch_object(model, object_id)? {
            if !languages.contains(&record.language) {
                languages.push(record.language);
            }
        }
        if languages.is_empty() {
            return Ok(0);
        }

        let mut scope = Scope::new();
        scope.add(model, object_id);
        self.delete(&scope, &LanguageFilter::Many(languages))
    }
}
