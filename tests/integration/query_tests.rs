/*!
 * Integration tests for translatable queries.
 *
 * Queries run over a `MemorySource` holding the sample graph, with
 * translations in an in-memory SQLite store.
 */

use polyfield::model::Entity;
use polyfield::{LanguageFilter, Q, TranslationError, TranslationStore, NO_RELATIONS};

use crate::common::{self, field, related, GERMAN, TURKISH};

fn names(instances: &[polyfield::Instance]) -> Vec<String> {
    instances
        .iter()
        .filter_map(|i| field(i, "name"))
        .collect()
}

#[test]
fn test_fetch_withoutSettings_shouldReturnFreshCopies() {
    let service = common::service();
    let continents = common::sample_continents();
    let source = common::sample_source(&continents);

    let results = service.query(&source, "continent").unwrap().fetch().unwrap();
    assert_eq!(names(&results), vec!["Europe", "Asia"]);
    assert!(!std::rc::Rc::ptr_eq(&results[0], &continents[0]));
}

#[test]
fn test_translate_afterFilter_shouldTranslateResults() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let results = service
        .query(&source, "continent")
        .unwrap()
        .filter(Q::new("code", "EU"))
        .unwrap()
        .translate(Some("de"))
        .unwrap()
        .fetch()
        .unwrap();

    assert_eq!(names(&results), vec!["Europa"]);
}

#[test]
fn test_translate_beforeFilter_shouldPropagateThroughChain() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let query = service
        .query(&source, "continent")
        .unwrap()
        .translate(Some("de"))
        .unwrap()
        .filter(Q::new("code", "AS"))
        .unwrap()
        .distinct();

    assert_eq!(query.settings().translate.as_deref(), Some("de"));
    assert_eq!(names(&query.fetch().unwrap()), vec!["Asien"]);
}

#[test]
fn test_translateRelated_shouldTranslateNestedInstances() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let europe = service
        .query(&source, "continent")
        .unwrap()
        .translate(Some("de"))
        .unwrap()
        .translate_related(&["countries", "countries.cities"])
        .unwrap()
        .first()
        .unwrap()
        .unwrap();

    let countries = related(&europe, "countries");
    assert_eq!(names(&countries), vec!["Deutschland", "Niederlande"]);
    assert_eq!(
        field(&related(&countries[0], "cities")[1], "name").as_deref(),
        Some("München")
    );
}

#[test]
fn test_translateRelated_withInvalidPath_shouldFailImmediately() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());

    let result = service
        .query(&source, "continent")
        .unwrap()
        .translate_related(&["countries.towns"]);
    assert!(matches!(
        result,
        Err(TranslationError::InvalidRelation { ref path, .. }) if path == "countries.towns"
    ));
}

#[test]
fn test_translate_withUnsupportedLanguage_shouldFail() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());
    let result = service.query(&source, "continent").unwrap().translate(Some("xx"));
    assert!(matches!(result, Err(TranslationError::UnsupportedLanguage(_))));
}

#[test]
fn test_filter_onTranslatedTextWithoutProbe_shouldMatchBaseValuesOnly() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let query = service.query(&source, "continent").unwrap();
    assert!(query.filter(Q::new("name", "Europa")).unwrap().is_empty().unwrap());
    assert_eq!(query.filter(Q::new("name", "Europe")).unwrap().len().unwrap(), 1);
}

#[test]
fn test_probe_shouldMatchTranslatedText() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let query = service
        .query(&source, "continent")
        .unwrap()
        .probe("de")
        .unwrap();
    assert_eq!(query.settings().probe, Some(LanguageFilter::One("de".to_string())));

    let results = query.filter(Q::new("name", "Europa")).unwrap().fetch().unwrap();
    assert_eq!(names(&results), vec!["Europe"]);

    // Base values are not searched unless the default language is probed
    assert!(query.filter(Q::new("name", "Europe")).unwrap().is_empty().unwrap());
}

#[test]
fn test_probe_withDefaultLanguage_shouldAlsoMatchBaseField() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let query = service
        .query(&source, "continent")
        .unwrap()
        .probe(["en", "de"])
        .unwrap();

    let german = query.filter(Q::new("name", "Asien")).unwrap().distinct();
    let english = query.filter(Q::new("name", "Asia")).unwrap().distinct();
    assert_eq!(names(&german.fetch().unwrap()), vec!["Asia"]);
    assert_eq!(names(&english.fetch().unwrap()), vec!["Asia"]);

    let Some(Q::Or(children)) = german.filter_expr() else {
        panic!("expected the base predicate ORed with the translated one");
    };
    assert!(matches!(children[1], Q::Translated { ref languages, .. } if languages == &["de".to_string()]));
}

#[test]
fn test_probe_onlyDefaultLanguage_shouldLeaveFilterUnchanged() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());

    let query = service
        .query(&source, "continent")
        .unwrap()
        .probe("en")
        .unwrap()
        .filter(Q::new("name", "Europe"))
        .unwrap();
    assert_eq!(query.filter_expr(), Some(&Q::new("name", "Europe")));
}

#[test]
fn test_probe_throughRelation_shouldMatchRelatedTranslations() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let results = service
        .query(&source, "continent")
        .unwrap()
        .probe("de")
        .unwrap()
        .filter(Q::new("countries__name__istartswith", "süd"))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(names(&results), vec!["Asia"]);
}

#[test]
fn test_probe_withSeveralLanguages_shouldDuplicateAtMostPerLanguage() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    common::store_rows(service.store(), TURKISH, "tr");
    let source = common::sample_source(&common::sample_continents());

    let query = service
        .query(&source, "continent")
        .unwrap()
        .probe(["de", "tr"])
        .unwrap()
        .filter(Q::new("name__icontains", "a"))
        .unwrap();

    let joined = query.len().unwrap();
    let unique = query.distinct().len().unwrap();

    // Europa and Avrupa, Asien and Asya
    assert_eq!(unique, 2);
    assert_eq!(joined, 4);
    assert!(joined <= 2 * unique);
}

#[test]
fn test_exclude_withProbe_shouldNegateTranslatedMatch() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let results = service
        .query(&source, "continent")
        .unwrap()
        .probe("de")
        .unwrap()
        .exclude(Q::new("name", "Europa"))
        .unwrap()
        .distinct()
        .fetch()
        .unwrap();
    assert_eq!(names(&results), vec!["Asia"]);
}

#[test]
fn test_exclude_withProbe_shouldNotRepeatRecords() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());

    let query = service
        .query(&source, "continent")
        .unwrap()
        .probe("de")
        .unwrap();

    // Asia has two German rows, neither of them named Europa
    let kept = query.exclude(Q::new("name", "Europa")).unwrap().fetch().unwrap();
    assert_eq!(names(&kept), vec!["Asia"]);

    // A positive match on the same rows still joins once per matching row
    let joined = query
        .filter(Q::new("denonym__icontains", "isch"))
        .unwrap()
        .exclude(Q::new("name", "Europa"))
        .unwrap();
    assert_eq!(names(&joined.fetch().unwrap()), vec!["Asia"]);
}

#[test]
fn test_filter_withUnknownField_shouldFail() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());
    let result = service
        .query(&source, "continent")
        .unwrap()
        .filter(Q::new("countries__capital", "Berlin"));
    assert!(matches!(result, Err(TranslationError::UnknownField { .. })));
}

#[test]
fn test_query_withUnknownModel_shouldFail() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());
    assert!(matches!(
        service.query(&source, "planet"),
        Err(TranslationError::UnknownModel(_))
    ));
}

#[test]
fn test_slice_shouldWindowResults() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());
    let cities = service.query(&source, "city").unwrap();

    assert_eq!(
        names(&cities.slice(1, Some(2)).fetch().unwrap()),
        vec!["Munich", "Amsterdam"]
    );
    assert_eq!(
        names(&cities.slice(1, Some(3)).slice(1, None).fetch().unwrap()),
        vec!["Amsterdam", "Seoul"]
    );
    assert_eq!(names(&cities.slice(4, None).fetch().unwrap()), vec!["Mumbai"]);
    assert!(cities.slice(10, Some(1)).is_empty().unwrap());
}

#[test]
fn test_fetch_calledTwice_shouldReuseEvaluation() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());
    let query = service.query(&source, "continent").unwrap();

    assert!(!query.is_evaluated());
    let first = query.fetch().unwrap();
    assert!(query.is_evaluated());
    let second = query.fetch().unwrap();
    assert!(std::rc::Rc::ptr_eq(&first[0], &second[0]));
}

#[test]
fn test_derivedQuery_shouldLoseOverlaysOfEarlierResults() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());
    let query = service.query(&source, "continent").unwrap();

    let results = query.fetch().unwrap();
    let mut context = service.context(results.clone(), NO_RELATIONS).unwrap();
    context.read(Some("de")).unwrap();
    assert_eq!(names(&query.fetch().unwrap()), vec!["Europa", "Asien"]);

    // Filtering evaluates again against the source
    let refiltered = query.filter(Q::new("code", "EU")).unwrap().fetch().unwrap();
    assert_eq!(names(&refiltered), vec!["Europe"]);

    // A clone is a fresh, unevaluated query too
    assert_eq!(names(&query.clone().fetch().unwrap()), vec!["Europe", "Asia"]);
}

#[test]
fn test_lazyEntity_shouldBeMaterializedByContext() {
    let service = common::service();
    common::store_rows(service.store(), GERMAN, "de");
    let source = common::sample_source(&common::sample_continents());
    let countries = service
        .query(&source, "country")
        .unwrap()
        .filter(Q::new("name__endswith", "ia"))
        .unwrap();

    let mut context = service
        .context(Entity::lazy(countries), &["cities"])
        .unwrap();
    assert_eq!(context.read(Some("de")).unwrap(), 4);

    let purview = context.purview().unwrap();
    assert!(purview.contains("country", "4"));
    assert!(purview.contains("city", "5"));
    assert!(!purview.contains("country", "1"));

    let india = purview.get("country", "4").unwrap();
    assert_eq!(field(india, "name").as_deref(), Some("Indien"));
}

#[test]
fn test_query_inContextWithCreate_shouldStoreResults() {
    let service = common::service();
    let source = common::sample_source(&common::sample_continents());
    let query = service.query(&source, "city").unwrap().slice(0, Some(2));

    let written = service
        .with_context(Entity::lazy(query.clone()), NO_RELATIONS, |context| context.create(Some("tr")))
        .unwrap();
    assert_eq!(written, 4);
    assert_eq!(
        service.store().fetch_object("city", "2").unwrap()[0].text,
        "Munich"
    );
}
