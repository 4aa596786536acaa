/*!
 * Common test utilities for the polyfield test suite
 *
 * A small geography model graph: continents have countries, countries have
 * cities and tags. Tags are a plain model and cannot be translated.
 */

#![allow(dead_code)]

use polyfield::database::TranslationKey;
use polyfield::model::{FieldKind, FieldMeta, RelationMeta};
use polyfield::{
    instance, Instance, Languages, MemorySource, Model, ModelMeta, Registry, Related,
    TranslationService, TranslationStore,
};

#[derive(Debug, Clone)]
pub struct Continent {
    pub id: i64,
    pub code: String,
    pub name: Option<String>,
    pub denonym: Option<String>,
    pub countries: Vec<Instance>,
}

impl Model for Continent {
    fn model_name(&self) -> &str {
        "continent"
    }

    fn object_id(&self) -> String {
        self.id.to_string()
    }

    fn get_field(&self, field: &str) -> Option<String> {
        match field {
            "code" => Some(self.code.clone()),
            "name" => self.name.clone(),
            "denonym" => self.denonym.clone(),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: Option<String>) {
        match field {
            "code" => self.code = value.unwrap_or_default(),
            "name" => self.name = value,
            "denonym" => self.denonym = value,
            _ => {}
        }
    }

    fn related(&self, relation: &str) -> Option<Related> {
        match relation {
            "countries" => Some(Related::Many(self.countries.clone())),
            _ => None,
        }
    }

    fn duplicate(&self) -> Instance {
        instance(Continent {
            countries: duplicate_all(&self.countries),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone)]
pub struct Country {
    pub id: i64,
    pub code: String,
    pub name: Option<String>,
    pub denonym: Option<String>,
    pub population: i64,
    pub cities: Vec<Instance>,
    pub tags: Vec<Instance>,
}

impl Model for Country {
    fn model_name(&self) -> &str {
        "country"
    }

    fn object_id(&self) -> String {
        self.id.to_string()
    }

    fn get_field(&self, field: &str) -> Option<String> {
        match field {
            "code" => Some(self.code.clone()),
            "name" => self.name.clone(),
            "denonym" => self.denonym.clone(),
            "population" => Some(self.population.to_string()),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: Option<String>) {
        match field {
            "code" => self.code = value.unwrap_or_default(),
            "name" => self.name = value,
            "denonym" => self.denonym = value,
            _ => {}
        }
    }

    fn related(&self, relation: &str) -> Option<Related> {
        match relation {
            "cities" => Some(Related::Many(self.cities.clone())),
            "tags" => Some(Related::Many(self.tags.clone())),
            _ => None,
        }
    }

    fn duplicate(&self) -> Instance {
        instance(Country {
            cities: duplicate_all(&self.cities),
            tags: duplicate_all(&self.tags),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone)]
pub struct City {
    pub id: i64,
    pub name: Option<String>,
    pub denonym: Option<String>,
}

impl Model for City {
    fn model_name(&self) -> &str {
        "city"
    }

    fn object_id(&self) -> String {
        self.id.to_string()
    }

    fn get_field(&self, field: &str) -> Option<String> {
        match field {
            "name" => self.name.clone(),
            "denonym" => self.denonym.clone(),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: Option<String>) {
        match field {
            "name" => self.name = value,
            "denonym" => self.denonym = value,
            _ => {}
        }
    }

    fn related(&self, _relation: &str) -> Option<Related> {
        None
    }

    fn duplicate(&self) -> Instance {
        instance(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

impl Model for Tag {
    fn model_name(&self) -> &str {
        "tag"
    }

    fn object_id(&self) -> String {
        self.id.to_string()
    }

    fn get_field(&self, field: &str) -> Option<String> {
        match field {
            "label" => Some(self.label.clone()),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: Option<String>) {
        if field == "label" {
            self.label = value.unwrap_or_default();
        }
    }

    fn related(&self, _relation: &str) -> Option<Related> {
        None
    }

    fn duplicate(&self) -> Instance {
        instance(self.clone())
    }
}

fn duplicate_all(instances: &[Instance]) -> Vec<Instance> {
    instances.iter().map(|i| i.borrow().duplicate()).collect()
}

/// Model declarations of the fixture graph
pub fn model_metas() -> Vec<ModelMeta> {
    vec![
        ModelMeta::new("continent")
            .field(FieldMeta::new("code", FieldKind::Slug))
            .field(FieldMeta::char("name"))
            .field(FieldMeta::char("denonym"))
            .relation(RelationMeta::to_many("countries", "country"))
            .translatable(&["name", "denonym"]),
        ModelMeta::new("country")
            .field(FieldMeta::new("code", FieldKind::Slug))
            .field(FieldMeta::char("name"))
            .field(FieldMeta::char("denonym"))
            .field(FieldMeta::new("population", FieldKind::Integer))
            .relation(RelationMeta::to_many("cities", "city"))
            .relation(RelationMeta::to_many("tags", "tag"))
            .translatable_auto(),
        ModelMeta::new("city")
            .field(FieldMeta::char("name"))
            .field(FieldMeta::char("denonym"))
            .translatable_auto(),
        ModelMeta::new("tag").field(FieldMeta::char("label")),
    ]
}

pub fn registry() -> Registry {
    Registry::new(model_metas()).unwrap()
}

/// English by default, German and Turkish translations
pub fn languages() -> Languages {
    Languages::new(
        [("en", "English"), ("de", "German"), ("tr", "Turkish")],
        "en",
    )
    .unwrap()
}

/// Route library logs to the test output, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Service over a fresh in-memory database
pub fn service() -> TranslationService {
    init_logging();
    TranslationService::in_memory(registry(), languages()).unwrap()
}

pub fn continent(id: i64, code: &str, name: &str, denonym: &str, countries: Vec<Instance>) -> Instance {
    instance(Continent {
        id,
        code: code.to_string(),
        name: Some(name.to_string()),
        denonym: Some(denonym.to_string()),
        countries,
    })
}

pub fn country(id: i64, code: &str, name: &str, denonym: &str, cities: Vec<Instance>) -> Instance {
    instance(Country {
        id,
        code: code.to_string(),
        name: Some(name.to_string()),
        denonym: Some(denonym.to_string()),
        population: 1_000_000 * id,
        cities,
        tags: Vec::new(),
    })
}

pub fn city(id: i64, name: &str, denonym: &str) -> Instance {
    instance(City {
        id,
        name: Some(name.to_string()),
        denonym: Some(denonym.to_string()),
    })
}

pub fn tag(id: i64, label: &str) -> Instance {
    instance(Tag {
        id,
        label: label.to_string(),
    })
}

/// Europe and Asia with two countries each and their cities
pub fn sample_continents() -> Vec<Instance> {
    let germany = country(
        1,
        "DE",
        "Germany",
        "German",
        vec![city(1, "Berlin", "Berliner"), city(2, "Munich", "Munich citizen")],
    );
    let netherlands = country(
        2,
        "NL",
        "Netherlands",
        "Dutch",
        vec![city(3, "Amsterdam", "Amsterdammer")],
    );
    let south_korea = country(
        3,
        "KR",
        "South Korea",
        "South Korean",
        vec![city(4, "Seoul", "Seoulite")],
    );
    let india = country(4, "IN", "India", "Indian", vec![city(5, "Mumbai", "Mumbaikar")]);

    vec![
        continent(1, "EU", "Europe", "European", vec![germany, netherlands]),
        continent(2, "AS", "Asia", "Asian", vec![south_korea, india]),
    ]
}

/// German rows for the sample graph as `(model, object_id, field, text)`
pub const GERMAN: &[(&str, &str, &str, &str)] = &[
    ("continent", "1", "name", "Europa"),
    ("continent", "1", "denonym", "Europäisch"),
    ("continent", "2", "name", "Asien"),
    ("continent", "2", "denonym", "Asiatisch"),
    ("country", "1", "name", "Deutschland"),
    ("country", "1", "denonym", "Deutsche"),
    ("country", "2", "name", "Niederlande"),
    ("country", "2", "denonym", "Niederländisch"),
    ("country", "3", "name", "Südkorea"),
    ("country", "3", "denonym", "Südkoreanisch"),
    ("country", "4", "name", "Indien"),
    ("country", "4", "denonym", "Indisch"),
    ("city", "1", "name", "Berlin"),
    ("city", "1", "denonym", "Berliner"),
    ("city", "2", "name", "München"),
    ("city", "2", "denonym", "Münchner"),
    ("city", "3", "name", "Amsterdam"),
    ("city", "3", "denonym", "Amsterdamer"),
    ("city", "4", "name", "Seoul"),
    ("city", "4", "denonym", "Seouler"),
    ("city", "5", "name", "Mumbai"),
    ("city", "5", "denonym", "Mumbaier"),
];

/// Turkish rows for the continents only
pub const TURKISH: &[(&str, &str, &str, &str)] = &[
    ("continent", "1", "name", "Avrupa"),
    ("continent", "1", "denonym", "Avrupalı"),
    ("continent", "2", "name", "Asya"),
    ("continent", "2", "denonym", "Asyalı"),
];

/// Write fixture rows in one language
pub fn store_rows<S: TranslationStore>(store: &S, rows: &[(&str, &str, &str, &str)], language: &str) {
    for (model, object_id, field, text) in rows {
        store
            .upsert(&TranslationKey::new(model, object_id, field, language), text)
            .unwrap();
    }
}

/// Source holding the sample continents, their countries and cities
pub fn sample_source(continents: &[Instance]) -> MemorySource {
    let mut source = MemorySource::new();
    for continent in continents {
        source.insert(continent.clone());
        for country in continent.borrow().related("countries").unwrap().into_vec() {
            source.insert(country.clone());
            for city in country.borrow().related("cities").unwrap().into_vec() {
                source.insert(city);
            }
        }
    }
    source
}

/// Current value of a field
pub fn field(instance: &Instance, name: &str) -> Option<String> {
    instance.borrow().get_field(name)
}

/// Related instances of a relation
pub fn related(instance: &Instance, relation: &str) -> Vec<Instance> {
    instance
        .borrow()
        .related(relation)
        .map(Related::into_vec)
        .unwrap_or_default()
}
