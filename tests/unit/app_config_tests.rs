/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use polyfield::app_config::{Config, LanguageConfig, LogLevel};
use polyfield::TranslationError;
use tempfile::TempDir;

use crate::common;

#[test]
fn test_default_shouldValidateAndBuildLanguages() -> Result<()> {
    let config = Config::default();
    config.validate()?;

    let languages = config.build_languages()?;
    assert_eq!(languages.default_language(), "en");
    assert_eq!(languages.display_name("de"), Some("German"));
    assert_eq!(languages.display_name("fr"), Some("French"));
    assert_eq!(config.log_level, LogLevel::Info);
    Ok(())
}

#[test]
fn test_validate_withInvalidCode_shouldFail() {
    let config = Config {
        languages: vec![LanguageConfig::new("en"), LanguageConfig::new("qq")],
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(TranslationError::Config(_))));
}

#[test]
fn test_validate_withDefaultOutsideLanguages_shouldFail() {
    let config = Config {
        default_language: "tr".to_string(),
        ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("tr"));
}

#[test]
fn test_validate_withNoLanguages_shouldFail() {
    let config = Config {
        languages: vec![],
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_buildLanguages_withExplicitName_shouldKeepIt() -> Result<()> {
    let config = Config {
        languages: vec![
            LanguageConfig::new("en"),
            LanguageConfig::named("de", "Deutsch"),
        ],
        ..Config::default()
    };
    let languages = config.build_languages()?;
    assert_eq!(languages.display_name("de"), Some("Deutsch"));
    assert_eq!(languages.display_name("en"), Some("English"));
    Ok(())
}

#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "default_language": "de",
        "languages": [{"code": "de"}, {"code": "en", "name": "English"}],
        "log_level": "debug",
        "models": [
            {
                "name": "page",
                "fields": [{"name": "title", "kind": "char"}, {"name": "body", "kind": "text"}],
                "translatable": {"explicit": ["title"]}
            }
        ]
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.database_path.is_none());
    config.validate()?;

    let registry = config.build_registry()?;
    assert_eq!(registry.translatable_fields("page")?, &["title".to_string()]);
    Ok(())
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(created, Config::default());

    let loaded = Config::load_or_create(&path)?;
    assert_eq!(loaded, created);
    Ok(())
}

#[test]
fn test_saveAndLoad_shouldKeepModels() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("conf.json");

    let config = Config {
        models: common::model_metas(),
        ..Config::default()
    };
    config.save(&path)?;

    let loaded = Config::load(&path)?;
    assert_eq!(loaded.models, config.models);
    assert!(loaded.build_registry()?.is_translatable("city"));
    Ok(())
}

#[test]
fn test_load_withMalformedFile_shouldFail() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json")?;

    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
    Ok(())
}
