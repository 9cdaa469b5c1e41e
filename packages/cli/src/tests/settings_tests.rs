use crate::settings::{load_config, select_model};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;
use uieasy_config::constants::{
    DEEPSEEK_API_KEY, IMAGE_ANALYZER_MODULE, OPENAI_API_KEY, REQUIREMENT_ANALYZER_MODULE,
    UIEASY_CONFIG, UIEASY_MODEL_CONFIG,
};
use uieasy_config::Config;

const CONFIG_JSON: &str = r#"{
    "models": {
        "default": {"name": "default", "provider": "openai", "api_key": "sk-file", "model_id": "gpt-4o"},
        "deepseek": {"name": "deepseek", "provider": "deepseek", "model_id": "deepseek-chat"}
    },
    "modules": {
        "requirement_analyzer": {"enabled": true, "model_config": "default"}
    }
}"#;

fn clear_env() {
    for key in [OPENAI_API_KEY, DEEPSEEK_API_KEY, UIEASY_CONFIG, UIEASY_MODEL_CONFIG] {
        env::remove_var(key);
    }
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_load_config_from_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, CONFIG_JSON);

    let config = load_config(Some(&path), None).unwrap();

    assert_eq!(config.models.len(), 2);
    assert_eq!(
        config.module_config(REQUIREMENT_ANALYZER_MODULE).model_config,
        "default"
    );
}

#[test]
#[serial]
fn test_env_fills_missing_provider_key() {
    clear_env();
    env::set_var(DEEPSEEK_API_KEY, "ds-env");
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, CONFIG_JSON);

    let config = load_config(Some(&path), None).unwrap();

    assert_eq!(config.model_config("deepseek").unwrap().api_key, "ds-env");
    assert_eq!(config.model_config("default").unwrap().api_key, "sk-file");
    clear_env();
}

#[test]
#[serial]
fn test_model_flag_selects_model_config() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, CONFIG_JSON);

    let config = load_config(Some(&path), Some("deepseek")).unwrap();

    let module = config.module_config(REQUIREMENT_ANALYZER_MODULE);
    assert_eq!(module.model_config, "deepseek");
    assert!(module.enabled);
}

#[test]
#[serial]
fn test_model_flag_unknown_config_fails_validation() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, CONFIG_JSON);

    assert!(load_config(Some(&path), Some("missing")).is_err());
}

#[test]
#[serial]
fn test_missing_file_uses_environment() {
    clear_env();
    env::set_var(OPENAI_API_KEY, "sk-env");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    let config = load_config(Some(&path), None).unwrap();

    let model = config.model_config("default").unwrap();
    assert_eq!(model.provider, "openai");
    assert_eq!(model.api_key, "sk-env");
    clear_env();
}

#[test]
#[serial]
fn test_invalid_json_is_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{ not json");

    assert!(load_config(Some(&path), None).is_err());
}

#[test]
fn test_select_model_keeps_module_settings() {
    let mut config = Config::default();
    let mut module = config.module_config(REQUIREMENT_ANALYZER_MODULE);
    module.detail_passes = false;
    config.set_module_config(REQUIREMENT_ANALYZER_MODULE, module);

    select_model(&mut config, "fast");

    let module = config.module_config(REQUIREMENT_ANALYZER_MODULE);
    assert_eq!(module.model_config, "fast");
    assert!(!module.detail_passes);
    assert_eq!(config.module_config(IMAGE_ANALYZER_MODULE).model_config, "fast");
}
