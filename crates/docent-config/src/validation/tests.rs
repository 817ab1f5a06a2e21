//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    let config = DocentConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_max_tokens_out_of_range() {
    let mut config = DocentConfig::default();
    config.model.max_tokens = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("model.max_tokens"));
}

#[test]
fn catches_temperature_out_of_range() {
    let mut config = DocentConfig::default();
    config.model.temperature = 3.5;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("model.temperature"));
}

#[test]
fn catches_ttl_too_short() {
    let mut config = DocentConfig::default();
    config.cache.ttl_secs = 10;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("cache.ttl_secs"));
}

#[test]
fn empty_system_instruction_only_matters_when_caching() {
    let mut config = DocentConfig::default();
    config.cache.system_instruction = "   ".into();
    assert!(validate(&config).is_err());

    config.cache.enabled = false;
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_template_without_placeholder() {
    let mut config = DocentConfig::default();
    config.chat.query_template = "Answer this".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("chat.query_template"));
}

#[test]
fn catches_zero_tool_rounds() {
    let mut config = DocentConfig::default();
    config.chat.max_tool_rounds = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("chat.max_tool_rounds"));
}

#[test]
fn catches_empty_seed_turn() {
    let mut config = DocentConfig::default();
    config.chat.seed_history[1].text = String::new();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("chat.seed_history[1].text"));
}

#[test]
fn catches_output_dir_escaping_working_root() {
    let mut config = DocentConfig::default();
    config.tools.output_dir = "../outside".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("tools.output_dir"));

    config.tools.output_dir = "/tmp/results".into();
    assert!(validate(&config).is_err());

    config.tools.output_dir = "out/results".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_dotted_extension() {
    let mut config = DocentConfig::default();
    config.tools.extension = ".txt".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("tools.extension"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = DocentConfig::default();
    config.model.max_tokens = 0;
    config.chat.max_tool_rounds = 100;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("model.max_tokens"));
    assert!(err.contains("chat.max_tool_rounds"));
    assert!(err.contains("; "));
}
