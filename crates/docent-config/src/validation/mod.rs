//! Full configuration validation.
//!
//! Validates numeric ranges, the query template and the tool sandbox
//! settings, collecting every problem into a single `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use std::path::{Component, Path};

use crate::schema::{DocentConfig, INPUT_PLACEHOLDER};
use docent_common::ConfigError;
use helpers::{validate_non_empty, validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &DocentConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_model(&mut errors, config);
    validate_cache(&mut errors, config);
    validate_chat(&mut errors, config);
    validate_tools(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_model(errors: &mut Vec<String>, config: &DocentConfig) {
    validate_non_empty(errors, "model.name", &config.model.name);
    validate_non_empty(errors, "model.fallback", &config.model.fallback);
    validate_non_empty(errors, "model.api_base", &config.model.api_base);
    validate_range(errors, "model.max_tokens", config.model.max_tokens, 1, 65536);
    validate_range_f64(errors, "model.temperature", config.model.temperature, 0.0, 2.0);
    validate_range(
        errors,
        "model.request_timeout_secs",
        config.model.request_timeout_secs,
        5,
        600,
    );
}

fn validate_cache(errors: &mut Vec<String>, config: &DocentConfig) {
    validate_range(errors, "cache.ttl_secs", config.cache.ttl_secs, 60, 86400);
    if config.cache.enabled {
        validate_non_empty(
            errors,
            "cache.system_instruction",
            &config.cache.system_instruction,
        );
    }
}

fn validate_chat(errors: &mut Vec<String>, config: &DocentConfig) {
    if !config.chat.query_template.contains(INPUT_PLACEHOLDER) {
        errors.push(format!(
            "chat.query_template must contain the {INPUT_PLACEHOLDER} placeholder"
        ));
    }
    validate_range(
        errors,
        "chat.max_tool_rounds",
        config.chat.max_tool_rounds,
        1,
        50,
    );
    for (i, turn) in config.chat.seed_history.iter().enumerate() {
        validate_non_empty(errors, &format!("chat.seed_history[{i}].text"), &turn.text);
    }
}

fn validate_tools(errors: &mut Vec<String>, config: &DocentConfig) {
    let tools = &config.tools;
    validate_non_empty(errors, "tools.output_dir", &tools.output_dir);

    let escapes = Path::new(&tools.output_dir)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        errors.push(format!(
            "tools.output_dir = {:?} must be a relative path without '..'",
            tools.output_dir
        ));
    }

    validate_non_empty(errors, "tools.extension", &tools.extension);
    if tools
        .extension
        .chars()
        .any(|c| c == '.' || c == '/' || c == '\\')
    {
        errors.push(format!(
            "tools.extension = {:?} must not contain '.' or path separators",
            tools.extension
        ));
    }
}
