//! Mapping configuration onto the conversation components.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use docent_ai::{ConversationSetup, FileWriteTool, GeminiConfig, ToolRegistry, Turn};
use docent_common::DocentError;
use docent_config::env::resolve_document_path;
use docent_config::schema::{ModelConfig, SeedRole, SeedTurn, ToolsConfig};
use docent_config::DocentConfig;

/// Apply `--document` and `--model` on top of the loaded config.
pub fn apply_cli_overrides(
    mut config: DocentConfig,
    document: Option<&Path>,
    model: Option<&str>,
) -> DocentConfig {
    if let Some(document) = document {
        config.document.path = Some(document.to_path_buf());
    }
    if let Some(model) = model {
        config.model.name = model.to_string();
        config.model.fallback = model.to_string();
    }
    config
}

pub fn gemini_config(model: &ModelConfig, api_key: String) -> GeminiConfig {
    GeminiConfig::new(api_key)
        .with_api_base(model.api_base.clone())
        .with_max_tokens(model.max_tokens)
        .with_temperature(model.temperature)
        .with_request_timeout(Duration::from_secs(u64::from(model.request_timeout_secs)))
}

/// Tools offered to the model. Empty when disabled in config or on the CLI.
pub fn tool_registry(
    tools: &ToolsConfig,
    root: &Path,
    disabled: bool,
) -> Result<ToolRegistry, DocentError> {
    let mut registry = ToolRegistry::new();
    if disabled || !tools.enabled {
        return Ok(registry);
    }
    registry
        .register(Arc::new(FileWriteTool::under(
            root,
            &tools.output_dir,
            &tools.extension,
        )))
        .map_err(|e| DocentError::Other(e.to_string()))?;
    Ok(registry)
}

fn seed_turn(seed: &SeedTurn) -> Turn {
    match seed.role {
        SeedRole::User => Turn::user_text(seed.text.clone()),
        SeedRole::Model => Turn::model_text(seed.text.clone()),
    }
}

pub fn conversation_setup(config: &DocentConfig, root: &Path) -> ConversationSetup {
    ConversationSetup {
        document: config
            .document
            .path
            .as_deref()
            .map(|p| resolve_document_path(root, p)),
        mime_type: config.document.mime_type.clone(),
        document_required: config.document.required,
        model: config.model.name.clone(),
        fallback_model: config.model.fallback.clone(),
        cache_enabled: config.cache.enabled,
        cache_ttl: Some(Duration::from_secs(u64::from(config.cache.ttl_secs))),
        system_instruction: config.cache.system_instruction.clone(),
        seed: config.chat.seed_history.iter().map(seed_turn).collect(),
        query_template: config.chat.query_template.clone(),
        max_tool_rounds: config.chat.max_tool_rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_ai::Role;
    use std::path::PathBuf;

    #[test]
    fn cli_overrides_replace_document_and_both_models() {
        let config = apply_cli_overrides(
            DocentConfig::default(),
            Some(Path::new("manual.pdf")),
            Some("gemini-1.5-pro-002"),
        );
        assert_eq!(config.document.path, Some(PathBuf::from("manual.pdf")));
        assert_eq!(config.model.name, "gemini-1.5-pro-002");
        assert_eq!(config.model.fallback, "gemini-1.5-pro-002");
    }

    #[test]
    fn no_overrides_keep_config() {
        let config = apply_cli_overrides(DocentConfig::default(), None, None);
        let defaults = DocentConfig::default();
        assert_eq!(config.model.name, defaults.model.name);
        assert_eq!(config.document.path, defaults.document.path);
    }

    #[test]
    fn conversation_setup_resolves_document_and_seed() {
        let root = Path::new("/work");
        let setup = conversation_setup(&DocentConfig::default(), root);

        assert_eq!(setup.document, Some(PathBuf::from("/work/document.pdf")));
        assert_eq!(setup.cache_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(setup.max_tool_rounds, 10);
        assert_eq!(setup.seed.len(), 2);
        assert_eq!(setup.seed[0].role, Role::User);
        assert_eq!(setup.seed[1].role, Role::Model);
    }

    #[test]
    fn tool_registry_respects_switches() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolsConfig::default();

        let enabled = tool_registry(&tools, dir.path(), false).unwrap();
        assert!(enabled.schema_for("file_write").is_some());

        assert!(tool_registry(&tools, dir.path(), true).unwrap().is_empty());

        let off = ToolsConfig {
            enabled: false,
            ..ToolsConfig::default()
        };
        assert!(tool_registry(&off, dir.path(), false).unwrap().is_empty());
    }

    #[test]
    fn gemini_config_carries_model_settings() {
        let model = ModelConfig {
            api_base: "http://localhost:8080/".into(),
            max_tokens: 256,
            ..ModelConfig::default()
        };
        let config = gemini_config(&model, "test-key".into());
        assert_eq!(config.api_base, "http://localhost:8080");
        assert_eq!(config.max_tokens, 256);
        assert!(!format!("{config:?}").contains("test-key"));
    }
}
