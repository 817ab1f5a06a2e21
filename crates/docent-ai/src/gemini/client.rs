//! Gemini API client struct, request building, and response parsing.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::tools::to_gemini_tool;
use crate::{
    AiError, CacheRequest, CachedContext, Candidate, ModelBinding, ModelHandle, ModelResponse,
    Part, Role, TokenUsage, ToolInvocationRequest, Turn, UploadedDocument,
};

use super::config::GeminiConfig;

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    /// Build a client. Fails with [`AiError::Auth`] when the key is blank.
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        if config.api_key.trim().is_empty() {
            return Err(AiError::Auth("API key is empty".into()));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub(crate) fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base, model
        )
    }

    pub(crate) fn upload_url(&self) -> String {
        format!(
            "{}/upload/v1beta/files?uploadType=multipart",
            self.config.api_base
        )
    }

    pub(crate) fn caches_url(&self) -> String {
        format!("{}/v1beta/cachedContents", self.config.api_base)
    }

    /// URL of a named resource such as `files/abc` or `cachedContents/xyz`.
    pub(crate) fn resource_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.config.api_base, name)
    }

    /// Build the JSON request body for `generateContent`.
    ///
    /// Turns without parts (placeholders for empty model replies) are not sent.
    pub(crate) fn build_generate_body(&self, model: &ModelHandle, contents: &[Turn]) -> Value {
        let contents: Vec<Value> = contents
            .iter()
            .filter(|t| !t.parts.is_empty())
            .map(turn_to_json)
            .collect();
        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        match &model.binding {
            ModelBinding::Cached { cache_id, .. } => {
                body["cachedContent"] = json!(cache_id);
            }
            ModelBinding::Named(_) => {
                if let Some(instruction) = &model.system_instruction {
                    body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
                }
                if !model.tools.is_empty() {
                    let tool_defs: Vec<_> = model.tools.iter().map(to_gemini_tool).collect();
                    body["tools"] = json!([{ "functionDeclarations": tool_defs }]);
                }
            }
        }

        body
    }

    /// Build the JSON request body for `cachedContents.create`.
    pub(crate) fn build_cache_body(&self, request: &CacheRequest) -> Value {
        let mut body = json!({
            "model": qualified_model(&request.model),
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }]
            },
            "contents": request.contents.iter().map(turn_to_json).collect::<Vec<_>>(),
        });

        if !request.tools.is_empty() {
            let tool_defs: Vec<_> = request.tools.iter().map(to_gemini_tool).collect();
            body["tools"] = json!([{ "functionDeclarations": tool_defs }]);
        }
        if let Some(ttl) = request.ttl {
            body["ttl"] = json!(format!("{}s", ttl.as_secs()));
        }

        body
    }
}

fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

pub(crate) fn turn_to_json(turn: &Turn) -> Value {
    json!({
        "role": turn.role.as_str(),
        "parts": turn.parts.iter().map(part_to_json).collect::<Vec<_>>(),
    })
}

pub(crate) fn part_to_json(part: &Part) -> Value {
    match part {
        Part::Text(text) => json!({ "text": text }),
        Part::FileData { uri, mime_type } => json!({
            "fileData": { "fileUri": uri, "mimeType": mime_type }
        }),
        Part::FunctionCall(call) => {
            let mut fc = json!({ "name": call.name, "args": call.args });
            if let Some(id) = &call.id {
                fc["id"] = json!(id);
            }
            json!({ "functionCall": fc })
        }
        Part::FunctionResponse(result) => {
            let mut fr = json!({ "name": result.name, "response": result.to_response_json() });
            if let Some(id) = &result.id {
                fr["id"] = json!(id);
            }
            json!({ "functionResponse": fr })
        }
    }
}

/// Parse one response part. Part kinds the core does not act on
/// (inline data, executable code, ...) are skipped.
fn parse_part(part: &Value) -> Option<Part> {
    if let Some(text) = part["text"].as_str() {
        return Some(Part::Text(text.to_string()));
    }
    if let Some(fc) = part.get("functionCall") {
        return Some(Part::FunctionCall(ToolInvocationRequest {
            id: fc["id"].as_str().map(String::from),
            name: fc["name"].as_str().unwrap_or("").to_string(),
            args: match &fc["args"] {
                Value::Null => json!({}),
                args => args.clone(),
            },
        }));
    }
    if let Some(fd) = part.get("fileData") {
        return Some(Part::FileData {
            uri: fd["fileUri"].as_str().unwrap_or("").to_string(),
            mime_type: fd["mimeType"].as_str().unwrap_or("").to_string(),
        });
    }
    None
}

fn parse_role(role: Option<&str>) -> Role {
    match role {
        Some("user") => Role::User,
        _ => Role::Model,
    }
}

/// Parse a `generateContent` response.
///
/// A missing `candidates` array is not an error: the orchestrator shows a
/// neutral "no response" line for it. A blocked prompt, or a response whose
/// every candidate was stopped for safety, is a content-policy error.
pub(crate) fn parse_generate_response(json: &Value) -> Result<ModelResponse, AiError> {
    if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
        return Err(AiError::ContentPolicy(format!("prompt blocked: {reason}")));
    }

    let mut candidates = Vec::new();
    if let Some(items) = json["candidates"].as_array() {
        for item in items {
            let content = item.get("content").map(|c| {
                let parts = c["parts"]
                    .as_array()
                    .map(|parts| parts.iter().filter_map(parse_part).collect())
                    .unwrap_or_default();
                Turn::new(parse_role(c["role"].as_str()), parts)
            });
            candidates.push(Candidate {
                content,
                finish_reason: item["finishReason"].as_str().map(String::from),
            });
        }
    }

    let all_blocked = !candidates.is_empty()
        && candidates.iter().all(|c| {
            c.finish_reason.as_deref() == Some("SAFETY")
                && c.content.as_ref().map_or(true, |t| t.parts.is_empty())
        });
    if all_blocked {
        return Err(AiError::ContentPolicy("response blocked: SAFETY".into()));
    }

    let meta = &json["usageMetadata"];
    let usage = TokenUsage {
        input_tokens: meta["promptTokenCount"].as_u64().unwrap_or(0),
        output_tokens: meta["candidatesTokenCount"].as_u64().unwrap_or(0),
        cached_tokens: meta["cachedContentTokenCount"].as_u64().unwrap_or(0),
    };

    Ok(ModelResponse { candidates, usage })
}

/// Remote processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileState {
    Processing,
    Active,
    Failed,
}

/// Parse a file resource, either bare or wrapped as `{"file": {...}}`.
pub(crate) fn parse_file(
    json: &Value,
    source_path: &Path,
) -> Result<(UploadedDocument, FileState), AiError> {
    let file = json.get("file").unwrap_or(json);
    let id = file["name"]
        .as_str()
        .ok_or_else(|| AiError::ParseError("file resource has no name".into()))?;
    let uri = file["uri"]
        .as_str()
        .ok_or_else(|| AiError::ParseError("file resource has no uri".into()))?;

    let state = match file["state"].as_str() {
        Some("PROCESSING") => FileState::Processing,
        Some("FAILED") => FileState::Failed,
        _ => FileState::Active,
    };

    let doc = UploadedDocument {
        id: id.to_string(),
        source_path: source_path.to_path_buf(),
        uri: uri.to_string(),
        mime_type: file["mimeType"]
            .as_str()
            .unwrap_or("application/octet-stream")
            .to_string(),
        uploaded_at: parse_timestamp(file["createTime"].as_str()).unwrap_or_else(Utc::now),
    };
    Ok((doc, state))
}

/// Parse a cached-content resource returned by `cachedContents.create`.
pub(crate) fn parse_cache(json: &Value, request: &CacheRequest) -> Result<CachedContext, AiError> {
    let id = json["name"]
        .as_str()
        .ok_or_else(|| AiError::CacheCreation("response has no cache name".into()))?;

    Ok(CachedContext {
        id: id.to_string(),
        model: request.model.clone(),
        system_instruction: request.system_instruction.clone(),
        contents: request.contents.clone(),
        created_at: parse_timestamp(json["createTime"].as_str()).unwrap_or_else(Utc::now),
        expires_at: parse_timestamp(json["expireTime"].as_str()),
    })
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Map a non-success HTTP status to an error.
pub(crate) fn error_for_status(status: reqwest::StatusCode, body: &str) -> AiError {
    match status.as_u16() {
        401 | 403 => AiError::Auth(format!("HTTP {status}: {body}")),
        429 => AiError::RateLimited,
        400 if body.contains("API_KEY_INVALID") => AiError::Auth(format!("HTTP {status}: {body}")),
        _ => AiError::ApiError(format!("HTTP {status}: {body}")),
    }
}

/// Guess a MIME type from the file extension.
pub(crate) fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/pdf",
    }
}
