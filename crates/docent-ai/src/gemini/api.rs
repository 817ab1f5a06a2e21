//! ModelClient trait implementation for GeminiClient.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    AiError, CacheRequest, CachedContext, ModelClient, ModelHandle, ModelResponse, Turn,
    UploadedDocument,
};

use super::client::{
    error_for_status, guess_mime_type, parse_cache, parse_file, parse_generate_response,
    FileState, GeminiClient,
};

fn transport_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::NetworkError(e.to_string())
    }
}

impl GeminiClient {
    /// Send a request and decode a JSON body, mapping HTTP failures.
    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, AiError> {
        let response = request
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text));
        }

        let text = response.text().await.map_err(transport_error)?;
        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&text).map_err(|e| AiError::ParseError(e.to_string()))
    }

    /// Delete a named resource. A resource that is already gone is fine.
    async fn delete_resource(&self, name: &str) -> Result<(), AiError> {
        let result = self.send_json(self.http.delete(self.resource_url(name))).await;
        match result {
            Ok(_) => Ok(()),
            Err(AiError::ApiError(msg)) if msg.starts_with("HTTP 404") => {
                debug!(resource = %name, "resource already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Poll an uploaded file until the service has finished processing it.
    async fn wait_until_active(&self, mut doc: UploadedDocument) -> Result<UploadedDocument, AiError> {
        for attempt in 1..=self.config.upload_poll_attempts {
            tokio::time::sleep(self.config.upload_poll_interval).await;

            let json = self
                .send_json(self.http.get(self.resource_url(&doc.id)))
                .await?;
            let (fresh, state) = parse_file(&json, &doc.source_path)?;
            doc = fresh;
            match state {
                FileState::Active => return Ok(doc),
                FileState::Failed => {
                    return Err(AiError::Upload(format!(
                        "remote processing of {} failed",
                        doc.id
                    )))
                }
                FileState::Processing => {
                    debug!(file = %doc.id, attempt, "upload still processing");
                }
            }
        }
        Err(AiError::Upload(format!(
            "{} was still processing after {} checks",
            doc.id, self.config.upload_poll_attempts
        )))
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn upload_document(
        &self,
        path: &Path,
        mime_type: Option<&str>,
    ) -> Result<UploadedDocument, AiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AiError::Upload(format!("failed to read {}: {e}", path.display())))?;

        let mime = mime_type.unwrap_or_else(|| guess_mime_type(path)).to_string();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        debug!(path = %path.display(), size = bytes.len(), mime = %mime, "Gemini file upload");

        let metadata = serde_json::json!({ "file": { "displayName": display_name } });
        let metadata_part = reqwest::multipart::Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|e| AiError::Upload(e.to_string()))?;
        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(display_name)
            .mime_str(&mime)
            .map_err(|e| AiError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let json = self
            .send_json(
                self.http
                    .post(self.upload_url())
                    .header("X-Goog-Upload-Protocol", "multipart")
                    .multipart(form),
            )
            .await
            .map_err(|e| match e {
                AiError::ApiError(msg) | AiError::ParseError(msg) => AiError::Upload(msg),
                other => other,
            })?;

        let (doc, state) = parse_file(&json, path)?;
        let id = doc.id.clone();
        let ready = match state {
            FileState::Active => Ok(doc),
            FileState::Failed => Err(AiError::Upload(format!(
                "remote processing of {} failed",
                doc.id
            ))),
            FileState::Processing => self.wait_until_active(doc).await,
        };

        match ready {
            Ok(doc) => {
                debug!(file = %doc.id, uri = %doc.uri, "upload active");
                Ok(doc)
            }
            Err(e) => {
                // The caller never sees this file, so it is deleted here.
                if let Err(cleanup) = self.delete_resource(&id).await {
                    warn!(file = %id, error = %cleanup, "failed to delete unusable upload");
                }
                Err(e)
            }
        }
    }

    async fn delete_document(&self, id: &str) -> Result<(), AiError> {
        debug!(file = %id, "Gemini file delete");
        self.delete_resource(id).await
    }

    async fn create_cached_context(
        &self,
        request: &CacheRequest,
    ) -> Result<CachedContext, AiError> {
        let body = self.build_cache_body(request);
        debug!(model = %request.model, "Gemini cache create");

        let json = self
            .send_json(self.http.post(self.caches_url()).json(&body))
            .await
            .map_err(|e| match e {
                AiError::ApiError(msg) | AiError::ParseError(msg) => AiError::CacheCreation(msg),
                other => other,
            })?;

        let cache = parse_cache(&json, request)?;
        debug!(cache = %cache.id, expires = ?cache.expires_at, "cache created");
        Ok(cache)
    }

    async fn delete_cached_context(&self, id: &str) -> Result<(), AiError> {
        debug!(cache = %id, "Gemini cache delete");
        self.delete_resource(id).await
    }

    async fn generate(
        &self,
        model: &ModelHandle,
        contents: &[Turn],
    ) -> Result<ModelResponse, AiError> {
        let body = self.build_generate_body(model, contents);
        let url = self.generate_url(model.model_name());

        debug!(
            model = %model.model_name(),
            cached = model.is_cached(),
            turns = contents.len(),
            "Gemini API request"
        );

        let json = self.send_json(self.http.post(&url).json(&body)).await?;
        parse_generate_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::GeminiConfig;

    /// Read one HTTP request and return its request line.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        head.lines().next().unwrap_or_default().to_string()
    }

    /// Serve `bodies` in order, one connection each, recording request lines.
    async fn stub_server(bodies: Vec<&'static str>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        tokio::spawn(async move {
            for body in bodies {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let line = read_request(&mut socket).await;
                log.lock().unwrap().push(line);
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        (format!("http://{addr}"), seen)
    }

    fn client(api_base: &str) -> GeminiClient {
        GeminiClient::new(
            GeminiConfig::new("test-key")
                .with_api_base(api_base)
                .with_upload_polling(Duration::from_millis(1), 3),
        )
        .unwrap()
    }

    const PROCESSING: &str =
        r#"{"file":{"name":"files/x","uri":"https://files.example/files/x","mimeType":"application/pdf","state":"PROCESSING"}}"#;
    const FAILED: &str =
        r#"{"name":"files/x","uri":"https://files.example/files/x","mimeType":"application/pdf","state":"FAILED"}"#;
    const ACTIVE: &str =
        r#"{"name":"files/x","uri":"https://files.example/files/x","mimeType":"application/pdf","state":"ACTIVE"}"#;

    fn document() -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        std::fs::write(file.path(), b"%PDF-1.4").unwrap();
        file
    }

    #[tokio::test]
    async fn failed_processing_deletes_the_uploaded_file() {
        let (base, seen) = stub_server(vec![PROCESSING, FAILED, "{}"]).await;
        let file = document();

        let err = client(&base)
            .upload_document(file.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Upload(_)));

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].starts_with("POST /upload/v1beta/files"));
        assert!(seen[1].starts_with("GET /v1beta/files/x"));
        assert!(seen[2].starts_with("DELETE /v1beta/files/x"));
    }

    #[tokio::test]
    async fn processing_that_never_finishes_is_cleaned_up() {
        let (base, seen) =
            stub_server(vec![PROCESSING, PROCESSING, PROCESSING, PROCESSING, "{}"]).await;
        let file = document();

        let err = client(&base)
            .upload_document(file.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Upload(ref msg) if msg.contains("still processing")));
        let seen = seen.lock().unwrap().clone();
        assert!(seen.last().unwrap().starts_with("DELETE /v1beta/files/x"));
    }

    #[tokio::test]
    async fn active_upload_is_kept() {
        let (base, seen) = stub_server(vec![PROCESSING, ACTIVE]).await;
        let file = document();

        let doc = client(&base)
            .upload_document(file.path(), None)
            .await
            .unwrap();
        assert_eq!(doc.id, "files/x");
        assert!(!seen
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.starts_with("DELETE")));
    }
}
