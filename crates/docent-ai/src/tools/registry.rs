//! Tool registry and dispatcher.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::definitions::{ParameterSchema, ToolDeclaration};
use super::error::ToolError;
use crate::{ToolInvocationRequest, ToolInvocationResult};

/// A locally executable capability the model may call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declaration advertised to the model. Its name is the registry key.
    fn declaration(&self) -> ToolDeclaration;

    /// Run with arguments whose required parameters are known to be present.
    async fn execute(&self, args: &Map<String, Value>) -> Result<String, ToolError>;
}

struct RegisteredTool {
    declaration: ToolDeclaration,
    tool: Arc<dyn Tool>,
}

/// Tools by unique name, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if a tool with the same name exists.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let declaration = tool.declaration();
        if self.tools.contains_key(&declaration.name) {
            return Err(ToolError::Duplicate(declaration.name));
        }
        debug!(tool = %declaration.name, "tool registered");
        self.order.push(declaration.name.clone());
        self.tools
            .insert(declaration.name.clone(), RegisteredTool { declaration, tool });
        Ok(())
    }

    pub fn schema_for(&self, name: &str) -> Option<&ParameterSchema> {
        self.tools.get(name).map(|t| &t.declaration.parameters)
    }

    /// Every declaration, in registration order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.declaration.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate and execute a model-issued call.
    ///
    /// Never fails: unknown tools, missing parameters, executor errors and
    /// executor panics all come back as `success: false` results.
    pub async fn dispatch(&self, request: &ToolInvocationRequest) -> ToolInvocationResult {
        match self.try_dispatch(request).await {
            Ok(payload) => {
                debug!(tool = %request.name, "tool call succeeded");
                ToolInvocationResult::ok(request, payload)
            }
            Err(e) => {
                warn!(tool = %request.name, error = %e, "tool call failed");
                ToolInvocationResult::failed(request, e.to_string())
            }
        }
    }

    async fn try_dispatch(&self, request: &ToolInvocationRequest) -> Result<String, ToolError> {
        let entry = self
            .tools
            .get(&request.name)
            .ok_or_else(|| ToolError::UnknownTool(request.name.clone()))?;

        let empty = Map::new();
        let args = match &request.args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ToolError::InvalidArgument {
                    name: "args".into(),
                    reason: format!("expected an object, got {other}"),
                })
            }
        };

        if let Some(missing) = entry.declaration.parameters.first_missing(args) {
            return Err(ToolError::MissingParameter(missing.to_string()));
        }

        // A panicking executor must not take the turn loop down with it.
        AssertUnwindSafe(entry.tool.execute(args))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ToolError::Panicked(panic_message(panic.as_ref()))))
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
