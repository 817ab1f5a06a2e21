//! Tools the model can call during a turn.
//!
//! A [`ToolRegistry`] advertises declarations to the model and dispatches
//! the calls it makes. Dispatch never fails: every problem becomes a
//! failed [`ToolInvocationResult`](crate::ToolInvocationResult) that is
//! fed back into the conversation.

mod definitions;
mod error;
mod file_write;
mod registry;
mod sandbox;


pub use definitions::{to_gemini_tool, ParamType, ParameterSchema, ParameterSpec, ToolDeclaration};
pub use error::ToolError;
pub use file_write::{unescape_newlines, FileWriteTool, FILE_WRITE_TOOL};
pub use registry::{Tool, ToolRegistry};
pub use sandbox::ToolSandbox;
