use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::notifier::Notifier;

/// Every tool the model may call. The variant name is the tool name the model sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ToolHandler {
    RecordUserDetails,
    RecordUnknownQuestion,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordUserDetailsArgs {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordUnknownQuestionArgs {
    question: String,
}

fn parse_args<T: DeserializeOwned>(handler: ToolHandler, arguments: Value) -> AgentResult<T> {
    serde_json::from_value(arguments).map_err(|e| {
        AgentError::InvalidParameters(format!("Invalid arguments for {}: {}", handler, e))
    })
}

fn recorded() -> Value {
    json!({"recorded": "ok"})
}

impl ToolHandler {
    /// The schema advertised to the model
    pub fn tool(&self) -> Tool {
        match self {
            ToolHandler::RecordUserDetails => Tool::new(
                self.to_string(),
                "Record that a user is interested and provided an email address",
                json!({
                    "type": "object",
                    "properties": {
                        "email": {"type": "string", "description": "The user's email"},
                        "name": {"type": "string", "description": "The user's name"},
                        "notes": {"type": "string", "description": "Extra context"}
                    },
                    "required": ["email"],
                    "additionalProperties": false
                }),
            ),
            ToolHandler::RecordUnknownQuestion => Tool::new(
                self.to_string(),
                "Record any question that couldn't be answered",
                json!({
                    "type": "object",
                    "properties": {
                        "question": {"type": "string", "description": "The unanswered question"}
                    },
                    "required": ["question"],
                    "additionalProperties": false
                }),
            ),
        }
    }

    async fn invoke(&self, arguments: Value, notifier: &dyn Notifier) -> AgentResult<Value> {
        match self {
            ToolHandler::RecordUserDetails => {
                let args: RecordUserDetailsArgs = parse_args(*self, arguments)?;
                let name = args.name.unwrap_or_else(|| "Name not provided".to_string());
                let notes = args.notes.unwrap_or_else(|| "not provided".to_string());
                notifier
                    .notify(&format!(
                        "Recording {} with email {} and notes {}",
                        name, args.email, notes
                    ))
                    .await;
                Ok(recorded())
            }
            ToolHandler::RecordUnknownQuestion => {
                let args: RecordUnknownQuestionArgs = parse_args(*self, arguments)?;
                notifier
                    .notify(&format!("Recording {}", args.question))
                    .await;
                Ok(recorded())
            }
        }
    }
}

/// What to answer when the model calls a tool that does not exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnknownToolPolicy {
    /// Report `ToolNotFound` back to the model
    #[default]
    Reject,
    /// Answer with an empty object, as if the call succeeded
    EmptyResult,
}

/// Maps tool names to handlers and runs them
pub struct ToolRegistry {
    tools: Vec<Tool>,
    notifier: Arc<dyn Notifier>,
    unknown_tool_policy: UnknownToolPolicy,
}

impl ToolRegistry {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tools: ToolHandler::iter().map(|handler| handler.tool()).collect(),
            notifier,
            unknown_tool_policy: UnknownToolPolicy::default(),
        }
    }

    pub fn with_unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tool_policy = policy;
        self
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn lookup(&self, name: &str) -> Option<ToolHandler> {
        ToolHandler::from_str(name).ok()
    }

    /// Run one tool call. Unknown names and malformed arguments come back as errors for the
    /// model to read; nothing here aborts the conversation.
    pub async fn dispatch(&self, call: &ToolCall) -> AgentResult<Value> {
        match self.lookup(&call.name) {
            Some(handler) => {
                tracing::info!(tool = %handler, "Dispatching tool call");
                handler
                    .invoke(call.arguments.clone(), self.notifier.as_ref())
                    .await
            }
            None => match self.unknown_tool_policy {
                UnknownToolPolicy::Reject => Err(AgentError::ToolNotFound(call.name.clone())),
                UnknownToolPolicy::EmptyResult => {
                    tracing::warn!(tool = %call.name, "Unknown tool, answering with an empty result");
                    Ok(json!({}))
                }
            },
        }
    }
}
