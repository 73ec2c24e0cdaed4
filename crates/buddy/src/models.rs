//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - chat history sent from the browser with each request
//! - openai messages/tools, sent from the agent to the LLM
//! - tool calls, dispatched from the agent to the tool registry
//!
//! We always immediately convert those formats into the internal structs using to/from helpers,
//! so the internal models are not an exact match to any of them.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
