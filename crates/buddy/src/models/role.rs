use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The author of a message. The system prompt is not a message; providers receive it separately.
pub enum Role {
    User,
    Assistant,
    Tool,
}
