use serde::{Deserialize, Serialize};

/// Internal event model the rest of the pipeline works with.
///
/// Produced per upstream payload and consumed immediately; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The upstream created (or resumed) a conversation
    ThreadCreated {
        thread_id: String,
    },

    /// A fragment of assistant text
    TextDelta {
        text: String,
    },

    Unrecognized,
}

impl StreamEvent {
    pub fn text_delta(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    pub fn thread_created(thread_id: impl Into<String>) -> Self {
        Self::ThreadCreated {
            thread_id: thread_id.into(),
        }
    }
}
