use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Message, MessageRole};

/// Title every thread starts with until its first user message arrives
pub const DEFAULT_THREAD_TITLE: &str = "New Chat";

/// Longest derived title, in characters, before the ellipsis
pub const TITLE_MAX_CHARS: usize = 30;

/// A persisted conversation: its messages plus the upstream identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_thread_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadRecord {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_THREAD_TITLE.to_string(),
            remote_thread_id: None,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Conversation id assigned by the upstream, once known
    pub fn remote_thread_id(&self) -> Option<&str> {
        self.remote_thread_id.as_deref()
    }

    /// Record the upstream conversation id.
    ///
    /// First writer wins: returns false and leaves the record untouched when
    /// an id is already bound.
    pub fn bind_remote_thread(&mut self, remote_thread_id: impl Into<String>) -> bool {
        if self.remote_thread_id.is_some() {
            return false;
        }
        self.remote_thread_id = Some(remote_thread_id.into());
        self.touch();
        true
    }

    /// True until the first user message arrives; the title is derived once, from it
    pub fn is_untitled(&self) -> bool {
        !self.messages.iter().any(|m| m.role == MessageRole::User)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for ThreadRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a thread title from the leading text of a user message.
///
/// Takes the first non-empty line, collapses runs of whitespace and cuts it
/// to [`TITLE_MAX_CHARS`] characters, appending `...` when cut.
pub fn derive_title(content: &str) -> String {
    let first_line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return DEFAULT_THREAD_TITLE.to_string();
    }

    if collapsed.chars().count() <= TITLE_MAX_CHARS {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_kept() {
        assert_eq!(derive_title("Hello"), "Hello");
        assert_eq!(derive_title("  Hello   there \n second line"), "Hello there");
    }

    #[test]
    fn test_long_title_truncated_on_char_boundary() {
        let title = derive_title("Ünïcödé characters should never be split in the middle");

        assert!(title.ends_with("..."));
        assert_eq!(title.trim_end_matches("...").chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_blank_content_keeps_default() {
        assert_eq!(derive_title("   \n  "), DEFAULT_THREAD_TITLE);
    }

    #[test]
    fn test_untitled_until_first_user_message() {
        let mut thread = ThreadRecord::new();
        assert!(thread.is_untitled());

        thread.messages.push(Message::assistant("a1", "Hi"));
        assert!(thread.is_untitled());

        thread.messages.push(Message::user("New Chat"));
        thread.title = derive_title("New Chat");
        assert!(!thread.is_untitled());
    }

    #[test]
    fn test_remote_thread_first_writer_wins() {
        let mut thread = ThreadRecord::new();

        assert!(thread.bind_remote_thread("thr_1"));
        assert!(!thread.bind_remote_thread("thr_2"));
        assert_eq!(thread.remote_thread_id(), Some("thr_1"));
    }

    #[test]
    fn test_serialized_layout_uses_camel_case() {
        let mut thread = ThreadRecord::new();
        thread.bind_remote_thread("thr_1");

        let json = serde_json::to_value(&thread).unwrap();

        assert_eq!(json["remoteThreadId"], "thr_1");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["title"], DEFAULT_THREAD_TITLE);
    }
}
