mod message;
mod thread;

pub use message::{Message, MessageRole};
pub use thread::{derive_title, ThreadRecord, DEFAULT_THREAD_TITLE, TITLE_MAX_CHARS};
