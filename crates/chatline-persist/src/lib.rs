//! Client-side conversation state for chatline.
//!
//! [`ThreadStore`] owns the persisted threads and the active selection;
//! [`MessageAssembler`] folds streamed events for one turn into it.

pub mod assembler;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;

pub use assembler::MessageAssembler;
pub use error::{PersistError, Result};
pub use models::{derive_title, Message, MessageRole, ThreadRecord, DEFAULT_THREAD_TITLE};
pub use storage::{FileStorage, MemoryStorage, StateStorage};
pub use store::{ThreadStore, STORAGE_KEY};
