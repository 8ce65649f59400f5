use crate::error::{PersistError, Result};
use crate::models::{derive_title, Message, ThreadRecord};
use crate::storage::StateStorage;

/// Key the serialized thread list lives under
pub const STORAGE_KEY: &str = "chatline-threads";

/// All conversation threads of one client plus the active selection
///
/// Threads are ordered most-recently-created first. The list is never empty
/// and `active_index` always points inside it. Every mutation rewrites the
/// full list to storage.
pub struct ThreadStore<S: StateStorage> {
    storage: S,
    threads: Vec<ThreadRecord>,
    active_index: usize,
}

impl<S: StateStorage> ThreadStore<S> {
    /// Load persisted threads, falling back to a single empty thread when
    /// storage is empty, unreadable or corrupt.
    pub fn load(storage: S) -> Self {
        let threads = match Self::read_threads(&storage) {
            Ok(Some(threads)) if !threads.is_empty() => {
                tracing::info!(threads = threads.len(), "Loaded persisted threads");
                threads
            }
            Ok(_) => {
                tracing::info!("No persisted threads, starting fresh");
                vec![ThreadRecord::new()]
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted threads unreadable, starting fresh");
                vec![ThreadRecord::new()]
            }
        };

        Self {
            storage,
            threads,
            active_index: 0,
        }
    }

    fn read_threads(storage: &S) -> Result<Option<Vec<ThreadRecord>>> {
        match storage.read(STORAGE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn threads(&self) -> &[ThreadRecord] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Always false: a store holds at least one thread
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// The thread the user is currently looking at
    pub fn active(&self) -> &ThreadRecord {
        &self.threads[self.active_index]
    }

    pub fn thread(&self, thread_id: &str) -> Option<&ThreadRecord> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Prepend a new empty thread and make it active
    pub fn create(&mut self) -> Result<&ThreadRecord> {
        self.threads.insert(0, ThreadRecord::new());
        self.active_index = 0;
        tracing::debug!(thread_id = %self.threads[0].id, "Created thread");

        self.persist()?;
        Ok(&self.threads[0])
    }

    pub fn switch_to(&mut self, index: usize) -> Result<&ThreadRecord> {
        self.check_index(index)?;
        self.active_index = index;

        self.persist()?;
        Ok(self.active())
    }

    /// Delete the thread at `index`.
    ///
    /// The sole remaining thread is reset to an empty record instead. When a
    /// thread at or before the active one goes away the selection moves to
    /// stay valid, preferring the previous thread.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;

        if self.threads.len() == 1 {
            self.threads[0] = ThreadRecord::new();
            self.active_index = 0;
            tracing::debug!("Reset last remaining thread");
            return self.persist();
        }

        let removed = self.threads.remove(index);
        tracing::debug!(thread_id = %removed.id, "Deleted thread");

        if index < self.active_index {
            self.active_index -= 1;
        } else if index == self.active_index {
            self.active_index = index.saturating_sub(1);
        }
        self.active_index = self.active_index.min(self.threads.len() - 1);

        self.persist()
    }

    /// Append a user message, titling the thread if it is still untitled
    pub fn append_user_message(
        &mut self,
        thread_id: &str,
        content: impl Into<String>,
    ) -> Result<Message> {
        let message = Message::user(content);
        let thread = self.thread_mut(thread_id)?;

        if thread.is_untitled() {
            thread.title = derive_title(&message.content);
        }
        thread.messages.push(message.clone());
        thread.touch();

        self.persist()?;
        Ok(message)
    }

    /// Insert `message`, or replace the content of the message with the same id
    pub fn upsert_message(&mut self, thread_id: &str, message: Message) -> Result<()> {
        let thread = self.thread_mut(thread_id)?;

        match thread.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => existing.content = message.content,
            None => thread.messages.push(message),
        }
        thread.touch();

        self.persist()
    }

    /// Bind the upstream conversation id; ignored when one is already bound
    pub fn bind_remote_thread(&mut self, thread_id: &str, remote_thread_id: &str) -> Result<bool> {
        let thread = self.thread_mut(thread_id)?;

        if !thread.bind_remote_thread(remote_thread_id) {
            tracing::debug!(
                thread_id,
                remote_thread_id,
                "Thread already bound to a remote conversation, keeping it"
            );
            return Ok(false);
        }

        self.persist()?;
        Ok(true)
    }

    /// Write the full thread list to storage
    pub fn persist(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.threads)?;
        self.storage.write(STORAGE_KEY, &raw)
    }

    fn thread_mut(&mut self, thread_id: &str) -> Result<&mut ThreadRecord> {
        self.threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.threads.len() {
            return Err(PersistError::IndexOutOfRange {
                index,
                len: self.threads.len(),
            });
        }
        Ok(())
    }
}
