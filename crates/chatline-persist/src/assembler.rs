use chatline_stream::StreamEvent;

use crate::error::Result;
use crate::models::Message;
use crate::storage::StateStorage;
use crate::store::ThreadStore;

/// Folds one turn's stream events into a thread's message list
///
/// The assembler is bound to the thread captured when the turn started, not
/// to whichever thread is active when an event arrives. Every text delta
/// grows a single assistant message (one id per turn) in place.
///
/// Deltas are taken as strictly ordered and never redelivered; a replayed
/// chunk would be appended twice.
pub struct MessageAssembler {
    thread_id: String,
    assistant_message_id: String,
    accumulated: String,
}

impl MessageAssembler {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            assistant_message_id: uuid::Uuid::new_v4().to_string(),
            accumulated: String::new(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn assistant_message_id(&self) -> &str {
        &self.assistant_message_id
    }

    /// Assistant text accumulated so far this turn
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    /// Apply one event to the bound thread.
    ///
    /// Returns whether the store changed. Events for a thread that no longer
    /// exists are discarded.
    pub fn apply<S: StateStorage>(
        &mut self,
        store: &mut ThreadStore<S>,
        event: StreamEvent,
    ) -> Result<bool> {
        if store.thread(&self.thread_id).is_none() {
            tracing::debug!(
                thread_id = %self.thread_id,
                "Target thread is gone, discarding stream event"
            );
            return Ok(false);
        }

        match event {
            StreamEvent::TextDelta { text } => {
                self.accumulated.push_str(&text);
                store.upsert_message(
                    &self.thread_id,
                    Message::assistant(&self.assistant_message_id, &self.accumulated),
                )?;
                Ok(true)
            }
            StreamEvent::ThreadCreated { thread_id } => {
                let bound = store.bind_remote_thread(&self.thread_id, &thread_id)?;
                if bound {
                    tracing::info!(
                        thread_id = %self.thread_id,
                        remote_thread_id = %thread_id,
                        "Bound thread to remote conversation"
                    );
                }
                Ok(bound)
            }
            StreamEvent::Unrecognized => Ok(false),
        }
    }

    /// End the turn, returning the full assistant text
    pub fn finish(self) -> String {
        tracing::debug!(
            thread_id = %self.thread_id,
            chars = self.accumulated.chars().count(),
            "Assistant turn finished"
        );
        self.accumulated
    }
}
