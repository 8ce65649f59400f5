use chatline_persist::{MessageAssembler, StateStorage, ThreadRecord, ThreadStore};
use chatline_stream::stream_events;
use futures::StreamExt;

use crate::error::{ClientError, Result};
use crate::transport::{ConversationTransport, SendRequest, SessionRequest};

/// One user's chat: thread store, credential and the in-flight turn
///
/// Sending runs the whole pipeline for a turn: the user message goes into
/// the active thread, the reply stream is decoded and interpreted, and the
/// assembler folds it into that same thread even if the user switches away.
pub struct ChatSession<T: ConversationTransport, S: StateStorage> {
    transport: T,
    store: ThreadStore<S>,
    client_secret: Option<String>,
    is_loading: bool,
    error: Option<String>,
}

impl<T: ConversationTransport, S: StateStorage> ChatSession<T, S> {
    pub fn new(transport: T, store: ThreadStore<S>) -> Self {
        Self {
            transport,
            store,
            client_secret: None,
            is_loading: false,
            error: None,
        }
    }

    /// Use an already issued credential instead of calling [`Self::initialize`]
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Issue the session credential. Called once at startup.
    pub async fn initialize(&mut self, request: SessionRequest) -> Result<()> {
        match self.transport.create_session(&request).await {
            Ok(secret) => {
                tracing::info!(workflow_id = %request.workflow.id, "Session initialized");
                self.client_secret = Some(secret);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize session");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn store(&self) -> &ThreadStore<S> {
        &self.store
    }

    pub fn is_ready(&self) -> bool {
        self.client_secret.is_some()
    }

    /// True while a send is in flight; no second send is accepted meanwhile
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Message for the error banner, if the last operation failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn new_thread(&mut self) -> Result<&ThreadRecord> {
        Ok(self.store.create()?)
    }

    pub fn switch_to(&mut self, index: usize) -> Result<&ThreadRecord> {
        Ok(self.store.switch_to(index)?)
    }

    pub fn delete_thread(&mut self, index: usize) -> Result<()> {
        Ok(self.store.delete(index)?)
    }

    pub async fn send(&mut self, text: &str) -> Result<()> {
        self.send_with(text, |_| {}).await
    }

    /// Send `text` to the active thread.
    ///
    /// `on_update` sees the target thread after every change: once for the
    /// user message, then per applied stream event. Failures land in the
    /// error banner and leave whatever already arrived in place.
    pub async fn send_with<F>(&mut self, text: &str, mut on_update: F) -> Result<()>
    where
        F: FnMut(&ThreadRecord),
    {
        let content = text.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let Some(client_secret) = self.client_secret.clone() else {
            return Err(ClientError::NotReady);
        };
        if self.is_loading {
            return Err(ClientError::Busy);
        }

        self.is_loading = true;
        self.error = None;

        let result = self.run_turn(client_secret, content, &mut on_update).await;

        self.is_loading = false;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Send failed");
            self.error = Some(e.to_string());
        }
        result
    }

    async fn run_turn<F>(
        &mut self,
        client_secret: String,
        content: &str,
        on_update: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&ThreadRecord),
    {
        let thread_id = self.store.active().id.clone();
        self.store.append_user_message(&thread_id, content)?;
        self.notify(&thread_id, on_update);

        let remote_thread_id = self
            .store
            .thread(&thread_id)
            .and_then(ThreadRecord::remote_thread_id)
            .map(str::to_string);
        let request = SendRequest::new(client_secret, remote_thread_id, content);

        let chunks = self.transport.open_stream(&request).await?;
        let mut events = Box::pin(stream_events(chunks));
        let mut assembler = MessageAssembler::new(&thread_id);

        while let Some(event) = events.next().await {
            if assembler.apply(&mut self.store, event?)? {
                self.notify(&thread_id, on_update);
            }
        }

        assembler.finish();
        Ok(())
    }

    fn notify<F: FnMut(&ThreadRecord)>(&self, thread_id: &str, on_update: &mut F) {
        if let Some(thread) = self.store.thread(thread_id) {
            on_update(thread);
        }
    }
}
