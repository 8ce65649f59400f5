use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chatline_client::{
    ByteStream, ChatSession, ClientError, ConversationTransport, Result, SendRequest,
    SessionRequest,
};
use chatline_persist::{MemoryStorage, MessageRole, ThreadStore};

type Script = Vec<Result<Bytes>>;

#[derive(Clone, Default)]
struct ScriptedTransport {
    turns: Arc<Mutex<VecDeque<Script>>>,
    requests: Arc<Mutex<Vec<SendRequest>>>,
    session_error: Option<u16>,
}

impl ScriptedTransport {
    fn with_turn(self, turn: Script) -> Self {
        self.turns.lock().unwrap().push_back(turn);
        self
    }

    fn sent(&self) -> Vec<SendRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationTransport for ScriptedTransport {
    async fn create_session(&self, _request: &SessionRequest) -> Result<String> {
        match self.session_error {
            Some(status) => Err(ClientError::Upstream {
                status,
                body: "{\"error\":\"bad workflow\"}".to_string(),
            }),
            None => Ok("cs_test".to_string()),
        }
    }

    async fn open_stream(&self, request: &SendRequest) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(request.clone());
        let turn = self.turns.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(turn)))
    }
}

fn chunked(body: &str, size: usize) -> Script {
    body.as_bytes()
        .chunks(size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

fn delta(text: &str) -> String {
    format!(
        "data: {{\"type\":\"thread.item.updated\",\"update\":{{\"type\":\"assistant_message.content_part.text_delta\",\"delta\":\"{text}\"}}}}\n\n"
    )
}

fn created(id: &str) -> String {
    format!("data: {{\"type\":\"thread.created\",\"thread\":{{\"id\":\"{id}\"}}}}\n\n")
}

fn session(transport: ScriptedTransport) -> ChatSession<ScriptedTransport, MemoryStorage> {
    ChatSession::new(transport, ThreadStore::load(MemoryStorage::new()))
}

#[tokio::test]
async fn test_hello_scenario() {
    let body = [created("thr_1"), delta("Hi"), delta(" there"), "data: [DONE]\n\n".into()].concat();
    let transport = ScriptedTransport::default().with_turn(chunked(&body, 5));
    let mut session = session(transport.clone());
    session.initialize(SessionRequest::new("wf_1")).await.unwrap();

    let mut seen = Vec::new();
    session
        .send_with("Hello", |thread| {
            seen.push(thread.messages.last().unwrap().content.clone());
        })
        .await
        .unwrap();

    let store = session.store();
    let thread = store.active();
    assert_eq!(store.len(), 1);
    assert_eq!(thread.title, "Hello");
    assert_eq!(thread.remote_thread_id(), Some("thr_1"));
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[0].role, MessageRole::User);
    assert_eq!(thread.messages[0].content, "Hello");
    assert_eq!(thread.messages[1].role, MessageRole::Assistant);
    assert_eq!(thread.messages[1].content, "Hi there");
    assert!(!session.is_loading());
    assert_eq!(session.error(), None);

    // user message, thread binding (no new text), then the two deltas
    assert_eq!(seen, vec!["Hello", "Hello", "Hi", "Hi there"]);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].client_secret, "cs_test");
    assert_eq!(sent[0].thread_id, None);
    assert_eq!(sent[0].message.role, "user");
    assert_eq!(sent[0].message.content, "Hello");
}

#[tokio::test]
async fn test_follow_up_uses_bound_remote_thread() {
    let first = [created("thr_1"), delta("One")].concat();
    let second = [created("thr_other"), delta("Two")].concat();
    let transport = ScriptedTransport::default()
        .with_turn(chunked(&first, 64))
        .with_turn(chunked(&second, 64));
    let mut session = session(transport.clone()).with_client_secret("cs_test");

    session.send("First").await.unwrap();
    session.send("  Second  ").await.unwrap();

    let thread = session.store().active();
    assert_eq!(thread.remote_thread_id(), Some("thr_1"));
    assert_eq!(thread.title, "First");
    let contents: Vec<_> = thread.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["First", "One", "Second", "Two"]);

    let sent = transport.sent();
    assert_eq!(sent[1].thread_id.as_deref(), Some("thr_1"));
    assert_eq!(sent[1].message.content, "Second");
}

#[tokio::test]
async fn test_malformed_line_between_deltas_is_skipped() {
    let body = [delta("Hi"), "data: {\"type\": nope\n\n".into(), delta(" there")].concat();
    let transport = ScriptedTransport::default().with_turn(chunked(&body, 3));
    let mut session = session(transport).with_client_secret("cs_test");

    session.send("Hello").await.unwrap();

    assert_eq!(session.store().active().messages[1].content, "Hi there");
}

#[tokio::test]
async fn test_stream_failure_keeps_partial_reply() {
    let mut turn = chunked(&delta("Partial"), 64);
    turn.push(Err(ClientError::Stream("connection reset".to_string())));
    turn.extend(chunked(&delta(" never"), 64));
    let transport = ScriptedTransport::default().with_turn(turn);
    let mut session = session(transport).with_client_secret("cs_test");

    let err = session.send("Hello").await.unwrap_err();

    assert!(matches!(err, ClientError::Stream(_)));
    assert!(!session.is_loading());
    assert_eq!(session.error(), Some("Stream error: connection reset"));
    let thread = session.store().active();
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[1].content, "Partial");

    session.dismiss_error();
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn test_send_preconditions() {
    let transport = ScriptedTransport::default();
    let mut not_ready = session(transport.clone());
    assert!(matches!(not_ready.send("Hello").await, Err(ClientError::NotReady)));

    let mut ready = session(transport.clone()).with_client_secret("cs_test");
    assert!(matches!(ready.send("   ").await, Err(ClientError::EmptyMessage)));

    assert!(transport.sent().is_empty());
    assert!(ready.store().active().is_empty());
    assert_eq!(ready.error(), None);
}

#[tokio::test]
async fn test_initialize_failure_sets_banner() {
    let transport = ScriptedTransport {
        session_error: Some(400),
        ..Default::default()
    };
    let mut session = session(transport);

    let err = session.initialize(SessionRequest::new("wf_bad")).await.unwrap_err();

    assert!(matches!(err, ClientError::Upstream { status: 400, .. }));
    assert!(!session.is_ready());
    assert_eq!(session.error(), Some("HTTP 400: {\"error\":\"bad workflow\"}"));
}

#[tokio::test]
async fn test_thread_operations_delegate_to_store() {
    let body = delta("Reply");
    let transport = ScriptedTransport::default().with_turn(chunked(&body, 64));
    let mut session = session(transport).with_client_secret("cs_test");

    session.send("In the first chat").await.unwrap();
    session.new_thread().unwrap();
    assert!(session.store().active().is_empty());
    assert_eq!(session.store().len(), 2);

    let first = session.switch_to(1).unwrap();
    assert_eq!(first.title, "In the first chat");

    session.delete_thread(1).unwrap();
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.store().active_index(), 0);
    assert!(session.switch_to(3).is_err());
}
