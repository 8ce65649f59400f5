use chatline_stream::{stream_events, StreamEvent};
use futures::StreamExt;

fn item_updated(delta: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "type": "thread.item.updated",
            "item_id": "msg_1",
            "update": {
                "type": "assistant_message.content_part.text_delta",
                "content_index": 0,
                "delta": delta,
            }
        })
    )
}

fn item_delta(parts: &[&str]) -> String {
    let content: Vec<_> = parts
        .iter()
        .map(|text| serde_json::json!({"type": "text", "text": text}))
        .collect();
    format!(
        "data: {}\n\n",
        serde_json::json!({"type": "thread.item.delta", "delta": {"content": content}})
    )
}

fn transcript() -> String {
    let mut body = String::new();
    body.push_str("data: {\"type\":\"thread.created\",\"thread\":{\"id\":\"thr_42\"}}\n\n");
    body.push_str(&item_updated("Grüß"));
    body.push_str("data: {\"type\":\"thread.item.updated\",\"update\":\n\n");
    body.push_str(&item_delta(&[" dich", ", "]));
    body.push_str("data: [DONE]\n\n");
    body.push_str(&item_updated("wörld 🌍"));
    body
}

async fn collect_text(chunks: Vec<Vec<u8>>) -> (String, Vec<String>) {
    let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
    let events: Vec<StreamEvent> = stream_events(stream)
        .map(|event| event.unwrap())
        .collect()
        .await;

    let mut text = String::new();
    let mut threads = Vec::new();
    for event in events {
        match event {
            StreamEvent::TextDelta { text: delta } => text.push_str(&delta),
            StreamEvent::ThreadCreated { thread_id } => threads.push(thread_id),
            StreamEvent::Unrecognized => {}
        }
    }
    (text, threads)
}

#[tokio::test]
async fn test_transcript_in_one_chunk() {
    let (text, threads) = collect_text(vec![transcript().into_bytes()]).await;

    assert_eq!(text, "Grüß dich, wörld 🌍");
    assert_eq!(threads, vec!["thr_42".to_string()]);
}

#[tokio::test]
async fn test_chunking_does_not_alter_reassembled_text() {
    let bytes = transcript().into_bytes();

    for size in [1, 2, 3, 5, 7, 13, 64, 1024] {
        let chunks: Vec<Vec<u8>> = bytes.chunks(size).map(<[u8]>::to_vec).collect();
        let (text, threads) = collect_text(chunks).await;

        assert_eq!(text, "Grüß dich, wörld 🌍", "chunk size {size}");
        assert_eq!(threads, vec!["thr_42".to_string()]);
    }
}

#[test]
fn test_stream_event_serialization() {
    let event = StreamEvent::text_delta("Test");

    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"text_delta\""));
    assert!(json.contains("Test"));
}

#[test]
fn test_stream_event_deserialization() {
    let json = r#"{"type":"thread_created","thread_id":"thr_1"}"#;
    let event: StreamEvent = serde_json::from_str(json).unwrap();

    assert_eq!(event, StreamEvent::thread_created("thr_1"));
}
