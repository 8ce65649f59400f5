use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::decoder::decode_sse_stream;
use crate::StreamEvent;

/// Upstream event payloads, tagged by their `type` field.
///
/// The upstream has shipped two overlapping conventions for assistant text
/// (`thread.item.updated` and `thread.item.delta`); both stay supported.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum UpstreamEvent {
    #[serde(rename = "thread.created")]
    ThreadCreated { thread: ThreadRef },

    #[serde(rename = "thread.item.updated")]
    ItemUpdated { update: ItemUpdate },

    #[serde(rename = "thread.item.delta")]
    ItemDelta { delta: ItemDelta },

    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ItemUpdate {
    #[serde(rename = "assistant_message.content_part.text_delta")]
    TextDelta {
        #[serde(default)]
        delta: String,
    },

    #[serde(other)]
    Other,
}

/// Entries stay raw so one malformed entry cannot discard its siblings.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDelta {
    #[serde(default)]
    pub content: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },

    #[serde(other)]
    Other,
}

impl ContentPart {
    /// Non-empty text of a text entry; anything else, malformed included, is skipped
    fn text(entry: Value) -> Option<String> {
        match serde_json::from_value(entry) {
            Ok(ContentPart::Text { text }) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

impl UpstreamEvent {
    /// Map onto the internal model. Never returns an empty list.
    pub fn into_stream_events(self) -> Vec<StreamEvent> {
        let events: Vec<StreamEvent> = match self {
            UpstreamEvent::ThreadCreated { thread } if !thread.id.is_empty() => {
                vec![StreamEvent::ThreadCreated {
                    thread_id: thread.id,
                }]
            }
            UpstreamEvent::ItemUpdated {
                update: ItemUpdate::TextDelta { delta },
            } if !delta.is_empty() => vec![StreamEvent::TextDelta { text: delta }],
            UpstreamEvent::ItemDelta { delta } => delta
                .content
                .into_iter()
                .filter_map(ContentPart::text)
                .map(|text| StreamEvent::TextDelta { text })
                .collect(),
            _ => Vec::new(),
        };

        if events.is_empty() {
            vec![StreamEvent::Unrecognized]
        } else {
            events
        }
    }
}

/// Classify one decoded payload.
pub fn interpret(payload: Value) -> Vec<StreamEvent> {
    match serde_json::from_value::<UpstreamEvent>(payload) {
        Ok(event) => event.into_stream_events(),
        Err(e) => {
            tracing::debug!(error = %e, "Payload does not match a known upstream event shape");
            vec![StreamEvent::Unrecognized]
        }
    }
}

/// Full pipeline from raw chunks to internal events.
pub fn stream_events<S, B, E>(chunks: S) -> impl Stream<Item = Result<StreamEvent, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    decode_sse_stream(chunks).flat_map(|payload| {
        let events: Vec<Result<StreamEvent, E>> = match payload {
            Ok(payload) => interpret(payload).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        futures::stream::iter(events)
    })
}
