use chatline_persist::{
    FileStorage, MessageAssembler, MessageRole, ThreadStore, STORAGE_KEY,
};
use chatline_stream::{SseDecoder, interpret};

const TURN: &str = concat!(
    "data: {\"type\":\"thread.created\",\"thread\":{\"id\":\"thr_hello\"}}\n\n",
    "data: {\"type\":\"thread.item.updated\",\"update\":{\"type\":\"assistant_message.content_part.text_delta\",\"delta\":\"Hi\"}}\n\n",
    "data: {oops\n\n",
    "data: [DONE]\n\n",
    "data: {\"type\":\"thread.item.delta\",\"delta\":{\"content\":[{\"type\":\"text\",\"text\":\" there\"}]}}\n\n",
);

fn run_turn(store: &mut ThreadStore<FileStorage>, thread_id: &str, bytes: &[u8], chunk: usize) {
    let mut decoder = SseDecoder::new();
    let mut assembler = MessageAssembler::new(thread_id);

    let mut payloads = Vec::new();
    for piece in bytes.chunks(chunk) {
        payloads.extend(decoder.push(piece));
    }
    payloads.extend(decoder.finish());

    for payload in payloads {
        for event in interpret(payload) {
            assembler.apply(store, event).unwrap();
        }
    }
    assembler.finish();
}

#[test]
fn test_hello_scenario_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ThreadStore::load(FileStorage::new(dir.path()));
    let thread_id = store.active().id.clone();

    store.append_user_message(&thread_id, "Hello").unwrap();
    run_turn(&mut store, &thread_id, TURN.as_bytes(), 7);

    let thread = store.active();
    assert_eq!(store.len(), 1);
    assert_eq!(thread.title, "Hello");
    assert_eq!(thread.remote_thread_id(), Some("thr_hello"));
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[0].role, MessageRole::User);
    assert_eq!(thread.messages[0].content, "Hello");
    assert_eq!(thread.messages[1].role, MessageRole::Assistant);
    assert_eq!(thread.messages[1].content, "Hi there");

    // a fresh process sees the same state
    let reloaded = ThreadStore::load(FileStorage::new(dir.path()));
    assert_eq!(reloaded.threads(), store.threads());
}

#[test]
fn test_chunk_size_does_not_change_result() {
    let mut contents = Vec::new();

    for chunk in [1, 3, 16, TURN.len()] {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ThreadStore::load(FileStorage::new(dir.path()));
        let thread_id = store.active().id.clone();

        run_turn(&mut store, &thread_id, TURN.as_bytes(), chunk);
        contents.push(store.active().messages[0].content.clone());
    }

    assert!(contents.iter().all(|c| c == "Hi there"));
}

#[test]
fn test_corrupt_file_falls_back_and_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(format!("{STORAGE_KEY}.json")), "not json").unwrap();

    let mut store = ThreadStore::load(FileStorage::new(dir.path()));
    assert_eq!(store.len(), 1);
    assert!(store.active().is_empty());

    store.create().unwrap();
    let reloaded = ThreadStore::load(FileStorage::new(dir.path()));
    assert_eq!(reloaded.len(), 2);
}
