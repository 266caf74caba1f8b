use keepchat_core::constants::defaults;
use keepchat_core::*;
use tempfile::TempDir;

fn fresh_store() -> (TempDir, SessionStore) {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::with_dir(dir.path().join("data"));
    (dir, store)
}

fn contents(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.content.clone()).collect()
}

// ========================================================================
// Storage Tests (context/persistence.rs)
// ========================================================================

#[test]
fn test_empty_start() {
    let (_dir, store) = fresh_store();

    assert!(store.load_history().is_empty());
    assert_eq!(store.load_system_prompt(), defaults::SYSTEM_PROMPT);

    let config = store.load_config();
    assert_eq!(config.max_history_length, defaults::MAX_HISTORY_LENGTH);
    assert!(config.last_used_model.is_none());
}

#[test]
fn test_history_reload_is_idempotent() {
    let (_dir, store) = fresh_store();
    let messages = vec![
        Message::user("What is Rust?"),
        Message::assistant("A systems programming language."),
        Message::user("Thanks"),
    ];

    store.save_history(&messages).unwrap();
    let first = store.load_history();
    store.save_history(&first).unwrap();
    let second = store.load_history();

    assert_eq!(first, messages);
    assert_eq!(second, messages);
}

#[test]
fn test_system_prompt_reload_is_idempotent() {
    let (_dir, store) = fresh_store();
    store.save_system_prompt("You only answer in haiku.").unwrap();
    assert_eq!(store.load_system_prompt(), "You only answer in haiku.");
}

#[test]
fn test_config_reload_keeps_unknown_fields() {
    let (_dir, store) = fresh_store();
    std::fs::create_dir_all(store.base_dir()).unwrap();
    std::fs::write(
        store.config_path(),
        "last_used_model = \"llama3\"\nmax_history_length = 40\nvoice = \"calm\"\n\n[plugins]\nenabled = [\"a\", \"b\"]\n",
    )
    .unwrap();

    let config = store.load_config();
    assert_eq!(config.last_used_model.as_deref(), Some("llama3"));
    assert_eq!(config.max_history_length, 40);

    store.save_config(&config).unwrap();
    let reloaded = store.load_config();
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.extra["voice"].as_str(), Some("calm"));
    assert!(reloaded.extra["plugins"].get("enabled").is_some());
}

#[test]
fn test_legacy_history_file_loads() {
    let (_dir, store) = fresh_store();
    std::fs::create_dir_all(store.base_dir()).unwrap();
    std::fs::write(
        store.history_path(),
        r#"[
  {"role": "user", "content": "hi", "timestamp": "2024-05-01T09:00:00.000001"},
  {"role": "assistant", "content": "hello", "timestamp": "2024-05-01T09:00:02.5"}
]"#,
    )
    .unwrap();

    let history = store.load_history();
    assert_eq!(contents(&history), vec!["hi", "hello"]);
    assert_eq!(history[1].role, Role::Assistant);
}

#[test]
fn test_zero_history_length_in_config_is_replaced() {
    let (_dir, store) = fresh_store();
    std::fs::create_dir_all(store.base_dir()).unwrap();
    std::fs::write(store.config_path(), "max_history_length = 0\n").unwrap();

    assert_eq!(store.load_config().max_history_length, defaults::MAX_HISTORY_LENGTH);
}

// ========================================================================
// HistoryStore Tests (context/history.rs)
// ========================================================================

#[test]
fn test_append_durability() {
    let (_dir, store) = fresh_store();
    let (mut history, _) = HistoryStore::load(store.clone(), 4);

    for i in 0..9 {
        let message = if i % 2 == 0 {
            Message::user(format!("q{i}"))
        } else {
            Message::assistant(format!("a{i}"))
        };
        history.append(message).unwrap();
        assert_eq!(store.load_history(), history.snapshot(), "after append {i}");
    }
}

#[test]
fn test_trim_keeps_last_m_in_order() {
    let (_dir, store) = fresh_store();
    let max = 5;
    let (mut history, _) = HistoryStore::load(store, max);

    let all: Vec<String> = (0..12).map(|i| format!("message {i}")).collect();
    for text in &all {
        history.append(Message::user(text.clone())).unwrap();
    }

    let kept = contents(&history.snapshot());
    assert_eq!(kept.len(), max);
    assert_eq!(kept, all[all.len() - max..].to_vec());
}

#[test]
fn test_clear_scenario() {
    let (_dir, store) = fresh_store();
    let (mut history, _) = HistoryStore::load(store.clone(), 50);
    for i in 0..10 {
        history.append(Message::user(format!("m{i}"))).unwrap();
    }
    assert_eq!(history.len(), 10);

    history.clear().unwrap();

    assert!(history.snapshot().is_empty());
    assert!(store.load_history().is_empty());
}

#[test]
fn test_snapshot_is_a_copy() {
    let (_dir, store) = fresh_store();
    let (mut history, _) = HistoryStore::load(store, 10);
    history.append(Message::user("original")).unwrap();

    let mut copy = history.snapshot();
    copy.push(Message::assistant("injected"));
    copy[0].content = "changed".into();

    assert_eq!(history.len(), 1);
    assert_eq!(history.last_message().unwrap().content, "original");
}

#[test]
fn test_summary_is_pure() {
    let (_dir, store) = fresh_store();
    let (mut history, _) = HistoryStore::load(store.clone(), 10);
    for i in 0..3 {
        history.append(Message::user(format!("m{i}"))).unwrap();
    }

    let summary = history.summary(2);
    assert_eq!(summary.total_count, 3);
    assert_eq!(contents(&summary.recent), vec!["m1", "m2"]);
    assert_eq!(history.len(), 3);
    assert_eq!(store.load_history().len(), 3);
}

// ========================================================================
// Conversation Assembler Tests (context/builder.rs)
// ========================================================================

#[test]
fn test_assembly_ordering() {
    let history: Vec<Message> = (0..6)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(format!("u{i}"))
            } else {
                Message::assistant(format!("a{i}"))
            }
        })
        .collect();

    let request = build_request("system text", &history, "newest");

    assert_eq!(request.len(), history.len() + 2);
    assert_eq!(request[0].role, Role::System);
    assert_eq!(request[0].content, "system text");
    assert_eq!(&request[1..=history.len()], &history[..]);
    let last = request.last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "newest");
}

#[test]
fn test_stored_system_record_never_reaches_request() {
    let (_dir, store) = fresh_store();
    store
        .save_history(&[Message::system("old prompt"), Message::user("earlier question")])
        .unwrap();

    let (history, _) = HistoryStore::load(store, 10);
    let request = build_request("current prompt", &history.snapshot(), "next");

    let system: Vec<&str> = request
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(system, vec!["current prompt"]);
    assert_eq!(contents(&request[1..]), vec!["earlier question", "next"]);
}
