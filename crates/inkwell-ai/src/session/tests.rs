//! Tests for turn lifecycle, failure handling, and cancellation.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use super::*;
use crate::error::ChatError;
use crate::frame::FrameFormat;
use crate::observer::TurnObserver;
use crate::transport::memory::{channel_chunks, ScriptedChunks, ScriptedTransport};
use crate::turn::{ConversationTurn, Role, TurnStatus};

#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<(TurnStatus, String)>>,
    rejected: Mutex<Vec<String>>,
    finished: Mutex<Vec<TurnStatus>>,
}

impl TurnObserver for Recorder {
    fn on_turn_update(&self, turn: &ConversationTurn) {
        self.updates
            .lock()
            .unwrap()
            .push((turn.status(), turn.text().to_string()));
    }

    fn on_frame_rejected(&self, _turn: &ConversationTurn, raw: &str) {
        self.rejected.lock().unwrap().push(raw.to_string());
    }

    fn on_turn_finished(&self, outcome: &TurnOutcome) {
        self.finished.lock().unwrap().push(outcome.turn.status());
    }
}

fn session_with(transport: Arc<ScriptedTransport>) -> (ChatSession, Arc<Recorder>) {
    let session = ChatSession::new(transport);
    let recorder = Arc::new(Recorder::default());
    session.subscribe(recorder.clone());
    (session, recorder)
}

fn content(text: &str) -> String {
    format!("data: {}\n", serde_json::json!({ "response": text }))
}

async fn wait_until(
    session: &ChatSession,
    predicate: impl Fn(&ConversationTurn) -> bool,
) -> ConversationTurn {
    for _ in 0..10_000 {
        if let Some(turn) = session.active_turn() {
            if predicate(&turn) {
                return turn;
            }
        }
        tokio::task::yield_now().await;
    }
    panic!("active turn never reached the expected state");
}

#[tokio::test]
async fn fragments_accumulate_into_complete_answer() {
    let body = ScriptedChunks::new([content("Hel"), content("lo"), "data: [DONE]\n".into()]);
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, recorder) = session_with(transport);

    let outcome = session.submit("greet me", false, "").await.unwrap();

    assert_eq!(outcome.turn.text(), "Hello");
    assert_eq!(outcome.turn.status(), TurnStatus::Complete);
    assert!(outcome.saw_sentinel);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.content_frames, 2);

    let updates = recorder.updates.lock().unwrap().clone();
    assert_eq!(
        updates,
        vec![
            (TurnStatus::Pending, String::new()),
            (TurnStatus::Streaming, "Hel".into()),
            (TurnStatus::Streaming, "Hello".into()),
            (TurnStatus::Complete, "Hello".into()),
        ]
    );
    assert_eq!(*recorder.finished.lock().unwrap(), vec![TurnStatus::Complete]);
    assert!(!session.is_busy());
}

#[tokio::test]
async fn malformed_frames_are_reported_but_invisible() {
    let body = ScriptedChunks::new([
        content(""),
        "data: garbage\n".into(),
        content("ok"),
        "data: [DONE]\n".into(),
    ]);
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, recorder) = session_with(transport);

    let outcome = session.submit("check", false, "").await.unwrap();

    assert_eq!(outcome.turn.text(), "ok");
    assert_eq!(outcome.turn.status(), TurnStatus::Complete);
    assert_eq!(outcome.rejected_frames, 1);
    assert_eq!(*recorder.rejected.lock().unwrap(), vec!["garbage".to_string()]);

    let updates = recorder.updates.lock().unwrap().clone();
    assert_eq!(updates[1], (TurnStatus::Streaming, String::new()));
}

#[tokio::test]
async fn error_status_surfaces_backend_message() {
    let body = ScriptedChunks::new([r#"{"error":"rate limited"}"#]);
    let transport = Arc::new(ScriptedTransport::new().respond(500, body));
    let (session, _) = session_with(transport);

    let outcome = session.submit("hello", false, "").await.unwrap();

    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
    assert!(outcome.turn.text().contains("rate limited"));
    assert_eq!(
        outcome.error,
        Some(ChatError::Status {
            status: 500,
            message: "rate limited".into()
        })
    );
}

#[tokio::test]
async fn error_status_without_body_uses_generic_message() {
    let transport = Arc::new(ScriptedTransport::new().respond(502, ScriptedChunks::empty()));
    let (session, _) = session_with(transport);

    let outcome = session.submit("hello", false, "").await.unwrap();
    assert_eq!(outcome.turn.text(), "HTTP 502: request failed");
}

#[tokio::test]
async fn connect_failure_replaces_placeholder() {
    let transport = Arc::new(
        ScriptedTransport::new().refuse(ChatError::Network("connection refused".into())),
    );
    let (session, _) = session_with(transport);

    let outcome = session.submit("hello", false, "").await.unwrap();
    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
    assert_eq!(outcome.turn.text(), "network error: connection refused");
}

#[tokio::test]
async fn mid_stream_drop_keeps_partial_answer() {
    let body = ScriptedChunks::new([content("The answer is")])
        .then_fail(ChatError::Network("connection reset".into()));
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, _) = session_with(transport);

    let outcome = session.submit("question", false, "").await.unwrap();

    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
    assert_eq!(
        outcome.turn.text(),
        "The answer is\n\n[network error: connection reset]"
    );
}

#[tokio::test]
async fn overlong_line_fails_the_turn() {
    let body = ScriptedChunks::new([content("fine"), format!("data: {}", "x".repeat(64))]);
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let session = ChatSession::new(transport).with_frame_format(FrameFormat {
        max_line_bytes: 32,
        ..FrameFormat::default()
    });

    let outcome = session.submit("question", false, "").await.unwrap();
    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
    assert_eq!(outcome.error, Some(ChatError::LineTooLong { limit: 32 }));
    assert!(outcome.turn.text().starts_with("fine"));
}

#[tokio::test]
async fn cancel_mid_stream_preserves_partial_text() {
    let (tx, body) = channel_chunks();
    let released = body.release_flag();
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, _) = session_with(transport);

    tx.send(content("Partial"));
    tx.send(content(" ans"));

    let (outcome, cancelled) = tokio::join!(session.submit("long question", false, ""), async {
        wait_until(&session, |turn| turn.text() == "Partial ans").await;
        session.cancel()
    });
    let outcome = outcome.unwrap();

    assert!(cancelled);
    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
    assert!(outcome.turn.text().starts_with("Partial ans"));
    assert!(outcome.turn.text().contains("request cancelled"));
    assert_eq!(outcome.error, Some(ChatError::Cancelled));
    assert!(released.load(Ordering::SeqCst));
    assert!(tx.is_released());
    assert!(!session.cancel());
}

#[tokio::test]
async fn cancel_before_any_content_replaces_placeholder() {
    let (_tx, body) = channel_chunks();
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, _) = session_with(transport);

    let (outcome, _) = tokio::join!(session.submit("slow", false, ""), async {
        wait_until(&session, |turn| turn.status() == TurnStatus::Pending).await;
        session.cancel()
    });

    let outcome = outcome.unwrap();
    assert_eq!(outcome.turn.text(), "request cancelled");
    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
}

#[tokio::test]
async fn second_submit_is_rejected_while_streaming() {
    let (tx, body) = channel_chunks();
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, _) = session_with(transport.clone());

    tx.send(content("Hel"));

    let (first, second) = tokio::join!(session.submit("first", false, ""), async {
        let turn = wait_until(&session, |turn| turn.status() == TurnStatus::Streaming).await;
        let rejected = session.submit("second", true, "doc").await;
        let after = session.active_turn().unwrap();
        assert_eq!(after.id(), turn.id());
        assert_eq!(after.text(), "Hel");
        assert_eq!(after.status(), TurnStatus::Streaming);
        tx.send(content("lo"));
        tx.send("data: [DONE]\n");
        rejected
    });

    assert_eq!(second.unwrap_err(), ChatError::TurnInFlight);
    let first = first.unwrap();
    assert_eq!(first.turn.text(), "Hello");
    assert_eq!(first.turn.status(), TurnStatus::Complete);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(session.turns().len(), 2);
}

#[tokio::test]
async fn context_is_sent_only_when_requested() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, ScriptedChunks::new(["data: [DONE]\n"]))
            .respond(200, ScriptedChunks::new(["data: [DONE]\n"])),
    );
    let (session, _) = session_with(transport.clone());

    session
        .submit("summarize", false, "<p>My draft</p>")
        .await
        .unwrap();
    session
        .submit("@writer summarize", true, "<p>My draft</p>")
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].prompt, "summarize");
    assert_eq!(requests[0].context, "");
    assert_eq!(requests[1].prompt, "@writer summarize");
    assert_eq!(requests[1].context, "<p>My draft</p>");
}

#[tokio::test]
async fn empty_prompt_is_rejected_without_side_effects() {
    let transport = Arc::new(ScriptedTransport::new());
    let (session, recorder) = session_with(transport.clone());

    let err = session.submit("   ", false, "").await.unwrap_err();

    assert_eq!(err, ChatError::EmptyPrompt);
    assert!(session.turns().is_empty());
    assert!(transport.requests().is_empty());
    assert!(recorder.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_sentinel_completes_by_default() {
    let body = ScriptedChunks::new([content("no marker")]);
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, _) = session_with(transport);

    let outcome = session.submit("q", false, "").await.unwrap();
    assert_eq!(outcome.turn.status(), TurnStatus::Complete);
    assert_eq!(outcome.turn.text(), "no marker");
    assert!(!outcome.saw_sentinel);
}

#[tokio::test]
async fn missing_sentinel_can_be_an_error() {
    let body = ScriptedChunks::new([content("no marker")]);
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let session = ChatSession::new(transport).with_policy(TurnPolicy {
        missing_sentinel: CompletionPolicy::Error,
        ..TurnPolicy::default()
    });

    let outcome = session.submit("q", false, "").await.unwrap();
    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
    assert_eq!(outcome.error, Some(ChatError::ProtocolIncomplete));
    assert!(outcome.turn.text().starts_with("no marker\n\n["));
}

#[tokio::test]
async fn empty_answer_completes_by_default() {
    let transport =
        Arc::new(ScriptedTransport::new().respond(200, ScriptedChunks::new(["data: [DONE]\n"])));
    let (session, _) = session_with(transport);

    let outcome = session.submit("q", false, "").await.unwrap();
    assert_eq!(outcome.turn.status(), TurnStatus::Complete);
    assert_eq!(outcome.turn.text(), "");
}

#[tokio::test]
async fn empty_answer_can_be_an_error() {
    let transport =
        Arc::new(ScriptedTransport::new().respond(200, ScriptedChunks::new(["data: [DONE]\n"])));
    let session = ChatSession::new(transport).with_policy(TurnPolicy {
        empty_answer: CompletionPolicy::Error,
        ..TurnPolicy::default()
    });

    let outcome = session.submit("q", false, "").await.unwrap();
    assert_eq!(outcome.turn.status(), TurnStatus::Errored);
    assert_eq!(outcome.turn.text(), "model returned an empty answer");
}

#[tokio::test]
async fn transport_is_released_at_sentinel() {
    let body = ScriptedChunks::new([
        format!("{}data: [DONE]\n", content("done")),
        ": keep-alive\n".to_string(),
    ]);
    let released = body.release_flag();
    let remaining = body.remaining_handle();
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let (session, _) = session_with(transport);

    let outcome = session.submit("q", false, "").await.unwrap();
    assert_eq!(outcome.turn.text(), "done");
    assert!(released.load(Ordering::SeqCst));
    assert_eq!(remaining.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn history_tracks_prompts_and_answers() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, ScriptedChunks::new([content("one"), "data: [DONE]\n".into()]))
            .respond(200, ScriptedChunks::new([content("two"), "data: [DONE]\n".into()])),
    );
    let (session, _) = session_with(transport);

    session.submit("  first  ", false, "").await.unwrap();
    session.submit("second", false, "").await.unwrap();

    let turns = session.turns();
    let roles: Vec<Role> = turns.iter().map(|t| t.role()).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(turns[0].text(), "first");
    assert_eq!(session.last_answer().unwrap().text(), "two");
    assert!(session.active_turn().is_none());

    session.clear().unwrap();
    assert!(session.turns().is_empty());
}

#[tokio::test]
async fn closure_observer_receives_updates() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let transport = Arc::new(
        ScriptedTransport::new().respond(200, ScriptedChunks::new([content("hi"), "data: [DONE]\n".into()])),
    );
    let session = ChatSession::new(transport);
    session.subscribe(Arc::new(move |turn: &ConversationTurn| {
        sink.lock().unwrap().push(turn.text().to_string());
    }));

    session.submit("q", false, "").await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["", "hi", "hi"]);
}

#[tokio::test]
async fn dropped_submit_settles_the_turn() {
    let (tx, body) = channel_chunks();
    let released = body.release_flag();
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, body)
            .respond(200, ScriptedChunks::new([content("two"), "data: [DONE]\n".into()])),
    );
    let (session, recorder) = session_with(transport);

    tx.send(content("Partial"));
    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        session.submit("slow", false, ""),
    )
    .await;

    assert!(timed_out.is_err());
    assert!(!session.is_busy());
    assert!(session.active_turn().is_none());
    assert!(!session.cancel());
    assert!(released.load(Ordering::SeqCst));

    let abandoned = session.last_answer().unwrap();
    assert_eq!(abandoned.status(), TurnStatus::Errored);
    assert_eq!(abandoned.text(), "Partial\n\n[request cancelled]");
    assert_eq!(
        recorder.updates.lock().unwrap().last().cloned(),
        Some((TurnStatus::Errored, "Partial\n\n[request cancelled]".to_string()))
    );

    let next = session.submit("next", false, "").await.unwrap();
    assert_eq!(next.turn.text(), "two");

    let summary: Vec<(Role, TurnStatus, String)> = session
        .turns()
        .iter()
        .map(|t| (t.role(), t.status(), t.text().to_string()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Role::User, TurnStatus::Complete, "slow".to_string()),
            (
                Role::Assistant,
                TurnStatus::Errored,
                "Partial\n\n[request cancelled]".to_string()
            ),
            (Role::User, TurnStatus::Complete, "next".to_string()),
            (Role::Assistant, TurnStatus::Complete, "two".to_string()),
        ]
    );
}
