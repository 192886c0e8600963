//! End-to-end chat session flows against a mocked answer service.

use academia_chat::backend::{DispatchError, RagClient};
use academia_chat::config::Config;
use academia_chat::markup;
use academia_chat::ui::chat::{ChatSession, Sender, FALLBACK_TEXT, WELCOME_HTML};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        backend_url: server.uri(),
        request_timeout_secs: 5,
        ..Config::default()
    }
}

async fn session_for(server: &MockServer) -> ChatSession {
    ChatSession::new(RagClient::new(&config_for(server)).unwrap())
}

/// Drive the session's polling until the history reaches the expected length.
async fn wait_for_history(session: &mut ChatSession, len: usize) {
    for _ in 0..200 {
        session.poll_responses();
        if session.history().len() >= len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "history never reached {} entries (got {})",
        len,
        session.history().len()
    );
}

#[tokio::test]
async fn initialization_seeds_the_welcome_message() {
    let server = MockServer::start().await;
    let session = session_for(&server).await;

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].sender, Sender::Assistant);
    assert_eq!(session.history()[0].text, WELCOME_HTML);
    assert!(!session.is_open());
}

#[tokio::test]
async fn happy_path_appends_question_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .and(body_json(json!({ "query": "o que é inteligência artificial?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "IA é..." })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server).await;
    session.submit("o que é inteligência artificial?");
    wait_for_history(&mut session, 3).await;

    let texts: Vec<(Sender, &str)> = session
        .history()
        .iter()
        .map(|m| (m.sender, m.text.as_str()))
        .collect();
    assert_eq!(
        texts,
        vec![
            (Sender::Assistant, WELCOME_HTML),
            (Sender::User, "o que é inteligência artificial?"),
            (Sender::Assistant, "IA é..."),
        ]
    );
}

#[tokio::test]
async fn whitespace_submission_changes_nothing() {
    let server = MockServer::start().await;
    let mut session = session_for(&server).await;

    session.submit("  ");
    session.poll_responses();

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.pending_input(), "");
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn server_error_appends_the_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = session_for(&server).await;
    session.submit("teste");
    wait_for_history(&mut session, 3).await;

    let last = session.history().last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert_eq!(last.text, FALLBACK_TEXT);
}

#[tokio::test]
async fn missing_answer_field_appends_the_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let mut session = session_for(&server).await;
    session.submit("teste");
    wait_for_history(&mut session, 3).await;

    assert_eq!(session.history().last().unwrap().text, FALLBACK_TEXT);
}

#[tokio::test]
async fn concurrent_submissions_resolve_to_one_answer_each() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "resposta" })))
        .expect(2)
        .mount(&server)
        .await;

    let mut session = session_for(&server).await;
    session.submit("primeira pergunta");
    session.submit("segunda pergunta");
    wait_for_history(&mut session, 5).await;

    let answers = session
        .history()
        .iter()
        .filter(|m| m.sender == Sender::Assistant && m.text == "resposta")
        .count();
    assert_eq!(answers, 2);
}

#[tokio::test]
async fn visibility_toggling_leaves_history_byte_identical() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "olá" })))
        .mount(&server)
        .await;

    let mut session = session_for(&server).await;
    session.submit("oi");
    wait_for_history(&mut session, 3).await;
    let before: Vec<String> = session.history().iter().map(|m| m.text.clone()).collect();

    session.toggle();
    session.toggle();
    session.close();
    session.toggle();
    session.close();

    let after: Vec<String> = session.history().iter().map(|m| m.text.clone()).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn injected_markup_in_answers_is_neutralized() {
    let server = MockServer::start().await;
    let payload = "<p>resposta</p><script>window.location='http://evil'</script>\
                   <img src=x onerror=\"alert(1)\">";
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": payload })))
        .mount(&server)
        .await;

    let mut session = session_for(&server).await;
    session.submit("teste");
    wait_for_history(&mut session, 3).await;

    let answer = &session.history().last().unwrap().text;
    let rendered = markup::plain_text(answer);
    assert_eq!(rendered, "resposta");
    assert!(!rendered.contains("evil"));
    assert!(!rendered.contains("alert"));
    assert!(!rendered.contains("onerror"));
}

#[tokio::test]
async fn two_widget_instances_do_not_share_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "só aqui" })))
        .mount(&server)
        .await;

    let mut first = session_for(&server).await;
    let mut second = session_for(&server).await;

    first.open();
    first.submit("pergunta");
    wait_for_history(&mut first, 3).await;
    second.poll_responses();

    assert_eq!(first.history().len(), 3);
    assert_eq!(second.history().len(), 1);
    assert!(first.is_open());
    assert!(!second.is_open());
}

#[tokio::test]
async fn dispatcher_returns_the_answer_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "<p>com <strong>markup</strong></p>" })),
        )
        .mount(&server)
        .await;

    let client = RagClient::new(&config_for(&server)).unwrap();
    let answer = client.send("qualquer coisa").await.unwrap();
    assert_eq!(answer, "<p>com <strong>markup</strong></p>");
}

#[tokio::test]
async fn dispatcher_maps_status_and_body_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = RagClient::new(&config_for(&server)).unwrap();
    match client.send("teste").await {
        Err(DispatchError::Status(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": null })))
        .mount(&server)
        .await;

    match client.send("teste").await {
        Err(DispatchError::MissingAnswer) => {}
        other => panic!("expected missing answer, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn dispatcher_times_out_slow_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "tarde demais" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = Config {
        request_timeout_secs: 1,
        ..config_for(&server)
    };
    let client = RagClient::new(&config).unwrap();
    match client.send("teste").await {
        Err(DispatchError::Transport(_)) => {}
        other => panic!("expected transport error, got {:?}", other.map(|_| ())),
    }
}
