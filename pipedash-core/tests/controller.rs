//! End-to-end tests for the controller over a stub backend
//!
//! These drive [`Controller`] through a real [`HttpBackend`] and check both
//! the resulting view model and the requests the server saw.

mod common;

use std::sync::Arc;

use common::{read_routes, unreachable_config, Route, StubServer};
use pipedash_core::chart::ChartStore;
use pipedash_core::config::ServerConfig;
use pipedash_core::gateway::GENERIC_CHAT_ERROR;
use pipedash_core::schema::{cell_text, ColumnStrategy};
use pipedash_core::sequencer::{CLEAR_FAILED_NOTICE, PIPELINE_FAILED_NOTICE};
use pipedash_core::types::{GeneratedContent, Message, Sender, ServerStatus};
use pipedash_core::{Controller, Dispatch, Gateway, HttpBackend};
use tempfile::TempDir;

fn connect(config: &ServerConfig, strategy: ColumnStrategy) -> (Controller, TempDir) {
    pipedash_core::logging::init_test();
    let dir = TempDir::new().unwrap();
    let charts = ChartStore::open(dir.path().join("charts")).unwrap();
    let backend = HttpBackend::new(config).unwrap();
    let gateway = Gateway::new(Arc::new(backend), charts);
    (Controller::new(gateway, strategy), dir)
}

fn with_routes(mut routes: Vec<Route>, extra: Vec<Route>) -> Vec<Route> {
    routes.extend(extra);
    routes
}

// ============================================
// Initial load
// ============================================

#[tokio::test]
async fn test_load_all_fills_every_slice() {
    let server = StubServer::start(read_routes()).await;
    let (mut controller, dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.load_all();
    controller.settle().await;

    let model = controller.model();
    assert_eq!(model.conversation().len(), 5);
    assert_eq!(model.conversation()[2], Message::user("E por tipo?"));

    let columns = model.report_columns();
    let headers: Vec<&str> = columns.iter().map(|c| c.header.as_str()).collect();
    assert_eq!(headers, vec!["nome", "hp", "ataque", "tipo"]);
    // chansey has no "tipo"
    assert_eq!(cell_text(&model.report()[1], &columns[3]), "");

    let chart = model.chart().expect("chart should be loaded");
    assert_eq!(chart.dimensions(), Some((800, 600)));
    assert!(chart.path().starts_with(dir.path()));

    assert_eq!(model.generated().len(), 2);
    assert_eq!(
        model.status(),
        &ServerStatus::Online("API está online!".to_string())
    );
    assert!(!model.is_busy());
}

#[tokio::test]
async fn test_union_strategy_shows_every_key() {
    let server = StubServer::start(read_routes()).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::Union);

    controller.load_all();
    controller.settle().await;

    let headers: Vec<String> = controller
        .model()
        .report_columns()
        .into_iter()
        .map(|c| c.header)
        .collect();
    assert_eq!(headers, vec!["nome", "hp", "ataque", "tipo", "lendario"]);
}

#[tokio::test]
async fn test_failed_reads_are_isolated() {
    let routes = vec![
        Route::json("GET", "/get_chat_history", 500, r#"{"detail":"boom"}"#),
        Route::json("GET", "/get_pipeline_report", 200, "not json"),
        Route::json("GET", "/get_chat_data", 200, r#"{"data":[]}"#),
    ];
    let server = StubServer::start(routes).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.load_all();
    controller.settle().await;

    let model = controller.model();
    assert!(model.conversation().is_empty());
    assert!(model.report().is_empty());
    assert!(model.report_columns().is_empty());
    assert!(model.chart().is_none());
    assert!(model.generated().is_empty());
    assert_eq!(model.status(), &ServerStatus::Offline);
}

// ============================================
// Send message
// ============================================

#[tokio::test]
async fn test_send_success_appends_user_and_reply() {
    let routes = with_routes(
        read_routes(),
        vec![Route::json("POST", "/chat", 200, r#"{"resposta":"Chansey."}"#)],
    );
    let server = StubServer::start(routes).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.set_input("Quem tem mais HP?");
    assert_eq!(controller.send_message(), Dispatch::Started);
    controller.settle().await;

    assert_eq!(
        controller.model().conversation(),
        &[Message::user("Quem tem mais HP?"), Message::assistant("Chansey.")]
    );
    assert_eq!(controller.model().generated().len(), 2);
    assert_eq!(server.hits("POST", "/chat"), 1);
    assert_eq!(server.hits("GET", "/get_chat_data"), 1);
    assert!(!controller.model().is_busy());
}

#[tokio::test]
async fn test_send_rejection_shows_detail_inline() {
    let server = StubServer::start(vec![Route::json(
        "POST",
        "/chat",
        503,
        r#"{"detail":"Chatbot não inicializado."}"#,
    )])
    .await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.set_input("oi");
    controller.send_message();
    controller.settle().await;

    let conversation = controller.model().conversation();
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[1].sender, Sender::Assistant);
    assert_eq!(conversation[1].text, "Erro: Chatbot não inicializado.");
    // generated data is re-fetched even after a rejection
    assert_eq!(server.hits("GET", "/get_chat_data"), 1);
}

#[tokio::test]
async fn test_send_rejection_without_detail_uses_generic_text() {
    let server = StubServer::start(vec![Route::json(
        "POST",
        "/chat",
        502,
        "<html><body><h1>502 Bad Gateway</h1><p>nginx</p></body></html>",
    )])
    .await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.set_input("oi");
    controller.send_message();
    controller.settle().await;

    // A non-JSON error page never reaches the transcript
    assert_eq!(
        controller.model().conversation()[1].text,
        format!("Erro: {}", GENERIC_CHAT_ERROR)
    );

    let server = StubServer::start(vec![Route::json("POST", "/chat", 500, "{}")]).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);
    controller.set_input("oi");
    controller.send_message();
    controller.settle().await;

    assert_eq!(
        controller.model().conversation()[1].text,
        format!("Erro: {}", GENERIC_CHAT_ERROR)
    );
}

#[tokio::test]
async fn test_send_without_reply_field_appends_only_user() {
    let server = StubServer::start(vec![Route::json("POST", "/chat", 200, "{}")]).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.set_input("oi");
    controller.send_message();
    controller.settle().await;

    assert_eq!(controller.model().conversation(), &[Message::user("oi")]);
}

#[tokio::test]
async fn test_send_transport_failure_is_inline() {
    let (mut controller, _dir) =
        connect(&unreachable_config().await, ColumnStrategy::FirstRow);

    controller.set_input("oi");
    controller.send_message();
    controller.settle().await;

    let conversation = controller.model().conversation();
    assert_eq!(conversation.len(), 2);
    assert!(conversation[1].text.starts_with("Erro de conexão: "));
    assert!(!controller.model().is_busy());
}

// ============================================
// Run pipeline
// ============================================

#[tokio::test]
async fn test_run_pipeline_refetches_report_and_chart_once() {
    let routes = with_routes(
        read_routes(),
        vec![Route::json(
            "POST",
            "/run_pipeline",
            200,
            r#"{"message":"Pipeline executado com sucesso!"}"#,
        )],
    );
    let server = StubServer::start(routes).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    assert_eq!(controller.run_pipeline(), Dispatch::Started);
    controller.settle().await;

    assert_eq!(server.hits("POST", "/run_pipeline"), 1);
    assert_eq!(server.hits("GET", "/get_pipeline_report"), 1);
    assert_eq!(server.hits("GET", "/get_pipeline_chart"), 1);
    assert_eq!(server.hits("GET", "/get_chat_history"), 0);

    let model = controller.model();
    assert_eq!(model.notice(), Some("Pipeline executado com sucesso!"));
    assert_eq!(model.report().len(), 3);
    assert!(model.chart().is_some());
}

#[tokio::test]
async fn test_run_pipeline_error_detail_is_the_notice() {
    let server = StubServer::start(vec![Route::json(
        "POST",
        "/run_pipeline",
        500,
        r#"{"detail":"Erro ao executar o pipeline: timeout"}"#,
    )])
    .await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.run_pipeline();
    controller.settle().await;

    assert_eq!(
        controller.model().notice(),
        Some("Erro ao executar o pipeline: timeout")
    );
    // refetches happen regardless
    assert_eq!(server.hits("GET", "/get_pipeline_report"), 1);
    assert_eq!(server.hits("GET", "/get_pipeline_chart"), 1);
}

#[tokio::test]
async fn test_run_pipeline_transport_failure_notice() {
    let (mut controller, _dir) =
        connect(&unreachable_config().await, ColumnStrategy::FirstRow);

    controller.run_pipeline();
    controller.settle().await;

    assert_eq!(controller.model().notice(), Some(PIPELINE_FAILED_NOTICE));
    assert!(!controller.model().is_busy());
}

#[tokio::test]
async fn test_run_pipeline_error_page_uses_failure_notice() {
    let server = StubServer::start(vec![Route::json(
        "POST",
        "/run_pipeline",
        502,
        "<html><body><h1>502 Bad Gateway</h1><p>nginx</p></body></html>",
    )])
    .await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.run_pipeline();
    controller.settle().await;

    assert_eq!(controller.model().notice(), Some(PIPELINE_FAILED_NOTICE));
    assert!(!controller.model().is_busy());
}

#[tokio::test]
async fn test_new_chart_releases_previous_file() {
    let routes = with_routes(
        read_routes(),
        vec![Route::json("POST", "/run_pipeline", 200, r#"{"message":"ok"}"#)],
    );
    let server = StubServer::start(routes).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.load_all();
    controller.settle().await;
    let first = controller.model().chart().unwrap().path().to_path_buf();

    controller.run_pipeline();
    controller.settle().await;
    let second = controller.model().chart().unwrap().path().to_path_buf();

    assert_ne!(first, second);
    assert!(!first.exists());
    assert!(second.exists());

    drop(controller);
    assert!(!second.exists());
}

// ============================================
// Clear context
// ============================================

#[tokio::test]
async fn test_clear_context_empties_conversation_and_data() {
    let routes = with_routes(
        read_routes(),
        vec![Route::json(
            "POST",
            "/clear_context",
            200,
            r#"{"message":"Contexto limpo com sucesso."}"#,
        )],
    );
    let server = StubServer::start(routes).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.load_all();
    controller.settle().await;
    assert!(!controller.model().conversation().is_empty());
    assert!(!controller.model().generated().is_empty());

    controller.clear_context();
    controller.settle().await;

    let model = controller.model();
    assert!(model.conversation().is_empty());
    assert!(model.generated().is_empty());
    assert_eq!(model.notice(), Some("Contexto limpo com sucesso."));
    // report and chart are untouched
    assert_eq!(model.report().len(), 3);
    assert!(model.chart().is_some());
}

#[tokio::test]
async fn test_clear_context_empties_even_when_server_is_down() {
    let (mut controller, _dir) =
        connect(&unreachable_config().await, ColumnStrategy::FirstRow);

    controller.set_input("oi");
    controller.send_message();
    controller.settle().await;
    assert_eq!(controller.model().conversation().len(), 2);

    controller.clear_context();
    controller.settle().await;

    assert!(controller.model().conversation().is_empty());
    assert_eq!(controller.model().notice(), Some(CLEAR_FAILED_NOTICE));
}

#[tokio::test]
async fn test_refresh_reloads_everything() {
    let server = StubServer::start(read_routes()).await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.load_all();
    controller.settle().await;
    assert_eq!(controller.refresh(), Dispatch::Started);
    controller.settle().await;

    assert_eq!(server.hits("GET", "/get_chat_history"), 2);
    assert_eq!(server.hits("GET", "/status"), 2);
    assert!(matches!(
        &controller.model().generated()[0].content,
        GeneratedContent::Csv(_)
    ));
}

#[tokio::test]
async fn test_empty_history_keeps_local_conversation() {
    let server = StubServer::start(vec![
        Route::json("GET", "/get_chat_history", 200, r#"{"history":""}"#),
        Route::json("POST", "/chat", 200, r#"{"resposta":"olá"}"#),
    ])
    .await;
    let (mut controller, _dir) = connect(&server.config(), ColumnStrategy::FirstRow);

    controller.set_input("oi");
    controller.send_message();
    controller.settle().await;

    controller.load_all();
    controller.settle().await;

    assert_eq!(server.hits("GET", "/get_chat_history"), 1);
    assert_eq!(
        controller.model().conversation(),
        &[Message::user("oi"), Message::assistant("olá")]
    );
}
