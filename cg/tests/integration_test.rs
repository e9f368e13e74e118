//! Integration tests for clauseguard
//!
//! The HTTP service runs against a local axum stub that speaks the storage,
//! analysis and chat contracts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use clauseguard::analysis::AnalysisClient;
use clauseguard::chat::{ChatClient, ChatOutcome};
use clauseguard::config::{IntakeConfig, ProgressConfig, RequestStyle, ServiceConfig, UploadConfig};
use clauseguard::domain::{FileStatus, PdfSource, Sender, WorkingSet};
use clauseguard::events::{ClientEvent, EventBus};
use clauseguard::intake::FileIntake;
use clauseguard::service::{DocumentService, HttpDocumentService, ServiceError};
use clauseguard::state::OpState;
use clauseguard::upload::UploadClient;

// =============================================================================
// Stub server
// =============================================================================

#[derive(Debug, Clone)]
struct ReceivedFile {
    field: String,
    file_name: String,
    content_type: Option<String>,
    size: usize,
}

#[derive(Default)]
struct Recorded {
    files: Mutex<Vec<ReceivedFile>>,
    analyze_urls: Mutex<Vec<String>>,
    questions: Mutex<Vec<(String, String)>>,
}

type Shared = Arc<Recorded>;

fn analysis_body() -> Value {
    json!({
        "document_summary": {
            "overall_risk_score": 72,
            "risk_summary": "Primary risks:\n- Unlimited liability (Score: 88)",
            "total_clauses": 3,
            "risky_clause_count": 1
        },
        "clause_by_clause_analysis": [
            {"Clause": "1. Payment is due in 30 days.", "risky": false, "score": 10,
             "summary": "Net 30 payment.", "reason": "Standard.", "category": "Financial"},
            {"Clause": "2. Either party may terminate with notice.", "risky": false, "score": 20,
             "summary": "Termination on notice.", "reason": "Balanced.", "category": "Termination"},
            {"Clause": "3. Supplier liability is unlimited.", "risky": true, "score": 88,
             "summary": "Unlimited liability.", "reason": "No cap on damages.", "category": "Liability"}
        ]
    })
}

async fn upload(State(recorded): State<Shared>, mut multipart: Multipart) -> Response {
    let mut url = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let Ok(data) = field.bytes().await else {
            return (StatusCode::BAD_REQUEST, "unreadable part").into_response();
        };
        if file_name == "reject.pdf" {
            return (StatusCode::INTERNAL_SERVER_ERROR, "bucket unavailable").into_response();
        }
        url = Some(format!("https://x/{}", file_name));
        recorded.files.lock().unwrap().push(ReceivedFile {
            field: name,
            file_name,
            content_type,
            size: data.len(),
        });
    }
    match url {
        Some(url) => Json(json!({ "publicUrl": url })).into_response(),
        None => (StatusCode::BAD_REQUEST, "No file uploaded").into_response(),
    }
}

async fn analyze_query(State(recorded): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Response {
    analyze_url(&recorded, params.get("fileUrl").cloned())
}

async fn analyze_json(State(recorded): State<Shared>, Json(body): Json<Value>) -> Response {
    analyze_url(&recorded, body["fileUrl"].as_str().map(str::to_string))
}

fn analyze_url(recorded: &Recorded, url: Option<String>) -> Response {
    let Some(url) = url else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "fileUrl is required").into_response();
    };
    recorded.analyze_urls.lock().unwrap().push(url.clone());
    if url.ends_with("missing.pdf") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to download PDF").into_response();
    }
    if url.ends_with("garbled.pdf") {
        return (StatusCode::OK, "{\"document_summary\": ").into_response();
    }
    Json(analysis_body()).into_response()
}

async fn chat(State(recorded): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Response {
    let url = params.get("fileUrl").cloned().unwrap_or_default();
    let question = params.get("question").cloned().unwrap_or_default();
    recorded.questions.lock().unwrap().push((url, question.clone()));
    if question.contains("clause 3") {
        Json(json!({ "answer": "It limits liability." })).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "").into_response()
    }
}

async fn spawn_stub() -> (ServiceConfig, Shared) {
    let recorded: Shared = Arc::new(Recorded::default());
    let app = Router::new()
        .route("/api/upload", post(upload))
        .route("/analyze", get(analyze_query).post(analyze_json))
        .route("/chat", get(chat))
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ServiceConfig {
        base_url: format!("http://{}", addr),
        timeout_ms: 10_000,
        ..ServiceConfig::default()
    };
    (config, recorded)
}

fn pdf_of_size(name: &str, size: usize) -> PdfSource {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(size, b' ');
    PdfSource::from_bytes(name, bytes)
}

fn fast_progress() -> ProgressConfig {
    ProgressConfig {
        tick_ms: 5,
        ..ProgressConfig::default()
    }
}

// =============================================================================
// HttpDocumentService
// =============================================================================

#[tokio::test]
async fn test_upload_sends_single_pdf_part() {
    let (config, recorded) = spawn_stub().await;
    let service = HttpDocumentService::from_config(&config).unwrap();

    let url = service.upload(&pdf_of_size("lease.pdf", 4096)).await.unwrap();
    assert_eq!(url, "https://x/lease.pdf");

    let files = recorded.files.lock().unwrap().clone();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].field, "file");
    assert_eq!(files[0].file_name, "lease.pdf");
    assert_eq!(files[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(files[0].size, 4096);
}

#[tokio::test]
async fn test_upload_error_status_is_api_error() {
    let (config, _recorded) = spawn_stub().await;
    let service = HttpDocumentService::from_config(&config).unwrap();

    let err = service.upload(&pdf_of_size("reject.pdf", 64)).await.unwrap_err();
    assert!(err.is_api());
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.detail_or("generic"), "bucket unavailable");
}

#[tokio::test]
async fn test_analyze_query_and_json_styles() {
    let (config, recorded) = spawn_stub().await;

    let query = HttpDocumentService::from_config(&config).unwrap();
    let analysis = query.analyze("https://x/doc.pdf").await.unwrap();
    assert_eq!(analysis.document_summary.total_clauses, 3);
    assert_eq!(analysis.clause_by_clause_analysis[2].clause, "3. Supplier liability is unlimited.");

    let json_config = ServiceConfig {
        request_style: RequestStyle::Json,
        ..config
    };
    let json = HttpDocumentService::from_config(&json_config).unwrap();
    let analysis = json.analyze("https://x/other.pdf").await.unwrap();
    assert_eq!(analysis.risky_clauses().count(), 1);

    assert_eq!(
        *recorded.analyze_urls.lock().unwrap(),
        vec!["https://x/doc.pdf".to_string(), "https://x/other.pdf".to_string()]
    );
}

#[tokio::test]
async fn test_analyze_malformed_body() {
    let (config, _recorded) = spawn_stub().await;
    let service = HttpDocumentService::from_config(&config).unwrap();

    let err = service.analyze("https://x/garbled.pdf").await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_truncated_success_body_is_network_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promise more body than is sent, then hang up
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let head = concat!(
            "HTTP/1.1 200 OK\r\n",
            "content-type: application/json\r\n",
            "content-length: 1000\r\n",
            "\r\n",
            "{\"document_",
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    let config = ServiceConfig {
        base_url: format!("http://{}", addr),
        timeout_ms: 5_000,
        ..ServiceConfig::default()
    };
    let service = HttpDocumentService::from_config(&config).unwrap();

    let err = service.analyze("https://x/doc.pdf").await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)), "expected a network error, got {:?}", err);
    assert!(!err.is_malformed());
}

#[tokio::test]
async fn test_chat_round_trip() {
    let (config, recorded) = spawn_stub().await;
    let service = HttpDocumentService::from_config(&config).unwrap();

    let answer = service.ask("https://x/doc.pdf", "What is clause 3 about?").await.unwrap();
    assert_eq!(answer, "It limits liability.");
    assert_eq!(
        recorded.questions.lock().unwrap()[0],
        ("https://x/doc.pdf".to_string(), "What is clause 3 about?".to_string())
    );
}

// =============================================================================
// Clients over HTTP
// =============================================================================

#[tokio::test]
async fn test_two_megabyte_upload_redirects() {
    let (config, recorded) = spawn_stub().await;
    let service: Arc<dyn DocumentService> = Arc::new(HttpDocumentService::from_config(&config).unwrap());
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();

    let mut set = WorkingSet::new();
    let intake = FileIntake::new(&IntakeConfig::default(), bus.emitter());
    let report = intake.accept(&mut set, vec![pdf_of_size("doc.pdf", 2 * 1024 * 1024)]);
    assert_eq!(report.accepted.len(), 1);

    let mut client = UploadClient::new(service, &UploadConfig::default(), bus.emitter());
    let outcome = client.submit(&mut set).await.unwrap();

    assert_eq!(outcome.redirect.as_deref(), Some("https://x/doc.pdf"));
    assert_eq!(set.files()[0].status(), FileStatus::Success);
    assert_eq!(recorded.files.lock().unwrap()[0].size, 2 * 1024 * 1024);

    let mut redirected = None;
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::Redirect { url } = event {
            redirected = Some(url);
        }
    }
    assert_eq!(redirected.as_deref(), Some("https://x/doc.pdf"));
}

#[tokio::test]
async fn test_concurrent_upload_over_http() {
    let (config, recorded) = spawn_stub().await;
    let service: Arc<dyn DocumentService> = Arc::new(HttpDocumentService::from_config(&config).unwrap());
    let bus = EventBus::new(64);

    let mut set = WorkingSet::new();
    let intake = FileIntake::new(&IntakeConfig::default(), bus.emitter());
    intake.accept(
        &mut set,
        vec![
            pdf_of_size("a.pdf", 1024),
            pdf_of_size("reject.pdf", 1024),
            pdf_of_size("c.pdf", 1024),
        ],
    );

    let mut client = UploadClient::new(service, &UploadConfig { concurrency: 3 }, bus.emitter());
    let outcome = client.submit(&mut set).await.unwrap();

    let statuses: Vec<FileStatus> = outcome.files.iter().map(|f| f.status).collect();
    assert_eq!(statuses, vec![FileStatus::Success, FileStatus::Error, FileStatus::Success]);
    assert_eq!(outcome.redirect.as_deref(), Some("https://x/c.pdf"));
    assert_eq!(recorded.files.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_analysis_error_body_becomes_message() {
    let (config, _recorded) = spawn_stub().await;
    let service: Arc<dyn DocumentService> = Arc::new(HttpDocumentService::from_config(&config).unwrap());
    let mut client = AnalysisClient::new(service, &fast_progress(), EventBus::new(16).emitter());

    let err = client.analyze(Some("https://x/missing.pdf")).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to download PDF");
    assert_eq!(client.state(), OpState::Error);
    assert_eq!(client.progress_value(), 100.0);
}

#[tokio::test]
async fn test_unreachable_analysis_service() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ServiceConfig {
        base_url: format!("http://{}", addr),
        timeout_ms: 2_000,
        ..ServiceConfig::default()
    };
    let service: Arc<dyn DocumentService> = Arc::new(HttpDocumentService::from_config(&config).unwrap());
    let mut client = AnalysisClient::new(service, &fast_progress(), EventBus::new(16).emitter());

    let err = client.analyze(Some("https://x/doc.pdf")).await.unwrap_err();
    assert!(!err.to_string().is_empty());
    assert_eq!(client.state(), OpState::Error);
    assert!(client.error().is_some_and(|m| !m.is_empty()));
    assert!(client.result().is_none());
    assert_eq!(client.progress_value(), 100.0);
}

#[tokio::test]
async fn test_review_flow_end_to_end() {
    let (config, recorded) = spawn_stub().await;
    let service: Arc<dyn DocumentService> = Arc::new(HttpDocumentService::from_config(&config).unwrap());
    let bus = EventBus::new(256);

    let mut set = WorkingSet::new();
    let intake = FileIntake::new(&IntakeConfig::default(), bus.emitter());
    intake.accept(&mut set, vec![pdf_of_size("contract.pdf", 10_000)]);

    let mut uploader = UploadClient::new(service.clone(), &UploadConfig::default(), bus.emitter());
    let url = uploader.submit(&mut set).await.unwrap().redirect.unwrap();

    let mut analyzer = AnalysisClient::new(service.clone(), &fast_progress(), bus.emitter());
    let analysis = analyzer.analyze(Some(&url)).await.unwrap();
    assert_eq!(analysis.document_summary.risky_clause_count, 1);
    assert!(analysis.is_consistent());
    assert_eq!(analyzer.progress_value(), 100.0);

    let mut chat = ChatClient::new(service);
    let before = chat.transcript().len();
    assert_eq!(chat.ask(Some(&url), "What is clause 3 about?").await, ChatOutcome::Answered);
    let messages = chat.transcript().messages();
    assert_eq!(messages.len(), before + 2);
    assert_eq!(messages[before].sender, Sender::User);
    assert_eq!(messages[before + 1].text, "It limits liability.");

    assert_eq!(chat.ask(Some(&url), "Anything else?").await, ChatOutcome::Failed);
    assert_eq!(chat.transcript().len(), before + 4);

    assert_eq!(*recorded.analyze_urls.lock().unwrap(), vec!["https://x/contract.pdf".to_string()]);
}
