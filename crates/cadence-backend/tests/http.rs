use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uuid::Uuid;

use cadence_backend::backend::Backend;
use cadence_backend::error::BackendError;
use cadence_backend::http::HttpBackend;
use cadence_backend::session::{Session, SessionContext};
use cadence_core::models::user::Role;

/// Serve one canned response and hand back the raw request head.
async fn one_shot_server(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let mut read = 0;
        loop {
            let n = socket.read(&mut buf[read..]).await.unwrap();
            read += n;
            if n == 0 {
                break;
            }
            let text = String::from_utf8_lossy(&buf[..read]).to_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if read >= end + 4 + body_len {
                    break;
                }
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&buf[..read]).into_owned());
    });

    (format!("http://{addr}/api/"), rx)
}

fn signed_in() -> Arc<SessionContext> {
    let context = SessionContext::new();
    context
        .init(Session {
            token: "tok-abc".to_string(),
            user_id: Uuid::new_v4(),
            role: Role::Admin,
            started_at: "2025-03-10T08:00:00Z".parse().unwrap(),
        })
        .unwrap();
    Arc::new(context)
}

#[tokio::test]
async fn sends_bearer_token_and_decodes_body() {
    let (base, request) = one_shot_server("200 OK", "[]").await;
    let backend = HttpBackend::new(base, Duration::from_secs(5), signed_in());

    let assignments = backend.evaluable_assignments().await.unwrap();
    assert!(assignments.is_empty());

    let head = request.await.unwrap();
    assert!(head.starts_with("GET /api/assignments?evaluable=true "), "{head}");
    assert!(head.to_lowercase().contains("authorization: bearer tok-abc"), "{head}");
}

#[tokio::test]
async fn not_found_maps_to_not_found() {
    let (base, _request) = one_shot_server("404 Not Found", r#"{"error":"nope"}"#).await;
    let backend = HttpBackend::new(base, Duration::from_secs(5), signed_in());

    let id = Uuid::new_v4();
    let err = backend.completion(id).await.unwrap_err();
    match err {
        BackendError::NotFound { path } => assert_eq!(path, format!("completions/{id}")),
        other => panic!("expected NotFound, got {other}"),
    }
}

#[tokio::test]
async fn precondition_failed_maps_to_conflict() {
    let (base, _request) = one_shot_server("412 Precondition Failed", "{}").await;
    let backend = HttpBackend::new(base, Duration::from_secs(5), signed_in());

    let err = backend.mark_missed(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BackendError::Conflict { .. }), "{err}");
}

#[tokio::test]
async fn unauthorized_tears_down_the_session() {
    let (base, _request) = one_shot_server("401 Unauthorized", "{}").await;
    let session = signed_in();
    let backend = HttpBackend::new(base, Duration::from_secs(5), session.clone());

    let err = backend.questionnaire(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BackendError::Unauthorized));
    assert!(!session.is_active());
}

#[tokio::test]
async fn server_errors_keep_status_and_body() {
    let (base, _request) = one_shot_server("503 Service Unavailable", r#"{"error":"down"}"#).await;
    let backend = HttpBackend::new(base, Duration::from_secs(5), signed_in());

    let err = backend.assignment(Uuid::new_v4()).await.unwrap_err();
    match err {
        BackendError::Http { status, body, .. } => {
            assert_eq!(status, 503);
            assert!(body.contains("down"));
        }
        other => panic!("expected Http, got {other}"),
    }
}

#[tokio::test]
async fn login_starts_the_session() {
    let user_id = Uuid::new_v4();
    let body: &'static str = Box::leak(
        format!(r#"{{"token":"fresh","userId":"{user_id}","role":"patient"}}"#).into_boxed_str(),
    );
    let (base, request) = one_shot_server("200 OK", body).await;
    let session = Arc::new(SessionContext::new());
    let backend = HttpBackend::new(base, Duration::from_secs(5), session.clone());

    let started = backend.login("p@example.org", "secret").await.unwrap();
    assert_eq!(started.user_id, user_id);
    assert_eq!(session.token().as_deref(), Some("fresh"));
    assert_eq!(session.role(), Some(Role::Patient));

    let head = request.await.unwrap();
    assert!(head.starts_with("POST /api/auth/login "), "{head}");
}

#[tokio::test]
async fn logout_ends_the_session_even_if_rejected() {
    let (base, request) = one_shot_server("401 Unauthorized", "{}").await;
    let session = signed_in();
    let backend = HttpBackend::new(base, Duration::from_secs(5), session.clone());

    backend.logout().await.unwrap();
    assert!(!session.is_active());

    let head = request.await.unwrap();
    assert!(head.starts_with("POST /api/auth/logout "), "{head}");
}
