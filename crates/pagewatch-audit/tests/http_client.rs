use pagewatch_audit::{AuditEngine, AuditError, AuditRequest, HttpAuditClient};
use pagewatch_core::AuditConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(endpoint: String, timeout_ms: u64) -> HttpAuditClient {
    HttpAuditClient::new(&AuditConfig {
        endpoint,
        timeout_ms,
    })
    .expect("create audit client")
}

#[tokio::test]
async fn test_audit_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .and(body_partial_json(json!({
            "url": "https://example.com",
            "pageInsights": true,
            "noStore": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "webPage": {
                "url": "https://example.com",
                "domain": "example.com",
                "online": true,
                "issuesInfo": {"errorCount": 1, "warningCount": 2, "noticeCount": 0}
            },
            "script": {"script": "<script></script>"},
            "issues": {"issues": [
                {"type": "error", "code": "H37", "selector": "img"}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(server.uri(), 2_000);
    let request = AuditRequest {
        page_insights: true,
        ..AuditRequest::new("https://example.com")
    };

    let result = client.audit(request).await.expect("audit succeeds");
    let page = result.page.expect("page rendered");
    assert_eq!(page.domain, "example.com");
    assert_eq!(result.issues.expect("issues").issues.len(), 1);
    assert!(result.script.is_some());
}

#[tokio::test]
async fn test_audit_null_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"webPage": null, "script": null, "issues": null})),
        )
        .mount(&server)
        .await;

    let client = client_for(server.uri(), 2_000);
    let result = client
        .audit(AuditRequest::new("https://slow.example.com"))
        .await
        .expect("audit returns a result");
    assert!(result.page.is_none());
}

#[tokio::test]
async fn test_audit_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"webPage": null}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_for(server.uri(), 50);
    let err = client
        .audit(AuditRequest::new("https://example.com"))
        .await
        .expect_err("audit should time out");
    assert!(matches!(err, AuditError::Timeout { ms: 50 }), "got {err:?}");
}

#[tokio::test]
async fn test_audit_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(server.uri(), 2_000);
    let err = client
        .audit(AuditRequest::new("https://example.com"))
        .await
        .expect_err("audit should be refused");
    assert!(matches!(err, AuditError::RateLimited { status: 429 }));
    assert!(err.is_timeout_equivalent());
}

#[tokio::test]
async fn test_audit_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(ResponseTemplate::new(500).set_body_string("render crashed"))
        .mount(&server)
        .await;

    let client = client_for(server.uri(), 2_000);
    let err = client
        .audit(AuditRequest::new("https://example.com"))
        .await
        .expect_err("audit should fail");
    match err {
        AuditError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "render crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_audit_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(server.uri(), 2_000);
    let err = client
        .audit(AuditRequest::new("https://example.com"))
        .await
        .expect_err("audit should fail to decode");
    assert!(matches!(err, AuditError::Decode(_)));
}

#[tokio::test]
async fn test_audit_unreachable() {
    // Bind then drop to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    };

    let client = client_for(format!("http://127.0.0.1:{port}"), 2_000);
    let err = client
        .audit(AuditRequest::new("https://example.com"))
        .await
        .expect_err("engine should be unreachable");
    assert!(matches!(err, AuditError::Unreachable(_)), "got {err:?}");
    assert!(!err.is_timeout_equivalent());
}
