//! ArgoCdTrigger against a mock HTTP server

use keyturn_rotation::{ArgoCdTrigger, Deployment, RestartError, RestartTrigger};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn deployment(base_url: String) -> Deployment {
    Deployment {
        url: base_url,
        application: "billing".into(),
        namespace: "prod".into(),
        resource_name: "billing-api".into(),
    }
}

#[tokio::test]
async fn test_restart_posts_the_contract_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/applications/billing/resource/actions"))
        .and(query_param("namespace", "prod"))
        .and(query_param("resourceName", "billing-api"))
        .and(query_param("version", "v1"))
        .and(query_param("kind", "Deployment"))
        .and(query_param("group", "apps"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("content-type", "application/json"))
        .and(body_string("\"restart\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let trigger = ArgoCdTrigger::new("tok-123");
    trigger.restart(&deployment(server.uri())).await.unwrap();
}

#[tokio::test]
async fn test_any_2xx_is_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let trigger = ArgoCdTrigger::new("tok-123");
    assert!(trigger.restart(&deployment(server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_non_2xx_is_reported_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let trigger = ArgoCdTrigger::new("tok-123");
    let err = trigger.restart(&deployment(server.uri())).await.unwrap_err();

    assert!(matches!(err, RestartError::Rejected { status: 503 }));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_request_error() {
    // Port 9 is discard; nothing listens there in the test environment.
    let trigger = ArgoCdTrigger::new("tok-123");
    let err = trigger
        .restart(&deployment("http://127.0.0.1:9".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, RestartError::Request { .. }));
}
