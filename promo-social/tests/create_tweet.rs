use promo_social::twitter::{OAuthCredentials, TwitterApi};
use promo_social::{PublishError, Published, Publisher};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn creds() -> OAuthCredentials {
    OAuthCredentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: "at".into(),
        access_token_secret: "ats".into(),
    }
}

fn signed_with_oauth(req: &Request) -> bool {
    req.headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.starts_with("OAuth ")
                && v.contains("oauth_consumer_key=\"ck\"")
                && v.contains("oauth_token=\"at\"")
                && v.contains("oauth_signature=")
        })
}

#[tokio::test]
async fn created_status_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_json(json!({"text": "Feed to pin!: Art\nnice\nPin here:https://bsky.app/f"})))
        .and(signed_with_oauth)
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"data": {"id": "42", "text": "Feed to pin!: Art"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(creds(), &server.uri()).unwrap();
    let published = api
        .publish("Feed to pin!: Art\nnice\nPin here:https://bsky.app/f")
        .await
        .unwrap();

    assert_eq!(published.id.as_deref(), Some("42"));
}

#[tokio::test]
async fn created_with_empty_reply_is_still_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(creds(), &server.uri()).unwrap();
    let published = api.publish("hello").await.unwrap();
    assert_eq!(published, Published::default());
}

#[tokio::test]
async fn created_with_numeric_id_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 123}})))
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(creds(), &server.uri()).unwrap();
    let published = api.publish("hello").await.unwrap();
    assert_eq!(published.id.as_deref(), Some("123"));
}

#[tokio::test]
async fn ok_without_created_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(creds(), &server.uri()).unwrap();
    let err = api.publish("hello").await.unwrap_err();
    assert!(matches!(err, PublishError::UnexpectedStatus(200)));
    assert!(err.is_cycle_failure());
}

#[tokio::test]
async fn rejection_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "title": "Service Unavailable",
            "detail": "Service Unavailable"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(creds(), &server.uri()).unwrap();
    match api.publish("hello").await.unwrap_err() {
        PublishError::Rejected { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_content_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "detail": "You are not allowed to create a Tweet with duplicate content.",
            "type": "about:blank",
            "title": "Forbidden",
            "status": 403
        })))
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(creds(), &server.uri()).unwrap();
    let err = api.publish("hello").await.unwrap_err();
    assert!(err.to_string().contains("duplicate content"), "{err}");
}

#[tokio::test]
async fn unreachable_api_is_a_transport_failure() {
    let api = TwitterApi::with_base_url(creds(), "http://127.0.0.1:9").unwrap();
    let err = api.publish("hello").await.unwrap_err();
    assert!(matches!(err, PublishError::Transport(_)), "{err:?}");
    assert!(err.is_cycle_failure());
}

#[test]
fn invalid_base_url_is_a_client_error() {
    let err = TwitterApi::with_base_url(creds(), "not a url").err().unwrap();
    assert!(matches!(err, PublishError::Client(_)));
}
