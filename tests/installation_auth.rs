mod common;

use common::{token_response, APP_ID, INSTALLATION_ID, PRIVATE_KEY, PUBLIC_KEY};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use prpilot::error::GitHubError;
use prpilot::github::token_manager::AssertionClaims;
use prpilot::github::{create_assertion, AppCredential, Endpoints, GitHubClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::for_installation(
        reqwest::Client::new(),
        Endpoints::new(server.uri()),
        AppCredential::new(APP_ID, PRIVATE_KEY),
        INSTALLATION_ID,
    )
}

fn access_token_path() -> String {
    format!("/app/installations/{}/access_tokens", INSTALLATION_ID)
}

#[test]
fn test_assertion_verifies_with_public_key() {
    let assertion = create_assertion(&AppCredential::new(APP_ID, PRIVATE_KEY)).unwrap();

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[APP_ID]);
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
    let decoded = decode::<AssertionClaims>(assertion.as_str(), &key, &validation).unwrap();

    assert_eq!(decoded.header.alg, Algorithm::RS256);
    assert_eq!(decoded.claims.iss, APP_ID);
    assert_eq!(decoded.claims.exp - decoded.claims.iat, 660);
    assert_eq!(&decoded.claims, assertion.claims());
}

#[test]
fn test_escaped_newlines_in_key_are_accepted() {
    let escaped = PRIVATE_KEY.trim_end().replace('\n', "\\n");
    assert!(create_assertion(&AppCredential::new(APP_ID, escaped)).is_ok());
}

#[tokio::test]
async fn test_token_is_cached_across_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(access_token_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_response("2099-01-01T00:00:00Z")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .and(header("Authorization", "Bearer ghs_installation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let mut client = client(&server);
    assert!(!client.has_token());

    let url = client.endpoints().repo("octo", "hello");
    client.get(&url).await.unwrap();
    client.get(&url).await.unwrap();
    assert!(client.has_token());
}

#[tokio::test]
async fn test_expired_token_is_exchanged_again() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(access_token_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_response("2000-01-01T00:00:00Z")))
        .expect(2)
        .mount(&server)
        .await;

    let mut client = client(&server);
    assert_eq!(client.ensure_token().await.unwrap(), "ghs_installation");
    assert_eq!(client.ensure_token().await.unwrap(), "ghs_installation");
}

#[tokio::test]
async fn test_rejected_exchange_is_auth_exchange_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(access_token_path()))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let err = client.ensure_token().await.unwrap_err();
    match err {
        GitHubError::AuthExchange { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Bad credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!client.has_token());
}
