//! Token exchange against a mock tenant

use anyhow::Result;
use resource_cloner::api::ApiError;
use resource_cloner::auth::{Side, TenantConfig, TokenProvider};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tenant(server: &MockServer, api_token: Option<&str>, jwt_token: Option<&str>) -> TenantConfig {
    TenantConfig {
        side: Side::Source,
        api_token: api_token.map(str::to_string),
        jwt_token: jwt_token.map(str::to_string),
        tenant: "old-co".to_string(),
        base_path: server.uri(),
    }
}

#[tokio::test]
async fn test_exchange_returns_access_token() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/exchange"))
        .and(body_json(json!({ "api_token": "secret", "tenant": "old-co" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "jwt-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = TokenProvider::with_client(reqwest::Client::new());
    let token = provider.exchange(&tenant(&server, Some("secret"), None)).await?;

    assert_eq!(token, "jwt-123");
    Ok(())
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_errors() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/exchange"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let provider = TokenProvider::with_client(reqwest::Client::new());
    let err = provider.exchange(&tenant(&server, Some("wrong"), None)).await.unwrap_err();

    assert!(err.is_auth(), "expected auth error, got {:?}", err);
    assert!(err.to_string().contains("old-co"));
    Ok(())
}

#[tokio::test]
async fn test_missing_access_token_is_auth_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "bearer" })))
        .mount(&server)
        .await;

    let provider = TokenProvider::with_client(reqwest::Client::new());
    let err = provider.exchange(&tenant(&server, Some("secret"), None)).await.unwrap_err();

    assert!(matches!(err, ApiError::Auth { .. }));
    Ok(())
}

#[tokio::test]
async fn test_unparsable_body_is_malformed() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let provider = TokenProvider::with_client(reqwest::Client::new());
    let err = provider.exchange(&tenant(&server, Some("secret"), None)).await.unwrap_err();

    assert!(matches!(err, ApiError::MalformedJson { .. }));
    Ok(())
}

#[tokio::test]
async fn test_stored_jwt_used_without_api_token() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "unused" })))
        .expect(0)
        .mount(&server)
        .await;

    let provider = TokenProvider::with_client(reqwest::Client::new());
    let token = provider.token_for(&tenant(&server, None, Some("stored-jwt"))).await?;
    assert_eq!(token, "stored-jwt");

    let err = provider.token_for(&tenant(&server, None, None)).await.unwrap_err();
    assert!(err.is_auth());
    Ok(())
}

#[tokio::test]
async fn test_exchanged_token_is_persisted() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh-jwt" })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let env_path = dir.path().join(".env");
    std::fs::write(&env_path, "SRC_TENANT=old-co\nSRC_JWT_TOKEN=stale\n")?;

    let provider = TokenProvider::with_client(reqwest::Client::new()).persist_to(&env_path);
    let token = provider.token_for(&tenant(&server, Some("secret"), Some("stale"))).await?;

    assert_eq!(token, "fresh-jwt");
    let contents = std::fs::read_to_string(&env_path)?;
    assert_eq!(contents, "SRC_TENANT=old-co\nSRC_JWT_TOKEN=fresh-jwt\n");
    Ok(())
}
