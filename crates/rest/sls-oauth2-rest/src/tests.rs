//! Endpoint tests over a simulated provider.

#[cfg(test)]
mod rest_tests {
    use crate::router;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use sls_identity_accounts::{IdentityResolver, InMemoryUserStore};
    use sls_identity_core::Provider;
    use sls_identity_flow::{FlowConfig, LoginFlow};
    use sls_identity_oauth2::{InMemoryStateStore, OAuth2Config, ProviderConfig, ProviderRegistry};
    use sls_identity_session::{SessionConfig, SessionService};
    use std::sync::Arc;
    use url::Url;

    fn test_server() -> TestServer {
        let config = OAuth2Config::new().add_provider(
            ProviderConfig::new(Provider::Google, "google-client-id", "google-secret")
                .with_authorization_endpoint("https://accounts.google.com/o/oauth2/v2/auth")
                .with_token_endpoint("http://127.0.0.1:1/token")
                .with_userinfo_endpoint("http://127.0.0.1:1/userinfo")
                .with_scopes(vec!["openid".to_string(), "email".to_string()])
                .with_simulated(true),
        );

        let registry = ProviderRegistry::from_config(&config).unwrap();
        let states = Arc::new(InMemoryStateStore::new());
        let store = Arc::new(InMemoryUserStore::new());
        let resolver = Arc::new(IdentityResolver::new(store));
        let sessions = Arc::new(SessionService::new(SessionConfig::new("rest-test-secret")));
        let flow = LoginFlow::new(
            registry,
            states,
            resolver,
            sessions,
            FlowConfig::default(),
        );

        TestServer::new(router(Arc::new(flow))).unwrap()
    }

    fn authorize_body(state: &str) -> serde_json::Value {
        serde_json::json!({
            "provider": "google",
            "platform": "WEB",
            "redirectUri": "http://localhost:3000/callback",
            "state": state,
        })
    }

    #[tokio::test]
    async fn authorize_returns_url_and_state() {
        let server = test_server();

        let response = server
            .post("/auth/oauth2/authorize")
            .json(&authorize_body("abc123"))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["state"], "abc123");

        let url = Url::parse(body["authorizationUrl"].as_str().unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert!(
            url.query_pairs()
                .any(|(key, value)| key == "state" && value == "abc123")
        );
    }

    #[tokio::test]
    async fn authorize_unknown_provider_is_a_structured_error() {
        let server = test_server();

        let response = server
            .post("/auth/oauth2/authorize")
            .json(&serde_json::json!({
                "provider": "apple",
                "platform": "WEB",
                "redirectUri": "http://localhost:3000/callback",
                "state": "abc123",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "unsupported_provider");
    }

    #[tokio::test]
    async fn callback_redirects_with_credential_then_rejects_replay() {
        let server = test_server();

        server
            .post("/auth/oauth2/authorize")
            .json(&authorize_body("abc123"))
            .await
            .assert_status_ok();

        let response = server
            .get("/auth/oauth2/callback/google")
            .add_query_param("code", "validcode")
            .add_query_param("state", "abc123")
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let redirect = Url::parse(&location).unwrap();
        assert_eq!(redirect.path(), "/oauth2/success");
        assert!(
            redirect
                .query_pairs()
                .any(|(key, value)| key == "token" && !value.is_empty())
        );
        assert!(
            redirect
                .query_pairs()
                .any(|(key, value)| key == "platform" && value == "WEB")
        );

        // Replay: still a redirect, but to the failure destination
        let replay = server
            .get("/auth/oauth2/callback/google")
            .add_query_param("code", "validcode")
            .add_query_param("state", "abc123")
            .await;

        replay.assert_status(StatusCode::SEE_OTHER);
        let location = replay
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(location.starts_with("http://localhost:3000/login"));
        assert!(location.contains("error=invalid_state"));
    }

    #[tokio::test]
    async fn token_endpoint_returns_credential_and_user() {
        let server = test_server();

        server
            .post("/auth/oauth2/authorize")
            .json(&authorize_body("api-state"))
            .await
            .assert_status_ok();

        let response = server
            .post("/auth/oauth2/token")
            .json(&serde_json::json!({
                "provider": "google",
                "platform": "WEB",
                "code": "validcode",
                "state": "api-state",
            }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert!(body["user"]["id"].as_i64().unwrap() > 0);
        assert!(body["user"]["email"].as_str().is_some());

        // The state was consumed by the successful exchange
        let replay = server
            .post("/auth/oauth2/token")
            .json(&serde_json::json!({
                "provider": "google",
                "platform": "WEB",
                "code": "validcode",
                "state": "api-state",
            }))
            .await;

        replay.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = replay.json();
        assert_eq!(body["error"], "invalid_state");
    }
}
