//! Provider wire types.

use serde::{Deserialize, Serialize};

/// PKCE challenge passed through from the client application.
///
/// The backend never generates the verifier for public clients; it echoes
/// the caller's challenge into the authorization URL and later checks the
/// verifier the caller presents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChallenge {
    pub challenge: String,
    pub method: String,
}

/// Tokens obtained from a provider's token endpoint.
///
/// `id_token` carries the signed identity assertion for providers that
/// deliver identity at exchange time (Apple); it is `None` elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub id_token: Option<String>,
}

/// Raw token endpoint response, as providers serialize it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenEndpointResponse {
    pub access_token: String,
    #[allow(dead_code)]
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

impl From<TokenEndpointResponse> for ProviderTokenSet {
    fn from(raw: TokenEndpointResponse) -> Self {
        Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            expires_in: raw.expires_in,
            id_token: raw.id_token,
        }
    }
}

/// User-info endpoint response.
///
/// Accepts both `sub` (OpenID Connect, Google) and `id` (Facebook Graph,
/// legacy Google endpoints) for the subject field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoResponse {
    #[serde(alias = "id")]
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_accepts_sub_field() {
        let json = r#"{"sub": "123456789", "email": "user@example.com", "name": "Test User"}"#;
        let user_info: UserInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(user_info.sub, "123456789");
        assert_eq!(user_info.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn user_info_accepts_id_field() {
        let json = r#"{"id": "fb-77001", "name": "Test User"}"#;
        let user_info: UserInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(user_info.sub, "fb-77001");
        assert!(user_info.email.is_none());
    }

    #[test]
    fn token_endpoint_response_converts() {
        let json = r#"{
            "access_token": "at-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "rt-1",
            "id_token": "jwt"
        }"#;
        let raw: TokenEndpointResponse = serde_json::from_str(json).unwrap();
        let tokens = ProviderTokenSet::from(raw);
        assert_eq!(tokens.access_token, "at-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(tokens.expires_in, Some(3600));
        assert_eq!(tokens.id_token.as_deref(), Some("jwt"));
    }
}
