//! Wire types for the login endpoints. Field names are camelCase, matching
//! the client contract.

use serde::{Deserialize, Serialize};
use sls_identity_core::{Platform, Provider, UserAccount};
use sls_identity_flow::{AuthorizeRequest, TokenRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeBody {
    pub provider: Provider,
    pub platform: Platform,
    pub redirect_uri: String,
    pub state: String,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

impl From<AuthorizeBody> for AuthorizeRequest {
    fn from(body: AuthorizeBody) -> Self {
        Self {
            provider: body.provider,
            platform: body.platform,
            redirect_uri: body.redirect_uri,
            state: body.state,
            code_challenge: body.code_challenge,
            code_challenge_method: body.code_challenge_method,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub authorization_url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBody {
    pub provider: Provider,
    pub platform: Platform,
    pub code: String,
    pub state: String,
    pub code_verifier: Option<String>,
}

impl From<TokenBody> for TokenRequest {
    fn from(body: TokenBody) -> Self {
        Self {
            provider: body.provider,
            platform: body.platform,
            code: body.code,
            state: body.state,
            code_verifier: body.code_verifier,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponseBody {
    pub token: String,
    pub user: UserBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

impl From<&UserAccount> for UserBody {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            image_url: account.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
