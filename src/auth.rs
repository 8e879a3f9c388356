use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{check_status, Result};
use crate::types::deserialize_id;

/// OAuth client identifier the service expects from every caller
pub const CLIENT_ID: &str = "123";
pub const GRANT_TYPE: &str = "password";

/// Body of the password-grant token request
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub grant_type: &'static str,
    pub client_id: &'static str,
}

impl<'a> TokenRequest<'a> {
    pub fn new(username: &'a str, password: &'a str) -> Self {
        Self {
            username,
            password,
            grant_type: GRANT_TYPE,
            client_id: CLIENT_ID,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
}

/// Bearer credential presented on every authenticated call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    /// Stored capitalized, e.g. "Bearer"
    pub token_type: String,
}

impl AccessToken {
    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl From<&TokenResponse> for AccessToken {
    fn from(response: &TokenResponse) -> Self {
        Self {
            access_token: response.access_token.clone(),
            token_type: capitalize(&response.token_type),
        }
    }
}

/// Uppercase the first character and lowercase the rest ("bearer" -> "Bearer")
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Exchange credentials for a token with a single POST to the token endpoint
pub async fn request_token(config: &ApiConfig, request: &TokenRequest<'_>) -> Result<TokenResponse> {
    let client = config.http_client()?;

    let response = client
        .post(config.token_url())
        .form(request)
        .send()
        .await?;

    let status = response.status();
    if let Err(e) = check_status(status) {
        debug!("Authentication failed with status: {}", status);
        return Err(e);
    }

    let response_text = response.text().await?;
    let token = serde_json::from_str::<TokenResponse>(&response_text)?;
    debug!("Authentication successful for user: {}", request.username);
    Ok(token)
}
