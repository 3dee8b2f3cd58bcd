use base64::Engine;
use meterview_common::FetchError;
use reqwest::Client;
use serde::Deserialize;

/// How requests to the billing API are authenticated.
#[derive(Clone)]
pub enum Credentials {
    /// Service key user/password sent directly as basic auth.
    Basic { username: String, password: String },
    /// Service key exchanged for a bearer token at `token_url` on every fetch.
    ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
    },
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::ClientCredentials {
                token_url,
                client_id,
                ..
            } => f
                .debug_struct("ClientCredentials")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub fn basic_auth_value(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into().trim().to_string(),
            password: password.into().trim().to_string(),
        }
    }

    /// Value for the `Authorization` header of the next billing API call.
    pub async fn authorization(&self, client: &Client) -> Result<String, FetchError> {
        match self {
            Credentials::Basic { username, password } => Ok(basic_auth_value(username, password)),
            Credentials::ClientCredentials {
                token_url,
                client_id,
                client_secret,
            } => {
                let token = fetch_access_token(client, token_url, client_id, client_secret).await?;
                Ok(format!("Bearer {}", token))
            }
        }
    }
}

async fn fetch_access_token(
    client: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, FetchError> {
    let resp = client
        .post(token_url)
        .header(
            reqwest::header::AUTHORIZATION,
            basic_auth_value(client_id, client_secret),
        )
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body("grant_type=client_credentials&response_type=token")
        .send()
        .await
        .map_err(|e| FetchError::network(format!("Authentication request failed: {}", e)))?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "token endpoint rejected client credentials");
        return Err(FetchError::upstream(
            status.as_u16(),
            format!(
                "Authentication failed: {} - {}",
                status.canonical_reason().unwrap_or("error"),
                detail.trim()
            ),
        ));
    }

    let body: TokenResponse = resp.json().await.map_err(|e| {
        FetchError::upstream(
            status.as_u16(),
            format!("Authentication failed: unreadable token response ({})", e),
        )
    })?;
    Ok(body.access_token)
}
