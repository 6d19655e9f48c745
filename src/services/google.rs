use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Authorization-code flow against Google.
pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig, redirect_uri: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn authorize_url(&self) -> Result<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "email profile"),
            ],
        )?;
        Ok(url.into())
    }

    pub async fn fetch_profile(&self, code: &str) -> Result<GoogleProfile> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to reach Google token endpoint")?
            .error_for_status()
            .map_err(|e| anyhow!("Google rejected the authorization code: {e}"))?
            .json()
            .await
            .context("Unexpected Google token response")?;

        self.http
            .get(USERINFO_URL)
            .bearer_auth(token.access_token)
            .send()
            .await
            .context("Failed to reach Google userinfo endpoint")?
            .error_for_status()
            .context("Google refused the profile request")?
            .json()
            .await
            .context("Unexpected Google profile response")
    }
}
