//! HTTP client for the provider's authorization, token and profile endpoints

use crate::error::ProviderError;
use crate::models::{DelegatedToken, Identity};
use crate::oauth::IdentityProvider;
use crate::settings::{Credentials, GateSettings};
use crate::utils::logging::LoggingHelper;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;

/// Media type the provider's REST API expects
pub const PROVIDER_API_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Token endpoint response
///
/// The provider answers refused codes with a 200 and an `error` field, so
/// every field is optional and the response is classified afterwards.
#[derive(Deserialize, Debug, Default)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// The profile fields the gate uses; the full document is kept as JSON
#[derive(Deserialize, Debug)]
struct ProfileResponse {
    id: serde_json::Value,
    login: String,
    name: Option<String>,
}

/// Build an authenticated GET against the provider's REST API
///
/// Shared by the profile fetch and the relationship query so both send the
/// same credential, media type and client identifier.
#[must_use]
pub fn provider_api_get(
    http: &reqwest::Client,
    url: &str,
    token: &DelegatedToken,
    user_agent: &str,
) -> reqwest::RequestBuilder {
    http.get(url)
        .header(AUTHORIZATION, format!("token {}", token.secret()))
        .header(ACCEPT, PROVIDER_API_MEDIA_TYPE)
        .header(USER_AGENT, user_agent)
}

/// Identity provider backed by the provider's OAuth endpoints
pub struct ProviderClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    authorization_endpoint: String,
    token_endpoint: String,
    api_base_url: String,
    callback_url: String,
    scopes: Vec<String>,
    user_agent: String,
}

impl ProviderClient {
    #[must_use]
    pub fn new(http: reqwest::Client, settings: &GateSettings, credentials: &Credentials) -> Self {
        Self {
            http,
            client_id: credentials.client_id().to_string(),
            client_secret: credentials.client_secret().to_string(),
            authorization_endpoint: settings.provider.authorization_endpoint.clone(),
            token_endpoint: settings.provider.token_endpoint.clone(),
            api_base_url: settings
                .provider
                .api_base_url
                .trim_end_matches('/')
                .to_string(),
            callback_url: settings.callback_url(),
            scopes: settings.provider.scopes.clone(),
            user_agent: settings.provider.user_agent.clone(),
        }
    }

    fn classify_token_response(
        status: reqwest::StatusCode,
        body: &str,
    ) -> Result<DelegatedToken, ProviderError> {
        if status.is_server_error() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: Option<TokenResponse> = serde_json::from_str(body).ok();

        if let Some(TokenResponse {
            error: Some(error),
            error_description,
            ..
        }) = &parsed
        {
            let detail = error_description
                .as_deref()
                .map_or_else(|| error.clone(), |d| format!("{error}: {d}"));
            return Err(ProviderError::Refused(detail));
        }

        if status.is_client_error() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        match parsed.and_then(|r| r.access_token) {
            Some(token) if !token.is_empty() => Ok(DelegatedToken::new(token)),
            _ => Err(ProviderError::InvalidResponse(
                "token response carried no access_token".to_string(),
            )),
        }
    }

    fn identity_from_profile(raw_profile: serde_json::Value) -> Result<Identity, ProviderError> {
        let profile: ProfileResponse = serde_json::from_value(raw_profile.clone())
            .map_err(|e| ProviderError::InvalidResponse(format!("profile: {e}")))?;

        let provider_user_id = match profile.id {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) if !s.is_empty() => s,
            _ => {
                return Err(ProviderError::InvalidResponse(
                    "profile has no usable id".to_string(),
                ))
            }
        };

        let display_name = profile
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| profile.login.clone());

        Ok(Identity {
            provider_user_id,
            login: profile.login,
            display_name,
            raw_profile,
        })
    }
}

#[async_trait]
impl IdentityProvider for ProviderClient {
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        let scopes = self.scopes.join(" ");
        let mut url = url::Url::parse(&self.authorization_endpoint)
            .map_err(|e| ProviderError::InvalidResponse(format!("authorization endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes)
            .append_pair("state", state);

        LoggingHelper::log_authorization_url_built(&scopes);
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<DelegatedToken, ProviderError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        LoggingHelper::log_token_exchange_start();
        let response = self
            .http
            .post(&self.token_endpoint)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let result = Self::classify_token_response(status, &body);
        if let Err(e) = &result {
            LoggingHelper::log_token_exchange_failed(status.as_u16(), e);
        }
        result
    }

    async fn fetch_profile(&self, token: &DelegatedToken) -> Result<Identity, ProviderError> {
        let url = format!("{}/user", self.api_base_url);
        let response = provider_api_get(&self.http, &url, token, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let raw_profile: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("profile: {e}")))?;

        Self::identity_from_profile(raw_profile)
    }
}
