//! Relationship check deciding whether a signed-in user may see the private view
//!
//! The provider answers `GET /user/following/{target}` with `204 No Content`
//! when the token's owner follows `target`. Every other non-error status is a
//! negative answer. Server errors and transport failures are reported as
//! [`CheckError`] so the caller can fail closed without mistaking them for
//! "not following".

use crate::error::CheckError;
use crate::models::{DelegatedToken, EntitlementVerdict};
use crate::oauth::provider_api_get;
use async_trait::async_trait;
use reqwest::StatusCode;

#[async_trait]
pub trait EntitlementChecker: Send + Sync {
    /// Ask the provider whether the token's owner satisfies the relationship with `target`
    ///
    /// # Errors
    ///
    /// Returns an error if the query times out, cannot be sent, or the provider fails
    async fn check(
        &self,
        token: &DelegatedToken,
        target: &str,
    ) -> Result<EntitlementVerdict, CheckError>;
}

/// Checks that the authenticated user follows a given account
pub struct FollowChecker {
    http: reqwest::Client,
    api_base_url: String,
    user_agent: String,
}

impl FollowChecker {
    #[must_use]
    pub fn new(http: reqwest::Client, api_base_url: &str, user_agent: &str) -> Self {
        Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// `{api_base}/user/following/{target}` with `target` encoded as a single path segment
    fn relationship_url(&self, target: &str) -> Result<url::Url, CheckError> {
        let mut url = url::Url::parse(&self.api_base_url)
            .map_err(|e| CheckError::InvalidUrl(format!("{}: {e}", self.api_base_url)))?;
        url.path_segments_mut()
            .map_err(|()| CheckError::InvalidUrl(self.api_base_url.clone()))?
            .pop_if_empty()
            .extend(["user", "following", target]);
        Ok(url)
    }

    fn verdict_for(status: StatusCode) -> Result<EntitlementVerdict, CheckError> {
        if status == StatusCode::NO_CONTENT {
            Ok(EntitlementVerdict::Member)
        } else if status.is_server_error() {
            Err(CheckError::ServerError {
                status: status.as_u16(),
            })
        } else {
            Ok(EntitlementVerdict::NotMember)
        }
    }
}

#[async_trait]
impl EntitlementChecker for FollowChecker {
    async fn check(
        &self,
        token: &DelegatedToken,
        target: &str,
    ) -> Result<EntitlementVerdict, CheckError> {
        let url = self.relationship_url(target)?;
        let response = provider_api_get(&self.http, url.as_str(), token, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            // Body is diagnostic only, a failure to read it changes nothing
            if let Ok(body) = response.text().await {
                log::debug!("Relationship query for {target} returned {status}: {body}");
            }
        }

        Self::verdict_for(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn checker_with_status(status: u16) -> (MockServer, FollowChecker) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/following/acme"))
            .and(header("authorization", "token gho_token"))
            .and(header("accept", "application/vnd.github.v3+json"))
            .and(header("user-agent", "followgate-test"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        let checker = FollowChecker::new(reqwest::Client::new(), &server.uri(), "followgate-test");
        (server, checker)
    }

    #[tokio::test]
    async fn test_no_content_means_member() {
        let (_server, checker) = checker_with_status(204).await;
        let verdict = checker
            .check(&DelegatedToken::new("gho_token"), "acme")
            .await
            .unwrap();
        assert_eq!(verdict, EntitlementVerdict::Member);
    }

    #[tokio::test]
    async fn test_not_found_means_not_member() {
        let (_server, checker) = checker_with_status(404).await;
        let verdict = checker
            .check(&DelegatedToken::new("gho_token"), "acme")
            .await
            .unwrap();
        assert_eq!(verdict, EntitlementVerdict::NotMember);
    }

    #[tokio::test]
    async fn test_success_other_than_no_content_is_not_member() {
        let (_server, checker) = checker_with_status(200).await;
        let verdict = checker
            .check(&DelegatedToken::new("gho_token"), "acme")
            .await
            .unwrap();
        assert_eq!(verdict, EntitlementVerdict::NotMember);
    }

    #[tokio::test]
    async fn test_server_error_is_check_error() {
        let (_server, checker) = checker_with_status(502).await;
        let err = checker
            .check(&DelegatedToken::new("gho_token"), "acme")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::ServerError { status: 502 }));
    }

    #[test]
    fn test_target_is_encoded_as_one_path_segment() {
        let checker = FollowChecker::new(reqwest::Client::new(), "https://api.github.com", "test");
        assert_eq!(
            checker.relationship_url("acme").unwrap().as_str(),
            "https://api.github.com/user/following/acme"
        );
        assert_eq!(
            checker.relationship_url("a/../b?c").unwrap().path(),
            "/user/following/a%2F..%2Fb%3Fc"
        );
    }

    #[test]
    fn test_api_base_path_is_kept() {
        let checker =
            FollowChecker::new(reqwest::Client::new(), "https://ghe.example.com/api/v3/", "test");
        assert_eq!(
            checker.relationship_url("acme").unwrap().path(),
            "/api/v3/user/following/acme"
        );
    }

    #[test]
    fn test_unparseable_api_base_is_check_error() {
        let checker = FollowChecker::new(reqwest::Client::new(), "not a url", "test");
        assert!(matches!(
            checker.relationship_url("acme"),
            Err(CheckError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/following/acme"))
            .respond_with(ResponseTemplate::new(204).set_delay(std::time::Duration::from_secs(2)))
            .mount(&server)
            .await;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(100))
            .build()
            .unwrap();
        let checker = FollowChecker::new(http, &server.uri(), "followgate-test");

        let err = checker
            .check(&DelegatedToken::new("gho_token"), "acme")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let checker = FollowChecker::new(reqwest::Client::new(), "http://127.0.0.1:9", "test");
        let err = checker
            .check(&DelegatedToken::new("gho_token"), "acme")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Transport(_)));
    }
}
