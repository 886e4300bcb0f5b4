//! `HttpRequest` builders for testing extractors and the session manager

use actix_web::cookie::Cookie;
use actix_web::{test, HttpRequest};

/// Builder for requests that only differ in the cookies they carry
pub struct TestRequestBuilder;

impl TestRequestBuilder {
    /// Request without cookies
    #[must_use]
    pub fn empty() -> HttpRequest {
        test::TestRequest::default().to_http_request()
    }

    /// Request carrying a single cookie, as a browser would send it back
    #[must_use]
    pub fn with_cookie(cookie: Cookie<'static>) -> HttpRequest {
        Self::with_cookies([cookie])
    }

    #[must_use]
    pub fn with_cookies(cookies: impl IntoIterator<Item = Cookie<'static>>) -> HttpRequest {
        cookies
            .into_iter()
            .fold(test::TestRequest::default(), |req, cookie| {
                // Browsers send back name and value only
                req.cookie(Cookie::new(
                    cookie.name().to_string(),
                    cookie.value().to_string(),
                ))
            })
            .to_http_request()
    }
}
