//! Response helpers shared by the handlers

use actix_web::{cookie::Cookie, http::header, HttpResponse};
use serde::Serialize;

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Start a `302 Found` redirect to `location`
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// `200 OK` with an HTML body
    #[must_use]
    pub fn html(body: String) -> HttpResponse {
        HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .body(body)
    }

    /// `200 OK` with a JSON body
    #[must_use]
    pub fn ok_json<T: Serialize>(body: &T) -> HttpResponse {
        HttpResponse::Ok().json(body)
    }

    /// `500` with a JSON error body; never carries internal details
    #[must_use]
    pub fn internal_server_error() -> HttpResponse {
        HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "server_error",
            "error_description": "An internal server error occurred"
        }))
    }
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
}

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: impl IntoIterator<Item = Cookie<'static>>) -> Self {
        self.cookies.extend(cookies);
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder
            .insert_header((header::LOCATION, self.location))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_redirect_sets_location_and_cookies() {
        let response = ResponseBuilder::redirect("/private")
            .with_cookie(Cookie::new("a", "1"))
            .with_cookies([Cookie::new("b", "2")])
            .build();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/private"
        );
        let names: Vec<_> = response.cookies().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_html_content_type() {
        let response = ResponseBuilder::html("<p>hi</p>".to_string());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }
}
