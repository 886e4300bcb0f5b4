// Page handlers: start, protected, rejected and health
use crate::handlers::gate::AuthenticatedSession;
use crate::models::HealthResponse;
use crate::utils::responses::ResponseBuilder;
use crate::views::ViewRenderer;
use actix_web::{web, HttpResponse};

fn html_or_error(rendered: Result<String, handlebars::RenderError>, view: &str) -> HttpResponse {
    match rendered {
        Ok(body) => ResponseBuilder::html(body),
        Err(e) => {
            log::error!("Failed to render {view} view: {e}");
            ResponseBuilder::internal_server_error()
        }
    }
}

/// Public start page
pub async fn index(views: web::Data<ViewRenderer>) -> HttpResponse {
    html_or_error(views.render_index(), "index")
}

/// Protected view; only reachable through the session gate
pub async fn private_view(
    session: AuthenticatedSession,
    views: web::Data<ViewRenderer>,
) -> HttpResponse {
    html_or_error(views.render_success(&session.record().identity), "success")
}

/// Rejection page, rendered regardless of session state
pub async fn not_follow(views: web::Data<ViewRenderer>) -> HttpResponse {
    html_or_error(views.render_not_follow(), "not_follow")
}

pub async fn health() -> HttpResponse {
    ResponseBuilder::ok_json(&HealthResponse {
        status: "ok".to_string(),
        message: "followgate is running".to_string(),
    })
}
