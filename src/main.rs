#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use followgate::{
    configure_services, routes, settings::Credentials, FollowChecker, GateSettings,
    IdentityVerifier, ProviderClient, SessionManager, ViewRenderer,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from .env, Settings.toml and environment variables
    let settings = GateSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    if let Err(e) = settings.init_logging() {
        eprintln!("Logger already initialised: {e}");
    }

    // Refuse to accept traffic without every required secret
    let credentials = settings.validate().map_err(|e| {
        log::error!("Invalid configuration: {e}");
        std::io::Error::other(format!("Invalid configuration: {e}"))
    })?;

    start_server(settings, credentials).await
}

/// Wire the components and start the server
///
/// # Errors
///
/// Returns an error if:
/// - The provider HTTP client or views cannot be built
/// - Server binding fails
async fn start_server(settings: GateSettings, credentials: Credentials) -> std::io::Result<()> {
    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .map_err(|e| std::io::Error::other(format!("Failed to build HTTP client: {e}")))?;

    let provider = ProviderClient::new(http.clone(), &settings, &credentials);
    let checker = FollowChecker::new(
        http,
        &settings.provider.api_base_url,
        &settings.provider.user_agent,
    );
    let verifier = web::Data::new(IdentityVerifier::new(
        Arc::new(provider),
        Arc::new(checker),
        settings.provider.organization.clone(),
    ));

    let session_manager = web::Data::new(
        SessionManager::new(
            &credentials,
            settings.cookies.secure,
            settings.session.session_duration_hours,
        )
        .map_err(|e| std::io::Error::other(format!("Invalid session settings: {e}")))?,
    );

    let views = web::Data::new(
        ViewRenderer::new(
            std::path::Path::new(&settings.views.folder),
            &settings.provider.organization,
        )
        .map_err(|e| std::io::Error::other(format!("Failed to load views: {e}")))?,
    );

    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    HttpServer::new(move || {
        App::new()
            .app_data(verifier.clone())
            .app_data(session_manager.clone())
            .app_data(views.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &GateSettings) {
    println!(
        "Starting followgate {} on http://{bind_address}",
        followgate::VERSION
    );
    println!(
        "Access requires following: {}",
        settings.provider.organization
    );
    println!();
    println!("Endpoints:");
    println!("  GET  {:<24} - Start page", routes::START_PAGE);
    println!("  GET  {:<24} - Sign in with the provider", routes::LOGIN);
    println!("  GET  {:<24} - OAuth callback", routes::CALLBACK);
    println!("  GET  {:<24} - Followers only", routes::PROTECTED_VIEW);
    println!("  GET  {:<24} - Rejected login", routes::REJECTED_VIEW);
    println!("  GET  {:<24} - Clear session", routes::LOGOUT);
    println!("  GET  {:<24} - Health check", routes::PING);
    println!();
    println!("OAuth callback URL for the provider:");
    println!("  {}", settings.callback_url());
}
