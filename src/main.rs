mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod logging;
mod mailer;
mod models;
mod reports;

use crate::config::Settings;
use crate::database::{create_pool, run_migrations};
use crate::handlers::AppState;
use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new().expect("Failed to load configuration");

    let log_dir = std::path::Path::new(&settings.logging.audit_log_path)
        .parent()
        .unwrap_or(std::path::Path::new("./logs"));

    logging::init_logging(log_dir, &settings.logging.level)
        .expect("Failed to initialize logging");

    info!("Hospital backend starting...");
    info!("Configuration loaded: {}", settings.server.bind_addr);

    info!("Connecting to SQLite...");
    let pool = create_pool(&settings.database)
        .await
        .expect("Failed to create database pool");

    info!("Running database migrations...");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let session_auth = Arc::new(auth::SessionAuth::new(&settings.session));
    let mailer = Arc::new(
        mailer::Mailer::new(settings.smtp.clone()).expect("Failed to build SMTP transport"),
    );

    let app_state = web::Data::new(AppState {
        pool: pool.clone(),
        session_auth: session_auth.clone(),
        mailer: mailer.clone(),
    });

    info!("All services initialized");
    info!("Starting server on {}", settings.server.bind_addr);

    let bind_addr = settings.server.bind_addr.clone();
    let cors_origins = settings.cors.allowed_origins.clone();

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            // Health check
            .route("/health", web::get().to(handlers::health_check))
            // Landing & authentication
            .route("/", web::get().to(handlers::home))
            .route("/login", web::get().to(handlers::login_page))
            .route("/login", web::post().to(handlers::login))
            .route("/logout", web::get().to(handlers::logout))
            // Role-based dashboard
            .route("/dashboard", web::get().to(handlers::dashboard))
            // Intake
            .route("/patients", web::get().to(handlers::list_patients))
            .route("/patients", web::post().to(handlers::create_patient))
            .route("/doctors", web::get().to(handlers::list_doctors))
            .route("/doctors", web::post().to(handlers::create_doctor))
            // Reports
            .route("/admin/reports", web::get().to(handlers::feedback_reports))
            .route("/export-reports", web::get().to(handlers::export_reports))
    })
    .workers(settings.server.workers.unwrap_or(4))
    .bind(bind_addr)?
    .run()
    .await
}
