#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for alert-front.
//!
//! Serves the hazard report REST API. Report creation persists the report
//! first, responds `201`, and hands high-urgency reports to the
//! [`MassAlertDispatcher`] on a background task so that alert delivery
//! never delays or fails the submission.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use alert_front_database::{ReportStore, StoreError, cleanup};
use alert_front_dispatch::{DispatchConfig, DispatchError, MassAlertDispatcher};
use alert_front_notify::NotifyError;
use alert_front_server_models::ApiError;
use thiserror::Error;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The report store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The notification sender could not be configured.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// The dispatcher configuration is invalid.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Binding or running the HTTP server failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Days a resolved report is kept (`CLEANUP_RETENTION_DAYS`).
    pub retention_days: u32,
    /// Bearer token required by the cleanup endpoint (`CRON_SECRET`).
    pub cron_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            retention_days: cleanup::DEFAULT_RETENTION_DAYS,
            cron_secret: None,
        }
    }
}

impl ServerConfig {
    /// Reads the settings, falling back to defaults for unset or
    /// unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            retention_days: std::env::var("CLEANUP_RETENTION_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(defaults.retention_days),
            cron_secret: std::env::var("CRON_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Report storage.
    pub store: Arc<dyn ReportStore>,
    /// Mass-alert dispatcher for high-urgency reports.
    pub dispatcher: Arc<MassAlertDispatcher>,
    /// Server settings.
    pub config: ServerConfig,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let body = ApiError::new(err.to_string());
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.app_data(json_config).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports", web::post().to(handlers::create_report))
            .route("/reports/{id}", web::get().to(handlers::get_report))
            .route(
                "/reports/{id}/status",
                web::patch().to(handlers::update_status),
            )
            .route("/cron/cleanup", web::post().to(handlers::cleanup)),
    );
}

/// Starts the alert-front API server.
///
/// Opens the report store named by `DATABASE_URL`, builds the notification
/// sender and dispatcher from the environment, and runs the HTTP server
/// until shutdown. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the store, sender or dispatcher cannot be
/// set up, or the server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    let config = ServerConfig::from_env();

    log::info!("Opening report store...");
    let store = alert_front_database::open_store_from_env().await?;

    let sender = alert_front_notify::create_sender_from_env()?;
    let dispatch_config = DispatchConfig::from_env()?;
    log::info!("Mass alerts cover {} km", dispatch_config.radius_km);

    let dispatcher = Arc::new(MassAlertDispatcher::new(
        store.clone(),
        sender,
        dispatch_config,
    ));

    let bind_addr = config.bind_addr.clone();
    let port = config.port;

    let state = web::Data::new(AppState {
        store,
        dispatcher,
        config,
    });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
