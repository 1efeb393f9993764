//! HTTP handler functions for the alert-front API.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use alert_front_database::{ReportFilter, StoreError, cleanup};
use alert_front_report_models::ReportStatus;
use alert_front_server_models::{
    ApiError, ApiHealth, ApiReport, CleanupResponse, CreateReportRequest, CreateReportResponse,
    ReportListParams, UpdateStatusRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/reports`
///
/// Validates and persists a report, then schedules the mass alert for
/// high-urgency reports. The response does not wait for the alert.
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<CreateReportRequest>,
) -> HttpResponse {
    let new_report = match body.into_inner().into_new_report() {
        Ok(new_report) => new_report,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    if let Err(e) = new_report.validate() {
        return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
    }

    let report = match state.store.insert(new_report).await {
        Ok(report) => report,
        Err(e) => {
            log::error!("Failed to persist report: {e}");
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to create report"));
        }
    };

    log::info!(
        "Created report {} ({} urgency) at ({}, {})",
        report.id,
        report.urgency,
        report.latitude,
        report.longitude
    );

    let id = report.id.clone();
    if report.urgency.triggers_mass_alert() {
        let dispatcher = state.dispatcher.clone();
        actix_web::rt::spawn(async move {
            dispatcher.handle_new_report(&report).await;
        });
    }

    HttpResponse::Created().json(CreateReportResponse { id })
}

/// `GET /api/reports`
///
/// Lists reports newest first, optionally filtered by status.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportListParams>,
) -> HttpResponse {
    let status = match params.status.as_deref().map(str::parse::<ReportStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(_)) => {
            return HttpResponse::BadRequest().json(ApiError::new(format!(
                "Unknown status: {}",
                params.status.as_deref().unwrap_or_default()
            )));
        }
    };

    let defaults = ReportFilter::default();
    let filter = ReportFilter {
        status,
        limit: params.limit.unwrap_or(defaults.limit),
        offset: params.offset.unwrap_or(defaults.offset),
    };

    match state.store.list(filter).await {
        Ok(reports) => {
            let reports: Vec<ApiReport> = reports.into_iter().map(ApiReport::from).collect();
            HttpResponse::Ok().json(reports)
        }
        Err(e) => {
            log::error!("Failed to list reports: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to list reports"))
        }
    }
}

/// `GET /api/reports/{id}`
pub async fn get_report(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state.store.get(&id).await {
        Ok(Some(report)) => HttpResponse::Ok().json(ApiReport::from(report)),
        Ok(None) => HttpResponse::NotFound().json(ApiError::new(format!("Report not found: {id}"))),
        Err(e) => {
            log::error!("Failed to load report {id}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to load report"))
        }
    }
}

/// `PATCH /api/reports/{id}/status`
///
/// Moves a report forward in its lifecycle. Backward moves get `409`.
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let Ok(status) = body.status.trim().parse::<ReportStatus>() else {
        return HttpResponse::BadRequest()
            .json(ApiError::new(format!("Unknown status: {}", body.status)));
    };

    match state.store.update_status(&id, status).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e @ StoreError::NotFound { .. }) => {
            HttpResponse::NotFound().json(ApiError::new(e.to_string()))
        }
        Err(e @ (StoreError::InvalidTransition(_) | StoreError::Conflict { .. })) => {
            HttpResponse::Conflict().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Failed to update status of report {id}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to update report"))
        }
    }
}

/// `POST /api/cron/cleanup`
///
/// Deletes reports resolved longer ago than the retention period. When a
/// cron secret is configured the request must present it as a bearer
/// token.
pub async fn cleanup(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(secret) = &state.config.cron_secret {
        let expected = format!("Bearer {secret}");
        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            log::warn!("Rejected cleanup request without valid cron secret");
            return HttpResponse::Unauthorized().json(ApiError::new("Unauthorized"));
        }
    }

    match cleanup::sweep(
        state.store.as_ref(),
        state.config.retention_days,
        chrono::Utc::now(),
    )
    .await
    {
        Ok(deleted) => HttpResponse::Ok().json(CleanupResponse { deleted }),
        Err(e) => {
            log::error!("Cleanup sweep failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Cleanup failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use alert_front_database::{MemoryReportStore, ReportStore};
    use alert_front_dispatch::{DispatchConfig, MassAlertDispatcher};
    use alert_front_notify::{AlertMessage, DeliveryReceipt, NotificationSender, NotifyError};
    use alert_front_report_models::{NewReport, Report, Urgency};
    use chrono::Utc;

    use super::*;
    use crate::{ServerConfig, configure};

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(
            &self,
            recipient: &str,
            _message: &AlertMessage,
        ) -> Result<DeliveryReceipt, NotifyError> {
            self.sent.lock().unwrap().push(recipient.to_string());
            Ok(DeliveryReceipt {
                recipient: recipient.to_string(),
                message_id: "SM1".to_string(),
                status: "queued".to_string(),
            })
        }
    }

    fn state(
        store: Arc<MemoryReportStore>,
        sender: Arc<RecordingSender>,
        config: ServerConfig,
    ) -> web::Data<AppState> {
        let dispatcher = MassAlertDispatcher::new(store.clone(), sender, DispatchConfig::default());
        web::Data::new(AppState {
            store,
            dispatcher: Arc::new(dispatcher),
            config,
        })
    }

    fn body(urgency: &str) -> serde_json::Value {
        serde_json::json!({
            "description": "Collapsed scaffolding on Market Street",
            "urgency": urgency,
            "latitude": 40.7128,
            "longitude": -74.0060,
            "reportedBy": "+15550009999"
        })
    }

    fn neighbour(id: &str, reporter: &str) -> Report {
        Report::from_new(
            id.to_string(),
            NewReport {
                description: "Earlier hazard a few blocks away".to_string(),
                urgency: Urgency::Low,
                latitude: 40.7140,
                longitude: -74.0050,
                image_url: None,
                reported_by: reporter.to_string(),
            },
            Utc::now(),
        )
    }

    #[actix_web::test]
    async fn create_report_returns_201_with_id() {
        let store = Arc::new(MemoryReportStore::new());
        let sender = Arc::new(RecordingSender::default());
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone(), sender, ServerConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(body("Moderate"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let created: CreateReportResponse = test::read_body_json(resp).await;
        let stored = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.urgency, Urgency::Moderate);
        assert_eq!(stored.status, ReportStatus::New);
    }

    #[actix_web::test]
    async fn invalid_report_is_rejected_with_400() {
        let store = Arc::new(MemoryReportStore::new());
        let app = test::init_service(
            App::new()
                .app_data(state(
                    store.clone(),
                    Arc::new(RecordingSender::default()),
                    ServerConfig::default(),
                ))
                .configure(configure),
        )
        .await;

        let mut short = body("High");
        short["description"] = serde_json::json!("too short");
        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(short)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(body("Critical"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(serde_json::json!({"description": 5}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(store.is_empty().await);
    }

    #[actix_web::test]
    async fn high_urgency_report_alerts_neighbours_once() {
        let store = Arc::new(MemoryReportStore::new());
        store.put(neighbour("n1", "+15551110000")).await;
        store.put(neighbour("n2", "+15551110000")).await;
        store.put(neighbour("n3", "+15552220000")).await;
        let sender = Arc::new(RecordingSender::default());
        let app = test::init_service(
            App::new()
                .app_data(state(store, sender.clone(), ServerConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(body("High"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        actix_web::rt::time::sleep(Duration::from_millis(100)).await;
        let mut sent = sender.sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["+15551110000", "+15552220000"]);
    }

    #[actix_web::test]
    async fn low_urgency_report_sends_nothing() {
        let store = Arc::new(MemoryReportStore::new());
        store.put(neighbour("n1", "+15551110000")).await;
        let sender = Arc::new(RecordingSender::default());
        let app = test::init_service(
            App::new()
                .app_data(state(store, sender.clone(), ServerConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(body("Low"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        actix_web::rt::time::sleep(Duration::from_millis(50)).await;
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn status_updates_move_forward_only() {
        let store = Arc::new(MemoryReportStore::new());
        store.put(neighbour("r1", "a")).await;
        let app = test::init_service(
            App::new()
                .app_data(state(
                    store,
                    Arc::new(RecordingSender::default()),
                    ServerConfig::default(),
                ))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/api/reports/r1/status")
            .set_json(serde_json::json!({"status": "Resolved"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let report: ApiReport = test::read_body_json(resp).await;
        assert_eq!(report.status, ReportStatus::Resolved);
        assert!(report.resolved_at.is_some());

        let req = test::TestRequest::patch()
            .uri("/api/reports/r1/status")
            .set_json(serde_json::json!({"status": "InProgress"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CONFLICT
        );

        let req = test::TestRequest::patch()
            .uri("/api/reports/missing/status")
            .set_json(serde_json::json!({"status": "InProgress"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn get_and_list_reports() {
        let store = Arc::new(MemoryReportStore::new());
        store.put(neighbour("r1", "a")).await;
        store.put(neighbour("r2", "b")).await;
        let app = test::init_service(
            App::new()
                .app_data(state(
                    store,
                    Arc::new(RecordingSender::default()),
                    ServerConfig::default(),
                ))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/reports/r2").to_request();
        let report: ApiReport = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report.reported_by, "b");

        let req = test::TestRequest::get().uri("/api/reports/nope").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::get()
            .uri("/api/reports?status=New&limit=1")
            .to_request();
        let reports: Vec<ApiReport> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reports.len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/reports?status=Archived")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn cleanup_requires_cron_secret_when_configured() {
        let store = Arc::new(MemoryReportStore::new());
        let mut stale = neighbour("stale", "a");
        stale
            .apply_status(ReportStatus::Resolved, Utc::now() - chrono::Duration::days(45))
            .unwrap();
        store.put(stale).await;

        let config = ServerConfig {
            cron_secret: Some("s3cret".to_string()),
            ..ServerConfig::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(state(
                    store.clone(),
                    Arc::new(RecordingSender::default()),
                    config,
                ))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/cron/cleanup").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(store.len().await, 1);

        let req = test::TestRequest::post()
            .uri("/api/cron/cleanup")
            .insert_header((header::AUTHORIZATION, "Bearer s3cret"))
            .to_request();
        let resp: CleanupResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.deleted, 1);
        assert!(store.is_empty().await);
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(health.healthy);
    }
}
