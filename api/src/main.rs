//! DetailHub API Server
//!
//! Backend for a car detailing shop: bookings, vehicles, campaigns, equipment,
//! invoices and multi-channel notifications driven by a realtime change feed.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::Database;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;
mod realtime;

#[cfg(test)]
mod test_utils;


use adapters::{
    HttpEmailSender, PostgresAdRepository, PostgresBookingRepository, PostgresCampaignRepository,
    PostgresEquipmentRepository, PostgresInvoiceRepository, PostgresNotificationRepository,
    PostgresPreferencesRepository, PostgresUserRepository, PostgresVehicleRepository,
    WhatsAppCloudSender,
};
use app::{
    AdService, BookingNotifier, BookingService, CampaignService, ClvService, EquipmentMonitor,
    EquipmentService, InvoiceService, NotificationService, UserService, VehicleService,
};
use config::Config;
use realtime::ChangeFeed;

/// Notification service over the production adapters
pub type Notifications = NotificationService<
    PostgresNotificationRepository,
    PostgresPreferencesRepository,
    PostgresUserRepository,
    HttpEmailSender,
    WhatsAppCloudSender,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<PostgresUserRepository>>,
    pub notification_service: Arc<Notifications>,
    pub booking_service:
        Arc<BookingService<PostgresBookingRepository, PostgresVehicleRepository, Notifications>>,
    pub vehicle_service: Arc<VehicleService<PostgresVehicleRepository, PostgresBookingRepository>>,
    pub campaign_service: Arc<
        CampaignService<
            PostgresCampaignRepository,
            PostgresUserRepository,
            PostgresBookingRepository,
            Notifications,
        >,
    >,
    pub equipment_service: Arc<EquipmentService<PostgresEquipmentRepository>>,
    pub invoice_service:
        Arc<InvoiceService<PostgresInvoiceRepository, PostgresUserRepository, Notifications>>,
    pub clv_service: Arc<ClvService<PostgresInvoiceRepository, PostgresUserRepository>>,
    pub ad_service: Arc<AdService<PostgresAdRepository>>,
    pub config: Config,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,detailhub_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DetailHub API...");

    // Load configuration
    let config = Config::from_env()?;

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let feed = ChangeFeed::new(config.realtime_capacity);

    // Create adapters
    let user_repo = Arc::new(PostgresUserRepository::new(db.clone()));
    let notification_repo = Arc::new(PostgresNotificationRepository::new(
        db.clone(),
        feed.clone(),
    ));
    let preferences_repo = Arc::new(PostgresPreferencesRepository::new(db.clone()));
    let booking_repo = Arc::new(PostgresBookingRepository::new(db.clone(), feed.clone()));
    let vehicle_repo = Arc::new(PostgresVehicleRepository::new(db.clone(), feed.clone()));
    let campaign_repo = Arc::new(PostgresCampaignRepository::new(db.clone(), feed.clone()));
    let equipment_repo = Arc::new(PostgresEquipmentRepository::new(db.clone(), feed.clone()));
    let invoice_repo = Arc::new(PostgresInvoiceRepository::new(db.clone(), feed.clone()));
    let ad_repo = Arc::new(PostgresAdRepository::new(db.clone(), feed.clone()));

    if !config.email_enabled() {
        tracing::warn!("Email API not configured, emails will be logged only");
    }
    if !config.whatsapp_enabled() {
        tracing::warn!("WhatsApp Cloud API not configured, messages will be logged only");
    }
    let email_sender = Arc::new(HttpEmailSender::new(config.email.clone()));
    let whatsapp_sender = Arc::new(WhatsAppCloudSender::new(config.whatsapp.clone()));

    // Create application services
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        config.default_country_code.clone(),
    ));

    let notification_service = Arc::new(NotificationService::new(
        notification_repo,
        preferences_repo,
        user_repo.clone(),
        email_sender,
        whatsapp_sender,
        config.default_country_code.clone(),
    ));

    let booking_service = Arc::new(BookingService::new(
        booking_repo.clone(),
        vehicle_repo.clone(),
        notification_service.clone(),
        config.business_hours.clone(),
        config.reminder_lead_hours,
    ));

    let vehicle_service = Arc::new(VehicleService::new(vehicle_repo, booking_repo.clone()));

    let campaign_service = Arc::new(CampaignService::new(
        campaign_repo,
        user_repo.clone(),
        booking_repo,
        notification_service.clone(),
    ));

    let equipment_service = Arc::new(EquipmentService::new(equipment_repo));

    let invoice_service = Arc::new(InvoiceService::new(
        invoice_repo.clone(),
        user_repo.clone(),
        notification_service.clone(),
    ));

    let clv_service = Arc::new(ClvService::new(
        invoice_repo,
        user_repo.clone(),
        config.clv.clone(),
    ));

    let ad_service = Arc::new(AdService::new(ad_repo));

    if let Some(email) = &config.admin_email {
        if let Some(api_key) = user_service.bootstrap_admin(email).await? {
            tracing::info!(
                email = %email,
                api_key = %api_key,
                "Admin account created. Save this API key - it won't be shown again"
            );
        }
    }

    // Realtime consumers live as long as their subscriptions
    let _booking_notifications = Arc::new(BookingNotifier::new(
        notification_service.clone(),
        config.business_hours.utc_offset_minutes,
    ))
    .subscribe(&feed);
    let _equipment_alerts =
        Arc::new(EquipmentMonitor::new(user_repo, notification_service.clone()))
            .subscribe(&feed)?;

    // Booking reminders
    let reminders = booking_service.clone();
    let reminder_every = Duration::from_secs(config.reminder_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reminder_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match reminders.send_due_reminders(Utc::now()).await {
                Ok(0) => {}
                Ok(sent) => tracing::info!(sent = sent, "Booking reminders sent"),
                Err(e) => tracing::warn!(error = %e, "Reminder run failed"),
            }
        }
    });

    // Create app state
    let state = AppState {
        user_service,
        notification_service,
        booking_service,
        vehicle_service,
        campaign_service,
        equipment_service,
        invoice_service,
        clv_service,
        ad_service,
        config: config.clone(),
    };

    // Rate limiting config: 2 req/sec sustained, burst of 5
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    // (SmartIpKeyExtractor requires X-Forwarded-For headers from reverse proxy)
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .context("Failed to build governor config")?,
    );

    // Rate-limited public routes
    let registration = Router::new()
        .route("/api/users/register", post(handlers::register))
        .layer(GovernorLayer {
            config: governor_config.clone(),
        });

    // Rate-limited booking creation
    let booking_creation = Router::new()
        .route("/api/bookings", post(handlers::create_booking))
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Authenticated customer routes
    let protected = Router::new()
        .route("/api/me", get(handlers::me))
        // Notifications
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route("/api/notifications/read-all", post(handlers::mark_all_read))
        .route(
            "/api/notifications/preferences",
            get(handlers::get_preferences).put(handlers::update_preferences),
        )
        .route("/api/notifications/:id/read", post(handlers::mark_read))
        .route(
            "/api/notifications/:id",
            axum::routing::delete(handlers::delete_notification),
        )
        // Bookings
        .route("/api/bookings", get(handlers::list_bookings))
        .merge(booking_creation)
        .route("/api/bookings/:id", get(handlers::get_booking))
        .route("/api/bookings/:id/cancel", post(handlers::cancel_booking))
        .route(
            "/api/bookings/:id/reschedule",
            post(handlers::reschedule_booking),
        )
        // Vehicles
        .route(
            "/api/vehicles",
            get(handlers::list_vehicles).post(handlers::add_vehicle),
        )
        .route(
            "/api/vehicles/:id",
            get(handlers::get_vehicle)
                .patch(handlers::update_vehicle)
                .delete(handlers::delete_vehicle),
        )
        .route("/api/fleet", get(handlers::fleet_overview))
        // Invoices
        .route("/api/invoices", get(handlers::my_invoices))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Admin routes
    let admin = Router::new()
        .route("/api/notifications/send", post(handlers::send_notification))
        .route("/api/notifications/broadcast", post(handlers::broadcast))
        .route("/api/admin/bookings", get(handlers::list_day))
        .route(
            "/api/admin/bookings/:id/status",
            patch(handlers::update_status),
        )
        // Campaigns
        .route(
            "/api/campaigns",
            get(handlers::list_campaigns).post(handlers::create_campaign),
        )
        .route(
            "/api/campaigns/:id",
            get(handlers::get_campaign)
                .patch(handlers::update_campaign)
                .delete(handlers::delete_campaign),
        )
        .route("/api/campaigns/:id/send", post(handlers::send_campaign))
        // Equipment
        .route(
            "/api/admin/equipment",
            get(handlers::list_equipment).post(handlers::create_equipment),
        )
        .route(
            "/api/admin/equipment/maintenance-due",
            get(handlers::maintenance_due),
        )
        .route(
            "/api/admin/equipment/:id",
            get(handlers::get_equipment)
                .patch(handlers::update_equipment)
                .delete(handlers::delete_equipment),
        )
        .route(
            "/api/admin/equipment/:id/maintenance",
            post(handlers::record_maintenance),
        )
        // Invoices and customer value
        .route("/api/admin/invoices", post(handlers::create_invoice))
        .route("/api/admin/invoices/:id/paid", post(handlers::mark_paid))
        .route("/api/admin/invoices/:id/void", post(handlers::void_invoice))
        .route("/api/admin/customers/top", get(handlers::top_customers))
        .route(
            "/api/admin/customers/:id/invoices",
            get(handlers::customer_invoices),
        )
        .route("/api/admin/customers/:id/clv", get(handlers::customer_clv))
        // Ads
        .route(
            "/api/admin/ads",
            get(handlers::list_ads).post(handlers::create_ad),
        )
        .route(
            "/api/admin/ads/:id",
            patch(handlers::update_ad).delete(handlers::delete_ad),
        )
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Build router
    let app = Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        // Webhooks (no auth, uses signature verification)
        .route(
            "/webhooks/whatsapp",
            get(handlers::whatsapp_verify).post(handlers::whatsapp_webhook),
        )
        // Public endpoints
        .route("/api/slots", get(handlers::available_slots))
        .route("/api/ads", get(handlers::live_ads))
        .merge(registration)
        .merge(protected)
        .merge(admin)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
