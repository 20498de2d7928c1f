use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tracing::info;
use vendor_hub::config::AppConfig;
use vendor_hub::error::AppError;
use vendor_hub::telemetry;
use vendor_hub::workflows::marketplace::{
    marketplace_router, AdvanceTarget, AttachmentUpload, CreateListingInput, Identity,
    LoggingNotifier, MarketplaceServices, MemoryStore, OpaqueCredentialHasher,
    RegisterVendorInput, ReviewDecision, ReviewInput, VendorReview,
};

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "vendor-hub",
    about = "Run the vendor marketplace workflow service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk the award lifecycle against an in-memory store
    Demo,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo => run_demo(),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(LoggingNotifier);
    let hasher = Arc::new(OpaqueCredentialHasher);
    let services = Arc::new(MarketplaceServices::new(
        store,
        notifier,
        hasher,
        config.client.base_url.clone(),
    ));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(marketplace_router(services))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "vendor marketplace service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn run_demo() -> Result<(), AppError> {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(LoggingNotifier);
    let hasher = Arc::new(OpaqueCredentialHasher);
    let services = MarketplaceServices::new(
        store,
        notifier,
        hasher,
        "http://localhost:5173".to_string(),
    );
    let now = Utc::now();

    println!("Vendor marketplace workflow demo");

    let category = services
        .categories
        .create("Electrical".to_string(), Some("Electrical works".to_string()))?;
    println!("Created category '{}'", category.name);

    let invite = services.invites.issue("quotes@auroravolt.example", now)?;
    println!(
        "Invited {} (token expires {})",
        invite.email,
        invite.expires_at.format("%Y-%m-%d")
    );

    let vendor_id = services.onboarding.register(
        RegisterVendorInput {
            invite_token: invite.token.clone(),
            first_name: "Ada".to_string(),
            last_name: "Okafor".to_string(),
            email: "ada.okafor@example.com".to_string(),
            phone_number: "+1-555-0100".to_string(),
            address: "12 Canal Street".to_string(),
            business_name: "Aurora Volt Ltd".to_string(),
            business_email: "quotes@auroravolt.example".to_string(),
            business_phone_number: "+1-555-0101".to_string(),
            other_phone_number: None,
            business_address: "Unit 4, Dockside Park".to_string(),
            category: "Electrical".to_string(),
        },
        vec![AttachmentUpload {
            name: "insurance-certificate.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4 demo".to_vec(),
        }],
        now,
    )?;
    println!("Registered vendor {vendor_id} (pending review)");

    let vendor = services
        .onboarding
        .review_status(vendor_id, VendorReview::Approved)?;
    println!(
        "Vendor '{}' is now {}",
        vendor.business_name,
        vendor.status.label()
    );

    let listing = services.listings.create(
        CreateListingInput {
            name: "Block C rewiring".to_string(),
            description: "Full rewiring of block C, floors 1-3".to_string(),
            category_id: category.id,
            allowed_vendors: BTreeSet::new(),
        },
        Vec::new(),
    )?;
    println!(
        "Opened listing '{}' ({})",
        listing.name,
        listing.status.label()
    );

    let identity = Identity::vendor(vendor_id);
    let application = services.applications.apply(
        listing.id,
        &identity,
        "Crew available from next month".to_string(),
        Vec::new(),
    )?;
    println!("Vendor applied ({})", application.status.label());

    let reviewed = services.applications.review(
        ReviewInput {
            application_id: application.id,
            vendor_id,
            listing_id: listing.id,
            decision: ReviewDecision::Awarded,
            delivery_date: Some(now.date_naive() + Duration::days(30)),
            description: Some("Deliver within 30 days".to_string()),
        },
        Vec::new(),
    )?;
    println!(
        "Application {}, listing awarded to '{}'",
        reviewed.status.label(),
        vendor.business_name
    );

    let second_attempt = services.applications.review(
        ReviewInput {
            application_id: application.id,
            vendor_id,
            listing_id: listing.id,
            decision: ReviewDecision::Awarded,
            delivery_date: None,
            description: None,
        },
        Vec::new(),
    );
    match second_attempt {
        Err(err) => println!("Second award attempt rejected: {err}"),
        Ok(_) => println!("Second award attempt unexpectedly succeeded"),
    }

    let listing = services.listings.advance(listing.id, AdvanceTarget::Ongoing)?;
    println!("Work started, listing {}", listing.status.label());

    services.applications.report(
        listing.id,
        application.id,
        &identity,
        "Phase one complete, materials on site".to_string(),
        Vec::new(),
    )?;
    println!("Vendor filed a delivery report");

    let listing = services
        .listings
        .advance(listing.id, AdvanceTarget::Delivered)?;
    println!("Listing {}", listing.status.label());

    Ok(())
}
