use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::applications::{ApplicationReview, ReviewDecision, ReviewInput};
use super::attachments::AttachmentLinker;
use super::categories::CategoryRegistry;
use super::credentials::CredentialHasher;
use super::domain::{
    ApplicationId, AttachmentId, AttachmentUpload, CategoryId, ListingId, VendorId,
};
use super::error::WorkflowError;
use super::identity::Identity;
use super::invites::InviteService;
use super::listings::{AdvanceTarget, CreateListingInput, ListingLifecycle, UpdateListingInput};
use super::notify::Notifier;
use super::onboarding::{RegisterVendorInput, VendorOnboarding, VendorReview};
use super::store::MarketplaceStore;

/// Every workflow service wired over one store, notifier, and hasher.
pub struct MarketplaceServices<S, N, H> {
    pub categories: CategoryRegistry<S>,
    pub invites: InviteService<S, N>,
    pub onboarding: VendorOnboarding<S, N, H>,
    pub listings: ListingLifecycle<S>,
    pub applications: ApplicationReview<S, N>,
    pub attachments: AttachmentLinker<S>,
}

impl<S, N, H> MarketplaceServices<S, N, H>
where
    S: MarketplaceStore,
    N: Notifier,
    H: CredentialHasher,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, hasher: Arc<H>, client_url: String) -> Self {
        let invites = InviteService::new(store.clone(), notifier.clone(), client_url);
        Self {
            categories: CategoryRegistry::new(store.clone()),
            onboarding: VendorOnboarding::new(store.clone(), invites.clone(), hasher),
            listings: ListingLifecycle::new(store.clone()),
            applications: ApplicationReview::new(store.clone(), notifier),
            attachments: AttachmentLinker::new(store),
            invites,
        }
    }
}

/// Router builder exposing the marketplace workflow over HTTP.
pub fn marketplace_router<S, N, H>(services: Arc<MarketplaceServices<S, N, H>>) -> Router
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    Router::new()
        .route(
            "/api/v1/categories",
            post(create_category_handler::<S, N, H>).get(list_categories_handler::<S, N, H>),
        )
        .route(
            "/api/v1/categories/:category_id",
            get(get_category_handler::<S, N, H>)
                .patch(rename_category_handler::<S, N, H>)
                .delete(delete_category_handler::<S, N, H>),
        )
        .route("/api/v1/vendors/invites", post(issue_invite_handler::<S, N, H>))
        .route("/api/v1/vendors/register", post(register_vendor_handler::<S, N, H>))
        .route("/api/v1/vendors", get(list_vendors_handler::<S, N, H>))
        .route("/api/v1/vendors/:vendor_id", get(get_vendor_handler::<S, N, H>))
        .route(
            "/api/v1/vendors/:vendor_id/status",
            post(review_vendor_handler::<S, N, H>),
        )
        .route(
            "/api/v1/listings",
            post(create_listing_handler::<S, N, H>).get(list_listings_handler::<S, N, H>),
        )
        .route(
            "/api/v1/listings/:listing_id",
            get(get_listing_handler::<S, N, H>)
                .patch(update_listing_handler::<S, N, H>)
                .delete(delete_listing_handler::<S, N, H>),
        )
        .route(
            "/api/v1/listings/:listing_id/status",
            post(advance_listing_handler::<S, N, H>),
        )
        .route(
            "/api/v1/listings/:listing_id/deactivate",
            post(deactivate_listing_handler::<S, N, H>),
        )
        .route(
            "/api/v1/listings/:listing_id/applications",
            post(apply_handler::<S, N, H>).get(list_applications_handler::<S, N, H>),
        )
        .route(
            "/api/v1/listings/:listing_id/applications/:application_id/review",
            post(review_application_handler::<S, N, H>),
        )
        .route(
            "/api/v1/listings/:listing_id/applications/:application_id/report",
            post(report_handler::<S, N, H>),
        )
        .route(
            "/api/v1/applications/:application_id/deactivate",
            post(deactivate_application_handler::<S, N, H>),
        )
        .route(
            "/api/v1/attachments/:attachment_id",
            get(download_attachment_handler::<S, N, H>),
        )
        .with_state(services)
}

/// Maps the workflow failure taxonomy onto HTTP statuses.
pub(crate) fn error_response(err: WorkflowError) -> Response {
    let status = match &err {
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::Conflict(_) | WorkflowError::AlreadyAwarded => StatusCode::CONFLICT,
        WorkflowError::BadRequest(_) | WorkflowError::InvalidInvite => StatusCode::BAD_REQUEST,
        WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}

/// Reads the caller identity the host's auth layer forwarded. The engine
/// trusts these headers; verifying them is the host's concern.
pub(crate) fn caller_identity(headers: &HeaderMap) -> Result<Identity, WorkflowError> {
    let role = headers
        .get("x-role")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WorkflowError::bad_request("missing caller role"))?;

    match role {
        "ADMIN" => Ok(Identity::admin()),
        "VENDOR" => {
            let raw = headers
                .get("x-vendor-id")
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| WorkflowError::bad_request("missing vendor id"))?;
            let id = raw
                .parse::<Uuid>()
                .map_err(|_| WorkflowError::bad_request("invalid vendor id"))?;
            Ok(Identity::vendor(VendorId(id)))
        }
        _ => Err(WorkflowError::bad_request("unrecognized caller role")),
    }
}

#[derive(Debug, Deserialize)]
struct CreateCategoryRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenameCategoryRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IssueInviteRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct RegisterVendorRequest {
    #[serde(flatten)]
    input: RegisterVendorInput,
    #[serde(default)]
    attachments: Vec<AttachmentUpload>,
}

#[derive(Debug, Deserialize)]
struct ReviewVendorRequest {
    status: VendorReview,
}

#[derive(Debug, Deserialize)]
struct CreateListingRequest {
    #[serde(flatten)]
    input: CreateListingInput,
    #[serde(default)]
    attachments: Vec<AttachmentUpload>,
}

#[derive(Debug, Deserialize)]
struct UpdateListingRequest {
    #[serde(flatten)]
    input: UpdateListingInput,
    #[serde(default)]
    attachments: Vec<AttachmentUpload>,
}

#[derive(Debug, Deserialize)]
struct AdvanceListingRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ApplyRequest {
    comment: String,
    #[serde(default)]
    attachments: Vec<AttachmentUpload>,
}

#[derive(Debug, Deserialize)]
struct ReviewApplicationRequest {
    vendor_id: VendorId,
    decision: String,
    #[serde(default)]
    delivery_date: Option<NaiveDate>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    attachments: Vec<AttachmentUpload>,
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    comment: String,
    #[serde(default)]
    attachments: Vec<AttachmentUpload>,
}

async fn create_category_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    axum::Json(payload): axum::Json<CreateCategoryRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.categories.create(payload.name, payload.description) {
        Ok(category) => (StatusCode::CREATED, axum::Json(category)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_categories_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.categories.list() {
        Ok(categories) => (StatusCode::OK, axum::Json(categories)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_category_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(category_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.categories.get(CategoryId(category_id)) {
        Ok(category) => (StatusCode::OK, axum::Json(category)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn rename_category_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(category_id): Path<Uuid>,
    axum::Json(payload): axum::Json<RenameCategoryRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services
        .categories
        .rename(CategoryId(category_id), payload.name)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_category_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(category_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.categories.delete(CategoryId(category_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn issue_invite_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    axum::Json(payload): axum::Json<IssueInviteRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.invites.issue(&payload.email, Utc::now()) {
        Ok(invite) => (StatusCode::CREATED, axum::Json(invite)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn register_vendor_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    axum::Json(payload): axum::Json<RegisterVendorRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services
        .onboarding
        .register(payload.input, payload.attachments, Utc::now())
    {
        Ok(vendor_id) => (
            StatusCode::CREATED,
            axum::Json(json!({ "vendor_id": vendor_id })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_vendors_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.onboarding.list() {
        Ok(vendors) => (StatusCode::OK, axum::Json(vendors)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_vendor_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(vendor_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.onboarding.get(VendorId(vendor_id)) {
        Ok(vendor) => (StatusCode::OK, axum::Json(vendor)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn review_vendor_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(vendor_id): Path<Uuid>,
    axum::Json(payload): axum::Json<ReviewVendorRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services
        .onboarding
        .review_status(VendorId(vendor_id), payload.status)
    {
        Ok(vendor) => (StatusCode::OK, axum::Json(vendor)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_listing_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    axum::Json(payload): axum::Json<CreateListingRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.listings.create(payload.input, payload.attachments) {
        Ok(listing) => (StatusCode::CREATED, axum::Json(listing)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_listings_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.listings.list() {
        Ok(listings) => (StatusCode::OK, axum::Json(listings)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_listing_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.listings.get(ListingId(listing_id)) {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_listing_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(listing_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateListingRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services
        .listings
        .update(ListingId(listing_id), payload.input, payload.attachments)
    {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_listing_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.listings.delete(ListingId(listing_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn advance_listing_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(listing_id): Path<Uuid>,
    axum::Json(payload): axum::Json<AdvanceListingRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    let Some(target) = AdvanceTarget::parse(&payload.status) else {
        return error_response(WorkflowError::bad_request("invalid status"));
    };
    match services.listings.advance(ListingId(listing_id), target) {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn deactivate_listing_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.listings.deactivate(ListingId(listing_id)) {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn apply_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(listing_id): Path<Uuid>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<ApplyRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    let identity = match caller_identity(&headers) {
        Ok(identity) => identity,
        Err(err) => return error_response(err),
    };
    match services.applications.apply(
        ListingId(listing_id),
        &identity,
        payload.comment,
        payload.attachments,
    ) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_applications_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.applications.list_for_listing(ListingId(listing_id)) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn review_application_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path((listing_id, application_id)): Path<(Uuid, Uuid)>,
    axum::Json(payload): axum::Json<ReviewApplicationRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    let Some(decision) = ReviewDecision::parse(&payload.decision) else {
        return error_response(WorkflowError::bad_request("invalid decision"));
    };
    let input = ReviewInput {
        application_id: ApplicationId(application_id),
        vendor_id: payload.vendor_id,
        listing_id: ListingId(listing_id),
        decision,
        delivery_date: payload.delivery_date,
        description: payload.description,
    };
    match services.applications.review(input, payload.attachments) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn report_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path((listing_id, application_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<ReportRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    let identity = match caller_identity(&headers) {
        Ok(identity) => identity,
        Err(err) => return error_response(err),
    };
    match services.applications.report(
        ListingId(listing_id),
        ApplicationId(application_id),
        &identity,
        payload.comment,
        payload.attachments,
    ) {
        Ok(report) => (StatusCode::CREATED, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn deactivate_application_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(application_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services
        .applications
        .deactivate(ApplicationId(application_id))
    {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn download_attachment_handler<S, N, H>(
    State(services): State<Arc<MarketplaceServices<S, N, H>>>,
    Path(attachment_id): Path<Uuid>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: Notifier + 'static,
    H: CredentialHasher + 'static,
{
    match services.attachments.fetch(AttachmentId(attachment_id)) {
        Ok(attachment) => {
            let content_type = header::HeaderValue::from_str(&attachment.mime_type)
                .unwrap_or_else(|_| header::HeaderValue::from_static("application/octet-stream"));
            let disposition = header::HeaderValue::from_str(&format!(
                "attachment; filename=\"{}\"",
                attachment.name.replace('"', "_")
            ))
            .unwrap_or_else(|_| header::HeaderValue::from_static("attachment"));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                attachment.bytes,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}
