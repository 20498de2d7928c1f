use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::marketplace::applications::{
    ApplicationReview, ReviewDecision, ReviewInput,
};
use crate::workflows::marketplace::attachments::AttachmentLinker;
use crate::workflows::marketplace::categories::CategoryRegistry;
use crate::workflows::marketplace::credentials::OpaqueCredentialHasher;
use crate::workflows::marketplace::domain::{
    Application, AttachmentUpload, Listing, VendorId,
};
use crate::workflows::marketplace::identity::Identity;
use crate::workflows::marketplace::invites::InviteService;
use crate::workflows::marketplace::listings::{CreateListingInput, ListingLifecycle};
use crate::workflows::marketplace::memory::MemoryStore;
use crate::workflows::marketplace::notify::{MailMessage, Notifier, NotifyError};
use crate::workflows::marketplace::onboarding::{
    RegisterVendorInput, VendorOnboarding, VendorReview,
};
use crate::workflows::marketplace::router::{marketplace_router, MarketplaceServices};

pub(super) const CLIENT_URL: &str = "http://client.test";

/// Captures every outbound mail for assertions.
#[derive(Default)]
pub(super) struct RecordingNotifier {
    messages: Mutex<Vec<MailMessage>>,
}

impl RecordingNotifier {
    pub(super) fn messages(&self) -> Vec<MailMessage> {
        self.messages.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .expect("notifier mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

/// Always refuses delivery, for the failures-are-ignored contract.
pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, _message: &MailMessage) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct Harness {
    pub(super) store: Arc<MemoryStore>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) categories: CategoryRegistry<MemoryStore>,
    pub(super) invites: InviteService<MemoryStore, RecordingNotifier>,
    pub(super) onboarding:
        VendorOnboarding<MemoryStore, RecordingNotifier, OpaqueCredentialHasher>,
    pub(super) listings: ListingLifecycle<MemoryStore>,
    pub(super) applications: ApplicationReview<MemoryStore, RecordingNotifier>,
    pub(super) linker: AttachmentLinker<MemoryStore>,
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let invites = InviteService::new(store.clone(), notifier.clone(), CLIENT_URL.to_string());
    Harness {
        categories: CategoryRegistry::new(store.clone()),
        onboarding: VendorOnboarding::new(
            store.clone(),
            invites.clone(),
            Arc::new(OpaqueCredentialHasher),
        ),
        listings: ListingLifecycle::new(store.clone()),
        applications: ApplicationReview::new(store.clone(), notifier.clone()),
        linker: AttachmentLinker::new(store.clone()),
        invites,
        store,
        notifier,
    }
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn upload(name: &str) -> AttachmentUpload {
    AttachmentUpload {
        name: name.to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.4 fixture".to_vec(),
    }
}

pub(super) fn business_email(tag: &str) -> String {
    format!("vendor-{tag}@example.com")
}

pub(super) fn register_input(token: &str, tag: &str) -> RegisterVendorInput {
    RegisterVendorInput {
        invite_token: token.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Okafor".to_string(),
        email: format!("owner-{tag}@example.com"),
        phone_number: format!("+1-555-1-{tag}"),
        address: "12 Canal Street".to_string(),
        business_name: format!("Vendor {tag}"),
        business_email: business_email(tag),
        business_phone_number: format!("+1-555-2-{tag}"),
        other_phone_number: None,
        business_address: "Unit 4, Dockside Park".to_string(),
        category: "Electrical".to_string(),
    }
}

/// Runs the full onboarding path and approves the vendor.
pub(super) fn approved_vendor(h: &Harness, tag: &str) -> VendorId {
    let invite = h
        .invites
        .issue(&business_email(tag), now())
        .expect("invite issues");
    let vendor_id = h
        .onboarding
        .register(register_input(&invite.token, tag), Vec::new(), now())
        .expect("vendor registers");
    h.onboarding
        .review_status(vendor_id, VendorReview::Approved)
        .expect("vendor approves");
    vendor_id
}

/// A pending listing open to all vendors, with its own category.
pub(super) fn open_listing(h: &Harness) -> Listing {
    let category = h
        .categories
        .create("Rewiring".to_string(), None)
        .expect("category creates");
    h.listings
        .create(
            CreateListingInput {
                name: "Block C rewiring".to_string(),
                description: "Full rewiring of block C".to_string(),
                category_id: category.id,
                allowed_vendors: BTreeSet::new(),
            },
            Vec::new(),
        )
        .expect("listing creates")
}

pub(super) fn apply_for(h: &Harness, listing: &Listing, vendor_id: VendorId) -> Application {
    h.applications
        .apply(
            listing.id,
            &Identity::vendor(vendor_id),
            "Crew ready".to_string(),
            Vec::new(),
        )
        .expect("application files")
}

pub(super) fn award(h: &Harness, listing: &Listing, application: &Application) -> Application {
    h.applications
        .review(
            ReviewInput {
                application_id: application.id,
                vendor_id: application.vendor_id,
                listing_id: listing.id,
                decision: ReviewDecision::Awarded,
                delivery_date: None,
                description: None,
            },
            Vec::new(),
        )
        .expect("award succeeds")
}

pub(super) type TestServices =
    MarketplaceServices<MemoryStore, RecordingNotifier, OpaqueCredentialHasher>;

pub(super) fn test_router() -> (axum::Router, Arc<TestServices>) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let services = Arc::new(MarketplaceServices::new(
        store,
        notifier,
        Arc::new(OpaqueCredentialHasher),
        CLIENT_URL.to_string(),
    ));
    (marketplace_router(services.clone()), services)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
