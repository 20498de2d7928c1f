use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Attachment, AttachmentId, AttachmentParent,
    AwardedListing, Category, CategoryId, Invite, InviteId, Listing, ListingId, ListingReport,
    ListingStatus, UserAccount, Vendor, VendorId, VendorStatus,
};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything persisted in one vendor-onboarding transaction. The invite
/// fields are re-verified inside the transaction so a concurrent expiry
/// sweep cannot invalidate a token between validation and consumption.
#[derive(Debug, Clone)]
pub struct VendorOnboardingRecord {
    pub account: UserAccount,
    pub vendor: Vendor,
    pub attachments: Vec<Attachment>,
    pub invite_email: String,
    pub invite_token: String,
    pub now: DateTime<Utc>,
}

/// Storage abstraction for the marketplace workflow engine.
///
/// Every method is atomic with respect to every other method; the composite
/// operations (`onboard_vendor`, `award_application`) bundle the
/// multi-statement transactions the workflows require. Unique constraints
/// (category name, account/vendor email and phone, one application per
/// (listing, vendor) pair) are enforced here and surface as
/// [`StoreError::Conflict`].
pub trait MarketplaceStore: Send + Sync {
    // Categories
    fn insert_category(&self, category: Category) -> Result<(), StoreError>;
    fn category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;
    fn categories(&self) -> Result<Vec<Category>, StoreError>;
    fn rename_category(&self, id: CategoryId, name: String) -> Result<(), StoreError>;
    fn delete_category(&self, id: CategoryId) -> Result<(), StoreError>;
    fn category_in_use(&self, id: CategoryId) -> Result<bool, StoreError>;

    // Vendors and accounts
    fn vendor(&self, id: VendorId) -> Result<Option<Vendor>, StoreError>;
    fn vendors(&self) -> Result<Vec<Vendor>, StoreError>;
    fn set_vendor_status(&self, id: VendorId, status: VendorStatus) -> Result<(), StoreError>;
    fn user_email_exists(&self, email: &str) -> Result<bool, StoreError>;
    fn vendor_email_exists(&self, email: &str) -> Result<bool, StoreError>;
    fn phone_number_in_use(&self, phone_number: &str) -> Result<bool, StoreError>;
    /// Creates the account, vendor, and attachment rows and consumes the
    /// invite, all in one transaction. Fails [`StoreError::NotFound`] when
    /// the invite is no longer present, valid, and unexpired, and
    /// [`StoreError::Conflict`] when a uniqueness constraint is violated;
    /// either failure leaves nothing persisted.
    fn onboard_vendor(&self, record: VendorOnboardingRecord) -> Result<(), StoreError>;

    // Invites
    fn insert_invite(&self, invite: Invite) -> Result<(), StoreError>;
    fn invite_by_token(&self, token: &str) -> Result<Option<Invite>, StoreError>;
    /// Flips `valid` to false. No-op error when the invite is gone.
    fn expire_invite(&self, id: InviteId) -> Result<(), StoreError>;
    /// Deletes every invite matching both fields; deleting nothing is not
    /// an error.
    fn delete_invites(&self, email: &str, token: &str) -> Result<(), StoreError>;

    // Listings
    fn insert_listing(&self, listing: Listing) -> Result<(), StoreError>;
    fn listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError>;
    fn listings(&self) -> Result<Vec<Listing>, StoreError>;
    /// Full row replacement: name, description, category, and the complete
    /// allowed-vendor set.
    fn update_listing(&self, listing: Listing) -> Result<(), StoreError>;
    /// Removes the listing and cascades to its applications, awards,
    /// reports, and all dependent attachments.
    fn delete_listing(&self, id: ListingId) -> Result<(), StoreError>;
    fn set_listing_status(&self, id: ListingId, status: ListingStatus) -> Result<(), StoreError>;

    // Applications, awards, reports
    fn insert_application(&self, application: Application) -> Result<(), StoreError>;
    fn application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError>;
    fn application_by_vendor(
        &self,
        id: ApplicationId,
        vendor_id: VendorId,
    ) -> Result<Option<Application>, StoreError>;
    fn application_for_pair(
        &self,
        listing_id: ListingId,
        vendor_id: VendorId,
    ) -> Result<Option<Application>, StoreError>;
    fn application_on_listing(
        &self,
        listing_id: ListingId,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError>;
    fn applications_for_listing(&self, listing_id: ListingId)
        -> Result<Vec<Application>, StoreError>;
    fn set_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError>;
    /// Compare-and-swap award: marks the application and listing `Awarded`
    /// and inserts the award row in one transaction. Fails
    /// [`StoreError::Conflict`] when the listing is already awarded, so a
    /// concurrent reviewer loses cleanly.
    fn award_application(
        &self,
        listing_id: ListingId,
        award: AwardedListing,
    ) -> Result<(), StoreError>;
    fn award_for_listing(&self, listing_id: ListingId)
        -> Result<Option<AwardedListing>, StoreError>;
    fn insert_report(&self, report: ListingReport) -> Result<(), StoreError>;

    // Attachments
    fn insert_attachments(&self, batch: Vec<Attachment>) -> Result<(), StoreError>;
    fn delete_attachments(&self, parent: AttachmentParent) -> Result<(), StoreError>;
    fn attachments_for(&self, parent: AttachmentParent) -> Result<Vec<Attachment>, StoreError>;
    fn attachment(&self, id: AttachmentId) -> Result<Option<Attachment>, StoreError>;
}
