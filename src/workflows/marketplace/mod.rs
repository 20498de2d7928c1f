//! Marketplace workflow engine.
//!
//! Vendors onboard through time-boxed invitations, apply to job listings,
//! and listings progress through an award/delivery lifecycle with documents
//! attached at every step. Persistence, mail delivery, and credential
//! hashing are collaborators behind the traits in [`store`], [`notify`],
//! and [`credentials`]; the workflow services own the sequencing and the
//! cross-entity invariants.

pub mod applications;
pub mod attachments;
pub mod categories;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod identity;
pub mod invites;
pub mod listings;
pub mod memory;
pub mod notify;
pub mod onboarding;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use applications::{ApplicationReview, ReviewDecision, ReviewInput};
pub use attachments::AttachmentLinker;
pub use categories::CategoryRegistry;
pub use credentials::{CredentialHasher, OpaqueCredentialHasher};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Attachment, AttachmentId, AttachmentParent,
    AttachmentUpload, AwardId, AwardedListing, Category, CategoryId, ContactInfo, Invite,
    InviteId, Listing, ListingId, ListingReport, ListingStatus, ReportId, Role, UserAccount,
    UserId, Vendor, VendorId, VendorStatus,
};
pub use error::WorkflowError;
pub use identity::Identity;
pub use invites::{InviteService, INVITE_TTL_DAYS};
pub use listings::{AdvanceTarget, CreateListingInput, ListingLifecycle, UpdateListingInput};
pub use memory::MemoryStore;
pub use notify::{LoggingNotifier, MailMessage, Notifier, NotifyError};
pub use onboarding::{RegisterVendorInput, VendorOnboarding, VendorReview};
pub use router::{marketplace_router, MarketplaceServices};
pub use store::{MarketplaceStore, StoreError, VendorOnboardingRecord};
