use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_id!(CategoryId);
entity_id!(
    /// Identifier of the account row owning a vendor profile.
    UserId
);
entity_id!(VendorId);
entity_id!(InviteId);
entity_id!(ListingId);
entity_id!(ApplicationId);
entity_id!(AwardId);
entity_id!(ReportId);
entity_id!(AttachmentId);

/// Reference data consumed by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Role of the calling principal, supplied by the host's identity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Vendor,
}

/// Account row created during vendor onboarding. The credential digest is
/// opaque to the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub role: Role,
    pub credential: String,
}

/// Business contact details recorded on a vendor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone_number: String,
    pub other_phone_number: Option<String>,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VendorStatus {
    Pending,
    Approved,
    Declined,
    Deactivated,
}

impl VendorStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Approved => "approved",
            VendorStatus::Declined => "declined",
            VendorStatus::Deactivated => "deactivated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub account_id: UserId,
    pub business_name: String,
    /// Trade category declared at registration (free text, not [`CategoryId`]).
    pub category: String,
    pub contact: ContactInfo,
    pub status: VendorStatus,
}

/// Single-use, time-boxed registration token. Deleted once consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: InviteId,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingStatus {
    Pending,
    Awarded,
    Ongoing,
    Delivered,
    Inactive,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Awarded => "awarded",
            ListingStatus::Ongoing => "ongoing",
            ListingStatus::Delivered => "delivered",
            ListingStatus::Inactive => "inactive",
        }
    }

    /// Position on the forward path, `None` for the administrative override.
    pub const fn stage(self) -> Option<u8> {
        match self {
            ListingStatus::Pending => Some(0),
            ListingStatus::Awarded => Some(1),
            ListingStatus::Ongoing => Some(2),
            ListingStatus::Delivered => Some(3),
            ListingStatus::Inactive => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ListingStatus::Delivered | ListingStatus::Inactive)
    }
}

/// A job opportunity vendors can apply to. An empty `allowed_vendors` set
/// means the listing is open to all vendors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub status: ListingStatus,
    pub allowed_vendors: BTreeSet<VendorId>,
}

impl Listing {
    pub fn is_open_to(&self, vendor_id: VendorId) -> bool {
        self.allowed_vendors.is_empty() || self.allowed_vendors.contains(&vendor_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Awarded,
    Declined,
    Inactive,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Awarded => "awarded",
            ApplicationStatus::Declined => "declined",
            ApplicationStatus::Inactive => "inactive",
        }
    }
}

/// A vendor's bid against a listing, unique per (listing, vendor) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub listing_id: ListingId,
    pub vendor_id: VendorId,
    pub comment: String,
    pub status: ApplicationStatus,
}

/// Outcome row created when an application is awarded. At most one exists
/// per listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardedListing {
    pub id: AwardId,
    pub application_id: ApplicationId,
    pub vendor_id: VendorId,
    pub delivery_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Delivery report filed by the contracted vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingReport {
    pub id: ReportId,
    pub application_id: ApplicationId,
    pub vendor_id: VendorId,
    pub comment: String,
}

/// The entity an attachment belongs to. Attachments are owned exclusively
/// by their parent and removed with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AttachmentParent {
    Listing(ListingId),
    Application(ApplicationId),
    Vendor(VendorId),
    Report(ReportId),
    Award(AwardId),
}

/// Stored document bytes plus the metadata recorded at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub parent: AttachmentParent,
}

/// Incoming upload before it is bound to a parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
