use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::CredentialHasher;
use super::domain::{
    AttachmentParent, AttachmentUpload, ContactInfo, Role, UserAccount, UserId, Vendor, VendorId,
    VendorStatus,
};
use super::error::WorkflowError;
use super::invites::InviteService;
use super::notify::Notifier;
use super::store::{MarketplaceStore, StoreError, VendorOnboardingRecord};
use super::attachments;

/// Registration payload submitted with a valid invitation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterVendorInput {
    pub invite_token: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub business_name: String,
    pub business_email: String,
    pub business_phone_number: String,
    pub other_phone_number: Option<String>,
    pub business_address: String,
    pub category: String,
}

/// Status an administrator can move a vendor to. `Pending` is reachable
/// only by registration, never by review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VendorReview {
    Approved,
    Declined,
    Deactivated,
}

impl VendorReview {
    pub const fn status(self) -> VendorStatus {
        match self {
            VendorReview::Approved => VendorStatus::Approved,
            VendorReview::Declined => VendorStatus::Declined,
            VendorReview::Deactivated => VendorStatus::Deactivated,
        }
    }
}

/// Consumes invitations to create vendor accounts and manages vendor
/// approval state.
pub struct VendorOnboarding<S, N, H> {
    store: Arc<S>,
    invites: InviteService<S, N>,
    hasher: Arc<H>,
}

impl<S, N, H> Clone for VendorOnboarding<S, N, H> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            invites: self.invites.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<S, N, H> VendorOnboarding<S, N, H>
where
    S: MarketplaceStore,
    N: Notifier,
    H: CredentialHasher,
{
    pub fn new(store: Arc<S>, invites: InviteService<S, N>, hasher: Arc<H>) -> Self {
        Self {
            store,
            invites,
            hasher,
        }
    }

    /// Registers a vendor against an outstanding invite.
    ///
    /// Uniqueness checks all run before any write and name the colliding
    /// field. The account, vendor profile, attachments, and invite
    /// consumption are one store transaction: a failure partway leaves no
    /// persisted vendor and the invite usable for a retry.
    pub fn register(
        &self,
        input: RegisterVendorInput,
        uploads: Vec<AttachmentUpload>,
        now: DateTime<Utc>,
    ) -> Result<VendorId, WorkflowError> {
        self.invites
            .validate(&input.invite_token, &input.business_email, now)?;

        if self.store.user_email_exists(&input.email)?
            || self.store.vendor_email_exists(&input.email)?
        {
            return Err(WorkflowError::conflict("email has been used"));
        }
        if self.store.vendor_email_exists(&input.business_email)? {
            return Err(WorkflowError::conflict("business email has been used"));
        }
        if self.store.phone_number_in_use(&input.phone_number)? {
            return Err(WorkflowError::conflict("phone number has been used"));
        }
        if self.store.phone_number_in_use(&input.business_phone_number)? {
            return Err(WorkflowError::conflict(
                "business phone number has been used",
            ));
        }

        let credential = self.hasher.hash(&input.last_name);
        let vendor_id = VendorId::new();
        let account = UserAccount {
            id: UserId::new(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone_number: input.phone_number,
            address: input.address,
            role: Role::Vendor,
            credential,
        };
        let vendor = Vendor {
            id: vendor_id,
            account_id: account.id,
            business_name: input.business_name,
            category: input.category,
            contact: ContactInfo {
                email: input.business_email.clone(),
                phone_number: input.business_phone_number,
                other_phone_number: input.other_phone_number,
                address: input.business_address,
            },
            status: VendorStatus::Pending,
        };
        let record = VendorOnboardingRecord {
            account,
            vendor,
            attachments: attachments::bind(AttachmentParent::Vendor(vendor_id), uploads),
            invite_email: input.business_email,
            invite_token: input.invite_token,
            now,
        };

        self.store.onboard_vendor(record).map_err(|err| match err {
            StoreError::NotFound => WorkflowError::InvalidInvite,
            StoreError::Conflict => {
                WorkflowError::conflict("registration details already in use")
            }
            other => WorkflowError::Store(other),
        })?;

        Ok(vendor_id)
    }

    /// Moves a vendor to the reviewed status. Re-submitting the current
    /// status is rejected rather than silently accepted; any other move
    /// between the three reviewed statuses is allowed.
    pub fn review_status(
        &self,
        vendor_id: VendorId,
        review: VendorReview,
    ) -> Result<Vendor, WorkflowError> {
        let mut vendor = self
            .store
            .vendor(vendor_id)?
            .ok_or(WorkflowError::NotFound("vendor"))?;

        let status = review.status();
        if vendor.status == status {
            return Err(WorkflowError::Conflict(format!(
                "vendor is already {}",
                status.label()
            )));
        }

        self.store.set_vendor_status(vendor_id, status)?;
        vendor.status = status;
        Ok(vendor)
    }

    pub fn get(&self, vendor_id: VendorId) -> Result<Vendor, WorkflowError> {
        self.store
            .vendor(vendor_id)?
            .ok_or(WorkflowError::NotFound("vendor"))
    }

    pub fn list(&self) -> Result<Vec<Vendor>, WorkflowError> {
        Ok(self.store.vendors()?)
    }
}
