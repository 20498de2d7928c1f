use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::attachments::AttachmentLinker;
use super::domain::{
    AttachmentParent, AttachmentUpload, CategoryId, Listing, ListingId, ListingStatus, VendorId,
};
use super::error::WorkflowError;
use super::store::{MarketplaceStore, StoreError};

/// Fields accepted when an administrator opens a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListingInput {
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    /// Vendors allowed to apply. Empty means the listing is open to all.
    #[serde(default)]
    pub allowed_vendors: BTreeSet<VendorId>,
}

/// Partial update. The allowed-vendor set is always a full replacement of
/// the existing links; an empty set reopens the listing to all vendors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateListingInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub allowed_vendors: BTreeSet<VendorId>,
}

/// Statuses an administrator can advance a listing to. The awarded step is
/// reachable only through application review, never directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTarget {
    Ongoing,
    Delivered,
}

impl AdvanceTarget {
    /// Strict parse of the wire value; unrecognized input is rejected at
    /// the boundary instead of being case-folded into a match.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ONGOING" => Some(Self::Ongoing),
            "DELIVERED" => Some(Self::Delivered),
            _ => None,
        }
    }

    pub const fn status(self) -> ListingStatus {
        match self {
            AdvanceTarget::Ongoing => ListingStatus::Ongoing,
            AdvanceTarget::Delivered => ListingStatus::Delivered,
        }
    }
}

/// Owns listing creation, update, deletion, and the status state machine.
pub struct ListingLifecycle<S> {
    store: Arc<S>,
    attachments: AttachmentLinker<S>,
}

impl<S> Clone for ListingLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            attachments: self.attachments.clone(),
        }
    }
}

impl<S: MarketplaceStore> ListingLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        let attachments = AttachmentLinker::new(store.clone());
        Self { store, attachments }
    }

    pub fn create(
        &self,
        input: CreateListingInput,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<Listing, WorkflowError> {
        if self.store.category(input.category_id)?.is_none() {
            return Err(WorkflowError::NotFound("category"));
        }

        let listing = Listing {
            id: ListingId::new(),
            name: input.name,
            description: input.description,
            category_id: input.category_id,
            status: ListingStatus::Pending,
            allowed_vendors: input.allowed_vendors,
        };
        self.store
            .insert_listing(listing.clone())
            .map_err(|err| match err {
                StoreError::NotFound => WorkflowError::NotFound("vendor"),
                other => WorkflowError::Store(other),
            })?;

        self.attachments
            .attach(AttachmentParent::Listing(listing.id), uploads)?;
        Ok(listing)
    }

    /// Applies the provided fields and replaces both the allowed-vendor set
    /// and the attachment batch wholesale. Calling update without uploads
    /// therefore deletes every attachment the listing had; that destructive
    /// replace is the documented contract, not an accident.
    pub fn update(
        &self,
        id: ListingId,
        input: UpdateListingInput,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<Listing, WorkflowError> {
        let mut listing = self
            .store
            .listing(id)?
            .ok_or(WorkflowError::NotFound("listing"))?;

        if let Some(name) = input.name {
            listing.name = name;
        }
        if let Some(description) = input.description {
            listing.description = description;
        }
        if let Some(category_id) = input.category_id {
            if self.store.category(category_id)?.is_none() {
                return Err(WorkflowError::NotFound("category"));
            }
            listing.category_id = category_id;
        }
        listing.allowed_vendors = input.allowed_vendors;

        self.store
            .update_listing(listing.clone())
            .map_err(|err| match err {
                StoreError::NotFound => WorkflowError::NotFound("vendor"),
                other => WorkflowError::Store(other),
            })?;

        self.attachments
            .replace(AttachmentParent::Listing(id), uploads)?;
        Ok(listing)
    }

    /// Removes the listing; the store cascades to applications, awards,
    /// reports, and every dependent attachment.
    pub fn delete(&self, id: ListingId) -> Result<(), WorkflowError> {
        self.store.delete_listing(id).map_err(|err| match err {
            StoreError::NotFound => WorkflowError::NotFound("listing"),
            other => WorkflowError::Store(other),
        })
    }

    /// Moves the listing forward along `Awarded -> Ongoing -> Delivered`.
    ///
    /// A pending listing must be awarded through the review workflow first,
    /// re-submitting the current status is rejected, and the status never
    /// moves backward.
    pub fn advance(&self, id: ListingId, target: AdvanceTarget) -> Result<Listing, WorkflowError> {
        let mut listing = self
            .store
            .listing(id)?
            .ok_or(WorkflowError::NotFound("listing"))?;

        let next = target.status();
        if listing.status == ListingStatus::Pending {
            return Err(WorkflowError::bad_request("listing has not been awarded"));
        }
        if listing.status == next {
            return Err(WorkflowError::BadRequest(format!(
                "listing is already {}",
                next.label()
            )));
        }
        let Some(current_stage) = listing.status.stage() else {
            return Err(WorkflowError::bad_request("listing is inactive"));
        };
        let target_stage = next.stage().unwrap_or(u8::MAX);
        if target_stage < current_stage {
            return Err(WorkflowError::bad_request(
                "listing status cannot move backward",
            ));
        }

        self.store.set_listing_status(id, next)?;
        listing.status = next;
        Ok(listing)
    }

    /// Administrative override. Reachable from any non-terminal state and
    /// terminal once applied.
    pub fn deactivate(&self, id: ListingId) -> Result<Listing, WorkflowError> {
        let mut listing = self
            .store
            .listing(id)?
            .ok_or(WorkflowError::NotFound("listing"))?;

        if listing.status.is_terminal() {
            return Err(WorkflowError::BadRequest(format!(
                "listing is already {}",
                listing.status.label()
            )));
        }

        self.store.set_listing_status(id, ListingStatus::Inactive)?;
        listing.status = ListingStatus::Inactive;
        Ok(listing)
    }

    pub fn get(&self, id: ListingId) -> Result<Listing, WorkflowError> {
        self.store
            .listing(id)?
            .ok_or(WorkflowError::NotFound("listing"))
    }

    pub fn list(&self) -> Result<Vec<Listing>, WorkflowError> {
        Ok(self.store.listings()?)
    }
}
