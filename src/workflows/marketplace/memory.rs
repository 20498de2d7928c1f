use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Attachment, AttachmentId, AttachmentParent,
    AwardedListing, AwardId, Category, CategoryId, Invite, InviteId, Listing, ListingId,
    ListingReport, ListingStatus, ReportId, UserAccount, UserId, Vendor, VendorId, VendorStatus,
};
use super::store::{MarketplaceStore, StoreError, VendorOnboardingRecord};

#[derive(Default)]
struct State {
    categories: HashMap<CategoryId, Category>,
    accounts: HashMap<UserId, UserAccount>,
    vendors: HashMap<VendorId, Vendor>,
    invites: HashMap<InviteId, Invite>,
    listings: HashMap<ListingId, Listing>,
    applications: HashMap<ApplicationId, Application>,
    awards: HashMap<AwardId, AwardedListing>,
    reports: HashMap<ReportId, ListingReport>,
    attachments: HashMap<AttachmentId, Attachment>,
}

/// In-memory store. A single mutex guards the whole state, so every trait
/// method (including the composite transactions) is serializable.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store mutex poisoned")
    }
}

impl State {
    fn user_email_exists(&self, email: &str) -> bool {
        self.accounts.values().any(|account| account.email == email)
    }

    fn vendor_email_exists(&self, email: &str) -> bool {
        self.vendors.values().any(|vendor| vendor.contact.email == email)
    }

    fn phone_number_in_use(&self, phone_number: &str) -> bool {
        self.accounts
            .values()
            .any(|account| account.phone_number == phone_number)
            || self
                .vendors
                .values()
                .any(|vendor| vendor.contact.phone_number == phone_number)
    }

    fn remove_attachments_of(&mut self, parent: AttachmentParent) {
        self.attachments.retain(|_, attachment| attachment.parent != parent);
    }

    fn remove_application_cascade(&mut self, application_id: ApplicationId) {
        self.remove_attachments_of(AttachmentParent::Application(application_id));

        let award_ids: Vec<AwardId> = self
            .awards
            .values()
            .filter(|award| award.application_id == application_id)
            .map(|award| award.id)
            .collect();
        for id in award_ids {
            self.awards.remove(&id);
            self.remove_attachments_of(AttachmentParent::Award(id));
        }

        let report_ids: Vec<ReportId> = self
            .reports
            .values()
            .filter(|report| report.application_id == application_id)
            .map(|report| report.id)
            .collect();
        for id in report_ids {
            self.reports.remove(&id);
            self.remove_attachments_of(AttachmentParent::Report(id));
        }

        self.applications.remove(&application_id);
    }
}

impl MarketplaceStore for MemoryStore {
    fn insert_category(&self, category: Category) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Conflict);
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    fn category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.lock().categories.get(&id).cloned())
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut all: Vec<Category> = self.lock().categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn rename_category(&self, id: CategoryId, name: String) -> Result<(), StoreError> {
        let mut state = self.lock();
        let category = state.categories.get_mut(&id).ok_or(StoreError::NotFound)?;
        category.name = name;
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let mut state = self.lock();
        state
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn category_in_use(&self, id: CategoryId) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .listings
            .values()
            .any(|listing| listing.category_id == id))
    }

    fn vendor(&self, id: VendorId) -> Result<Option<Vendor>, StoreError> {
        Ok(self.lock().vendors.get(&id).cloned())
    }

    fn vendors(&self) -> Result<Vec<Vendor>, StoreError> {
        let mut all: Vec<Vendor> = self.lock().vendors.values().cloned().collect();
        all.sort_by(|a, b| a.business_name.cmp(&b.business_name));
        Ok(all)
    }

    fn set_vendor_status(&self, id: VendorId, status: VendorStatus) -> Result<(), StoreError> {
        let mut state = self.lock();
        let vendor = state.vendors.get_mut(&id).ok_or(StoreError::NotFound)?;
        vendor.status = status;
        Ok(())
    }

    fn user_email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.lock().user_email_exists(email))
    }

    fn vendor_email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.lock().vendor_email_exists(email))
    }

    fn phone_number_in_use(&self, phone_number: &str) -> Result<bool, StoreError> {
        Ok(self.lock().phone_number_in_use(phone_number))
    }

    fn onboard_vendor(&self, record: VendorOnboardingRecord) -> Result<(), StoreError> {
        let mut state = self.lock();

        // The invite must still be consumable inside the transaction.
        let invite = state
            .invites
            .values()
            .find(|invite| invite.token == record.invite_token)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if invite.email != record.invite_email || !invite.valid {
            return Err(StoreError::NotFound);
        }
        if record.now > invite.expires_at {
            if let Some(stored) = state.invites.get_mut(&invite.id) {
                stored.valid = false;
            }
            return Err(StoreError::NotFound);
        }

        if state.user_email_exists(&record.account.email)
            || state.vendor_email_exists(&record.account.email)
            || state.vendor_email_exists(&record.vendor.contact.email)
            || state.phone_number_in_use(&record.account.phone_number)
            || state.phone_number_in_use(&record.vendor.contact.phone_number)
        {
            return Err(StoreError::Conflict);
        }

        state.accounts.insert(record.account.id, record.account);
        state.vendors.insert(record.vendor.id, record.vendor);
        for attachment in record.attachments {
            state.attachments.insert(attachment.id, attachment);
        }
        state
            .invites
            .retain(|_, i| !(i.email == record.invite_email && i.token == record.invite_token));
        Ok(())
    }

    fn insert_invite(&self, invite: Invite) -> Result<(), StoreError> {
        self.lock().invites.insert(invite.id, invite);
        Ok(())
    }

    fn invite_by_token(&self, token: &str) -> Result<Option<Invite>, StoreError> {
        Ok(self
            .lock()
            .invites
            .values()
            .find(|invite| invite.token == token)
            .cloned())
    }

    fn expire_invite(&self, id: InviteId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let invite = state.invites.get_mut(&id).ok_or(StoreError::NotFound)?;
        invite.valid = false;
        Ok(())
    }

    fn delete_invites(&self, email: &str, token: &str) -> Result<(), StoreError> {
        self.lock()
            .invites
            .retain(|_, invite| !(invite.email == email && invite.token == token));
        Ok(())
    }

    fn insert_listing(&self, listing: Listing) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.categories.contains_key(&listing.category_id) {
            return Err(StoreError::NotFound);
        }
        for vendor_id in &listing.allowed_vendors {
            if !state.vendors.contains_key(vendor_id) {
                return Err(StoreError::NotFound);
            }
        }
        state.listings.insert(listing.id, listing);
        Ok(())
    }

    fn listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(self.lock().listings.get(&id).cloned())
    }

    fn listings(&self) -> Result<Vec<Listing>, StoreError> {
        let mut all: Vec<Listing> = self.lock().listings.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn update_listing(&self, listing: Listing) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.listings.contains_key(&listing.id) {
            return Err(StoreError::NotFound);
        }
        if !state.categories.contains_key(&listing.category_id) {
            return Err(StoreError::NotFound);
        }
        for vendor_id in &listing.allowed_vendors {
            if !state.vendors.contains_key(vendor_id) {
                return Err(StoreError::NotFound);
            }
        }
        state.listings.insert(listing.id, listing);
        Ok(())
    }

    fn delete_listing(&self, id: ListingId) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.listings.remove(&id).ok_or(StoreError::NotFound)?;
        state.remove_attachments_of(AttachmentParent::Listing(id));

        let application_ids: Vec<ApplicationId> = state
            .applications
            .values()
            .filter(|application| application.listing_id == id)
            .map(|application| application.id)
            .collect();
        for application_id in application_ids {
            state.remove_application_cascade(application_id);
        }
        Ok(())
    }

    fn set_listing_status(&self, id: ListingId, status: ListingStatus) -> Result<(), StoreError> {
        let mut state = self.lock();
        let listing = state.listings.get_mut(&id).ok_or(StoreError::NotFound)?;
        listing.status = status;
        Ok(())
    }

    fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.listings.contains_key(&application.listing_id) {
            return Err(StoreError::NotFound);
        }
        let duplicate = state.applications.values().any(|existing| {
            existing.listing_id == application.listing_id
                && existing.vendor_id == application.vendor_id
        });
        if duplicate {
            return Err(StoreError::Conflict);
        }
        state.applications.insert(application.id, application);
        Ok(())
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self.lock().applications.get(&id).cloned())
    }

    fn application_by_vendor(
        &self,
        id: ApplicationId,
        vendor_id: VendorId,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .lock()
            .applications
            .get(&id)
            .filter(|application| application.vendor_id == vendor_id)
            .cloned())
    }

    fn application_for_pair(
        &self,
        listing_id: ListingId,
        vendor_id: VendorId,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .lock()
            .applications
            .values()
            .find(|application| {
                application.listing_id == listing_id && application.vendor_id == vendor_id
            })
            .cloned())
    }

    fn application_on_listing(
        &self,
        listing_id: ListingId,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .lock()
            .applications
            .get(&id)
            .filter(|application| application.listing_id == listing_id)
            .cloned())
    }

    fn applications_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<Application>, StoreError> {
        Ok(self
            .lock()
            .applications
            .values()
            .filter(|application| application.listing_id == listing_id)
            .cloned()
            .collect())
    }

    fn set_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        let application = state.applications.get_mut(&id).ok_or(StoreError::NotFound)?;
        application.status = status;
        Ok(())
    }

    fn award_application(
        &self,
        listing_id: ListingId,
        award: AwardedListing,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.applications.contains_key(&award.application_id) {
            return Err(StoreError::NotFound);
        }
        let listing = state.listings.get_mut(&listing_id).ok_or(StoreError::NotFound)?;
        if listing.status == ListingStatus::Awarded {
            return Err(StoreError::Conflict);
        }
        listing.status = ListingStatus::Awarded;
        if let Some(application) = state.applications.get_mut(&award.application_id) {
            application.status = ApplicationStatus::Awarded;
        }
        state.awards.insert(award.id, award);
        Ok(())
    }

    fn award_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Option<AwardedListing>, StoreError> {
        let state = self.lock();
        let application_ids: Vec<ApplicationId> = state
            .applications
            .values()
            .filter(|application| application.listing_id == listing_id)
            .map(|application| application.id)
            .collect();
        Ok(state
            .awards
            .values()
            .find(|award| application_ids.contains(&award.application_id))
            .cloned())
    }

    fn insert_report(&self, report: ListingReport) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.applications.contains_key(&report.application_id) {
            return Err(StoreError::NotFound);
        }
        state.reports.insert(report.id, report);
        Ok(())
    }

    fn insert_attachments(&self, batch: Vec<Attachment>) -> Result<(), StoreError> {
        let mut state = self.lock();
        for attachment in batch {
            state.attachments.insert(attachment.id, attachment);
        }
        Ok(())
    }

    fn delete_attachments(&self, parent: AttachmentParent) -> Result<(), StoreError> {
        self.lock().remove_attachments_of(parent);
        Ok(())
    }

    fn attachments_for(&self, parent: AttachmentParent) -> Result<Vec<Attachment>, StoreError> {
        let mut all: Vec<Attachment> = self
            .lock()
            .attachments
            .values()
            .filter(|attachment| attachment.parent == parent)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn attachment(&self, id: AttachmentId) -> Result<Option<Attachment>, StoreError> {
        Ok(self.lock().attachments.get(&id).cloned())
    }
}
