use std::sync::Arc;

use chrono::NaiveDate;

use super::attachments::AttachmentLinker;
use super::domain::{
    Application, ApplicationId, ApplicationStatus, AttachmentParent, AttachmentUpload,
    AwardId, AwardedListing, Listing, ListingId, ListingReport, ListingStatus, ReportId, VendorId,
};
use super::error::WorkflowError;
use super::identity::Identity;
use super::notify::{self, MailMessage, Notifier};
use super::store::{MarketplaceStore, StoreError};

/// Outcome an administrator records for a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Declined,
    Awarded,
}

impl ReviewDecision {
    /// Strict parse of the wire value; unrecognized input is rejected at
    /// the boundary.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DECLINED" => Some(Self::Declined),
            "AWARDED" => Some(Self::Awarded),
            _ => None,
        }
    }
}

/// Everything a review call carries besides its uploads.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub application_id: ApplicationId,
    pub vendor_id: VendorId,
    pub listing_id: ListingId,
    pub decision: ReviewDecision,
    pub delivery_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Owns applications, their review and award outcomes, and delivery
/// reporting.
pub struct ApplicationReview<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    attachments: AttachmentLinker<S>,
}

impl<S, N> Clone for ApplicationReview<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            attachments: self.attachments.clone(),
        }
    }
}

impl<S, N> ApplicationReview<S, N>
where
    S: MarketplaceStore,
    N: Notifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        let attachments = AttachmentLinker::new(store.clone());
        Self {
            store,
            notifier,
            attachments,
        }
    }

    /// Files a bid by the calling vendor against a listing.
    ///
    /// A vendor applies to a given listing at most once, in any status; a
    /// declined vendor may not re-apply. The store's unique constraint on
    /// the (listing, vendor) pair backstops the check under races.
    pub fn apply(
        &self,
        listing_id: ListingId,
        identity: &Identity,
        comment: String,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<Application, WorkflowError> {
        let vendor_id = identity.require_vendor()?;
        let listing = self
            .store
            .listing(listing_id)?
            .ok_or_else(|| WorkflowError::bad_request("listing does not exist"))?;

        if !listing.is_open_to(vendor_id) {
            return Err(WorkflowError::bad_request(
                "vendor is not allowed for this listing",
            ));
        }
        if self
            .store
            .application_for_pair(listing_id, vendor_id)?
            .is_some()
        {
            return Err(WorkflowError::conflict(
                "vendor has already applied for this listing",
            ));
        }

        let application = Application {
            id: ApplicationId::new(),
            listing_id,
            vendor_id,
            comment,
            status: ApplicationStatus::Pending,
        };
        self.store
            .insert_application(application.clone())
            .map_err(|err| match err {
                StoreError::Conflict => {
                    WorkflowError::conflict("vendor has already applied for this listing")
                }
                StoreError::NotFound => WorkflowError::bad_request("listing does not exist"),
                other => WorkflowError::Store(other),
            })?;

        self.attachments
            .attach(AttachmentParent::Application(application.id), uploads)?;
        Ok(application)
    }

    /// Resolves a pending application.
    ///
    /// A declined review touches the application alone. An award marks the
    /// application and listing `Awarded` and inserts the single award row in
    /// one store transaction; the listing-level guard makes a second award
    /// attempt fail [`WorkflowError::AlreadyAwarded`] even when two reviews
    /// race. The vendor notification is fire-and-forget either way.
    pub fn review(
        &self,
        input: ReviewInput,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<Application, WorkflowError> {
        let mut application = self
            .store
            .application_by_vendor(input.application_id, input.vendor_id)?
            .ok_or(WorkflowError::NotFound("application"))?;
        let listing = self
            .store
            .listing(input.listing_id)?
            .ok_or(WorkflowError::NotFound("listing"))?;

        if listing.status == ListingStatus::Awarded {
            return Err(WorkflowError::AlreadyAwarded);
        }
        if application.status != ApplicationStatus::Pending {
            return Err(WorkflowError::BadRequest(format!(
                "application is already {}",
                application.status.label()
            )));
        }

        match input.decision {
            ReviewDecision::Declined => {
                self.store
                    .set_application_status(application.id, ApplicationStatus::Declined)?;
                application.status = ApplicationStatus::Declined;
                self.notify_outcome(&application, &listing);
            }
            ReviewDecision::Awarded => {
                let award = AwardedListing {
                    id: AwardId::new(),
                    application_id: application.id,
                    vendor_id: application.vendor_id,
                    delivery_date: input.delivery_date,
                    description: input.description,
                };
                self.store
                    .award_application(listing.id, award.clone())
                    .map_err(|err| match err {
                        StoreError::Conflict => WorkflowError::AlreadyAwarded,
                        StoreError::NotFound => WorkflowError::NotFound("application"),
                        other => WorkflowError::Store(other),
                    })?;
                application.status = ApplicationStatus::Awarded;
                self.attachments
                    .attach(AttachmentParent::Award(award.id), uploads)?;
                self.notify_outcome(&application, &listing);
            }
        }

        Ok(application)
    }

    /// Files a delivery report against an awarded application. Only the
    /// contracted party may report, and never against an inactive listing.
    pub fn report(
        &self,
        listing_id: ListingId,
        application_id: ApplicationId,
        identity: &Identity,
        comment: String,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<ListingReport, WorkflowError> {
        let vendor_id = identity.require_vendor()?;
        let listing = self
            .store
            .listing(listing_id)?
            .ok_or_else(|| WorkflowError::bad_request("listing does not exist"))?;
        if listing.status == ListingStatus::Inactive {
            return Err(WorkflowError::bad_request("listing is inactive"));
        }

        let application = self
            .store
            .application_on_listing(listing_id, application_id)?
            .ok_or(WorkflowError::NotFound("application"))?;
        if application.status != ApplicationStatus::Awarded {
            return Err(WorkflowError::BadRequest(format!(
                "application is {}, only an awarded application may report",
                application.status.label()
            )));
        }

        let report = ListingReport {
            id: ReportId::new(),
            application_id,
            vendor_id,
            comment,
        };
        self.store.insert_report(report.clone())?;
        self.attachments
            .attach(AttachmentParent::Report(report.id), uploads)?;
        Ok(report)
    }

    /// Administrative override; `Inactive` is terminal for applications.
    pub fn deactivate(&self, id: ApplicationId) -> Result<Application, WorkflowError> {
        let mut application = self
            .store
            .application(id)?
            .ok_or(WorkflowError::NotFound("application"))?;

        if application.status == ApplicationStatus::Inactive {
            return Err(WorkflowError::conflict("application is already inactive"));
        }

        self.store
            .set_application_status(id, ApplicationStatus::Inactive)?;
        application.status = ApplicationStatus::Inactive;
        Ok(application)
    }

    pub fn list_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<Application>, WorkflowError> {
        if self.store.listing(listing_id)?.is_none() {
            return Err(WorkflowError::NotFound("listing"));
        }
        Ok(self.store.applications_for_listing(listing_id)?)
    }

    fn notify_outcome(&self, application: &Application, listing: &Listing) {
        // A failed lookup only costs the courtesy mail.
        let Ok(Some(vendor)) = self.store.vendor(application.vendor_id) else {
            return;
        };
        let (subject, html_body) = match application.status {
            ApplicationStatus::Awarded => (
                notify::APPLICATION_AWARDED_SUBJECT,
                notify::application_awarded(&listing.name),
            ),
            _ => (
                notify::APPLICATION_DECLINED_SUBJECT,
                notify::application_declined(&listing.name),
            ),
        };
        notify::dispatch(
            self.notifier.as_ref(),
            MailMessage {
                to: vendor.contact.email,
                subject: subject.to_owned(),
                html_body,
            },
        );
    }
}
