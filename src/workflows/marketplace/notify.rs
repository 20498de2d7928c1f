use tracing::{info, warn};

/// Outbound mail payload handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Mail delivery error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Trait describing the outbound mail hook. Delivery failures are logged
/// by the workflows and never fail the operation that triggered them.
pub trait Notifier: Send + Sync {
    fn send(&self, message: &MailMessage) -> Result<(), NotifyError>;
}

/// Default notifier: records the send in the log stream only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        info!(to = %message.to, subject = %message.subject, "mail dispatched");
        Ok(())
    }
}

/// Fire-and-forget dispatch used by every workflow.
pub(crate) fn dispatch<N: Notifier>(notifier: &N, message: MailMessage) {
    if let Err(err) = notifier.send(&message) {
        warn!(%err, to = %message.to, "notification delivery failed");
    }
}

pub const VENDOR_INVITATION_SUBJECT: &str = "Vendor Invitation";
pub const APPLICATION_AWARDED_SUBJECT: &str = "Listing Awarded";
pub const APPLICATION_DECLINED_SUBJECT: &str = "Application Update";

pub fn vendor_invitation(registration_link: &str) -> String {
    format!(
        "<html><body>\
         <h1>Vendor Management System</h1>\
         <p>We're thrilled to have you on board as a vendor. To complete your \
         registration, please follow the link below:</p>\
         <p><a href=\"{registration_link}\">Register as a Vendor</a></p>\
         <p>If the link does not work, copy and paste it into your browser: \
         {registration_link}</p>\
         </body></html>"
    )
}

pub fn application_awarded(listing_name: &str) -> String {
    format!(
        "<html><body>\
         <p>Congratulations! Your application for <b>{listing_name}</b> has \
         been awarded. Log in to review the delivery details.</p>\
         </body></html>"
    )
}

pub fn application_declined(listing_name: &str) -> String {
    format!(
        "<html><body>\
         <p>Your application for <b>{listing_name}</b> was not successful \
         this time. Thank you for your interest.</p>\
         </body></html>"
    )
}
