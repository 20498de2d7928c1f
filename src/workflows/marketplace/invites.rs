use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::domain::{Invite, InviteId};
use super::error::WorkflowError;
use super::notify::{self, MailMessage, Notifier};
use super::store::{MarketplaceStore, StoreError};

/// Invitation links stay usable for two days.
pub const INVITE_TTL_DAYS: i64 = 2;

/// Issues, validates, and consumes vendor invitation tokens.
pub struct InviteService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    client_url: String,
}

impl<S, N> Clone for InviteService<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            client_url: self.client_url.clone(),
        }
    }
}

fn new_invite_token() -> String {
    Uuid::new_v4().simple().to_string()
}

impl<S, N> InviteService<S, N>
where
    S: MarketplaceStore,
    N: Notifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, client_url: String) -> Self {
        Self {
            store,
            notifier,
            client_url,
        }
    }

    /// Issues a fresh invite for `email` and mails the registration link.
    ///
    /// Fails `Conflict` when a vendor already registered with that email.
    /// Outstanding invites for the same address are not deduplicated, so
    /// an admin can resend; every `issue` call persists exactly one row.
    pub fn issue(&self, email: &str, now: DateTime<Utc>) -> Result<Invite, WorkflowError> {
        if self.store.vendor_email_exists(email)? {
            return Err(WorkflowError::conflict("vendor already exists"));
        }

        let invite = Invite {
            id: InviteId::new(),
            email: email.to_owned(),
            token: new_invite_token(),
            expires_at: now + Duration::days(INVITE_TTL_DAYS),
            valid: true,
        };
        self.store.insert_invite(invite.clone())?;

        let link = format!("{}/registration?token={}", self.client_url, invite.token);
        notify::dispatch(
            self.notifier.as_ref(),
            MailMessage {
                to: email.to_owned(),
                subject: notify::VENDOR_INVITATION_SUBJECT.to_owned(),
                html_body: notify::vendor_invitation(&link),
            },
        );

        Ok(invite)
    }

    /// Resolves `token` and checks it may still be used by `expected_email`.
    ///
    /// An expired invite is marked `valid = false` on the way out, so later
    /// attempts fail without re-checking the clock.
    pub fn validate(
        &self,
        token: &str,
        expected_email: &str,
        now: DateTime<Utc>,
    ) -> Result<Invite, WorkflowError> {
        let invite = self
            .store
            .invite_by_token(token)?
            .ok_or(WorkflowError::InvalidInvite)?;

        if invite.email != expected_email {
            return Err(WorkflowError::InvalidInvite);
        }
        if now > invite.expires_at {
            // A concurrent consumer may have deleted the row already; the
            // token is equally unusable either way.
            match self.store.expire_invite(invite.id) {
                Ok(()) | Err(StoreError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
            return Err(WorkflowError::InvalidInvite);
        }
        if !invite.valid {
            return Err(WorkflowError::InvalidInvite);
        }
        Ok(invite)
    }

    /// Deletes every invite matching both fields. Deleting an already
    /// consumed invite is a no-op, so racing consumers converge.
    pub fn consume(&self, email: &str, token: &str) -> Result<(), WorkflowError> {
        self.store.delete_invites(email, token)?;
        Ok(())
    }
}
