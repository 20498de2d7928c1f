use super::common::*;
use chrono::Duration;

use crate::workflows::marketplace::error::WorkflowError;
use crate::workflows::marketplace::invites::INVITE_TTL_DAYS;
use crate::workflows::marketplace::store::MarketplaceStore;

#[test]
fn issue_persists_invite_and_mails_the_registration_link() {
    let h = harness();

    let invite = h
        .invites
        .issue("vendor-a@example.com", now())
        .expect("invite issues");

    assert_eq!(invite.email, "vendor-a@example.com");
    assert!(invite.valid);
    assert_eq!(invite.expires_at, now() + Duration::days(INVITE_TTL_DAYS));

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to, "vendor-a@example.com");
    assert!(messages[0].html_body.contains(&invite.token));
    assert!(messages[0].html_body.contains(CLIENT_URL));
}

#[test]
fn issue_rejects_an_email_already_registered_as_vendor() {
    let h = harness();
    approved_vendor(&h, "a");

    let err = h
        .invites
        .issue(&business_email("a"), now())
        .expect_err("existing vendor rejected");
    assert!(matches!(err, WorkflowError::Conflict(_)));
}

#[test]
fn issue_allows_multiple_outstanding_invites_per_email() {
    let h = harness();

    let first = h.invites.issue("vendor-a@example.com", now()).expect("first");
    let second = h
        .invites
        .issue("vendor-a@example.com", now())
        .expect("resend");
    assert_ne!(first.token, second.token);

    h.invites
        .validate(&first.token, "vendor-a@example.com", now())
        .expect("first token usable");
    h.invites
        .validate(&second.token, "vendor-a@example.com", now())
        .expect("second token usable");
}

#[test]
fn validate_rejects_unknown_tokens() {
    let h = harness();
    let err = h
        .invites
        .validate("no-such-token", "vendor-a@example.com", now())
        .expect_err("unknown token rejected");
    assert!(matches!(err, WorkflowError::InvalidInvite));
}

#[test]
fn validate_rejects_a_token_presented_for_another_email() {
    let h = harness();
    let invite = h.invites.issue("vendor-a@example.com", now()).expect("issues");

    let err = h
        .invites
        .validate(&invite.token, "vendor-b@example.com", now())
        .expect_err("cross-identity reuse rejected");
    assert!(matches!(err, WorkflowError::InvalidInvite));
}

#[test]
fn validate_flips_expired_invites_invalid() {
    let h = harness();
    let invite = h.invites.issue("vendor-a@example.com", now()).expect("issues");

    let three_days_later = now() + Duration::days(3);
    let err = h
        .invites
        .validate(&invite.token, "vendor-a@example.com", three_days_later)
        .expect_err("expired token rejected");
    assert!(matches!(err, WorkflowError::InvalidInvite));

    let stored = h
        .store
        .invite_by_token(&invite.token)
        .expect("store reads")
        .expect("row kept");
    assert!(!stored.valid);

    // The flag outlives the clock check.
    let err = h
        .invites
        .validate(&invite.token, "vendor-a@example.com", now())
        .expect_err("invalidated token stays rejected");
    assert!(matches!(err, WorkflowError::InvalidInvite));
}

#[test]
fn consume_deletes_only_matching_invites() {
    let h = harness();
    let first = h.invites.issue("vendor-a@example.com", now()).expect("first");
    let second = h.invites.issue("vendor-a@example.com", now()).expect("second");

    h.invites
        .consume("vendor-a@example.com", &first.token)
        .expect("consume succeeds");

    let err = h
        .invites
        .validate(&first.token, "vendor-a@example.com", now())
        .expect_err("consumed token gone");
    assert!(matches!(err, WorkflowError::InvalidInvite));
    h.invites
        .validate(&second.token, "vendor-a@example.com", now())
        .expect("outstanding token untouched");
}

#[test]
fn consume_is_a_noop_when_nothing_matches() {
    let h = harness();
    h.invites
        .consume("vendor-a@example.com", "already-gone")
        .expect("racing consumers converge");
}
