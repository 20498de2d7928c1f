use super::common::*;

use crate::workflows::marketplace::domain::{AttachmentParent, VendorId, VendorStatus};
use crate::workflows::marketplace::error::WorkflowError;
use crate::workflows::marketplace::onboarding::VendorReview;

#[test]
fn register_creates_pending_vendor_and_consumes_the_invite() {
    let h = harness();
    let invite = h
        .invites
        .issue(&business_email("a"), now())
        .expect("invite issues");

    let vendor_id = h
        .onboarding
        .register(
            register_input(&invite.token, "a"),
            vec![upload("insurance.pdf")],
            now(),
        )
        .expect("registration succeeds");

    let vendor = h.onboarding.get(vendor_id).expect("vendor persisted");
    assert_eq!(vendor.status, VendorStatus::Pending);
    assert_eq!(vendor.contact.email, business_email("a"));
    assert_eq!(vendor.business_name, "Vendor a");

    let docs = h
        .linker
        .for_parent(AttachmentParent::Vendor(vendor_id))
        .expect("attachments read");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name, "insurance.pdf");

    let err = h
        .invites
        .validate(&invite.token, &business_email("a"), now())
        .expect_err("invite consumed");
    assert!(matches!(err, WorkflowError::InvalidInvite));
}

#[test]
fn register_rejects_an_unknown_invite_token_before_any_write() {
    let h = harness();

    let err = h
        .onboarding
        .register(register_input("bogus-token", "a"), Vec::new(), now())
        .expect_err("invalid invite rejected");
    assert!(matches!(err, WorkflowError::InvalidInvite));
    assert!(h.onboarding.list().expect("vendors list").is_empty());
}

#[test]
fn register_rejects_a_reused_personal_email() {
    let h = harness();
    approved_vendor(&h, "a");

    let invite = h.invites.issue(&business_email("b"), now()).expect("issues");
    let mut input = register_input(&invite.token, "b");
    input.email = "owner-a@example.com".to_string();

    let err = h
        .onboarding
        .register(input, Vec::new(), now())
        .expect_err("email collision rejected");
    match err {
        WorkflowError::Conflict(message) => assert!(message.contains("email")),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn register_rejects_a_reused_phone_number() {
    let h = harness();
    approved_vendor(&h, "a");

    let invite = h.invites.issue(&business_email("b"), now()).expect("issues");
    let mut input = register_input(&invite.token, "b");
    input.phone_number = "+1-555-1-a".to_string();

    let err = h
        .onboarding
        .register(input, Vec::new(), now())
        .expect_err("phone collision rejected");
    match err {
        WorkflowError::Conflict(message) => assert!(message.contains("phone")),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn failed_registration_leaves_the_invite_usable() {
    let h = harness();
    approved_vendor(&h, "a");

    let invite = h.invites.issue(&business_email("b"), now()).expect("issues");
    let mut input = register_input(&invite.token, "b");
    input.business_phone_number = "+1-555-2-a".to_string();

    let err = h
        .onboarding
        .register(input, Vec::new(), now())
        .expect_err("business phone collision rejected");
    assert!(matches!(err, WorkflowError::Conflict(_)));

    h.invites
        .validate(&invite.token, &business_email("b"), now())
        .expect("invite survives the failed attempt");
    assert_eq!(h.onboarding.list().expect("vendors list").len(), 1);
}

#[test]
fn review_status_moves_between_administrative_states() {
    let h = harness();
    let invite = h.invites.issue(&business_email("a"), now()).expect("issues");
    let vendor_id = h
        .onboarding
        .register(register_input(&invite.token, "a"), Vec::new(), now())
        .expect("registers");

    let vendor = h
        .onboarding
        .review_status(vendor_id, VendorReview::Approved)
        .expect("pending to approved");
    assert_eq!(vendor.status, VendorStatus::Approved);

    let vendor = h
        .onboarding
        .review_status(vendor_id, VendorReview::Deactivated)
        .expect("approved to deactivated");
    assert_eq!(vendor.status, VendorStatus::Deactivated);

    // Any reviewed status is reachable from any other.
    let vendor = h
        .onboarding
        .review_status(vendor_id, VendorReview::Approved)
        .expect("deactivated back to approved");
    assert_eq!(vendor.status, VendorStatus::Approved);
}

#[test]
fn review_status_rejects_a_noop_resubmission() {
    let h = harness();
    let vendor_id = approved_vendor(&h, "a");

    let err = h
        .onboarding
        .review_status(vendor_id, VendorReview::Approved)
        .expect_err("no-op rejected");
    match err {
        WorkflowError::Conflict(message) => assert!(message.contains("already approved")),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn review_status_fails_for_unknown_vendors() {
    let h = harness();
    let err = h
        .onboarding
        .review_status(VendorId::new(), VendorReview::Declined)
        .expect_err("unknown vendor rejected");
    assert!(matches!(err, WorkflowError::NotFound("vendor")));
}
