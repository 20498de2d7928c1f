use std::collections::BTreeSet;

use super::common::*;

use crate::workflows::marketplace::domain::{
    AttachmentParent, CategoryId, ListingStatus, VendorId,
};
use crate::workflows::marketplace::error::WorkflowError;
use crate::workflows::marketplace::listings::{
    AdvanceTarget, CreateListingInput, UpdateListingInput,
};
use crate::workflows::marketplace::store::MarketplaceStore;

#[test]
fn create_requires_an_existing_category() {
    let h = harness();
    let err = h
        .listings
        .create(
            CreateListingInput {
                name: "Block C rewiring".to_string(),
                description: "Full rewiring".to_string(),
                category_id: CategoryId::new(),
                allowed_vendors: BTreeSet::new(),
            },
            Vec::new(),
        )
        .expect_err("unknown category rejected");
    assert!(matches!(err, WorkflowError::NotFound("category")));
}

#[test]
fn create_links_allowed_vendors_and_attachments() {
    let h = harness();
    let vendor_id = approved_vendor(&h, "a");
    let category = h
        .categories
        .create("Electrical".to_string(), None)
        .expect("category creates");

    let listing = h
        .listings
        .create(
            CreateListingInput {
                name: "Block C rewiring".to_string(),
                description: "Full rewiring".to_string(),
                category_id: category.id,
                allowed_vendors: BTreeSet::from([vendor_id]),
            },
            vec![upload("scope-of-works.pdf")],
        )
        .expect("listing creates");

    assert_eq!(listing.status, ListingStatus::Pending);
    assert!(listing.allowed_vendors.contains(&vendor_id));

    let docs = h
        .linker
        .for_parent(AttachmentParent::Listing(listing.id))
        .expect("attachments read");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name, "scope-of-works.pdf");
}

#[test]
fn create_rejects_unknown_vendors_in_the_allowed_set() {
    let h = harness();
    let category = h
        .categories
        .create("Electrical".to_string(), None)
        .expect("category creates");

    let err = h
        .listings
        .create(
            CreateListingInput {
                name: "Block C rewiring".to_string(),
                description: "Full rewiring".to_string(),
                category_id: category.id,
                allowed_vendors: BTreeSet::from([VendorId::new()]),
            },
            Vec::new(),
        )
        .expect_err("unknown vendor rejected");
    assert!(matches!(err, WorkflowError::NotFound("vendor")));
}

#[test]
fn update_replaces_the_vendor_set_wholesale() {
    let h = harness();
    let first = approved_vendor(&h, "a");
    let second = approved_vendor(&h, "b");
    let category = h
        .categories
        .create("Electrical".to_string(), None)
        .expect("category creates");
    let listing = h
        .listings
        .create(
            CreateListingInput {
                name: "Block C rewiring".to_string(),
                description: "Full rewiring".to_string(),
                category_id: category.id,
                allowed_vendors: BTreeSet::from([first]),
            },
            Vec::new(),
        )
        .expect("listing creates");

    let updated = h
        .listings
        .update(
            listing.id,
            UpdateListingInput {
                allowed_vendors: BTreeSet::from([second]),
                ..UpdateListingInput::default()
            },
            Vec::new(),
        )
        .expect("update succeeds");

    assert_eq!(updated.allowed_vendors, BTreeSet::from([second]));

    // An empty replacement set reopens the listing to all vendors.
    let reopened = h
        .listings
        .update(listing.id, UpdateListingInput::default(), Vec::new())
        .expect("update succeeds");
    assert!(reopened.allowed_vendors.is_empty());
    assert!(reopened.is_open_to(VendorId::new()));
}

#[test]
fn update_without_uploads_deletes_existing_attachments() {
    let h = harness();
    let category = h
        .categories
        .create("Electrical".to_string(), None)
        .expect("category creates");
    let listing = h
        .listings
        .create(
            CreateListingInput {
                name: "Block C rewiring".to_string(),
                description: "Full rewiring".to_string(),
                category_id: category.id,
                allowed_vendors: BTreeSet::new(),
            },
            vec![upload("scope-of-works.pdf")],
        )
        .expect("listing creates");

    h.listings
        .update(
            listing.id,
            UpdateListingInput {
                description: Some("Full rewiring, floors 1-3".to_string()),
                ..UpdateListingInput::default()
            },
            Vec::new(),
        )
        .expect("update succeeds");

    let docs = h
        .linker
        .for_parent(AttachmentParent::Listing(listing.id))
        .expect("attachments read");
    assert!(docs.is_empty(), "update always replaces the attachment batch");
}

#[test]
fn update_with_uploads_replaces_the_batch() {
    let h = harness();
    let listing = open_listing(&h);
    h.linker
        .attach(
            AttachmentParent::Listing(listing.id),
            vec![upload("old-scope.pdf")],
        )
        .expect("seed attachment");

    h.listings
        .update(
            listing.id,
            UpdateListingInput::default(),
            vec![upload("new-scope.pdf")],
        )
        .expect("update succeeds");

    let docs = h
        .linker
        .for_parent(AttachmentParent::Listing(listing.id))
        .expect("attachments read");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name, "new-scope.pdf");
}

#[test]
fn advance_requires_the_listing_to_be_awarded_first() {
    let h = harness();
    let listing = open_listing(&h);

    let err = h
        .listings
        .advance(listing.id, AdvanceTarget::Ongoing)
        .expect_err("pending listing rejected");
    match err {
        WorkflowError::BadRequest(message) => assert!(message.contains("awarded")),
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[test]
fn advance_walks_the_forward_path_only() {
    let h = harness();
    let vendor_id = approved_vendor(&h, "a");
    let listing = open_listing(&h);
    let application = apply_for(&h, &listing, vendor_id);
    award(&h, &listing, &application);

    let listing = h
        .listings
        .advance(listing.id, AdvanceTarget::Ongoing)
        .expect("awarded to ongoing");
    assert_eq!(listing.status, ListingStatus::Ongoing);

    let err = h
        .listings
        .advance(listing.id, AdvanceTarget::Ongoing)
        .expect_err("no-op rejected");
    assert!(matches!(err, WorkflowError::BadRequest(_)));

    let listing = h
        .listings
        .advance(listing.id, AdvanceTarget::Delivered)
        .expect("ongoing to delivered");
    assert_eq!(listing.status, ListingStatus::Delivered);

    let err = h
        .listings
        .advance(listing.id, AdvanceTarget::Ongoing)
        .expect_err("backward move rejected");
    assert!(matches!(err, WorkflowError::BadRequest(_)));
}

#[test]
fn advance_allows_the_forward_jump_to_delivered() {
    let h = harness();
    let vendor_id = approved_vendor(&h, "a");
    let listing = open_listing(&h);
    let application = apply_for(&h, &listing, vendor_id);
    award(&h, &listing, &application);

    let listing = h
        .listings
        .advance(listing.id, AdvanceTarget::Delivered)
        .expect("awarded straight to delivered");
    assert_eq!(listing.status, ListingStatus::Delivered);
}

#[test]
fn deactivate_is_reachable_from_any_non_terminal_state_and_terminal() {
    let h = harness();
    let listing = open_listing(&h);

    let listing = h.listings.deactivate(listing.id).expect("pending deactivates");
    assert_eq!(listing.status, ListingStatus::Inactive);

    let err = h
        .listings
        .deactivate(listing.id)
        .expect_err("repeat deactivation rejected");
    assert!(matches!(err, WorkflowError::BadRequest(_)));

    let err = h
        .listings
        .advance(listing.id, AdvanceTarget::Ongoing)
        .expect_err("inactive listing never advances");
    assert!(matches!(err, WorkflowError::BadRequest(_)));
}

#[test]
fn deactivate_rejects_delivered_listings() {
    let h = harness();
    let vendor_id = approved_vendor(&h, "a");
    let listing = open_listing(&h);
    let application = apply_for(&h, &listing, vendor_id);
    award(&h, &listing, &application);
    h.listings
        .advance(listing.id, AdvanceTarget::Delivered)
        .expect("delivers");

    let err = h
        .listings
        .deactivate(listing.id)
        .expect_err("terminal listing rejected");
    assert!(matches!(err, WorkflowError::BadRequest(_)));
}

#[test]
fn delete_cascades_to_applications_and_attachments() {
    let h = harness();
    let vendor_id = approved_vendor(&h, "a");
    let category = h
        .categories
        .create("Electrical".to_string(), None)
        .expect("category creates");
    let listing = h
        .listings
        .create(
            CreateListingInput {
                name: "Block C rewiring".to_string(),
                description: "Full rewiring".to_string(),
                category_id: category.id,
                allowed_vendors: BTreeSet::new(),
            },
            vec![upload("scope-of-works.pdf")],
        )
        .expect("listing creates");
    let application = apply_for(&h, &listing, vendor_id);

    h.listings.delete(listing.id).expect("listing deletes");

    assert!(h
        .linker
        .for_parent(AttachmentParent::Listing(listing.id))
        .expect("attachments read")
        .is_empty());
    assert!(h
        .store
        .application(application.id)
        .expect("store reads")
        .is_none());
    let err = h.listings.get(listing.id).expect_err("listing gone");
    assert!(matches!(err, WorkflowError::NotFound("listing")));
}

#[test]
fn advance_target_parse_is_strict() {
    assert_eq!(AdvanceTarget::parse("ONGOING"), Some(AdvanceTarget::Ongoing));
    assert_eq!(
        AdvanceTarget::parse("DELIVERED"),
        Some(AdvanceTarget::Delivered)
    );
    assert_eq!(AdvanceTarget::parse("AWARDED"), None);
    assert_eq!(AdvanceTarget::parse("ongoing"), None);
    assert_eq!(AdvanceTarget::parse(""), None);
}
