//! Integration tests for order placement and lookup.
//!
//! These tests drive `OrderService` against the in-memory store and verify
//! totals, validation, and that a placement is committed whole or not at all.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use online_shop_core::{CurrentUser, OrderId, OrderStatus, ProductId};
use online_shop_integration_tests::{GADGET, InMemoryOrderStore, WIDGET};
use online_shop_orders::db::RepositoryError;
use online_shop_orders::models::{LineItemInput, PlaceOrderInput};
use online_shop_orders::services::{OrderError, OrderService};

fn buyer() -> CurrentUser {
    CurrentUser::new("u1", "alice")
}

fn line(product: (i64, &str), quantity: i32, cents: i64) -> LineItemInput {
    LineItemInput {
        product_id: ProductId::new(product.0),
        quantity,
        price: Decimal::new(cents, 2),
    }
}

fn cart(items: Vec<LineItemInput>) -> PlaceOrderInput {
    PlaceOrderInput {
        shipping_address: "addr-1".to_string(),
        items,
    }
}

fn service() -> (OrderService<InMemoryOrderStore>, InMemoryOrderStore) {
    let store = InMemoryOrderStore::with_catalog();
    (OrderService::new(store.clone()), store)
}

// =============================================================================
// Placement
// =============================================================================

#[tokio::test]
async fn test_place_single_item_order() {
    let (service, store) = service();

    let view = service
        .place_order(&buyer(), cart(vec![line(WIDGET, 2, 1000)]))
        .await
        .unwrap();

    assert_eq!(view.amount, Decimal::new(2000, 2));
    assert_eq!(view.status, OrderStatus::Created);
    assert_eq!(view.user_id.as_str(), "u1");
    assert_eq!(view.shipping_address, "addr-1");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].name, WIDGET.1);
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.items[0].price, Decimal::new(1000, 2));

    assert_eq!(store.order_count(), 1);
    assert_eq!(store.stored_items(view.id).len(), 1);
}

#[tokio::test]
async fn test_amount_is_sum_of_line_totals() {
    let (service, store) = service();

    let view = service
        .place_order(
            &buyer(),
            cart(vec![
                line(WIDGET, 3, 1999),
                line(GADGET, 1, 5),
                line(WIDGET, 10, 0),
            ]),
        )
        .await
        .unwrap();

    // 3 * 19.99 + 1 * 0.05 + 10 * 0.00
    assert_eq!(view.amount, Decimal::new(6002, 2));

    let items = store.stored_items(view.id);
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item.order_id == view.id));
    let stored_total: Decimal = items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();
    assert_eq!(stored_total, view.amount);
    assert_eq!(store.stored_order(view.id).unwrap().amount, view.amount);
}

#[tokio::test]
async fn test_items_keep_request_order() {
    let (service, _store) = service();

    let view = service
        .place_order(
            &buyer(),
            cart(vec![line(GADGET, 1, 100), line(WIDGET, 1, 100)]),
        )
        .await
        .unwrap();

    let names: Vec<_> = view.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, [GADGET.1, WIDGET.1]);
}

#[tokio::test]
async fn test_each_placement_gets_fresh_ids() {
    let (service, store) = service();

    let first = service
        .place_order(&buyer(), cart(vec![line(WIDGET, 1, 100)]))
        .await
        .unwrap();
    let second = service
        .place_order(&buyer(), cart(vec![line(WIDGET, 1, 100)]))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.order_count(), 2);
    assert_eq!(store.item_count(), 2);
}

// =============================================================================
// Validation (no store access)
// =============================================================================

#[tokio::test]
async fn test_empty_cart_rejected_before_store() {
    let (service, store) = service();

    let err = service
        .place_order(&buyer(), cart(Vec::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::Validation(_)), "{err:?}");
    assert_eq!(store.calls(), 0);
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn test_invalid_lines_rejected_before_store() {
    let (service, store) = service();

    for bad in [
        line(WIDGET, 0, 100),
        line(WIDGET, -2, 100),
        line(WIDGET, 1, -1),
        LineItemInput {
            price: Decimal::new(10_005, 3),
            ..line(WIDGET, 1, 0)
        },
    ] {
        let err = service
            .place_order(&buyer(), cart(vec![line(GADGET, 1, 100), bad]))
            .await
            .unwrap_err();
        assert!(
            matches!(err, OrderError::Validation(ref msg) if msg.starts_with("item 2")),
            "{err:?}"
        );
    }

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_amounts_beyond_stored_range_rejected_before_store() {
    let (service, store) = service();

    for items in [
        // 100 * 100000000000.00 does not fit NUMERIC(12, 2)
        vec![LineItemInput {
            price: Decimal::new(100_000_000_000, 0),
            ..line(WIDGET, 100, 0)
        }],
        // each line fits, the sum does not
        vec![
            line(WIDGET, 1, 600_000_000_000),
            line(GADGET, 1, 600_000_000_000),
        ],
    ] {
        let err = service
            .place_order(&buyer(), cart(items))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)), "{err:?}");
    }

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_missing_identity_rejected_before_store() {
    let (service, store) = service();

    let err = service
        .place_order(&CurrentUser::new(" ", ""), cart(vec![line(WIDGET, 1, 100)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::Unauthorized), "{err:?}");
    assert_eq!(store.calls(), 0);
}

// =============================================================================
// Atomicity
// =============================================================================

#[tokio::test]
async fn test_failed_line_insert_leaves_nothing_behind() {
    let (service, store) = service();
    store.fail_item_insert_at(2);

    let err = service
        .place_order(
            &buyer(),
            cart(vec![
                line(WIDGET, 1, 100),
                line(GADGET, 1, 100),
                line(WIDGET, 1, 100),
            ]),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, OrderError::Repository(RepositoryError::Conflict(_))),
        "{err:?}"
    );
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.item_count(), 0);
}

#[tokio::test]
async fn test_unknown_product_rolls_back_whole_order() {
    let (service, store) = service();

    let err = service
        .place_order(
            &buyer(),
            cart(vec![line(WIDGET, 1, 100), line((999, "Missing"), 1, 100)]),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, OrderError::Repository(RepositoryError::Conflict(_))),
        "{err:?}"
    );
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.item_count(), 0);
}

#[tokio::test]
async fn test_failed_placement_does_not_disturb_earlier_orders() {
    let (service, store) = service();

    let kept = service
        .place_order(&buyer(), cart(vec![line(WIDGET, 1, 100)]))
        .await
        .unwrap();

    store.fail_item_insert_at(1);
    service
        .place_order(&buyer(), cart(vec![line(GADGET, 1, 100)]))
        .await
        .unwrap_err();

    assert_eq!(store.order_count(), 1);
    assert_eq!(store.stored_items(kept.id).len(), 1);
}

#[tokio::test]
async fn test_store_failure_passes_through() {
    let (service, store) = service();
    store.set_unavailable(true);

    let err = service
        .place_order(&buyer(), cart(vec![line(WIDGET, 1, 100)]))
        .await
        .unwrap_err();

    assert!(
        matches!(err, OrderError::Repository(RepositoryError::Database(_))),
        "{err:?}"
    );
}

// =============================================================================
// Lookup
// =============================================================================

#[tokio::test]
async fn test_get_after_place_matches() {
    let (service, _store) = service();

    let placed = service
        .place_order(
            &buyer(),
            cart(vec![line(WIDGET, 2, 1000), line(GADGET, 1, 250)]),
        )
        .await
        .unwrap();
    let fetched = service.get(placed.id).await.unwrap();

    assert_eq!(fetched, placed);
}

#[tokio::test]
async fn test_get_unknown_order_is_not_found() {
    let (service, _store) = service();
    let id = OrderId::generate();

    let err = service.get(id).await.unwrap_err();

    assert!(matches!(err, OrderError::NotFound(missing) if missing == id));
}

#[tokio::test]
async fn test_placement_reads_back_from_primary() {
    let (service, store) = service();
    store.pause_replication();

    // The replica has not seen the new order, but placement still returns it.
    let placed = service
        .place_order(&buyer(), cart(vec![line(WIDGET, 1, 100)]))
        .await
        .unwrap();
    assert_eq!(placed.items.len(), 1);

    let err = service.get(placed.id).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));

    store.resume_replication();
    assert_eq!(service.get(placed.id).await.unwrap(), placed);
}
