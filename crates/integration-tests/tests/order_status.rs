//! Integration tests for order status updates.
//!
//! Status updates are permissive: any status may be written at any time and
//! the last write wins. These tests pin down the timestamp stamping and that
//! permissiveness.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use online_shop_core::{CurrentUser, OrderId, OrderStatus, ProductId};
use online_shop_integration_tests::{InMemoryOrderStore, WIDGET};
use online_shop_orders::db::RepositoryError;
use online_shop_orders::models::{LineItemInput, PlaceOrderInput, StatusUpdate};
use online_shop_orders::services::{OrderError, OrderService};

async fn placed() -> (OrderService<InMemoryOrderStore>, InMemoryOrderStore, OrderId) {
    let store = InMemoryOrderStore::with_catalog();
    let service = OrderService::new(store.clone());
    let view = service
        .place_order(
            &CurrentUser::new("u1", "alice"),
            PlaceOrderInput {
                shipping_address: "addr-1".to_string(),
                items: vec![LineItemInput {
                    product_id: ProductId::new(WIDGET.0),
                    quantity: 2,
                    price: Decimal::new(1000, 2),
                }],
            },
        )
        .await
        .unwrap();
    (service, store, view.id)
}

const fn update(order_id: OrderId, status: OrderStatus) -> StatusUpdate {
    StatusUpdate { order_id, status }
}

// =============================================================================
// Stamping
// =============================================================================

#[tokio::test]
async fn test_payment_received_stamps_payment_date() {
    let (service, store, id) = placed().await;

    let order = service
        .update_order(update(id, OrderStatus::PaymentReceived))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::PaymentReceived);
    assert!(order.payment_date.is_some());
    assert!(order.delivered_date.is_none());
    assert_eq!(store.stored_order(id).unwrap(), order);

    let view = service.get(id).await.unwrap();
    assert_eq!(view.status, OrderStatus::PaymentReceived);
    assert_eq!(view.payment_date, order.payment_date);
}

#[tokio::test]
async fn test_stamped_dates_fit_timestamptz_precision() {
    let (service, store, id) = placed().await;

    let paid = service
        .update_order(update(id, OrderStatus::PaymentReceived))
        .await
        .unwrap();
    let shipped = service
        .update_order(update(id, OrderStatus::Shipped))
        .await
        .unwrap();

    for date in [paid.order_date, paid.payment_date.unwrap(), shipped.delivered_date.unwrap()] {
        assert_eq!(date.timestamp_subsec_nanos() % 1_000, 0, "{date}");
    }
    assert_eq!(store.stored_order(id).unwrap(), shipped);
}

#[tokio::test]
async fn test_shipping_after_payment_keeps_payment_date() {
    let (service, _store, id) = placed().await;

    let paid = service
        .update_order(update(id, OrderStatus::PaymentReceived))
        .await
        .unwrap();
    let shipped = service
        .update_order(update(id, OrderStatus::Shipped))
        .await
        .unwrap();

    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(shipped.delivered_date.is_some());
    assert_eq!(shipped.payment_date, paid.payment_date);
}

#[tokio::test]
async fn test_update_leaves_amount_and_address() {
    let (service, store, id) = placed().await;
    let before = store.stored_order(id).unwrap();

    let after = service
        .update_order(update(id, OrderStatus::Verified))
        .await
        .unwrap();

    assert_eq!(after.amount, before.amount);
    assert_eq!(after.address_id, before.address_id);
    assert_eq!(after.order_date, before.order_date);
    assert_eq!(store.stored_items(id).len(), 1);
}

// =============================================================================
// Permissive transitions
// =============================================================================

#[tokio::test]
async fn test_repeated_status_succeeds() {
    let (service, _store, id) = placed().await;

    let first = service
        .update_order(update(id, OrderStatus::PaymentReceived))
        .await
        .unwrap();
    let second = service
        .update_order(update(id, OrderStatus::PaymentReceived))
        .await
        .unwrap();

    assert_eq!(second.status, OrderStatus::PaymentReceived);
    assert!(second.payment_date >= first.payment_date);
}

#[tokio::test]
async fn test_irregular_transition_is_written() {
    let (service, _store, id) = placed().await;

    service
        .update_order(update(id, OrderStatus::Cancelled))
        .await
        .unwrap();
    let revived = service
        .update_order(update(id, OrderStatus::Created))
        .await
        .unwrap();

    assert_eq!(revived.status, OrderStatus::Created);
}

#[tokio::test]
async fn test_every_status_can_be_written() {
    let (service, store, id) = placed().await;

    for status in OrderStatus::ALL {
        let order = service.update_order(update(id, status)).await.unwrap();
        assert_eq!(order.status, status);
        assert_eq!(store.stored_order(id).unwrap().status, status);
    }
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (service, store, _id) = placed().await;
    let missing = OrderId::generate();

    let err = service
        .update_order(update(missing, OrderStatus::Shipped))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::NotFound(id) if id == missing), "{err:?}");
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn test_store_failure_applies_no_change() {
    let (service, store, id) = placed().await;
    store.set_unavailable(true);

    let err = service
        .update_order(update(id, OrderStatus::Shipped))
        .await
        .unwrap_err();
    assert!(
        matches!(err, OrderError::Repository(RepositoryError::Database(_))),
        "{err:?}"
    );

    store.set_unavailable(false);
    assert_eq!(store.stored_order(id).unwrap().status, OrderStatus::Created);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_updates_last_write_wins() {
    let (service, store, id) = placed().await;

    let (shipped, cancelled) = tokio::join!(
        service.update_order(update(id, OrderStatus::Shipped)),
        service.update_order(update(id, OrderStatus::Cancelled)),
    );
    let shipped = shipped.unwrap();
    let cancelled = cancelled.unwrap();

    // Both succeed; the stored status is one of the two writes.
    let stored = store.stored_order(id).unwrap();
    assert!(
        stored == shipped || stored == cancelled,
        "stored {stored:?} matches neither write"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_placements_are_independent() {
    let store = InMemoryOrderStore::with_catalog();
    let service = std::sync::Arc::new(OrderService::new(store.clone()));

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let service = std::sync::Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .place_order(
                        &CurrentUser::new(format!("u{n}"), "buyer"),
                        PlaceOrderInput {
                            shipping_address: format!("addr-{n}"),
                            items: vec![LineItemInput {
                                product_id: ProductId::new(WIDGET.0),
                                quantity: n + 1,
                                price: Decimal::new(100, 2),
                            }],
                        },
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        let view = handle.await.unwrap().unwrap();
        assert_eq!(view.amount, Decimal::from(view.items[0].quantity));
    }
    assert_eq!(store.order_count(), 16);
    assert_eq!(store.item_count(), 16);
}
