//! Test fixtures for the online shop order service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p online-shop-integration-tests
//! ```
//!
//! Most suites need no database: [`InMemoryOrderStore`] implements the same
//! `OrderStore` contract as the `PostgreSQL` store, including all-or-nothing
//! placement, inner-join composition and a replica that can be made to lag.
//!
//! The `postgres_store` suite runs against a live database and is ignored by
//! default:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/shop_test \
//!     cargo test -p online-shop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `order_placement` - Totals, validation and placement atomicity
//! - `order_status` - Status updates, timestamp stamping and concurrency
//! - `order_routes` - The HTTP surface, driven with `tower::ServiceExt::oneshot`
//! - `postgres_store` - `PgOrderStore` and `UnitOfWork` against `PostgreSQL`

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use jsonwebtoken::{EncodingKey, Header};
use secrecy::SecretString;

use online_shop_core::{OrderId, ProductId};
use online_shop_orders::db::{Consistency, OrderStore, RepositoryError};
use online_shop_orders::middleware::{Claims, JwtVerifier};
use online_shop_orders::models::{ComposedOrderRow, NewOrder, Order, OrderLineItem};
use online_shop_orders::routes;
use online_shop_orders::state::AppState;

/// Signing key shared by [`test_app`] and [`bearer_token`].
pub const TEST_SIGNING_KEY: &str = "t3$Kq9!vM2@wZ7#rB5&nX8^pL4*dH6%j";

/// Product 7 in the default catalog.
pub const WIDGET: (i64, &str) = (7, "Widget");
/// Product 8 in the default catalog.
pub const GADGET: (i64, &str) = (8, "Gadget");

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Clone, Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    items: Vec<OrderLineItem>,
}

impl Tables {
    fn insert_order(&mut self, order: &Order) -> Result<(), RepositoryError> {
        if self.orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict("order already exists".to_string()));
        }
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn insert_item(
        &mut self,
        item: &OrderLineItem,
        products: &HashMap<ProductId, String>,
    ) -> Result<(), RepositoryError> {
        if !self.orders.contains_key(&item.order_id) || !products.contains_key(&item.product_id)
        {
            return Err(RepositoryError::Conflict(
                "order line item references a missing row".to_string(),
            ));
        }
        if self.items.iter().any(|existing| {
            existing.id == item.id
                || (existing.order_id == item.order_id && existing.line_number == item.line_number)
        }) {
            return Err(RepositoryError::Conflict(
                "order line item already exists".to_string(),
            ));
        }
        self.items.push(item.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct StoreData {
    products: HashMap<ProductId, String>,
    primary: Tables,
    /// `Some` while the replica is lagging; reads at `Eventual` see this copy.
    replica: Option<Tables>,
}

#[derive(Debug, Default)]
struct Shared {
    data: Mutex<StoreData>,
    calls: AtomicUsize,
    fail_item_insert_at: AtomicUsize,
    unavailable: AtomicBool,
}

/// `OrderStore` kept in process memory.
///
/// Clones share the same data, so a test can keep a handle for inspection
/// after moving one into the application state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    shared: Arc<Shared>,
}

impl InMemoryOrderStore {
    /// Empty store with no products.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose catalog holds [`WIDGET`] and [`GADGET`].
    #[must_use]
    pub fn with_catalog() -> Self {
        let store = Self::new();
        store.add_product(WIDGET.0, WIDGET.1);
        store.add_product(GADGET.0, GADGET.1);
        store
    }

    /// Add a product to the catalog.
    pub fn add_product(&self, id: i64, name: &str) {
        self.data()
            .products
            .insert(ProductId::new(id), name.to_string());
    }

    /// Make the `n`-th line item insert of every placement fail (1-based).
    /// Zero disables the fault.
    pub fn fail_item_insert_at(&self, n: usize) {
        self.shared.fail_item_insert_at.store(n, Ordering::SeqCst);
    }

    /// Make every store call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Freeze the replica at the current primary state.
    pub fn pause_replication(&self) {
        let mut data = self.data();
        data.replica = Some(data.primary.clone());
    }

    /// Catch the replica up with the primary and keep it current.
    pub fn resume_replication(&self) {
        self.data().replica = None;
    }

    /// Number of store calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    /// Number of committed orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.data().primary.orders.len()
    }

    /// Number of committed line items across all orders.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.data().primary.items.len()
    }

    /// Committed header of an order.
    #[must_use]
    pub fn stored_order(&self, id: OrderId) -> Option<Order> {
        self.data().primary.orders.get(&id).cloned()
    }

    /// Committed line items of an order, in line order.
    #[must_use]
    pub fn stored_items(&self, id: OrderId) -> Vec<OrderLineItem> {
        let mut items: Vec<_> = self
            .data()
            .primary
            .items
            .iter()
            .filter(|item| item.order_id == id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.line_number);
        items
    }

    fn data(&self) -> MutexGuard<'_, StoreData> {
        self.shared
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, yield to other tasks, and fail if unavailable.
    async fn enter(&self) -> Result<(), RepositoryError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.shared.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

impl OrderStore for InMemoryOrderStore {
    async fn get(&self, id: OrderId, consistency: Consistency) -> Result<Order, RepositoryError> {
        self.enter().await?;
        let data = self.data();
        let tables = read_tables(&data, consistency);
        tables
            .orders
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_composed(
        &self,
        id: OrderId,
        consistency: Consistency,
    ) -> Result<Vec<ComposedOrderRow>, RepositoryError> {
        self.enter().await?;
        let data = self.data();
        let tables = read_tables(&data, consistency);
        let Some(order) = tables.orders.get(&id) else {
            return Ok(Vec::new());
        };

        let mut items: Vec<_> = tables
            .items
            .iter()
            .filter(|item| item.order_id == id)
            .collect();
        items.sort_by_key(|item| item.line_number);

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let product_name = data.products.get(&item.product_id)?;
                Some(ComposedOrderRow {
                    order: order.clone(),
                    product_name: product_name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                })
            })
            .collect())
    }

    async fn create_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.enter().await?;
        self.data().primary.insert_order(order)
    }

    async fn create_order_detail(&self, item: &OrderLineItem) -> Result<(), RepositoryError> {
        self.enter().await?;
        let mut data = self.data();
        let StoreData {
            products, primary, ..
        } = &mut *data;
        primary.insert_item(item, products)
    }

    async fn update_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.enter().await?;
        if let Some(stored) = self.data().primary.orders.get_mut(&order.id) {
            stored.address_id.clone_from(&order.address_id);
            stored.payment_date = order.payment_date;
            stored.delivered_date = order.delivered_date;
            stored.status = order.status;
        }
        Ok(())
    }

    async fn place_order(&self, new_order: &NewOrder) -> Result<(), RepositoryError> {
        self.enter().await?;
        let fail_at = self.shared.fail_item_insert_at.load(Ordering::SeqCst);

        let mut data = self.data();
        let StoreData {
            products, primary, ..
        } = &mut *data;

        // Writes go to a staging copy that replaces the primary on commit.
        let mut staged = primary.clone();
        staged.insert_order(&new_order.order)?;
        for (n, item) in new_order.items.iter().enumerate() {
            if n + 1 == fail_at {
                return Err(RepositoryError::Conflict(
                    "order line item violates a check constraint".to_string(),
                ));
            }
            staged.insert_item(item, products)?;
        }

        *primary = staged;
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.enter().await
    }
}

fn read_tables(data: &StoreData, consistency: Consistency) -> &Tables {
    match (consistency, &data.replica) {
        (Consistency::Eventual, Some(replica)) => replica,
        _ => &data.primary,
    }
}

// =============================================================================
// HTTP helpers
// =============================================================================

/// Build the full application router over `store`.
pub fn test_app(store: InMemoryOrderStore) -> Router {
    let verifier = JwtVerifier::new(&SecretString::from(TEST_SIGNING_KEY));
    routes::app(AppState::new(store, verifier), Duration::from_secs(5))
}

/// Sign an identity token valid for one hour.
///
/// # Panics
///
/// Panics if the token cannot be encoded.
#[must_use]
pub fn bearer_token(user_id: &str, name: &str) -> String {
    let exp = chrono::Utc::now() + chrono::Duration::hours(1);
    let claims = Claims {
        id: user_id.to_string(),
        name: name.to_string(),
        exp: exp.timestamp().unsigned_abs(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SIGNING_KEY.as_bytes()),
    )
    .expect("encode test token")
}
