//! Order repository backed by `PostgreSQL`.
//!
//! Queries are checked at runtime (`sqlx::query` / `sqlx::query_as`) so the
//! crate builds without a live database. Status values travel as text and are
//! cast to `shop.order_status` in SQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use online_shop_core::{OrderId, OrderStatus, UserId};

use super::unit_of_work::UnitOfWork;
use super::{Consistency, OrderStore, RepositoryError, write_error};
use crate::models::{ComposedOrderRow, NewOrder, Order, OrderLineItem};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    address_id: String,
    order_date: DateTime<Utc>,
    payment_date: Option<DateTime<Utc>>,
    delivered_date: Option<DateTime<Utc>>,
    status: String,
    amount: Decimal,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            address_id: row.address_id,
            order_date: row.order_date,
            payment_date: row.payment_date,
            delivered_date: row.delivered_date,
            status,
            amount: row.amount,
        })
    }
}

/// Internal row type for the order/line item/product join.
#[derive(Debug, sqlx::FromRow)]
struct ComposedRow {
    #[sqlx(flatten)]
    order: OrderRow,
    product_name: String,
    price: Decimal,
    quantity: i32,
}

impl TryFrom<ComposedRow> for ComposedOrderRow {
    type Error = RepositoryError;

    fn try_from(row: ComposedRow) -> Result<Self, Self::Error> {
        Ok(Self {
            order: row.order.try_into()?,
            product_name: row.product_name,
            price: row.price,
            quantity: row.quantity,
        })
    }
}

// =============================================================================
// Statements
// =============================================================================

/// Insert an order header on the given connection.
async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.orders (
            id, user_id, address_id, order_date, payment_date, delivered_date, status, amount
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7::shop.order_status, $8)
        ",
    )
    .bind(order.id)
    .bind(&order.user_id)
    .bind(&order.address_id)
    .bind(order.order_date)
    .bind(order.payment_date)
    .bind(order.delivered_date)
    .bind(order.status.as_str())
    .bind(order.amount)
    .execute(conn)
    .await
    .map_err(|e| write_error("order", e))?;

    Ok(())
}

/// Insert one line item on the given connection.
async fn insert_order_detail(
    conn: &mut PgConnection,
    item: &OrderLineItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.order_detail (id, order_id, line_number, product_id, price, quantity)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.line_number)
    .bind(item.product_id)
    .bind(item.price)
    .bind(item.quantity)
    .execute(conn)
    .await
    .map_err(|e| write_error("order line item", e))?;

    Ok(())
}

/// Insert a header followed by its line items, stopping at the first failure.
async fn insert_new_order(
    conn: &mut PgConnection,
    new_order: &NewOrder,
) -> Result<(), RepositoryError> {
    insert_order(&mut *conn, &new_order.order).await?;
    for item in &new_order.items {
        insert_order_detail(&mut *conn, item).await?;
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Order store with separate writer and reader pools.
#[derive(Clone)]
pub struct PgOrderStore {
    writer: PgPool,
    reader: PgPool,
}

impl PgOrderStore {
    /// Create a store over a primary (writer) and a replica (reader) pool.
    #[must_use]
    pub const fn new(writer: PgPool, reader: PgPool) -> Self {
        Self { writer, reader }
    }

    /// Create a store that reads and writes through one pool.
    #[must_use]
    pub fn single(pool: PgPool) -> Self {
        Self {
            reader: pool.clone(),
            writer: pool,
        }
    }

    const fn pool_for(&self, consistency: Consistency) -> &PgPool {
        match consistency {
            Consistency::Eventual => &self.reader,
            Consistency::Strong => &self.writer,
        }
    }
}

impl OrderStore for PgOrderStore {
    async fn get(&self, id: OrderId, consistency: Consistency) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, address_id, order_date, payment_date, delivered_date,
                   status::text AS status, amount
            FROM shop.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool_for(consistency))
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn get_composed(
        &self,
        id: OrderId,
        consistency: Consistency,
    ) -> Result<Vec<ComposedOrderRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComposedRow>(
            r"
            SELECT o.id, o.user_id, o.address_id, o.order_date, o.payment_date,
                   o.delivered_date, o.status::text AS status, o.amount,
                   p.name AS product_name, od.price, od.quantity
            FROM shop.orders o
            JOIN shop.order_detail od ON od.order_id = o.id
            JOIN shop.product p ON p.id = od.product_id
            WHERE o.id = $1
            ORDER BY od.line_number
            ",
        )
        .bind(id)
        .fetch_all(self.pool_for(consistency))
        .await?;

        rows.into_iter().map(ComposedOrderRow::try_from).collect()
    }

    async fn create_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut conn = self.writer.acquire().await?;
        insert_order(&mut conn, order).await
    }

    async fn create_order_detail(&self, item: &OrderLineItem) -> Result<(), RepositoryError> {
        let mut conn = self.writer.acquire().await?;
        insert_order_detail(&mut conn, item).await
    }

    async fn update_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.orders
            SET address_id = $2,
                payment_date = $3,
                delivered_date = $4,
                status = $5::shop.order_status
            WHERE id = $1
            ",
        )
        .bind(order.id)
        .bind(&order.address_id)
        .bind(order.payment_date)
        .bind(order.delivered_date)
        .bind(order.status.as_str())
        .execute(&self.writer)
        .await
        .map_err(|e| write_error("order", e))?;

        if result.rows_affected() == 0 {
            tracing::debug!(order_id = %order.id, "Order update matched no rows");
        }

        Ok(())
    }

    async fn place_order(&self, new_order: &NewOrder) -> Result<(), RepositoryError> {
        let mut uow = UnitOfWork::begin(&self.writer).await?;
        let outcome = insert_new_order(uow.connection(), new_order).await;
        uow.end(outcome).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.writer).await?;
        sqlx::query("SELECT 1").execute(&self.reader).await?;
        Ok(())
    }
}
